//! Reduction of one posterior artifact to one summary row.

use crate::error::{DaaError, Result};
use crate::model::{parse_artifact_name, Posterior};
use crate::summarize::hdi::{hdi, DEFAULT_HDI_PROB};
use std::path::Path;
use tracing::warn;

/// Reduced statistics for one covariate's coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovariateSummary {
    pub mean: f64,
    pub std: f64,
    pub hdi: (f64, f64),
}

/// One feature's reduced statistics across all of its covariates.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub feature_id: String,
    /// (covariate name, summary), in artifact covariate order.
    pub summaries: Vec<(String, CovariateSummary)>,
}

impl SummaryRow {
    /// Look up one covariate's summary.
    pub fn get(&self, covariate: &str) -> Option<&CovariateSummary> {
        self.summaries
            .iter()
            .find(|(name, _)| name == covariate)
            .map(|(_, s)| s)
    }
}

/// Reduce one artifact to a summary row.
///
/// The feature id comes from the artifact's file name alone; a name that
/// does not match `F<nnnn>_<id>.json` or an unreadable artifact is an error.
pub fn extract_summary(path: &Path) -> Result<SummaryRow> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DaaError::MalformedArtifactName(path.display().to_string()))?;
    let feature_id = parse_artifact_name(file_name)?;

    let posterior = Posterior::read(path)?;

    let mut summaries = Vec::with_capacity(posterior.covariates.len());
    for (i, covariate) in posterior.covariates.iter().enumerate() {
        let draws = posterior.covariate_draws(i);
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        // Population std (ddof = 0), so tables stay comparable across runs.
        let std = (draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>()
            / draws.len() as f64)
            .sqrt();
        let interval = hdi(&draws, DEFAULT_HDI_PROB)?;
        summaries.push((
            covariate.clone(),
            CovariateSummary {
                mean,
                std,
                hdi: interval,
            },
        ));
    }

    Ok(SummaryRow {
        feature_id,
        summaries,
    })
}

/// Extraction with the skip contract: a failure is logged and yields no row,
/// never an abort.
pub fn try_extract(path: &Path) -> Option<SummaryRow> {
    match extract_summary(path) {
        Ok(row) => Some(row),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping artifact");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifact_file_name;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn write_artifact(dir: &Path, index: usize, id: &str, draws: Vec<f64>) -> std::path::PathBuf {
        // Two chains, draws split between them, single covariate "x".
        let mid = draws.len() / 2;
        let posterior = Posterior {
            covariates: vec!["x".to_string()],
            beta_var: vec![
                draws[..mid].iter().map(|&v| vec![v]).collect(),
                draws[mid..].iter().map(|&v| vec![v]).collect(),
            ],
            scalars: BTreeMap::new(),
            log_likelihood: None,
        };
        let path = dir.join(artifact_file_name(index, id));
        posterior.write(&path).unwrap();
        path
    }

    #[test]
    fn test_extract_recovers_id_and_stats() {
        let dir = TempDir::new().unwrap();
        let draws: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let path = write_artifact(dir.path(), 7, "feat-A", draws);

        let row = extract_summary(&path).unwrap();
        assert_eq!(row.feature_id, "feat-A");
        let summary = row.get("x").unwrap();
        assert!((summary.mean - 0.5).abs() < 1e-9);
        assert!(summary.std > 0.28 && summary.std < 0.30);
        assert!(summary.hdi.0 >= 0.0 && summary.hdi.1 <= 1.0);
        assert!(summary.hdi.0 < summary.hdi.1);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let draws: Vec<f64> = (0..60).map(|i| (i as f64 * 0.37).sin()).collect();
        let path = write_artifact(dir.path(), 0, "feat-B", draws);

        let first = extract_summary(&path).unwrap();
        let second = extract_summary(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_name_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not_an_artifact.json");
        fs::write(&path, "{}").unwrap();
        assert!(extract_summary(&path).is_err());
        assert!(try_extract(&path).is_none());
    }

    #[test]
    fn test_corrupt_artifact_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(artifact_file_name(1, "feat-C"));
        fs::write(&path, "this is not json").unwrap();
        assert!(try_extract(&path).is_none());
    }
}
