//! Posterior draws and their durable artifact form.
//!
//! A fitted feature is persisted as one JSON artifact named
//! `F<4-digit zero-padded index>_<feature-id>.json`. The feature id is
//! recoverable from the name alone, which is what summarization relies on.
//! Artifacts are write-once: each worker writes disjoint filenames, so
//! concurrent chunks never contend.

use crate::error::{DaaError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::OnceLock;

/// File extension of the posterior artifact container.
pub const ARTIFACT_EXT: &str = "json";

static NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn name_regex() -> &'static Regex {
    // Index block is fixed-width; the id may itself contain underscores.
    NAME_REGEX.get_or_init(|| Regex::new(r"^F\d{4}_(.+)\.json$").expect("valid regex"))
}

/// Artifact file name for a feature: `F0042_<feature-id>.json`.
pub fn artifact_file_name(index: usize, feature_id: &str) -> String {
    format!("F{:04}_{}.{}", index, feature_id, ARTIFACT_EXT)
}

/// Recover the feature id from an artifact file name.
pub fn parse_artifact_name(file_name: &str) -> Result<String> {
    name_regex()
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DaaError::MalformedArtifactName(file_name.to_string()))
}

/// Posterior draws for one fitted feature.
///
/// Draws are organized chain-major: `beta_var[chain][draw][covariate]`.
/// `beta_var` is the minimum monitored parameter; additional scalar
/// parameters (e.g. `inv_disp`) ride along for convergence diagnostics, and
/// pointwise log-likelihood draws enable the predictive-fit estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posterior {
    /// Covariate names, in design matrix column order.
    pub covariates: Vec<String>,
    /// Coefficient draws: chains x draws x covariates.
    pub beta_var: Vec<Vec<Vec<f64>>>,
    /// Scalar monitored parameters: name -> chains x draws.
    #[serde(default)]
    pub scalars: BTreeMap<String, Vec<Vec<f64>>>,
    /// Pointwise log-likelihood: chains x draws x samples, if monitored.
    #[serde(default)]
    pub log_likelihood: Option<Vec<Vec<Vec<f64>>>>,
}

impl Posterior {
    /// Validate internal shape consistency.
    pub fn validate(&self) -> Result<()> {
        let n_cov = self.covariates.len();
        if self.beta_var.is_empty() || self.beta_var[0].is_empty() {
            return Err(DaaError::EmptyData(
                "Posterior has no beta_var draws".to_string(),
            ));
        }
        let n_draws = self.beta_var[0].len();
        for chain in &self.beta_var {
            if chain.len() != n_draws {
                return Err(DaaError::DimensionMismatch {
                    expected: n_draws,
                    actual: chain.len(),
                });
            }
            for draw in chain {
                if draw.len() != n_cov {
                    return Err(DaaError::DimensionMismatch {
                        expected: n_cov,
                        actual: draw.len(),
                    });
                }
            }
        }
        for chains in self.scalars.values() {
            for chain in chains {
                if chain.len() != n_draws {
                    return Err(DaaError::DimensionMismatch {
                        expected: n_draws,
                        actual: chain.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of chains.
    pub fn n_chains(&self) -> usize {
        self.beta_var.len()
    }

    /// Number of draws per chain.
    pub fn n_draws(&self) -> usize {
        self.beta_var.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Per-chain draw series for one covariate's coefficient.
    pub fn covariate_chains(&self, cov_idx: usize) -> Vec<Vec<f64>> {
        self.beta_var
            .iter()
            .map(|chain| chain.iter().map(|draw| draw[cov_idx]).collect())
            .collect()
    }

    /// All draws for one covariate, flattened across chains (chain-major).
    ///
    /// The order is irrelevant to the sample statistics computed from it.
    pub fn covariate_draws(&self, cov_idx: usize) -> Vec<f64> {
        let mut draws = Vec::with_capacity(self.n_chains() * self.n_draws());
        for chain in &self.beta_var {
            for draw in chain {
                draws.push(draw[cov_idx]);
            }
        }
        draws
    }

    /// Write the artifact to disk.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read an artifact from disk, validating its shape.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let posterior: Self = serde_json::from_reader(reader)?;
        posterior.validate()?;
        Ok(posterior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_posterior() -> Posterior {
        Posterior {
            covariates: vec!["Intercept".to_string(), "group[T.b]".to_string()],
            beta_var: vec![
                vec![vec![0.1, -1.0], vec![0.2, -1.2]],
                vec![vec![0.15, -0.9], vec![0.05, -1.1]],
            ],
            scalars: BTreeMap::from([(
                "inv_disp".to_string(),
                vec![vec![0.5, 0.6], vec![0.55, 0.45]],
            )]),
            log_likelihood: None,
        }
    }

    #[test]
    fn test_artifact_name_roundtrip() {
        let name = artifact_file_name(42, "feat-id_x");
        assert_eq!(name, "F0042_feat-id_x.json");
        assert_eq!(parse_artifact_name(&name).unwrap(), "feat-id_x");
    }

    #[test]
    fn test_malformed_names_rejected() {
        for bad in ["F42_x.json", "G0042_x.json", "F0042_.json", "F0042_x.nc"] {
            assert!(parse_artifact_name(bad).is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn test_shapes() {
        let p = small_posterior();
        p.validate().unwrap();
        assert_eq!(p.n_chains(), 2);
        assert_eq!(p.n_draws(), 2);
        assert_eq!(p.covariate_draws(1), vec![-1.0, -1.2, -0.9, -1.1]);
        assert_eq!(p.covariate_chains(0)[1], vec![0.15, 0.05]);
    }

    #[test]
    fn test_ragged_posterior_rejected() {
        let mut p = small_posterior();
        p.beta_var[1][0].pop();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_write_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(artifact_file_name(0, "feat-A"));
        let p = small_posterior();
        p.write(&path).unwrap();

        let loaded = Posterior::read(&path).unwrap();
        assert_eq!(loaded.covariates, p.covariates);
        assert_eq!(loaded.beta_var, p.beta_var);
        assert_eq!(loaded.scalars, p.scalars);
    }
}
