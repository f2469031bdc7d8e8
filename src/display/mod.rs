//! Credibility filtering and ranked selection for display.
//!
//! Consumes the wide summary table, classifies each feature's effect for
//! one covariate as credible (HDI excludes zero) or not, and produces the
//! sorted, truncated subset fed to chart rendering. Rendering itself lives
//! elsewhere; only the data selection is here.

use crate::error::{DaaError, Result};
use crate::summarize::SummaryTable;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Default number of features shown at each end of the effect-size ranking.
pub const DEFAULT_DISPLAY_N: usize = 25;

/// One table row annotated for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub feature_id: String,
    /// Posterior mean effect for the chosen covariate.
    pub mean: f64,
    /// Distance from mean down to the HDI lower bound.
    pub lower_err: f64,
    /// Distance from mean up to the HDI upper bound.
    pub upper_err: f64,
    /// Whether the HDI excludes zero.
    pub credible: bool,
}

/// Display-ready subset for one covariate: credible rows only, sorted
/// ascending by mean effect, truncated to the extremes.
#[derive(Debug, Clone)]
pub struct DisplaySelection {
    pub covariate: String,
    /// Credible row count before truncation.
    pub n_credible: usize,
    pub rows: Vec<DisplayRow>,
}

impl DisplaySelection {
    /// Write the selection as TSV, for downstream plotting.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "Feature\tmean\tlower_err\tupper_err")?;
        for row in &self.rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                row.feature_id, row.mean, row.lower_err, row.upper_err
            )?;
        }
        Ok(())
    }
}

/// Whether an interval excludes zero.
pub fn is_credible(lower: f64, upper: f64) -> bool {
    lower > 0.0 || upper < 0.0
}

/// Annotate every row that carries the covariate, unsorted and unfiltered.
///
/// The HDI is converted to asymmetric error magnitudes relative to the
/// mean, for error-bar rendering.
pub fn annotate_rows(table: &SummaryTable, covariate: &str) -> Result<Vec<DisplayRow>> {
    if !table.covariates().iter().any(|c| c == covariate) {
        return Err(DaaError::MissingCovariate(covariate.to_string()));
    }

    let mut rows = Vec::new();
    for row in table.rows() {
        let Some(summary) = row.get(covariate) else {
            continue; // cell absent for this feature
        };
        let (lower, upper) = summary.hdi;
        rows.push(DisplayRow {
            feature_id: row.feature_id.clone(),
            mean: summary.mean,
            lower_err: summary.mean - lower,
            upper_err: upper - summary.mean,
            credible: is_credible(lower, upper),
        });
    }
    Ok(rows)
}

/// Select the display subset for one covariate.
///
/// Credible rows are sorted ascending by mean effect with feature id as a
/// tie-break, so output is deterministic across runs. When fewer than
/// `2 * display_n` rows are credible all of them are shown; otherwise the
/// bottom and top `display_n` by effect size, in sort order.
pub fn select_features(
    table: &SummaryTable,
    covariate: &str,
    display_n: usize,
) -> Result<DisplaySelection> {
    let mut credible: Vec<DisplayRow> = annotate_rows(table, covariate)?
        .into_iter()
        .filter(|r| r.credible)
        .collect();

    credible.sort_by(|a, b| {
        a.mean
            .partial_cmp(&b.mean)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.feature_id.cmp(&b.feature_id))
    });

    let n_credible = credible.len();
    let rows = if n_credible < 2 * display_n {
        credible
    } else {
        let mut rows = credible[..display_n].to_vec();
        rows.extend_from_slice(&credible[n_credible - display_n..]);
        rows
    };

    info!(
        covariate,
        n_credible,
        n_shown = rows.len(),
        "selected features for display"
    );

    Ok(DisplaySelection {
        covariate: covariate.to_string(),
        n_credible,
        rows,
    })
}
