//! Parallel aggregation of artifact summaries into one wide table.

use crate::error::{DaaError, Result};
use crate::model::ARTIFACT_EXT;
use crate::summarize::extract::{try_extract, CovariateSummary, SummaryRow};
use crate::summarize::hdi::{format_hdi, parse_hdi};
use rayon::prelude::*;
use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The wide summary table: one row per successfully extracted feature.
///
/// Columns are the union of covariates seen across input artifacts, in
/// first-appearance order; a feature missing a covariate leaves those cells
/// absent. Derived data: it can always be regenerated from the artifacts.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    covariates: Vec<String>,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Assemble a table from extracted rows.
    pub fn from_rows(rows: Vec<SummaryRow>) -> Self {
        let mut covariates: Vec<String> = Vec::new();
        for row in &rows {
            for (name, _) in &row.summaries {
                if !covariates.contains(name) {
                    covariates.push(name.clone());
                }
            }
        }
        Self { covariates, rows }
    }

    /// Union of covariates across all rows.
    pub fn covariates(&self) -> &[String] {
        &self.covariates
    }

    /// Rows, keyed by feature identifier (order is not ordinal order).
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Number of feature rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Write as tab-delimited text.
    ///
    /// First column is labeled `Feature`; per covariate the columns are
    /// `<covariate>_mean`, `<covariate>_std`, `<covariate>_hdi`, grouped as
    /// all means, then all stds, then all HDIs.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "Feature")?;
        for suffix in ["_mean", "_std", "_hdi"] {
            for covariate in &self.covariates {
                write!(writer, "\t{}{}", covariate, suffix)?;
            }
        }
        writeln!(writer)?;

        for row in &self.rows {
            write!(writer, "{}", row.feature_id)?;
            for covariate in &self.covariates {
                match row.get(covariate) {
                    Some(s) => write!(writer, "\t{}", s.mean)?,
                    None => write!(writer, "\t")?,
                }
            }
            for covariate in &self.covariates {
                match row.get(covariate) {
                    Some(s) => write!(writer, "\t{}", s.std)?,
                    None => write!(writer, "\t")?,
                }
            }
            for covariate in &self.covariates {
                match row.get(covariate) {
                    Some(s) => write!(writer, "\t{}", format_hdi(s.hdi))?,
                    None => write!(writer, "\t")?,
                }
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Read a table previously written by [`SummaryTable::to_tsv`].
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| DaaError::EmptyData("Empty summary table".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.first() != Some(&"Feature") {
            return Err(DaaError::EmptyData(
                "Summary table must start with a 'Feature' column".to_string(),
            ));
        }

        // Covariate union, recovered from the *_mean block.
        let covariates: Vec<String> = header[1..]
            .iter()
            .filter_map(|c| c.strip_suffix("_mean"))
            .map(|c| c.to_string())
            .collect();
        if covariates.is_empty() {
            return Err(DaaError::EmptyData(
                "Summary table has no covariate columns".to_string(),
            ));
        }

        let col_index: std::collections::HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| (*h, i))
            .collect();

        let mut rows = Vec::new();
        for line_result in lines {
            let line = line_result?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let feature_id = fields[0].to_string();

            let mut summaries = Vec::new();
            for covariate in &covariates {
                let cell = |suffix: &str| -> Option<&str> {
                    col_index
                        .get(format!("{}{}", covariate, suffix).as_str())
                        .and_then(|&i| fields.get(i))
                        .copied()
                        .filter(|s| !s.is_empty())
                };
                let (Some(mean), Some(std), Some(hdi_cell)) =
                    (cell("_mean"), cell("_std"), cell("_hdi"))
                else {
                    continue; // absent cell, not zero-filled
                };
                let mean: f64 = mean.trim().parse().map_err(|_| {
                    DaaError::Numerical(format!("Bad mean cell '{}'", mean))
                })?;
                let std: f64 = std.trim().parse().map_err(|_| {
                    DaaError::Numerical(format!("Bad std cell '{}'", std))
                })?;
                let hdi = parse_hdi(hdi_cell)?;
                summaries.push((covariate.clone(), CovariateSummary { mean, std, hdi }));
            }

            rows.push(SummaryRow {
                feature_id,
                summaries,
            });
        }

        Ok(Self { covariates, rows })
    }
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizeOutcome {
    /// Table written with this many rows.
    Written { path: PathBuf, n_rows: usize },
    /// Zero artifacts survived extraction; no output written. Reportable,
    /// not fatal: re-running once more artifacts exist is legitimate.
    Empty,
}

/// Reduce every artifact under `input_dir` into one table at `output_path`.
///
/// Extraction is read-only and embarrassingly parallel; it runs on a
/// bounded pool of `threads` workers (must be at least 1) and joins before
/// any output is produced. Unreadable artifacts are dropped, never
/// fabricated.
pub fn summarize_inferences(
    input_dir: &Path,
    output_path: &Path,
    threads: usize,
) -> Result<SummarizeOutcome> {
    if threads < 1 {
        return Err(DaaError::InvalidParameter(
            "threads must be at least 1".to_string(),
        ));
    }

    let mut artifact_paths = Vec::new();
    for dir_entry in fs::read_dir(input_dir)? {
        let path = dir_entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXT) {
            artifact_paths.push(path);
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| DaaError::InvalidParameter(format!("worker pool: {}", e)))?;

    let rows: Vec<SummaryRow> = pool.install(|| {
        artifact_paths
            .par_iter()
            .filter_map(|path| try_extract(path))
            .collect()
    });

    if rows.is_empty() {
        warn!(
            input_dir = %input_dir.display(),
            "no summaries available, nothing written"
        );
        return Ok(SummarizeOutcome::Empty);
    }

    let table = SummaryTable::from_rows(rows);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    table.to_tsv(output_path)?;
    info!(
        path = %output_path.display(),
        n_rows = table.n_rows(),
        "wrote summary table"
    );
    Ok(SummarizeOutcome::Written {
        path: output_path.to_path_buf(),
        n_rows: table.n_rows(),
    })
}
