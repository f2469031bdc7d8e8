//! Per-feature fit runner and chunk-level driver.

use crate::data::DesignMatrix;
use crate::error::{DaaError, Result};
use crate::fit::chunk::{Chunk, FeatureEntry};
use crate::fit::diagnostics::Diagnostics;
use crate::model::{artifact_file_name, FitConfig, FitInputs, Sampler};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{error, info, warn};

/// Result of one feature's fit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitOutcome {
    /// Artifact persisted at this path.
    Fitted(PathBuf),
    /// Sampler failed; logged, no artifact, processing continues.
    Failed,
}

/// Tally for one chunk invocation.
#[derive(Debug, Clone, Default)]
pub struct ChunkReport {
    pub fitted: usize,
    pub failed: Vec<String>,
}

/// Drives individual features through the sampler and persists artifacts.
///
/// The design matrix and offsets are shared across all features of a run;
/// only the response counts vary per feature. Artifacts land in
/// `<output_dir>/inferences/`, sampler scratch in `<output_dir>/tmp/`.
pub struct FitRunner<'a, S> {
    sampler: &'a S,
    config: &'a FitConfig,
    design: &'a DesignMatrix,
    log_depth: Vec<f64>,
    output_dir: PathBuf,
}

impl<'a, S: Sampler> FitRunner<'a, S> {
    pub fn new(
        sampler: &'a S,
        config: &'a FitConfig,
        design: &'a DesignMatrix,
        log_depth: Vec<f64>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        if log_depth.len() != design.n_samples() {
            return Err(DaaError::DimensionMismatch {
                expected: design.n_samples(),
                actual: log_depth.len(),
            });
        }
        Ok(Self {
            sampler,
            config,
            design,
            log_depth,
            output_dir: output_dir.into(),
        })
    }

    /// Directory where posterior artifacts are written.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.output_dir.join("inferences")
    }

    fn scratch_root(&self) -> PathBuf {
        self.output_dir.join("tmp")
    }

    /// Fit one feature.
    ///
    /// A sampler failure is logged and reported as `FitOutcome::Failed`
    /// without propagating, so a chunk survives any one feature. I/O errors
    /// around artifact persistence are structural and do propagate. The
    /// per-feature scratch directory is removed on every exit path.
    pub fn fit_feature(&self, entry: &FeatureEntry) -> Result<FitOutcome> {
        if entry.counts.len() != self.design.n_samples() {
            return Err(DaaError::DimensionMismatch {
                expected: self.design.n_samples(),
                actual: entry.counts.len(),
            });
        }

        info!(
            feature_num = entry.index,
            feature_id = entry.feature_id.as_str(),
            "fitting feature"
        );

        let artifacts_dir = self.artifacts_dir();
        fs::create_dir_all(&artifacts_dir)?;
        let scratch_root = self.scratch_root();
        fs::create_dir_all(&scratch_root)?;

        // RAII scratch dir: recursively deleted on drop, fit or fail.
        let scratch = Builder::new()
            .prefix(&format!("F{:04}_{}", entry.index, entry.feature_id))
            .tempdir_in(&scratch_root)?;

        let inputs = FitInputs {
            feature_id: &entry.feature_id,
            counts: &entry.counts,
            log_depth: &self.log_depth,
            design: self.design,
            config: self.config,
            scratch_dir: scratch.path(),
        };

        // The sampler is an untrusted boundary: a malformed posterior is
        // treated exactly like a fit failure, never propagated.
        let posterior = match self.sampler.fit(&inputs).and_then(|p| {
            p.validate()?;
            Ok(p)
        }) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    feature_id = entry.feature_id.as_str(),
                    error = %e,
                    "sampler failed, skipping feature"
                );
                return Ok(FitOutcome::Failed);
            }
        };

        let diagnostics = Diagnostics::evaluate(&posterior);
        for parameter in diagnostics.rhat_flags() {
            warn!(
                feature_id = entry.feature_id.as_str(),
                parameter, "Rhat > 1.05"
            );
        }
        if let Some(elpd) = &diagnostics.elpd {
            info!(
                feature_id = entry.feature_id.as_str(),
                elpd = elpd.elpd,
                se = elpd.se,
                p_eff = elpd.p_eff,
                "predictive fit"
            );
            if elpd.has_nan() {
                warn!(feature_id = entry.feature_id.as_str(), "NaN elpd");
            }
        }

        let path = artifacts_dir.join(artifact_file_name(entry.index, &entry.feature_id));
        posterior.write(&path)?;
        info!(
            feature_id = entry.feature_id.as_str(),
            path = %path.display(),
            "saved artifact"
        );
        Ok(FitOutcome::Fitted(path))
    }

    /// Process one chunk sequentially.
    ///
    /// A chunk number outside `[1, total]` is a fatal input error: nothing
    /// is processed. Per-feature sampler failures are tallied and never
    /// abort the chunk.
    pub fn run_chunk(&self, chunk: &Chunk) -> Result<ChunkReport> {
        if chunk.number < 1 || chunk.number > chunk.total {
            error!(
                chunk = chunk.number,
                total = chunk.total,
                "chunk number out of range, aborting"
            );
            return Err(DaaError::InvalidChunk {
                chunk: chunk.number,
                total: chunk.total,
            });
        }

        let start = chunk.entries.first().map(|e| e.index).unwrap_or(0);
        let end = chunk.entries.last().map(|e| e.index + 1).unwrap_or(start);
        info!(
            chunk = chunk.number,
            total = chunk.total,
            start,
            end,
            n_features = chunk.len(),
            "processing chunk"
        );

        let mut report = ChunkReport::default();
        for entry in &chunk.entries {
            match self.fit_feature(entry)? {
                FitOutcome::Fitted(_) => report.fitted += 1,
                FitOutcome::Failed => report.failed.push(entry.feature_id.clone()),
            }
        }

        info!(
            chunk = chunk.number,
            fitted = report.fitted,
            failed = report.failed.len(),
            "chunk complete"
        );
        Ok(report)
    }
}

/// List the artifact files currently present under a runner's output
/// directory, in name order.
pub fn list_artifacts(artifacts_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for dir_entry in fs::read_dir(artifacts_dir)? {
        let path = dir_entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(crate::model::ARTIFACT_EXT) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
