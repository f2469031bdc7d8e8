//! The opaque sampler capability.

use crate::data::DesignMatrix;
use crate::error::Result;
use crate::model::{FitConfig, Posterior};
use std::path::Path;

/// Everything a sampler needs to fit one feature.
#[derive(Debug)]
pub struct FitInputs<'a> {
    /// Feature identifier, for logging and scratch naming.
    pub feature_id: &'a str,
    /// Response counts for this feature, one per sample.
    pub counts: &'a [u64],
    /// Per-sample log sequencing depth, the model offset.
    pub log_depth: &'a [f64],
    /// Design matrix shared across all features of the run.
    pub design: &'a DesignMatrix,
    /// Model hyperparameters.
    pub config: &'a FitConfig,
    /// Scratch directory for sampler state; deleted after the fit.
    pub scratch_dir: &'a Path,
}

/// An external Bayesian inference engine, seen as a single operation.
///
/// Implementations may shell out to a compiled model, call into an FFI
/// sampler, or synthesize draws for tests. A failed compile or fit is
/// reported as an error; the caller owns failure isolation.
pub trait Sampler {
    /// Fit one feature, returning posterior draws for all monitored
    /// parameters.
    fn fit(&self, inputs: &FitInputs<'_>) -> Result<Posterior>;
}
