//! Chunked Bayesian Differential Abundance Analysis
//!
//! This library orchestrates per-feature Bayesian differential abundance
//! inference over thousands of independent features (e.g. microbial taxa)
//! and reduces the resulting posteriors into one summary table used for
//! credibility filtering and display.
//!
//! # Overview
//!
//! The pipeline is a three-stage fan-out/fan-in:
//!
//! - **fit**: each feature is driven through an opaque [`model::Sampler`]
//!   by a chunk worker; successes persist one posterior artifact each,
//!   failures are logged and skipped.
//! - **summarize**: all artifacts are reduced in parallel to one wide
//!   table of per-covariate means, standard deviations and HDIs.
//! - **display**: the table is filtered to credible effects for one
//!   covariate, ranked by effect size and truncated for plotting.
//!
//! Modules:
//!
//! - **data**: Count matrix, metadata, formula, design matrix
//! - **model**: Fit configuration, sampler capability, posterior artifacts
//! - **fit**: Chunk partitioning, per-feature fit runner, diagnostics
//! - **summarize**: Artifact extraction and parallel aggregation
//! - **display**: Credibility filtering and ranked selection
//!
//! # Example
//!
//! ```no_run
//! use chunked_daa::prelude::*;
//!
//! let counts = CountMatrix::from_tsv("counts.tsv").unwrap();
//! let metadata = Metadata::from_tsv("metadata.tsv").unwrap();
//! let metadata = metadata.align_to(counts.sample_ids()).unwrap();
//!
//! let formula = Formula::parse("~ group").unwrap();
//! let design = DesignMatrix::from_formula(&metadata, &formula).unwrap();
//! let config = FitConfig::default();
//!
//! // One worker invocation processes one chunk of the feature set.
//! let sampler = SyntheticSampler::new(42); // stand-in for a real engine
//! let runner = FitRunner::new(&sampler, &config, &design, counts.log_depths(), "out").unwrap();
//! let chunk = partition_chunk(&counts, 20, 1).unwrap();
//! runner.run_chunk(&chunk).unwrap();
//!
//! // Later, once all chunks have run:
//! let outcome = summarize_inferences(
//!     std::path::Path::new("out/inferences"),
//!     std::path::Path::new("out/results/beta_var.tsv"),
//!     8,
//! )
//! .unwrap();
//! if let SummarizeOutcome::Written { path, .. } = outcome {
//!     let table = SummaryTable::from_tsv(path).unwrap();
//!     let selection = select_features(&table, "group[T.treatment]", 25).unwrap();
//!     selection.to_tsv("out/plots/group.tsv").unwrap();
//! }
//! ```

pub mod data;
pub mod display;
pub mod error;
pub mod fit;
pub mod model;
pub mod summarize;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{CountMatrix, DesignMatrix, Formula, Metadata, Term, Variable};
    pub use crate::display::{
        annotate_rows, is_credible, select_features, DisplayRow, DisplaySelection,
        DEFAULT_DISPLAY_N,
    };
    pub use crate::error::{DaaError, Result};
    pub use crate::fit::{
        chunk_bounds, partition_chunk, split_rhat, Chunk, ChunkReport, Diagnostics,
        ElpdEstimate, FeatureEntry, FitOutcome, FitRunner, RHAT_THRESHOLD,
    };
    pub use crate::model::{
        artifact_file_name, parse_artifact_name, FitConfig, FitInputs, Posterior, Sampler,
        SyntheticSampler, ARTIFACT_EXT,
    };
    pub use crate::summarize::{
        extract_summary, format_hdi, hdi, parse_hdi, summarize_inferences, CovariateSummary,
        SummarizeOutcome, SummaryRow, SummaryTable, DEFAULT_HDI_PROB,
    };
}
