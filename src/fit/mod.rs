//! Per-feature fitting: chunk iteration, the fit runner, and posterior
//! diagnostics.

pub mod chunk;
pub mod diagnostics;
pub mod runner;

pub use chunk::{chunk_bounds, partition_chunk, Chunk, FeatureEntry};
pub use diagnostics::{split_rhat, Diagnostics, ElpdEstimate, RHAT_THRESHOLD};
pub use runner::{list_artifacts, ChunkReport, FitOutcome, FitRunner};
