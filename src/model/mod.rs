//! Model-facing types: fit configuration, the opaque sampler capability,
//! posterior draws and their on-disk artifact form.

pub mod config;
pub mod posterior;
pub mod sampler;
pub mod synthetic;

pub use config::FitConfig;
pub use posterior::{artifact_file_name, parse_artifact_name, Posterior, ARTIFACT_EXT};
pub use sampler::{FitInputs, Sampler};
pub use synthetic::SyntheticSampler;
