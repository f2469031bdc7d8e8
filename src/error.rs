//! Error types for the chunked-daa library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum DaaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid count value '{value}' at row {row}, column {col}")]
    InvalidCount {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Missing column '{0}' in metadata")]
    MissingColumn(String),

    #[error("Formula parse error: {0}")]
    FormulaParse(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Chunk {chunk} out of range [1, {total}]")]
    InvalidChunk { chunk: usize, total: usize },

    #[error("Sampler failed: {0}")]
    Sampler(String),

    #[error("Artifact name '{0}' does not match F<nnnn>_<feature-id>")]
    MalformedArtifactName(String),

    #[error("Malformed HDI cell '{0}': expected \"(lower, upper)\"")]
    MalformedHdi(String),

    #[error("Covariate '{0}' not present in summary table")]
    MissingCovariate(String),

    #[error("Numerical error: {0}")]
    Numerical(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, DaaError>;
