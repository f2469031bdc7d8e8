//! Core data structures: count matrix, sample metadata, formula, design matrix.

pub mod count_matrix;
pub mod design_matrix;
pub mod formula;
pub mod metadata;

pub use count_matrix::CountMatrix;
pub use design_matrix::DesignMatrix;
pub use formula::{Formula, Term};
pub use metadata::{Metadata, Variable};
