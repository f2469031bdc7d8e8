//! Reduction of posterior artifacts into one wide summary table.

pub mod extract;
pub mod hdi;
pub mod reduce;

pub use extract::{extract_summary, try_extract, CovariateSummary, SummaryRow};
pub use hdi::{format_hdi, hdi, parse_hdi, DEFAULT_HDI_PROB};
pub use reduce::{summarize_inferences, SummarizeOutcome, SummaryTable};
