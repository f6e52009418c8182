//! Ulasan evaluation
//!
//! ROUGE scoring is delegated to an external service through the [`Scorer`]
//! trait; this crate batches the calls, averages the results and formats them.

mod rouge;
mod scorer;
mod types;

pub use rouge::{aggregate_scores, calculate_rouge, evaluate_predictions, format_rouge_scores, Evaluation};
pub use scorer::{HttpScorer, Scorer};
pub use types::{MetricScore, RougeScores, DEFAULT_ROUGE_TYPES};
