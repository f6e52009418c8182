use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ROUGE variants scored when the caller does not choose
pub const DEFAULT_ROUGE_TYPES: &[&str] = &["rouge1", "rouge2", "rougeL"];

/// Precision/recall/F1 for one ROUGE variant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,

    /// Population standard deviation of F1 across a batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

impl MetricScore {
    pub fn new(precision: f64, recall: f64, fmeasure: f64) -> Self {
        Self {
            precision,
            recall,
            fmeasure,
            std: None,
        }
    }
}

/// Scores keyed by ROUGE variant name (e.g. `rouge1`, `rougeL`)
pub type RougeScores = BTreeMap<String, MetricScore>;
