//! Batch ROUGE evaluation on top of a [`Scorer`]

use serde::Serialize;
use tracing::{debug, info};
use ulasan_common::{Result, UlasanError};

use crate::scorer::Scorer;
use crate::types::{MetricScore, RougeScores, DEFAULT_ROUGE_TYPES};

/// Outcome of [`evaluate_predictions`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Evaluation {
    /// Mean scores with the F1 standard deviation filled in
    Aggregated(RougeScores),
    /// One score map per prediction/reference pair
    PerExample(Vec<RougeScores>),
}

async fn score_pairs<S: AsRef<str>>(
    scorer: &dyn Scorer,
    predictions: &[S],
    references: &[S],
    rouge_types: &[&str],
) -> Result<Vec<RougeScores>> {
    if predictions.len() != references.len() {
        return Err(UlasanError::count_mismatch(predictions.len(), references.len()));
    }
    if predictions.is_empty() {
        return Err(UlasanError::invalid_input("No predictions to score"));
    }

    let mut all_scores = Vec::with_capacity(predictions.len());
    for (i, (prediction, reference)) in predictions.iter().zip(references).enumerate() {
        debug!("Scoring pair {}/{}", i + 1, predictions.len());
        all_scores.push(
            scorer
                .score(prediction.as_ref(), reference.as_ref(), rouge_types)
                .await?,
        );
    }

    Ok(all_scores)
}

/// Average per-example scores for each ROUGE variant
///
/// With `with_std` the population standard deviation of F1 is attached.
/// Variants missing from an example are skipped for that example.
pub fn aggregate_scores(all_scores: &[RougeScores], rouge_types: &[&str], with_std: bool) -> RougeScores {
    let mut aggregated = RougeScores::new();

    for rouge_type in rouge_types {
        let scores: Vec<&MetricScore> = all_scores
            .iter()
            .filter_map(|s| s.get(*rouge_type))
            .collect();
        if scores.is_empty() {
            continue;
        }

        let n = scores.len() as f64;
        let mean = |f: fn(&MetricScore) -> f64| scores.iter().map(|&s| f(s)).sum::<f64>() / n;

        let fmeasure = mean(|s| s.fmeasure);
        let std = with_std.then(|| {
            let variance = scores
                .iter()
                .map(|s| (s.fmeasure - fmeasure).powi(2))
                .sum::<f64>()
                / n;
            variance.sqrt()
        });

        aggregated.insert(
            rouge_type.to_string(),
            MetricScore {
                precision: mean(|s| s.precision),
                recall: mean(|s| s.recall),
                fmeasure,
                std,
            },
        );
    }

    aggregated
}

/// Score predictions against references
///
/// A single pair returns the scorer's numbers as-is; several pairs return
/// their mean. Fails with `CountMismatch` before any scoring if the two
/// lists differ in length.
pub async fn calculate_rouge<S: AsRef<str>>(
    scorer: &dyn Scorer,
    predictions: &[S],
    references: &[S],
    rouge_types: Option<&[&str]>,
) -> Result<RougeScores> {
    let rouge_types = rouge_types.unwrap_or(DEFAULT_ROUGE_TYPES);
    let mut all_scores = score_pairs(scorer, predictions, references, rouge_types).await?;

    if all_scores.len() == 1 {
        let mut single = all_scores.remove(0);
        single.retain(|name, _| rouge_types.contains(&name.as_str()));
        return Ok(single);
    }

    Ok(aggregate_scores(&all_scores, rouge_types, false))
}

/// Evaluate a batch of predictions, aggregated or per example
pub async fn evaluate_predictions<S: AsRef<str>>(
    scorer: &dyn Scorer,
    predictions: &[S],
    references: &[S],
    rouge_types: Option<&[&str]>,
    aggregate: bool,
) -> Result<Evaluation> {
    let rouge_types = rouge_types.unwrap_or(DEFAULT_ROUGE_TYPES);
    let all_scores = score_pairs(scorer, predictions, references, rouge_types).await?;
    info!("Scored {} prediction/reference pairs", all_scores.len());

    if !aggregate {
        return Ok(Evaluation::PerExample(all_scores));
    }

    Ok(Evaluation::Aggregated(aggregate_scores(&all_scores, rouge_types, true)))
}

/// Render scores as an indented text block
///
/// ```text
/// ROUGE1:
///   precision: 0.5000
///   recall: 0.2500
///   fmeasure: 0.3333
/// ```
pub fn format_rouge_scores(scores: &RougeScores, decimals: usize) -> String {
    let mut lines = Vec::new();

    for (rouge_type, metric) in scores {
        lines.push(format!("{}:", rouge_type.to_uppercase()));
        lines.push(format!("  precision: {:.*}", decimals, metric.precision));
        lines.push(format!("  recall: {:.*}", decimals, metric.recall));
        lines.push(format!("  fmeasure: {:.*}", decimals, metric.fmeasure));
        if let Some(std) = metric.std {
            lines.push(format!("  std: {:.*}", decimals, std));
        }
    }

    lines.join("\n")
}
