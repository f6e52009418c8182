use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};
use ulasan_common::{Result, UlasanError};

use crate::types::RougeScores;

/// Scores one prediction against one reference
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Return precision/recall/F1 for each requested ROUGE variant
    async fn score(&self, prediction: &str, reference: &str, rouge_types: &[&str]) -> Result<RougeScores>;
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    prediction: &'a str,
    reference: &'a str,
    rouge_types: &'a [&'a str],
}

/// Client for an external ROUGE scoring service
///
/// `POST {base_url}/score` with `{prediction, reference, rouge_types}` must
/// answer with `{"rouge1": {"precision": .., "recall": .., "fmeasure": ..}, ..}`.
#[derive(Debug, Clone)]
pub struct HttpScorer {
    base_url: String,
    client: Client,
}

impl HttpScorer {
    /// Create new scorer client without contacting the service
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        info!("Scorer client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Create a client and check that the scoring service answers
    pub async fn connect(base_url: impl Into<String>) -> Result<Self> {
        let scorer = Self::new(base_url)?;
        let url = format!("{}/health", scorer.base_url);

        let healthy = scorer
            .client
            .get(&url)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false);

        if !healthy {
            return Err(UlasanError::dependency_unavailable(format!(
                "ROUGE scoring service at {} is not available",
                scorer.base_url
            )));
        }

        Ok(scorer)
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, prediction: &str, reference: &str, rouge_types: &[&str]) -> Result<RougeScores> {
        let url = format!("{}/score", self.base_url);
        let request = ScoreRequest {
            prediction,
            reference,
            rouge_types,
        };

        debug!(
            "Scoring prediction ({} chars) against reference ({} chars)",
            prediction.len(),
            reference.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| UlasanError::network(format!("Failed to send score request: {}", e)))?
            .error_for_status()
            .map_err(|e| UlasanError::scoring(format!("Scoring API error: {}", e)))?;

        let scores: RougeScores = response
            .json()
            .await
            .map_err(|e| UlasanError::scoring(format!("Failed to parse score response: {}", e)))?;

        check_complete(&scores, rouge_types)?;
        Ok(scores)
    }
}

/// Every requested variant must be present in a scorer response
pub(crate) fn check_complete(scores: &RougeScores, rouge_types: &[&str]) -> Result<()> {
    match rouge_types.iter().find(|t| !scores.contains_key(**t)) {
        Some(missing) => Err(UlasanError::scoring(format!(
            "Scorer response is missing '{}'",
            missing
        ))),
        None => Ok(()),
    }
}
