use async_trait::async_trait;
use futures::future::try_join_all;
use ulasan_common::Result;

use crate::types::GenerateOptions;

/// Common trait for LLM clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate text from a prompt
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;

    /// Generate text for many prompts, `options.batch_size` at a time
    ///
    /// Prompts within a batch run concurrently; outputs keep the input order.
    async fn batch_generate(&self, prompts: &[String], options: &GenerateOptions) -> Result<Vec<String>> {
        let mut results = Vec::with_capacity(prompts.len());

        for batch in prompts.chunks(options.batch_size.max(1)) {
            let outputs = try_join_all(batch.iter().map(|prompt| self.generate(prompt, options))).await?;
            results.extend(outputs);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ulasan_common::UlasanError;

    /// Echoes prompts back, recording the largest number of in-flight calls
    #[derive(Default)]
    struct EchoClient {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for EchoClient {
        async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if prompt == "boom" {
                return Err(UlasanError::llm("generation failed"));
            }
            Ok(format!("summary of {}", prompt))
        }
    }

    fn prompts(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("p{}", i)).collect()
    }

    #[tokio::test]
    async fn test_batch_generate_keeps_order() {
        let client = EchoClient::default();
        let options = GenerateOptions {
            batch_size: 2,
            ..Default::default()
        };

        let outputs = client.batch_generate(&prompts(5), &options).await.unwrap();
        assert_eq!(
            outputs,
            vec!["summary of p1", "summary of p2", "summary of p3", "summary of p4", "summary of p5"]
        );
        assert!(client.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_batch_generate_zero_batch_size_still_progresses() {
        let client = EchoClient::default();
        let options = GenerateOptions {
            batch_size: 0,
            ..Default::default()
        };

        let outputs = client.batch_generate(&prompts(3), &options).await.unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(client.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_generate_propagates_failure() {
        let client = EchoClient::default();
        let batch = vec!["ok".to_string(), "boom".to_string()];

        let err = client
            .batch_generate(&batch, &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UlasanError::Llm(_)));
    }
}
