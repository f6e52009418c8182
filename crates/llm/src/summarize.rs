use tracing::{debug, info};
use ulasan_common::Result;

use crate::llm_trait::LlmClient;
use crate::prompts::{create_summarization_prompt, ModelType};
use crate::types::GenerateOptions;

/// Review summarizer: prompt templating plus a generation backend
pub struct ReviewSummarizer<C> {
    client: C,
    model_type: ModelType,
    options: GenerateOptions,
    max_length: Option<usize>,
}

impl<C: LlmClient> ReviewSummarizer<C> {
    /// Create new summarizer
    pub fn new(client: C, model_type: ModelType, options: GenerateOptions) -> Self {
        Self {
            client,
            model_type,
            options,
            max_length: None,
        }
    }

    /// Ask the model to keep summaries under `words` words
    pub fn with_max_length(mut self, words: usize) -> Self {
        self.max_length = Some(words);
        self
    }

    /// Underlying generation backend
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Prompt template family in use
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Build the prompt for one group of reviews
    pub fn prompt_for<S: AsRef<str>>(&self, reviews: &[S]) -> Result<String> {
        create_summarization_prompt(reviews, self.model_type.as_str(), None, self.max_length)
    }

    /// Summarize a group of reviews into one summary
    pub async fn summarize<S: AsRef<str>>(&self, reviews: &[S]) -> Result<String> {
        let prompt = self.prompt_for(reviews)?;
        debug!(
            "Summarizing {} reviews - Prompt length: {} chars",
            reviews.len(),
            prompt.len()
        );
        self.client.generate(&prompt, &self.options).await
    }

    /// Summarize every review on its own, batching generation calls
    pub async fn summarize_each<S: AsRef<str>>(&self, reviews: &[S]) -> Result<Vec<String>> {
        let prompts = reviews
            .iter()
            .map(|review| self.prompt_for(std::slice::from_ref(review)))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Generating {} summaries in batches of {}",
            prompts.len(),
            self.options.batch_size
        );
        self.client.batch_generate(&prompts, &self.options).await
    }
}
