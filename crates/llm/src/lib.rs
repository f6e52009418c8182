//! Ulasan LLM integration
//!
//! Prompt templates for instruction-tuned models, the generation capability
//! trait and an Ollama backend for it.

mod client;
mod llm_trait;
mod prompts;
mod summarize;
mod types;

pub use client::OllamaClient;
pub use llm_trait::LlmClient;
pub use prompts::{
    create_aspect_based_prompt, create_multi_review_prompt, create_summarization_prompt,
    ModelType, PromptTemplate, DEFAULT_MODEL_TYPE,
};
pub use summarize::ReviewSummarizer;
pub use types::{GenerateOptions, GenerateRequest, GenerateResponse, OllamaOptions};
