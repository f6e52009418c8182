use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use ulasan_common::{Result, UlasanError};

use crate::llm_trait::LlmClient;
use crate::types::{GenerateOptions, GenerateRequest, GenerateResponse, OllamaOptions, TagsResponse};

const MAX_RETRIES: u32 = 3;

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client without contacting the server
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 minutes for LLM calls
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        info!("Ollama client initialized: {} (model: {})", base_url, model);
        Ok(Self {
            base_url,
            model,
            client,
        })
    }

    /// Create a client and make sure the server is up and the model is pulled
    ///
    /// Fails with `DependencyUnavailable` at load time rather than on the
    /// first generation.
    pub async fn connect(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Self::new(base_url, model)?;

        let installed = client.list_models().await.map_err(|e| {
            UlasanError::dependency_unavailable(format!(
                "Ollama server at {} is not reachable: {}",
                client.base_url, e
            ))
        })?;

        if !installed.iter().any(|name| model_matches(name, &client.model)) {
            return Err(UlasanError::dependency_unavailable(format!(
                "Model '{}' is not available on {} (installed: {})",
                client.model,
                client.base_url,
                installed.join(", ")
            )));
        }

        info!("Model {} is available", client.model);
        Ok(client)
    }

    /// Model name requests are sent with
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of models installed on the server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UlasanError::network(format!("Failed to connect to Ollama: {}", e)))?
            .error_for_status()
            .map_err(|e| UlasanError::network(format!("Ollama API error: {}", e)))?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse model list: {}", e))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn build_request(&self, prompt: &str, options: &GenerateOptions) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            // Prompts are already wrapped in the model's instruction template
            raw: true,
            stream: Some(false),
            options: Some(OllamaOptions::from(options)),
        }
    }

    /// Generate text with custom retry count
    async fn generate_with_retry(&self, request: GenerateRequest, max_retries: u32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let mut attempt = 1;
        loop {
            match self.try_generate(&url, &request).await {
                Ok(response) => {
                    debug!("Received response from Ollama - Length: {}", response.len());
                    return Ok(response);
                }
                Err(e) if attempt < max_retries => {
                    let delay = std::time::Duration::from_secs(2u64.pow(attempt - 1));
                    warn!(
                        "Ollama request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt, max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single attempt to generate text
    async fn try_generate(&self, url: &str, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| UlasanError::network(format!("Failed to send request: {}", e)))?
            .error_for_status()
            .map_err(|e| UlasanError::llm(format!("Ollama API error: {}", e)))?;

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))?;

        let text = result.response.trim();
        if text.is_empty() {
            return Err(UlasanError::llm("Empty response from Ollama"));
        }

        Ok(text.to_string())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let request = self.build_request(prompt, options);
        self.generate_with_retry(request, MAX_RETRIES).await
    }
}

/// Ollama reports untagged pulls as `name:latest`
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || (!wanted.contains(':') && installed.strip_suffix(":latest") == Some(wanted))
}
