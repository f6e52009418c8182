use serde::{Deserialize, Serialize};

/// Backend-independent generation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Maximum tokens to generate
    pub max_new_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling parameter
    pub top_p: f32,

    /// Top-k sampling parameter
    pub top_k: u32,

    /// Sample instead of greedy decoding
    pub do_sample: bool,

    /// Prompts sent together per batch
    pub batch_size: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            do_sample: true,
            batch_size: 4,
        }
    }
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g., "mistral:instruct", "llama3.2")
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Send the prompt verbatim, skipping Ollama's own chat template
    pub raw: bool,

    /// Disable streaming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// Ollama sampling options
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct OllamaOptions {
    /// Temperature (0.0 disables sampling)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl From<&GenerateOptions> for OllamaOptions {
    fn from(options: &GenerateOptions) -> Self {
        let num_predict = i32::try_from(options.max_new_tokens).unwrap_or(i32::MAX);

        if !options.do_sample {
            // Greedy decoding
            return Self {
                temperature: Some(0.0),
                top_p: None,
                top_k: Some(1),
                num_predict: Some(num_predict),
            };
        }

        Self {
            temperature: Some(options.temperature),
            top_p: Some(options.top_p),
            top_k: Some(options.top_k),
            num_predict: Some(num_predict),
        }
    }
}

/// Ollama generate response
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Model name
    pub model: String,

    /// Generated text
    pub response: String,

    /// Whether generation is complete
    pub done: bool,
}

/// Ollama `/api/tags` response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelTag {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_predict_saturates() {
        let options = GenerateOptions {
            max_new_tokens: u32::MAX,
            ..Default::default()
        };
        assert_eq!(OllamaOptions::from(&options).num_predict, Some(i32::MAX));
    }

    #[test]
    fn test_sampling_options_mapping() {
        let options = GenerateOptions {
            max_new_tokens: 128,
            ..Default::default()
        };
        let ollama = OllamaOptions::from(&options);
        assert_eq!(ollama.temperature, Some(0.7));
        assert_eq!(ollama.top_k, Some(50));
        assert_eq!(ollama.num_predict, Some(128));
    }

    #[test]
    fn test_greedy_options_mapping() {
        let options = GenerateOptions {
            do_sample: false,
            ..Default::default()
        };
        let ollama = OllamaOptions::from(&options);
        assert_eq!(ollama.temperature, Some(0.0));
        assert_eq!(ollama.top_p, None);
        assert_eq!(ollama.num_predict, Some(256));
    }

    #[test]
    fn test_request_serialization_skips_empty_fields() {
        let request = GenerateRequest {
            model: "mistral".to_string(),
            prompt: "[INST] hi [/INST]".to_string(),
            raw: true,
            stream: Some(false),
            options: Some(OllamaOptions {
                temperature: Some(0.5),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["raw"], true);
        assert_eq!(value["options"]["temperature"], 0.5);
        assert!(value["options"].get("top_p").is_none());
    }
}
