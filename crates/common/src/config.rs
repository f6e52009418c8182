use crate::error::UlasanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ulasan application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ollama API base URL
    pub ollama_base_url: String,

    /// LLM summarization model name
    pub llm_model: String,

    /// Prompt template key (mistral, llama, generic, indonesian)
    pub model_type: String,

    /// External ROUGE scoring service URL
    pub scorer_url: String,

    /// Maximum tokens to generate per summary
    pub max_new_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Prompts sent per generation batch
    pub batch_size: usize,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            llm_model: "mistral:instruct".to_string(),
            model_type: "mistral".to_string(),
            scorer_url: "http://localhost:8008".to_string(),
            max_new_tokens: 128,
            temperature: 0.7,
            batch_size: 4,
            log_dir: PathBuf::from("./logs"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, UlasanError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let config = Self {
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            model_type: std::env::var("MODEL_TYPE").unwrap_or(defaults.model_type),
            scorer_url: std::env::var("SCORER_URL").unwrap_or(defaults.scorer_url),
            max_new_tokens: Self::get_env_parsed("MAX_NEW_TOKENS")?
                .unwrap_or(defaults.max_new_tokens),
            temperature: Self::get_env_parsed("TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            batch_size: Self::get_env_parsed("BATCH_SIZE")?
                .unwrap_or(defaults.batch_size),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Parse a numeric environment variable, rejecting malformed values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, UlasanError> {
        match std::env::var(key) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| UlasanError::config(format!("{} has an invalid value: {}", key, raw))),
            Err(_) => Ok(None),
        }
    }

    /// Get log file path
    pub fn get_log_path(&self, filename: &str) -> PathBuf {
        self.log_dir.join(filename)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), UlasanError> {
        for (name, url) in [
            ("Ollama base URL", &self.ollama_base_url),
            ("Scorer URL", &self.scorer_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(UlasanError::config(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        if self.llm_model.is_empty() {
            return Err(UlasanError::config("LLM model name cannot be empty"));
        }

        if self.batch_size == 0 {
            return Err(UlasanError::config("Batch size cannot be 0"));
        }

        // Ollama takes num_predict as a signed 32-bit integer
        if i32::try_from(self.max_new_tokens).is_err() {
            return Err(UlasanError::config(format!(
                "Max new tokens must be at most {}, got {}",
                i32::MAX,
                self.max_new_tokens
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(UlasanError::config(format!(
                "Temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model_type, "mistral");
        assert_eq!(config.max_new_tokens, 128);
        assert_eq!(config.batch_size, 4);
    }

    #[test]
    fn test_log_path() {
        let config = AppConfig::default();
        assert_eq!(
            config.get_log_path("ulasan.log"),
            PathBuf::from("./logs/ulasan.log")
        );
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = AppConfig::default();
        invalid_config.batch_size = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.scorer_url = "localhost:8008".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.temperature = 3.5;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_validate_max_new_tokens_fits_i32() {
        let mut config = AppConfig::default();
        config.max_new_tokens = i32::MAX as u32;
        assert!(config.validate().is_ok());

        config.max_new_tokens = i32::MAX as u32 + 1;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, UlasanError::Config(_)));
    }
}
