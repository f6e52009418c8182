/// Ulasan error types
#[derive(Debug, thiserror::Error)]
pub enum UlasanError {
    /// Requested prompt template key is not registered
    #[error("Unknown model type: {given}. Choose from {valid:?}")]
    UnknownModelType {
        given: String,
        valid: Vec<&'static str>,
    },

    /// Prediction and reference batches differ in length
    #[error("Mismatch: {predictions} predictions vs {references} references")]
    CountMismatch {
        predictions: usize,
        references: usize,
    },

    /// Model runtime or backend service is not available
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// LLM related error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Scoring backend error
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Dataset format cannot be handled
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UlasanError {
    /// Create unknown model type error
    pub fn unknown_model_type<S: Into<String>>(given: S, valid: Vec<&'static str>) -> Self {
        Self::UnknownModelType {
            given: given.into(),
            valid,
        }
    }

    /// Create count mismatch error
    pub fn count_mismatch(predictions: usize, references: usize) -> Self {
        Self::CountMismatch {
            predictions,
            references,
        }
    }

    /// Create dependency unavailable error
    pub fn dependency_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::DependencyUnavailable(msg.into())
    }

    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create scoring error
    pub fn scoring<S: Into<String>>(msg: S) -> Self {
        Self::Scoring(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create file system error
    pub fn file_system<S: Into<String>>(msg: S) -> Self {
        Self::FileSystem(msg.into())
    }

    /// Create unsupported format error
    pub fn unsupported_format<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }
}
