use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiveOpsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Fetch failed: {0}")]
    SourceFetch(String),

    #[error("Model provider error: primary failed ({primary}); fallback failed ({fallback})")]
    ModelProvider { primary: String, fallback: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LiveOpsError>;
