use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Model call failed: {0}")]
    ModelCall(String),

    #[error("Model call failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ContractError>;
