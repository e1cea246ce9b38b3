use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgusError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Scan error: {0}")]
    ScanError(String),

    #[error("Resource error: {0}")]
    ResourceError(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type ArgusResult<T> = Result<T, ArgusError>;

impl From<reqwest::header::InvalidHeaderValue> for ArgusError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        ArgusError::InvalidHeaderValue(err.to_string())
    }
}
