// Error types for citewatch
// Author: kelexine (https://github.com/kelexine)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Direct fetch and every proxy failed. Carries the last error seen.
    #[error("All {attempts} fetch attempts failed, last error: {last_error}")]
    TransportFailure { attempts: usize, last_error: String },

    #[error("Upstream returned HTTP {0}")]
    UpstreamStatus(u16),

    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Refresh cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CiteError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CiteError::TransportFailure { .. }
                | CiteError::UpstreamStatus(_)
                | CiteError::BodyTooLarge { .. }
                | CiteError::Http(_)
        )
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, CiteError::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, CiteError>;
