use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt record at {path}:{line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid session id: {0:?}")]
    InvalidSession(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Marker not found: {0}")]
    MarkerNotFound(String),
}

impl HandoffError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HandoffError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HandoffError>;
