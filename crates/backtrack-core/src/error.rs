use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktrackError {
    #[error("Backup not found for conversation: {conversation_id}")]
    NotFound { conversation_id: String },

    #[error("Failed to read snapshot {}: {}", .path.display(), .source)]
    ReadSnapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to restore {}: {}", .path.display(), .source)]
    Restore {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete {}: {}", .path.display(), .source)]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read backup directory {}: {}", .path.display(), .message)]
    Catalog { path: PathBuf, message: String },

    #[error("Failed to remove backup directory {}: {}", .path.display(), .source)]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BacktrackError {
    pub fn not_found(conversation_id: impl Into<String>) -> Self {
        Self::NotFound {
            conversation_id: conversation_id.into(),
        }
    }

    pub fn catalog(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Catalog {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BacktrackError>;
