//! Error types for configuration editing and workflow resolution.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{0}")]
    Validation(String),

    #[error("No updates provided")]
    NoUpdates,

    #[error("Invalid configuration in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io { path: path.into(), source }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Unknown workflow type '{name}'")]
    UnknownWorkflow { name: String, available: Vec<&'static str> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
