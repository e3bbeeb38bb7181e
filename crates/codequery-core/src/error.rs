//! Error types for codequery

use thiserror::Error;

/// Result type alias using CodeQueryError
pub type Result<T> = std::result::Result<T, CodeQueryError>;

/// Error type alias for convenience
pub type Error = CodeQueryError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const ENGINE_UNAVAILABLE: i32 = 4;
}

/// Main error type for codequery
#[derive(Debug, Error)]
pub enum CodeQueryError {
    #[error("Index build error: {0}")]
    IndexBuild(String),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Reasoning engine unavailable: {0}")]
    ReasoningUnavailable(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CodeQueryError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileRead { .. } => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            Self::ReasoningUnavailable(_) => exit_codes::ENGINE_UNAVAILABLE,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
