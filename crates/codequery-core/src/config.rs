//! Configuration management

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Reasoning engine service configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Search loop and memory limits
    #[serde(default)]
    pub limits: Limits,

    /// Override for the snapshot working directory
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
}

/// Reasoning engine service configuration (Ollama or compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the chat service
    pub url: String,

    /// Model used for answer generation
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Context window for answer generation
    #[serde(default = "default_chat_ctx")]
    pub chat_ctx: u32,

    /// Smaller model used for classification, selection and assessment
    #[serde(default = "default_helper_model")]
    pub helper_model: String,

    /// Context window for helper calls
    #[serde(default = "default_helper_ctx")]
    pub helper_ctx: u32,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("CODEQUERY_ENGINE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            chat_model: default_chat_model(),
            chat_ctx: default_chat_ctx(),
            helper_model: default_helper_model(),
            helper_ctx: default_helper_ctx(),
            api_key: std::env::var("CODEQUERY_ENGINE_API_KEY").ok(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("CODEQUERY_CHAT_MODEL").unwrap_or_else(|_| "llama3.1".to_string())
}

fn default_chat_ctx() -> u32 {
    16000
}

fn default_helper_model() -> String {
    std::env::var("CODEQUERY_HELPER_MODEL").unwrap_or_else(|_| "mistral".to_string())
}

fn default_helper_ctx() -> u32 {
    4096
}

fn default_timeout() -> u64 {
    180
}

/// Limits for the search loop, file memory and history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum selection/load/assess rounds per query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Conversation history length (entries, FIFO)
    #[serde(default = "default_history_length")]
    pub history_length: usize,

    /// New files the engine may select per iteration
    #[serde(default = "default_files_per_iteration")]
    pub files_per_iteration: usize,

    /// Characters of each file read for the index preview
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Files listed in the selection prompt before eliding the rest
    #[serde(default = "default_overview_limit")]
    pub overview_limit: usize,

    /// Cached content above this length is truncated
    #[serde(default = "default_truncate_ceiling")]
    pub truncate_ceiling: usize,

    /// Head segment kept when truncating
    #[serde(default = "default_truncate_head")]
    pub truncate_head: usize,

    /// Tail segment kept when truncating
    #[serde(default = "default_truncate_tail")]
    pub truncate_tail: usize,

    /// Characters of each answer kept in history
    #[serde(default = "default_answer_cap")]
    pub answer_cap: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_length: default_history_length(),
            files_per_iteration: default_files_per_iteration(),
            preview_chars: default_preview_chars(),
            overview_limit: default_overview_limit(),
            truncate_ceiling: default_truncate_ceiling(),
            truncate_head: default_truncate_head(),
            truncate_tail: default_truncate_tail(),
            answer_cap: default_answer_cap(),
        }
    }
}

fn default_max_iterations() -> usize {
    3
}

fn default_history_length() -> usize {
    4
}

fn default_files_per_iteration() -> usize {
    3
}

fn default_preview_chars() -> usize {
    500
}

fn default_overview_limit() -> usize {
    200
}

fn default_truncate_ceiling() -> usize {
    8000
}

fn default_truncate_head() -> usize {
    6000
}

fn default_truncate_tail() -> usize {
    2000
}

fn default_answer_cap() -> usize {
    500
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Directory where fetched snapshots are materialized
    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(crate::CONFIG_DIR_NAME)
                .join("codebase")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_defaults() {
        let limits = Limits::default();
        assert_eq!(limits.max_iterations, 3);
        assert_eq!(limits.history_length, 4);
        assert_eq!(limits.files_per_iteration, 3);
        assert_eq!(limits.truncate_ceiling, 8000);
        assert_eq!(limits.truncate_head, 6000);
        assert_eq!(limits.truncate_tail, 2000);
    }

    #[test]
    fn test_config_roundtrip_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.limits.max_iterations, config.limits.max_iterations);
        assert_eq!(parsed.engine.chat_ctx, config.engine.chat_ctx);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "limits:\n  max_iterations: 5\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.limits.max_iterations, 5);
        assert_eq!(config.limits.history_length, 4);
    }
}
