//! Codequery Core Library
//!
//! Agentic question answering over a codebase snapshot.
//!
//! # Features
//! - Iterative LLM-driven file selection with confidence-gated termination
//! - Session-scoped file memory cache with head/tail truncation
//! - Bounded conversation history for follow-up context
//! - Snapshot acquisition from local folders and GitHub archives

pub mod agent;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod index;
pub mod reader;
pub mod reasoning;
pub mod session;
pub mod snapshot;

pub use agent::{QueryAborted, QueryOutcome, SearchController};
pub use cache::{CacheEntry, FileMemoryCache, TruncationPolicy};
pub use config::{Config, EngineConfig, Limits};
pub use error::{CodeQueryError, Error, Result};
pub use history::{ConversationHistory, HistoryEntry};
pub use index::{FileIndex, FileRecord};
pub use reader::{FileReader, FsReader};
pub use reasoning::{
    ChatClient, ChatMessage, Confidence, ConfidenceReport, Evidence, FileSelection, HttpReasoner,
    MetricsSnapshot, ModelRole, OllamaClient, QueryRoute, ReasoningEngine,
};
pub use session::Session;
pub use snapshot::{SnapshotFetcher, SnapshotSource};

/// Default config/data directory name
pub const CONFIG_DIR_NAME: &str = "codequery";
