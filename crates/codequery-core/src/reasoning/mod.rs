//! Reasoning engine integration
//!
//! The controller drives four distinct reasoning calls — query
//! classification, file selection, confidence assessment and answer
//! generation — behind the [`ReasoningEngine`] trait. Engine output is
//! untrusted: the HTTP implementation parses every response into the strict
//! types below, falling back to conservative defaults on malformed output.

mod client;
mod http;
mod parse;
mod prompts;

pub use client::{ChatClient, ChatMessage, ChatMetrics, MetricsSnapshot, ModelRole, OllamaClient};
pub use http::HttpReasoner;

use crate::error::Result;
use crate::history::ConversationHistory;
use crate::index::FileIndex;
use async_trait::async_trait;

/// How a query should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRoute {
    /// Run the iterative file-selection loop
    SearchCode,
    /// Answer from files already in the memory cache
    UseMemory,
    /// Answer from general knowledge, no file access
    Direct,
}

/// Engine judgment on whether gathered evidence suffices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// Confidence level plus an optional refinement hint
#[derive(Debug, Clone)]
pub struct ConfidenceReport {
    pub level: Confidence,
    /// Search term to carry into the next selection round
    pub suggested_term: Option<String>,
}

/// Files the engine picked for the next iteration
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    /// Candidate paths, already clamped at the adapter boundary
    pub paths: Vec<String>,
    /// Engine believes already-analyzed files answer the question
    pub sufficient: bool,
}

/// One analyzed file presented as evidence
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

/// Contract for the external reasoning engine.
///
/// Every call is blocking and network-bound; any of them may fail with
/// [`crate::CodeQueryError::ReasoningUnavailable`]. No retry happens below
/// this boundary.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Classify a query given the current cache digest
    async fn classify(
        &self,
        query: &str,
        cached_paths: &[String],
        history: &ConversationHistory,
    ) -> Result<QueryRoute>;

    /// Pick up to the configured number of new files to inspect
    async fn select_files(
        &self,
        query: &str,
        index: &FileIndex,
        already_analyzed: &[String],
        cached_paths: &[String],
        suggested_term: Option<&str>,
    ) -> Result<FileSelection>;

    /// Judge whether the accumulated evidence answers the query
    async fn assess_confidence(
        &self,
        query: &str,
        evidence: &[Evidence<'_>],
        history: &ConversationHistory,
    ) -> Result<ConfidenceReport>;

    /// Produce the final answer. With empty evidence the answer comes from
    /// general knowledge and history alone.
    async fn generate_answer(
        &self,
        query: &str,
        evidence: &[Evidence<'_>],
        history: &ConversationHistory,
    ) -> Result<String>;
}
