//! HTTP-backed reasoning engine
//!
//! Glues the prompt builders, the chat client and the response parsers
//! behind [`ReasoningEngine`]. Helper calls run on the smaller model;
//! answer generation runs on the chat model with conversation history
//! replayed as real chat turns.

use super::client::{ChatClient, ChatMessage, ModelRole};
use super::parse::{parse_classification, parse_confidence, parse_selection};
use super::{prompts, ConfidenceReport, Evidence, FileSelection, QueryRoute, ReasoningEngine};
use crate::config::Limits;
use crate::error::Result;
use crate::history::ConversationHistory;
use crate::index::FileIndex;
use async_trait::async_trait;
use std::sync::Arc;

/// Production reasoning engine over a chat service
pub struct HttpReasoner {
    client: Arc<dyn ChatClient>,
    limits: Limits,
}

impl HttpReasoner {
    pub fn new(client: Arc<dyn ChatClient>, limits: Limits) -> Self {
        Self { client, limits }
    }

    fn with_history(history: &ConversationHistory, prompt: String) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 1);
        for entry in history.entries() {
            messages.push(ChatMessage::user(entry.query.clone()));
            messages.push(ChatMessage::assistant(entry.answer.clone()));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }
}

#[async_trait]
impl ReasoningEngine for HttpReasoner {
    async fn classify(
        &self,
        query: &str,
        cached_paths: &[String],
        history: &ConversationHistory,
    ) -> Result<QueryRoute> {
        let prompt = prompts::classification_prompt(query, cached_paths);
        let response = self
            .client
            .chat(Self::with_history(history, prompt), ModelRole::Helper)
            .await?;
        Ok(parse_classification(&response))
    }

    async fn select_files(
        &self,
        query: &str,
        index: &FileIndex,
        already_analyzed: &[String],
        cached_paths: &[String],
        suggested_term: Option<&str>,
    ) -> Result<FileSelection> {
        let overview = index.overview(self.limits.overview_limit);
        let prompt = prompts::selection_prompt(
            query,
            &overview,
            already_analyzed,
            cached_paths,
            suggested_term,
            self.limits.files_per_iteration,
        );
        let response = self
            .client
            .chat(vec![ChatMessage::user(prompt)], ModelRole::Helper)
            .await?;

        let known: Vec<&str> = index.records().iter().map(|r| r.path.as_str()).collect();
        Ok(parse_selection(
            &response,
            &known,
            self.limits.files_per_iteration,
        ))
    }

    async fn assess_confidence(
        &self,
        query: &str,
        evidence: &[Evidence<'_>],
        history: &ConversationHistory,
    ) -> Result<ConfidenceReport> {
        let prompt = prompts::confidence_prompt(query, evidence);
        let response = self
            .client
            .chat(Self::with_history(history, prompt), ModelRole::Helper)
            .await?;
        Ok(parse_confidence(&response))
    }

    async fn generate_answer(
        &self,
        query: &str,
        evidence: &[Evidence<'_>],
        history: &ConversationHistory,
    ) -> Result<String> {
        let prompt = if evidence.is_empty() {
            prompts::direct_prompt(query)
        } else {
            prompts::answer_prompt(query, evidence)
        };
        self.client
            .chat(Self::with_history(history, prompt), ModelRole::Chat)
            .await
    }
}
