//! HTTP client for the chat service backing the reasoning engine
//!
//! Speaks the Ollama `/api/chat` wire format. Two model roles are
//! configured: a larger chat model for answer generation and a smaller
//! helper model for classification, selection and assessment.

use crate::config::EngineConfig;
use crate::error::{CodeQueryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which configured model a call runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Answer generation
    Chat,
    /// Classification, selection, assessment
    Helper,
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for chat completion backends
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run a chat completion on the given model role
    async fn chat(&self, messages: Vec<ChatMessage>, role: ModelRole) -> Result<String>;
}

/// Call counters for monitoring
#[derive(Debug, Default)]
pub struct ChatMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of chat metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub avg_latency_ms: f64,
}

/// Ollama-compatible chat client
pub struct OllamaClient {
    http_client: reqwest::Client,
    config: EngineConfig,
    metrics: Arc<ChatMetrics>,
}

impl OllamaClient {
    /// Create a new client from configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CodeQueryError::ReasoningUnavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            metrics: Arc::new(ChatMetrics::default()),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    /// Get current call metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    fn model_for(&self, role: ModelRole) -> (&str, u32) {
        match role {
            ModelRole::Chat => (&self.config.chat_model, self.config.chat_ctx),
            ModelRole::Helper => (&self.config.helper_model, self.config.helper_ctx),
        }
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, messages: Vec<ChatMessage>, role: ModelRole) -> Result<String> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        #[derive(Serialize)]
        struct ChatOptions {
            num_ctx: u32,
        }

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            stream: bool,
            options: ChatOptions,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        let (model, num_ctx) = self.model_for(role);
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: ChatOptions { num_ctx },
        };

        let url = format!("{}/api/chat", self.config.url);
        let mut req = self.http_client.post(&url).json(&request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
            if e.is_timeout() {
                CodeQueryError::ReasoningUnavailable("request timed out".to_string())
            } else if e.is_connect() {
                CodeQueryError::ReasoningUnavailable(format!(
                    "cannot connect to {}: {}",
                    self.config.url, e
                ))
            } else {
                CodeQueryError::ReasoningUnavailable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CodeQueryError::ReasoningUnavailable(format!(
                "chat service error (HTTP {}): {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
            CodeQueryError::ReasoningUnavailable(format!("malformed chat response: {}", e))
        })?;

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        Ok(chat_response.message.content.trim().to_string())
    }
}
