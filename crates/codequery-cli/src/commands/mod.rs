//! Command implementations

pub mod ask;
pub mod fetch;
pub mod ls;
pub mod repl;

use anyhow::Result;
use codequery_core::{
    Config, HttpReasoner, OllamaClient, ReasoningEngine, Session,
};
use std::sync::Arc;

/// Open a session over the fetched snapshot with the configured engine
pub fn open_session(config: &Config, max_iterations: Option<usize>) -> Result<Session> {
    let mut config = config.clone();
    if let Some(n) = max_iterations {
        config.limits.max_iterations = n;
    }

    let client = OllamaClient::new(config.engine.clone())?;
    let engine: Arc<dyn ReasoningEngine> =
        Arc::new(HttpReasoner::new(Arc::new(client), config.limits.clone()));

    let snapshot_dir = config.snapshot_dir();
    let session = Session::open(&snapshot_dir, &config, engine)?;
    Ok(session)
}
