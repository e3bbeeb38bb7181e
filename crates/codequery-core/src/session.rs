//! Query session over one codebase snapshot
//!
//! A [`Session`] owns the file index, memory cache, conversation history and
//! reasoning engine for the lifetime of an interactive session. Queries run
//! one at a time through `&mut self`, which is the single-writer discipline
//! the cache relies on; wrap the session in a mutex if the embedding
//! application overlaps queries.

use crate::agent::{QueryAborted, QueryOutcome, SearchController};
use crate::cache::{FileMemoryCache, TruncationPolicy};
use crate::config::{Config, Limits};
use crate::error::Result;
use crate::history::ConversationHistory;
use crate::index::FileIndex;
use crate::reader::{FileReader, FsReader};
use crate::reasoning::ReasoningEngine;
use std::path::Path;
use std::sync::Arc;

pub struct Session {
    limits: Limits,
    index: FileIndex,
    cache: FileMemoryCache,
    history: ConversationHistory,
    reader: Box<dyn FileReader>,
    engine: Arc<dyn ReasoningEngine>,
}

impl Session {
    /// Index the snapshot under `root` and open a session over it
    pub fn open(root: &Path, config: &Config, engine: Arc<dyn ReasoningEngine>) -> Result<Self> {
        let reader = FsReader::new(root);
        let index = FileIndex::build(root, &reader, config.limits.preview_chars)?;
        Ok(Self::from_parts(
            index,
            Box::new(reader),
            engine,
            config.limits.clone(),
        ))
    }

    /// Assemble a session from pre-built parts (tests, custom readers)
    pub fn from_parts(
        index: FileIndex,
        reader: Box<dyn FileReader>,
        engine: Arc<dyn ReasoningEngine>,
        limits: Limits,
    ) -> Self {
        let cache = FileMemoryCache::new(TruncationPolicy::from_limits(&limits));
        let history = ConversationHistory::new(limits.history_length, limits.answer_cap);
        Self {
            limits,
            index,
            cache,
            history,
            reader,
            engine,
        }
    }

    /// Run one query through the search controller.
    ///
    /// On success the exchange is appended to the conversation history. On
    /// abort the history is left untouched, but files cached before the
    /// failure remain available to later queries.
    pub async fn ask(&mut self, query: &str) -> std::result::Result<QueryOutcome, QueryAborted> {
        let controller = SearchController::new(
            &self.index,
            &mut self.cache,
            &self.history,
            self.reader.as_ref(),
            self.engine.as_ref(),
            &self.limits,
        );
        let outcome = controller.run(query).await?;
        self.history.append(query, &outcome.answer);
        Ok(outcome)
    }

    /// The session's immutable file index
    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    /// Paths currently held in the memory cache, in load order
    pub fn cached_paths(&self) -> Vec<String> {
        self.cache.snapshot()
    }

    /// Explicitly clear the file memory cache
    pub fn wipe_cache(&mut self) {
        self.cache.wipe();
    }

    /// The conversation history
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Empty the conversation history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Search loop and memory limits in effect
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}
