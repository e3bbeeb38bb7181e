//! Bounded conversation history
//!
//! A strict FIFO of the most recent query/answer exchanges, rendered into
//! reasoning-engine prompts for follow-up context. Entries are immutable
//! once appended; only the oldest is ever evicted.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// One completed query/answer exchange
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Monotonic order index within the session
    pub seq: u64,
    pub query: String,
    /// Answer capped at the configured char limit
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Bounded FIFO log of prior exchanges
pub struct ConversationHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    answer_cap: usize,
    next_seq: u64,
}

impl ConversationHistory {
    /// Create a history bounded at `capacity` entries, storing at most
    /// `answer_cap` chars of each answer
    pub fn new(capacity: usize, answer_cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            answer_cap,
            next_seq: 0,
        }
    }

    /// Append an exchange, evicting the oldest entry past capacity
    pub fn append(&mut self, query: impl Into<String>, answer: &str) {
        let answer: String = answer.chars().take(self.answer_cap).collect();
        self.entries.push_back(HistoryEntry {
            seq: self.next_seq,
            query: query.into(),
            answer,
            asked_at: Utc::now(),
        });
        self.next_seq += 1;

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Entries oldest-first, for prompt rendering
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Empty the log
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
