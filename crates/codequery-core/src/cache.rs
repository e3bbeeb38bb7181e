//! Session-scoped file memory cache
//!
//! Holds the (possibly truncated) content of every file loaded during a
//! session. Entries are only added, never silently replaced; the cache is
//! cleared as a whole by an explicit [`FileMemoryCache::wipe`].

use crate::config::Limits;
use crate::error::Result;
use crate::reader::FileReader;
use std::collections::HashMap;

/// Cached content of one file
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub path: String,
    pub content: String,
    pub truncated: bool,
}

/// Head/tail truncation applied to oversized files before caching
#[derive(Debug, Clone, Copy)]
pub struct TruncationPolicy {
    /// Content above this many chars is truncated
    pub ceiling: usize,
    /// Chars kept from the start of the file
    pub head: usize,
    /// Chars kept from the end of the file
    pub tail: usize,
}

impl TruncationPolicy {
    pub fn from_limits(limits: &Limits) -> Self {
        Self {
            ceiling: limits.truncate_ceiling,
            head: limits.truncate_head,
            tail: limits.truncate_tail,
        }
    }

    /// Apply the policy. Returns the stored content and whether it was cut.
    ///
    /// Keeps the file start (imports, declarations) and end (exports,
    /// summaries), joined by an explicit elision marker. Operates on chars so
    /// multi-byte content never splits mid-codepoint.
    pub fn apply(&self, content: &str) -> (String, bool) {
        let total = content.chars().count();
        if total <= self.ceiling {
            return (content.to_string(), false);
        }

        let head: String = content.chars().take(self.head).collect();
        let tail: String = content.chars().skip(total - self.tail).collect();
        let elided = total.saturating_sub(self.head + self.tail);

        (
            format!("{}\n\n... (truncated {} chars) ...\n\n{}", head, elided, tail),
            true,
        )
    }
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self::from_limits(&Limits::default())
    }
}

/// In-memory cache of loaded file contents, keyed by path
///
/// Grows monotonically within a session; insertion order is preserved for
/// display. Not internally synchronized — one query drives it at a time.
pub struct FileMemoryCache {
    entries: HashMap<String, CacheEntry>,
    order: Vec<String>,
    policy: TruncationPolicy,
}

impl FileMemoryCache {
    /// Create an empty cache with the given truncation policy
    pub fn new(policy: TruncationPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            policy,
        }
    }

    /// Return the cached entry for `path`, loading it on first access.
    ///
    /// A hit performs no I/O. A miss reads the full file through `reader`,
    /// applies the truncation policy and stores the result. Failed reads are
    /// not cached, so a later retry can succeed once the underlying condition
    /// is fixed.
    pub fn fetch(&mut self, path: &str, reader: &dyn FileReader) -> Result<&CacheEntry> {
        if !self.entries.contains_key(path) {
            let raw = reader.read_full(path)?;
            let (content, truncated) = self.policy.apply(&raw);
            tracing::debug!(path, truncated, "loaded file into memory cache");
            self.entries.insert(
                path.to_string(),
                CacheEntry {
                    path: path.to_string(),
                    content,
                    truncated,
                },
            );
            self.order.push(path.to_string());
        }
        Ok(&self.entries[path])
    }

    /// Look up an entry without triggering a load
    pub fn get(&self, path: &str) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Whether `path` is already cached
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Cached paths in insertion order, without materializing content
    pub fn snapshot(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.order.iter().map(|p| &self.entries[p])
    }

    /// Clear all entries. Irreversible; only invoked as an explicit action.
    pub fn wipe(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        tracing::info!(count, "file memory cache wiped");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FileMemoryCache {
    fn default() -> Self {
        Self::new(TruncationPolicy::default())
    }
}
