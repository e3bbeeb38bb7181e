//! Agentic search controller
//!
//! Drives one query through the `CLASSIFYING → SELECTING → LOADING →
//! ASSESSING` loop: asks the reasoning engine which files to inspect, loads
//! them into the session cache, and keeps iterating until the engine is
//! confident, nothing new can be loaded, or the iteration cap is hit. The
//! final answer is generated exactly once from the accumulated evidence.

use crate::cache::FileMemoryCache;
use crate::config::Limits;
use crate::history::ConversationHistory;
use crate::index::FileIndex;
use crate::reader::FileReader;
use crate::reasoning::{Confidence, Evidence, FileSelection, QueryRoute, ReasoningEngine};
use thiserror::Error;

/// Result of one completed query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// How the query was routed
    pub route: QueryRoute,
    pub answer: String,
    /// Every file loaded as evidence for this query, in load order.
    /// Always a subset of the cache's key set.
    pub analyzed_files: Vec<String>,
    /// Selection rounds performed (0 for Direct/UseMemory routes)
    pub iterations: usize,
    /// Last confidence the engine reported, if the loop ran
    pub confidence: Option<Confidence>,
}

/// Query-level failure. The reasoning engine became unavailable mid-query;
/// files cached so far are kept and reported rather than discarded.
#[derive(Debug, Error)]
#[error("could not complete analysis: {reason}")]
pub struct QueryAborted {
    pub reason: String,
    /// Files analyzed before the failure
    pub analyzed_files: Vec<String>,
}

/// Per-iteration bookkeeping, discarded when the loop terminates
#[derive(Debug)]
struct IterationRecord {
    iteration: usize,
    requested: Vec<String>,
    newly_loaded: Vec<String>,
    confidence: Confidence,
    suggested_term: Option<String>,
}

/// One query's pass through the search state machine.
///
/// Holds the session state by reference for the duration of a single query;
/// consumed by [`SearchController::run`]. All engine calls and file loads are
/// sequential — there is no fan-out and no internal retry.
pub struct SearchController<'a> {
    index: &'a FileIndex,
    cache: &'a mut FileMemoryCache,
    history: &'a ConversationHistory,
    reader: &'a dyn FileReader,
    engine: &'a dyn ReasoningEngine,
    limits: &'a Limits,
}

impl<'a> SearchController<'a> {
    pub fn new(
        index: &'a FileIndex,
        cache: &'a mut FileMemoryCache,
        history: &'a ConversationHistory,
        reader: &'a dyn FileReader,
        engine: &'a dyn ReasoningEngine,
        limits: &'a Limits,
    ) -> Self {
        Self {
            index,
            cache,
            history,
            reader,
            engine,
            limits,
        }
    }

    /// Run the query to completion
    pub async fn run(self, query: &str) -> Result<QueryOutcome, QueryAborted> {
        let engine = self.engine;

        let route = engine
            .classify(query, &self.cache.snapshot(), self.history)
            .await
            .map_err(|e| abort(e, &[]))?;

        // UseMemory with nothing loaded degrades to a fresh search
        let route = if route == QueryRoute::UseMemory && self.cache.is_empty() {
            tracing::debug!("no files in memory, falling back to code search");
            QueryRoute::SearchCode
        } else {
            route
        };

        match route {
            QueryRoute::Direct => {
                // No file access on this route
                let answer = engine
                    .generate_answer(query, &[], self.history)
                    .await
                    .map_err(|e| abort(e, &[]))?;
                Ok(QueryOutcome {
                    route,
                    answer,
                    analyzed_files: Vec::new(),
                    iterations: 0,
                    confidence: None,
                })
            }
            QueryRoute::UseMemory => {
                let paths = self.cache.snapshot();
                let evidence = collect_evidence(self.cache, &paths);
                let answer = engine
                    .generate_answer(query, &evidence, self.history)
                    .await
                    .map_err(|e| abort(e, &paths))?;
                Ok(QueryOutcome {
                    route,
                    answer,
                    analyzed_files: paths,
                    iterations: 0,
                    confidence: None,
                })
            }
            QueryRoute::SearchCode => self.search(query).await,
        }
    }

    /// The iteration loop for the SearchCode route
    async fn search(self, query: &str) -> Result<QueryOutcome, QueryAborted> {
        let engine = self.engine;
        let cache = self.cache;

        let mut analyzed: Vec<String> = Vec::new();
        let mut carried_term: Option<String> = None;
        let mut last_confidence: Option<Confidence> = None;
        let mut iterations = 0;

        for iteration in 1..=self.limits.max_iterations {
            iterations = iteration;

            let selection = engine
                .select_files(
                    query,
                    self.index,
                    &analyzed,
                    &cache.snapshot(),
                    carried_term.as_deref(),
                )
                .await
                .map_err(|e| abort(e, &analyzed))?;

            let sufficient = selection.sufficient;
            let requested = validate_selection(
                self.index,
                selection,
                &analyzed,
                self.limits.files_per_iteration,
            );

            if sufficient {
                tracing::debug!(iteration, "engine reports sufficient context, stopping");
                break;
            }

            if requested.is_empty() {
                // Nothing genuinely new. On the first iteration the
                // assessment still runs so the caller sees a confidence
                // level; afterwards the loop just ends.
                if iteration == 1 {
                    let evidence = collect_evidence(cache, &analyzed);
                    let report = engine
                        .assess_confidence(query, &evidence, self.history)
                        .await
                        .map_err(|e| abort(e, &analyzed))?;
                    last_confidence = Some(report.level);
                }
                tracing::debug!(iteration, "no new files to load, stopping");
                break;
            }

            // LOADING: a failed path is skipped, left uncached and does not
            // count as newly loaded; the engine may reselect it later.
            let mut newly_loaded = Vec::new();
            for path in &requested {
                match cache.fetch(path, self.reader) {
                    Ok(_) => newly_loaded.push(path.clone()),
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "failed to load selected file, skipping")
                    }
                }
            }
            analyzed.extend(newly_loaded.iter().cloned());

            // ASSESSING
            let evidence = collect_evidence(cache, &analyzed);
            let report = engine
                .assess_confidence(query, &evidence, self.history)
                .await
                .map_err(|e| abort(e, &analyzed))?;
            last_confidence = Some(report.level);

            let record = IterationRecord {
                iteration,
                requested,
                newly_loaded,
                confidence: report.level,
                suggested_term: report.suggested_term.clone(),
            };
            tracing::debug!(?record, "iteration complete");

            if report.level == Confidence::High {
                break;
            }
            if record.newly_loaded.is_empty() {
                // Every selected path failed to load
                break;
            }
            carried_term = report.suggested_term;
        }

        if analyzed.is_empty() {
            return Ok(QueryOutcome {
                route: QueryRoute::SearchCode,
                answer: "I couldn't identify any relevant files for this query.".to_string(),
                analyzed_files: Vec::new(),
                iterations,
                confidence: last_confidence,
            });
        }

        // Exactly one answer call per query, however many iterations ran
        let evidence = collect_evidence(cache, &analyzed);
        let answer = engine
            .generate_answer(query, &evidence, self.history)
            .await
            .map_err(|e| abort(e, &analyzed))?;

        Ok(QueryOutcome {
            route: QueryRoute::SearchCode,
            answer,
            analyzed_files: analyzed,
            iterations,
            confidence: last_confidence,
        })
    }
}

fn abort(error: crate::CodeQueryError, analyzed: &[String]) -> QueryAborted {
    QueryAborted {
        reason: error.to_string(),
        analyzed_files: analyzed.to_vec(),
    }
}

/// Drop paths not present in the index, paths already analyzed, and
/// duplicates; cap what remains. The engine's output is never trusted as-is.
fn validate_selection(
    index: &FileIndex,
    selection: FileSelection,
    analyzed: &[String],
    cap: usize,
) -> Vec<String> {
    let mut fresh: Vec<String> = Vec::new();
    for path in selection.paths {
        if index.lookup(&path).is_none() {
            tracing::debug!(path = %path, "engine selected unknown path, dropping");
            continue;
        }
        if analyzed.contains(&path) || fresh.contains(&path) {
            continue;
        }
        fresh.push(path);
        if fresh.len() == cap {
            break;
        }
    }
    fresh
}

fn collect_evidence<'c>(cache: &'c FileMemoryCache, paths: &[String]) -> Vec<Evidence<'c>> {
    paths
        .iter()
        .filter_map(|p| cache.get(p))
        .map(|e| Evidence {
            path: &e.path,
            content: &e.content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_selection_drops_unknown_and_analyzed() {
        use crate::reader::FsReader;
        use std::fs;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "a\n").unwrap();
        fs::write(temp.path().join("b.py"), "b\n").unwrap();
        fs::write(temp.path().join("c.py"), "c\n").unwrap();
        let reader = FsReader::new(temp.path());
        let index = FileIndex::build(temp.path(), &reader, 500).unwrap();

        let selection = FileSelection {
            paths: vec![
                "ghost.py".to_string(),
                "a.py".to_string(),
                "b.py".to_string(),
                "b.py".to_string(),
                "c.py".to_string(),
            ],
            sufficient: false,
        };

        let fresh = validate_selection(&index, selection, &["a.py".to_string()], 3);
        assert_eq!(fresh, vec!["b.py", "c.py"]);
    }

    #[test]
    fn test_validate_selection_caps_count() {
        use crate::reader::FsReader;
        use std::fs;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        for name in ["a.py", "b.py", "c.py", "d.py"] {
            fs::write(temp.path().join(name), "x\n").unwrap();
        }
        let reader = FsReader::new(temp.path());
        let index = FileIndex::build(temp.path(), &reader, 500).unwrap();

        let selection = FileSelection {
            paths: ["a.py", "b.py", "c.py", "d.py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sufficient: false,
        };

        let fresh = validate_selection(&index, selection, &[], 3);
        assert_eq!(fresh.len(), 3);
    }
}
