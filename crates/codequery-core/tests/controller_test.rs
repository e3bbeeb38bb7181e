//! Integration tests for the agentic search controller and session

use async_trait::async_trait;
use codequery_core::{
    CodeQueryError, Confidence, ConfidenceReport, ConversationHistory, Evidence, FileIndex,
    FileMemoryCache, FileReader, FileSelection, Limits, QueryRoute, ReasoningEngine, Result,
    SearchController, Session, TruncationPolicy,
};
use std::collections::VecDeque;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Which reasoning call should fail with ReasoningUnavailable
#[derive(Clone, Copy, PartialEq)]
enum FailAt {
    Nowhere,
    Select,
    Assess,
    Answer,
}

/// Scripted engine: replays canned selections/assessments and records calls
struct ScriptedEngine {
    route: QueryRoute,
    selections: Mutex<VecDeque<FileSelection>>,
    assessments: Mutex<VecDeque<ConfidenceReport>>,
    answer: String,
    fail_at: FailAt,

    classify_calls: AtomicUsize,
    select_calls: AtomicUsize,
    assess_calls: AtomicUsize,
    answer_calls: AtomicUsize,
    /// (already_analyzed, suggested_term) seen by each select call
    select_args: Mutex<Vec<(Vec<String>, Option<String>)>>,
    /// evidence paths seen by each answer call
    answer_evidence: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEngine {
    fn new(route: QueryRoute) -> Self {
        Self {
            route,
            selections: Mutex::new(VecDeque::new()),
            assessments: Mutex::new(VecDeque::new()),
            answer: "scripted answer".to_string(),
            fail_at: FailAt::Nowhere,
            classify_calls: AtomicUsize::new(0),
            select_calls: AtomicUsize::new(0),
            assess_calls: AtomicUsize::new(0),
            answer_calls: AtomicUsize::new(0),
            select_args: Mutex::new(Vec::new()),
            answer_evidence: Mutex::new(Vec::new()),
        }
    }

    fn with_selection(self, paths: &[&str]) -> Self {
        self.selections.lock().unwrap().push_back(FileSelection {
            paths: paths.iter().map(|s| s.to_string()).collect(),
            sufficient: false,
        });
        self
    }

    fn with_assessment(self, level: Confidence, term: Option<&str>) -> Self {
        self.assessments.lock().unwrap().push_back(ConfidenceReport {
            level,
            suggested_term: term.map(String::from),
        });
        self
    }

    fn failing_at(mut self, at: FailAt) -> Self {
        self.fail_at = at;
        self
    }

    fn unavailable() -> CodeQueryError {
        CodeQueryError::ReasoningUnavailable("connection refused".to_string())
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn classify(
        &self,
        _query: &str,
        _cached_paths: &[String],
        _history: &ConversationHistory,
    ) -> Result<QueryRoute> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.route)
    }

    async fn select_files(
        &self,
        _query: &str,
        _index: &FileIndex,
        already_analyzed: &[String],
        _cached_paths: &[String],
        suggested_term: Option<&str>,
    ) -> Result<FileSelection> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailAt::Select {
            return Err(Self::unavailable());
        }
        self.select_args
            .lock()
            .unwrap()
            .push((already_analyzed.to_vec(), suggested_term.map(String::from)));
        Ok(self
            .selections
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn assess_confidence(
        &self,
        _query: &str,
        _evidence: &[Evidence<'_>],
        _history: &ConversationHistory,
    ) -> Result<ConfidenceReport> {
        self.assess_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailAt::Assess {
            return Err(Self::unavailable());
        }
        Ok(self
            .assessments
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConfidenceReport {
                level: Confidence::Low,
                suggested_term: None,
            }))
    }

    async fn generate_answer(
        &self,
        _query: &str,
        evidence: &[Evidence<'_>],
        _history: &ConversationHistory,
    ) -> Result<String> {
        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailAt::Answer {
            return Err(Self::unavailable());
        }
        self.answer_evidence
            .lock()
            .unwrap()
            .push(evidence.iter().map(|e| e.path.to_string()).collect());
        Ok(self.answer.clone())
    }
}

/// Reader over a temp dir that counts full reads
struct CountingReader {
    root: std::path::PathBuf,
    full_reads: AtomicUsize,
}

impl CountingReader {
    fn new(root: &std::path::Path) -> Self {
        Self {
            root: root.to_path_buf(),
            full_reads: AtomicUsize::new(0),
        }
    }
}

impl FileReader for CountingReader {
    fn read_prefix(&self, path: &str, max_bytes: usize) -> Result<String> {
        let content = std::fs::read(self.root.join(path)).map_err(|e| {
            CodeQueryError::FileRead {
                path: path.to_string(),
                source: e,
            }
        })?;
        Ok(String::from_utf8_lossy(&content[..max_bytes.min(content.len())]).into_owned())
    }

    fn read_full(&self, path: &str) -> Result<String> {
        self.full_reads.fetch_add(1, Ordering::SeqCst);
        let content =
            std::fs::read_to_string(self.root.join(path)).map_err(|e| CodeQueryError::FileRead {
                path: path.to_string(),
                source: e,
            })?;
        Ok(content)
    }
}

/// Test fixture: three-file snapshot plus empty session state
struct Fixture {
    temp: TempDir,
    index: FileIndex,
    cache: FileMemoryCache,
    history: ConversationHistory,
    reader: CountingReader,
    limits: Limits,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "def alpha(): pass\n").unwrap();
        fs::write(temp.path().join("b.py"), "def beta(): pass\n").unwrap();
        fs::write(temp.path().join("c.py"), "def gamma(): pass\n").unwrap();

        let reader = CountingReader::new(temp.path());
        let index = FileIndex::build(temp.path(), &reader, 500).unwrap();
        let limits = Limits::default();

        Self {
            temp,
            index,
            cache: FileMemoryCache::new(TruncationPolicy::from_limits(&limits)),
            history: ConversationHistory::new(4, 500),
            reader,
            limits,
        }
    }

    async fn run(
        &mut self,
        engine: &ScriptedEngine,
        query: &str,
    ) -> std::result::Result<codequery_core::QueryOutcome, codequery_core::QueryAborted> {
        SearchController::new(
            &self.index,
            &mut self.cache,
            &self.history,
            &self.reader,
            engine,
            &self.limits,
        )
        .run(query)
        .await
    }
}

#[tokio::test]
async fn test_two_iteration_scenario() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py", "b.py"])
        .with_selection(&["c.py"])
        .with_assessment(Confidence::Medium, Some("timers"))
        .with_assessment(Confidence::High, None);

    let outcome = fx.run(&engine, "how do the timers work?").await.unwrap();

    assert_eq!(outcome.analyzed_files, vec!["a.py", "b.py", "c.py"]);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.confidence, Some(Confidence::High));
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.assess_calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.answer_calls.load(Ordering::SeqCst), 1);

    // The MEDIUM assessment's suggestion feeds the second selection
    let args = engine.select_args.lock().unwrap();
    assert_eq!(args[0].1, None);
    assert_eq!(args[1].0, vec!["a.py", "b.py"]);
    assert_eq!(args[1].1.as_deref(), Some("timers"));
}

#[tokio::test]
async fn test_high_confidence_stops_after_one_iteration() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py"])
        .with_assessment(Confidence::High, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    assert_eq!(outcome.iterations, 1);
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.answer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_max_iterations_bounds_selection_steps() {
    let mut fx = Fixture::new();
    // Always MEDIUM: only the iteration cap can stop the loop
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py"])
        .with_selection(&["b.py"])
        .with_selection(&["c.py"])
        .with_assessment(Confidence::Medium, None)
        .with_assessment(Confidence::Medium, None)
        .with_assessment(Confidence::Medium, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    assert_eq!(outcome.iterations, 3);
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 3);
    assert_eq!(engine.answer_calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.analyzed_files.len(), 3);
}

#[tokio::test]
async fn test_repeated_already_analyzed_selection_stops_loop() {
    let mut fx = Fixture::new();
    // Engine keeps proposing a.py; after the first load nothing is new
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py"])
        .with_selection(&["a.py"])
        .with_selection(&["a.py"])
        .with_assessment(Confidence::Medium, None)
        .with_assessment(Confidence::Medium, None)
        .with_assessment(Confidence::Medium, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    // One full iteration, then the empty re-selection ends the loop
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.assess_calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.analyzed_files, vec!["a.py"]);
    assert_eq!(engine.answer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_selection_on_first_iteration_still_assesses() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&[])
        .with_assessment(Confidence::Low, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.assess_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.answer_calls.load(Ordering::SeqCst), 0);
    assert!(outcome.analyzed_files.is_empty());
    assert_eq!(outcome.confidence, Some(Confidence::Low));
    assert!(outcome.answer.contains("couldn't identify any relevant files"));
}

#[tokio::test]
async fn test_direct_route_touches_no_files() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::Direct);

    let outcome = fx.run(&engine, "what is a mutex?").await.unwrap();

    assert_eq!(outcome.route, QueryRoute::Direct);
    assert_eq!(outcome.iterations, 0);
    assert!(outcome.analyzed_files.is_empty());
    assert_eq!(fx.reader.full_reads.load(Ordering::SeqCst), 0);
    assert!(fx.cache.is_empty());
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.answer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_use_memory_with_empty_cache_falls_back_to_search() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::UseMemory)
        .with_selection(&["a.py"])
        .with_assessment(Confidence::High, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    assert_eq!(outcome.route, QueryRoute::SearchCode);
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.analyzed_files, vec!["a.py"]);
}

#[tokio::test]
async fn test_use_memory_answers_from_cache_without_selection() {
    let mut fx = Fixture::new();
    fx.cache.fetch("b.py", &fx.reader).unwrap();
    let reads_before = fx.reader.full_reads.load(Ordering::SeqCst);

    let engine = ScriptedEngine::new(QueryRoute::UseMemory);
    let outcome = fx.run(&engine, "follow-up").await.unwrap();

    assert_eq!(outcome.route, QueryRoute::UseMemory);
    assert_eq!(outcome.analyzed_files, vec!["b.py"]);
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.reader.full_reads.load(Ordering::SeqCst), reads_before);

    let evidence = engine.answer_evidence.lock().unwrap();
    assert_eq!(evidence[0], vec!["b.py"]);
}

#[tokio::test]
async fn test_duplicate_selection_across_queries_hits_cache() {
    let mut fx = Fixture::new();

    let first = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py"])
        .with_assessment(Confidence::High, None);
    fx.run(&first, "q1").await.unwrap();

    let second = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py"])
        .with_assessment(Confidence::High, None);
    let outcome = fx.run(&second, "q2").await.unwrap();

    // Second query re-analyzes a.py but the content comes from cache
    assert_eq!(outcome.analyzed_files, vec!["a.py"]);
    assert_eq!(fx.reader.full_reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_paths_dropped_silently() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["ghost.py", "a.py"])
        .with_assessment(Confidence::High, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    assert_eq!(outcome.analyzed_files, vec!["a.py"]);
    assert!(!fx.cache.contains("ghost.py"));
}

#[tokio::test]
async fn test_failed_load_skipped_not_cached() {
    let mut fx = Fixture::new();
    // b.py exists in the index but vanishes before loading
    fs::remove_file(fx.temp.path().join("b.py")).unwrap();

    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py", "b.py"])
        .with_assessment(Confidence::High, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    assert_eq!(outcome.analyzed_files, vec!["a.py"]);
    assert!(fx.cache.contains("a.py"));
    assert!(!fx.cache.contains("b.py"));
}

#[tokio::test]
async fn test_all_loads_failing_ends_loop() {
    let mut fx = Fixture::new();
    fs::remove_file(fx.temp.path().join("a.py")).unwrap();

    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py"])
        .with_selection(&["b.py"])
        .with_assessment(Confidence::Medium, None)
        .with_assessment(Confidence::Medium, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    // Iteration 1 loads nothing, so the loop must not continue
    assert_eq!(engine.select_calls.load(Ordering::SeqCst), 1);
    assert!(outcome.analyzed_files.is_empty());
}

#[tokio::test]
async fn test_assess_failure_aborts_with_partial_results() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py", "b.py"])
        .failing_at(FailAt::Assess);

    let aborted = fx.run(&engine, "q").await.unwrap_err();

    assert!(aborted.reason.contains("connection refused"));
    assert_eq!(aborted.analyzed_files, vec!["a.py", "b.py"]);
    // Work already done stays cached for the next query
    assert!(fx.cache.contains("a.py"));
    assert!(fx.cache.contains("b.py"));
}

#[tokio::test]
async fn test_answer_failure_aborts_with_full_analyzed_set() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["c.py"])
        .with_assessment(Confidence::High, None)
        .failing_at(FailAt::Answer);

    let aborted = fx.run(&engine, "q").await.unwrap_err();
    assert_eq!(aborted.analyzed_files, vec!["c.py"]);
}

#[tokio::test]
async fn test_session_appends_history_only_on_success() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();

    let engine = Arc::new(
        ScriptedEngine::new(QueryRoute::SearchCode)
            .with_selection(&["a.py"])
            .with_assessment(Confidence::High, None),
    );
    let config = codequery_core::Config::default();
    let mut session = Session::open(temp.path(), &config, engine).unwrap();

    session.ask("what is x?").await.unwrap();
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.cached_paths(), vec!["a.py"]);

    let failing = Arc::new(ScriptedEngine::new(QueryRoute::SearchCode).failing_at(FailAt::Select));
    let mut session2 = Session::open(temp.path(), &config, failing).unwrap();
    session2.ask("q").await.unwrap_err();
    assert_eq!(session2.history().len(), 0);
}

#[tokio::test]
async fn test_session_wipe_and_clear_are_explicit() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();

    let engine = Arc::new(
        ScriptedEngine::new(QueryRoute::SearchCode)
            .with_selection(&["a.py"])
            .with_assessment(Confidence::High, None),
    );
    let config = codequery_core::Config::default();
    let mut session = Session::open(temp.path(), &config, engine).unwrap();
    session.ask("q").await.unwrap();

    session.wipe_cache();
    assert!(session.cached_paths().is_empty());

    session.clear_history();
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_analyzed_files_subset_of_cache() {
    let mut fx = Fixture::new();
    let engine = ScriptedEngine::new(QueryRoute::SearchCode)
        .with_selection(&["a.py", "b.py"])
        .with_selection(&["c.py"])
        .with_assessment(Confidence::Medium, None)
        .with_assessment(Confidence::High, None);

    let outcome = fx.run(&engine, "q").await.unwrap();

    let cached = fx.cache.snapshot();
    for path in &outcome.analyzed_files {
        assert!(cached.contains(path));
    }
}
