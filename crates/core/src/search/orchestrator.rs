//! Search orchestrator: debounced queries in, view state out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tracing::{debug, info, warn};

use super::state::{SearchPhase, ViewState};
use crate::config::SearchConfig;
use crate::debounce::{DebounceHandle, Debouncer};
use crate::metadata::{MetadataClient, Query, SearchOutcome, SearchResult, REQUEST_FAILED_MESSAGE};
use crate::metrics::{FETCHES_SUPERSEDED, QUERIES_DISPATCHED, TRENDING_OPERATIONS};
use crate::trending::TrendingStore;

/// A dispatched query together with the generation it was issued under.
///
/// Only the ticket matching the current generation may change the view.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchTicket {
    generation: u64,
    query: Query,
}

/// What happened to the trending counter after a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendRecording {
    /// Discover query, empty list or failure: nothing to record.
    NotQualifying,
    /// Hit recorded; carries the new count.
    Recorded(u64),
    /// The store rejected the hit. The search itself still succeeded.
    Failed,
}

/// Result of executing a fetch ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDisposition {
    /// The outcome was applied to the view.
    Applied {
        phase: SearchPhase,
        trend: TrendRecording,
    },
    /// A newer ticket was issued first; the view was left alone.
    Superseded,
}

/// State shared between the orchestrator and its background tasks.
struct Shared {
    config: SearchConfig,
    metadata: Arc<dyn MetadataClient>,
    trending: Arc<dyn TrendingStore>,
    view: watch::Sender<ViewState>,
    generation: watch::Sender<u64>,
}

/// Clears the loading flag if the owning fetch ends without applying an
/// outcome (task aborted or the client panicked).
struct LoadingGuard<'a> {
    shared: &'a Shared,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let generation = self.generation;
        let current = *self.shared.generation.borrow();
        if current != generation {
            return;
        }
        self.shared.view.send_if_modified(|state| {
            if !state.is_loading {
                return false;
            }
            warn!("Fetch for generation {} ended without an outcome", generation);
            state.apply(&SearchOutcome::Failure(REQUEST_FAILED_MESSAGE.to_string()));
            true
        });
    }
}

impl Shared {
    fn issue(&self, query: Query) -> FetchTicket {
        let mut generation = 0;
        self.generation.send_modify(|current| {
            *current += 1;
            generation = *current;
        });
        self.view.send_modify(|state| state.begin_loading(&query));
        debug!("Issued fetch #{} for '{}'", generation, query);
        FetchTicket { generation, query }
    }

    async fn execute(&self, ticket: FetchTicket) -> FetchDisposition {
        let _guard = LoadingGuard {
            shared: self,
            generation: ticket.generation,
        };

        let outcome = tokio::select! {
            outcome = self.metadata.fetch(&ticket.query) => outcome,
            _ = superseded(self.generation.subscribe(), ticket.generation) => {
                FETCHES_SUPERSEDED.inc();
                debug!("Fetch #{} for '{}' cancelled by a newer query", ticket.generation, ticket.query);
                return FetchDisposition::Superseded;
            }
        };
        let outcome = outcome.classify_empty(&ticket.query);

        let applied = self.view.send_if_modified(|state| {
            if *self.generation.borrow() != ticket.generation {
                return false;
            }
            state.apply(&outcome);
            true
        });
        if !applied {
            FETCHES_SUPERSEDED.inc();
            debug!("Discarding stale outcome of fetch #{}", ticket.generation);
            return FetchDisposition::Superseded;
        }

        let phase = self.view.borrow().phase;
        let trend = match (&outcome, ticket.query.is_discover()) {
            (SearchOutcome::Success(results), false) => match results.first() {
                Some(chosen) => self.record_hit(&ticket.query, chosen).await,
                None => TrendRecording::NotQualifying,
            },
            _ => TrendRecording::NotQualifying,
        };

        FetchDisposition::Applied { phase, trend }
    }

    async fn record_hit(&self, query: &Query, chosen: &SearchResult) -> TrendRecording {
        match self.trending.record_hit(query, chosen).await {
            Ok(record) => {
                TRENDING_OPERATIONS
                    .with_label_values(&["record_hit", "success"])
                    .inc();
                debug!(
                    "Recorded trending hit for '{}' -> {} (count {})",
                    query, record.id, record.count
                );
                TrendRecording::Recorded(record.count)
            }
            Err(e) => {
                TRENDING_OPERATIONS
                    .with_label_values(&["record_hit", "error"])
                    .inc();
                warn!("Failed to record trending hit for '{}': {}", query, e);
                TrendRecording::Failed
            }
        }
    }

    async fn load_trending(&self) -> bool {
        match self.trending.top_trending(self.config.trending_limit).await {
            Ok(records) => {
                TRENDING_OPERATIONS
                    .with_label_values(&["top_trending", "success"])
                    .inc();
                debug!("Loaded {} trending entries", records.len());
                self.view.send_modify(|state| state.trending_movies = records);
                true
            }
            Err(e) => {
                TRENDING_OPERATIONS
                    .with_label_values(&["top_trending", "error"])
                    .inc();
                warn!("Error fetching trending movies: {}", e);
                false
            }
        }
    }
}

/// Resolves once the generation moves past `generation`.
async fn superseded(mut rx: watch::Receiver<u64>, generation: u64) {
    if rx.wait_for(|current| *current != generation).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Drives the search view: debounces query text, fetches from the metadata
/// API, applies the latest outcome and records trending hits.
pub struct SearchOrchestrator {
    shared: Arc<Shared>,
    input: RwLock<Option<DebounceHandle<Query>>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SearchOrchestrator {
    pub fn new(
        config: SearchConfig,
        metadata: Arc<dyn MetadataClient>,
        trending: Arc<dyn TrendingStore>,
    ) -> Self {
        let (view, _) = watch::channel(ViewState::default());
        let (generation, _) = watch::channel(0);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            shared: Arc::new(Shared {
                config,
                metadata,
                trending,
                view,
                generation,
            }),
            input: RwLock::new(None),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the debouncer and dispatch loop, then run the startup discover
    /// fetch and trending load in the background.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Search orchestrator already running");
            return;
        }

        info!(
            "Starting search orchestrator (metadata: {}, trending: {})",
            self.shared.metadata.name(),
            self.shared.trending.backend_name()
        );

        let quiet = Duration::from_millis(self.shared.config.debounce_ms);
        let (handle, _task, debounced) = Debouncer::spawn(quiet);
        *self.input.write().await = Some(handle);

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            shared.load_trending().await;
        });

        self.spawn_dispatch_loop(debounced);

        info!("Search orchestrator started");
    }

    /// Stop the dispatch loop and tear down the debouncer.
    ///
    /// A pending debounced value is dropped; fetches already in flight finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Search orchestrator not running");
            return;
        }

        info!("Stopping search orchestrator");

        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.input.write().await.take() {
            handle.shutdown().await;
        }

        info!("Search orchestrator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Observe view state changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.shared.view.subscribe()
    }

    /// Current view state.
    pub fn snapshot(&self) -> ViewState {
        self.shared.view.borrow().clone()
    }

    /// Store the live query text and feed it to the debouncer.
    ///
    /// Never fetches directly. Before [`start`](Self::start) only the text is stored.
    pub async fn on_query_change(&self, raw: impl Into<String>) {
        let raw = raw.into();
        let query = Query::new(&raw);
        self.shared
            .view
            .send_modify(|state| state.search_term = raw);

        let handle = self.input.read().await.clone();
        match handle {
            Some(handle) => handle.observe(query).await,
            None => debug!("Search orchestrator not running, query '{}' not dispatched", query),
        }
    }

    /// Fetch `query` now and apply the outcome if it is still the latest.
    pub async fn on_debounced_query(&self, query: Query) -> FetchDisposition {
        let ticket = self.shared.issue(query);
        self.shared.execute(ticket).await
    }

    /// Reload the trending list. Returns whether the store answered.
    pub async fn load_trending(&self) -> bool {
        self.shared.load_trending().await
    }

    /// Spawn the loop turning debounced queries into fetches.
    ///
    /// The startup discover fetch goes first. An emission equal to the last
    /// dispatched query is skipped, so the same term is never fetched (or
    /// counted) twice in a row.
    fn spawn_dispatch_loop(&self, mut debounced: mpsc::Receiver<Query>) {
        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            debug!("Search dispatch loop started");
            let mut last = Query::discover();
            dispatch(&shared, last.clone());

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Search dispatch loop received shutdown signal");
                        break;
                    }
                    query = debounced.recv() => {
                        let Some(query) = query else { break };
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if query == last {
                            debug!("Debounced query '{}' unchanged, not refetching", query);
                            continue;
                        }
                        last = query.clone();
                        dispatch(&shared, query);
                    }
                }
            }
            debug!("Search dispatch loop stopped");
        });
    }
}

fn dispatch(shared: &Arc<Shared>, query: Query) {
    QUERIES_DISPATCHED.inc();
    let ticket = shared.issue(query);
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        shared.execute(ticket).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SearchOutcome;
    use crate::testing::{fixtures, MockMetadataClient, MockTrendingStore};

    fn orchestrator(
        metadata: &Arc<MockMetadataClient>,
        store: &Arc<MockTrendingStore>,
    ) -> SearchOrchestrator {
        SearchOrchestrator::new(
            SearchConfig::default(),
            Arc::clone(metadata) as Arc<dyn MetadataClient>,
            Arc::clone(store) as Arc<dyn TrendingStore>,
        )
    }

    async fn wait_until(
        rx: &mut watch::Receiver<ViewState>,
        predicate: impl FnMut(&ViewState) -> bool,
    ) -> ViewState {
        tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
            .await
            .expect("view state never matched")
            .expect("view channel closed")
            .clone()
    }

    #[tokio::test]
    async fn test_successful_search_records_first_result() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        let movies = vec![
            fixtures::movie(268, "Batman"),
            fixtures::movie(272, "Batman Begins"),
            fixtures::movie(414, "Batman Forever"),
        ];
        metadata
            .set_outcome("batman", SearchOutcome::Success(movies.clone()))
            .await;
        let orch = orchestrator(&metadata, &store);

        let disposition = orch.on_debounced_query(Query::new("batman")).await;

        assert_eq!(
            disposition,
            FetchDisposition::Applied {
                phase: SearchPhase::Success,
                trend: TrendRecording::Recorded(1),
            }
        );
        let state = orch.snapshot();
        assert_eq!(state.movie_list, movies);
        assert!(state.error_message.is_empty());
        assert!(!state.is_loading);
        assert_eq!(state.debounced_search_term, "batman");

        let hits = store.recorded_hits().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].query, Query::new("batman"));
        assert_eq!(hits[0].movie_id, 268);
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_skips_recording() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata
            .set_outcome("batman", SearchOutcome::request_failed())
            .await;
        let orch = orchestrator(&metadata, &store);

        let disposition = orch.on_debounced_query(Query::new("batman")).await;

        assert_eq!(
            disposition,
            FetchDisposition::Applied {
                phase: SearchPhase::Failure,
                trend: TrendRecording::NotQualifying,
            }
        );
        let state = orch.snapshot();
        assert_eq!(state.error_message, "Error fetching movies. Try again later.");
        assert!(state.movie_list.is_empty());
        assert!(!state.is_loading);
        assert!(store.recorded_hits().await.is_empty());
    }

    #[tokio::test]
    async fn test_discover_query_never_records() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata
            .set_outcome("", SearchOutcome::Success(fixtures::movies(20)))
            .await;
        let orch = orchestrator(&metadata, &store);

        let disposition = orch.on_debounced_query(Query::new("   ")).await;

        assert_eq!(
            disposition,
            FetchDisposition::Applied {
                phase: SearchPhase::Success,
                trend: TrendRecording::NotQualifying,
            }
        );
        assert_eq!(orch.snapshot().movie_list.len(), 20);
        assert!(store.recorded_hits().await.is_empty());
        assert_eq!(metadata.recorded_fetches().await[0].query, Query::discover());
    }

    #[tokio::test]
    async fn test_empty_result_sets_message() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata
            .set_outcome("zzzxqq", SearchOutcome::Success(Vec::new()))
            .await;
        let orch = orchestrator(&metadata, &store);

        let disposition = orch.on_debounced_query(Query::new("zzzxqq")).await;

        assert_eq!(
            disposition,
            FetchDisposition::Applied {
                phase: SearchPhase::EmptyResult,
                trend: TrendRecording::NotQualifying,
            }
        );
        let state = orch.snapshot();
        assert_eq!(state.error_message, "No movies found for \"zzzxqq\".");
        assert!(state.movie_list.is_empty());
        assert!(store.recorded_hits().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_search_successful() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata
            .set_outcome("alien", SearchOutcome::Success(fixtures::movies(3)))
            .await;
        store.set_failing(true).await;
        let orch = orchestrator(&metadata, &store);

        let disposition = orch.on_debounced_query(Query::new("alien")).await;

        assert_eq!(
            disposition,
            FetchDisposition::Applied {
                phase: SearchPhase::Success,
                trend: TrendRecording::Failed,
            }
        );
        let state = orch.snapshot();
        assert_eq!(state.movie_list.len(), 3);
        assert!(state.error_message.is_empty());
    }

    #[tokio::test]
    async fn test_repeat_searches_increment_count() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata
            .set_outcome("matrix", SearchOutcome::Success(vec![fixtures::movie(603, "The Matrix")]))
            .await;
        let orch = orchestrator(&metadata, &store);

        orch.on_debounced_query(Query::new("matrix")).await;
        let second = orch.on_debounced_query(Query::new("matrix")).await;

        assert_eq!(
            second,
            FetchDisposition::Applied {
                phase: SearchPhase::Success,
                trend: TrendRecording::Recorded(2),
            }
        );
        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_fetch_never_overwrites_newer_one() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata
            .set_outcome("star", SearchOutcome::Success(vec![fixtures::movie(1, "Star")]))
            .await;
        metadata
            .set_outcome("star wars", SearchOutcome::Success(vec![fixtures::movie(11, "Star Wars")]))
            .await;
        metadata.set_delay("star", Duration::from_millis(300)).await;
        metadata.set_delay("star wars", Duration::from_millis(10)).await;
        let orch = Arc::new(orchestrator(&metadata, &store));

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.on_debounced_query(Query::new("star")).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = orch.on_debounced_query(Query::new("star wars")).await;

        assert_eq!(first.await.unwrap(), FetchDisposition::Superseded);
        assert!(matches!(second, FetchDisposition::Applied { .. }));

        // Let any leftover timer fire
        tokio::time::sleep(Duration::from_millis(500)).await;

        let state = orch.snapshot();
        assert_eq!(state.debounced_search_term, "star wars");
        assert_eq!(state.movie_list[0].id, 11);
        assert!(!state.is_loading);

        let hits = store.recorded_hits().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].movie_id, 11);

        // The superseded request was dropped before it completed
        let fetches = metadata.recorded_fetches().await;
        let stale = fetches.iter().find(|f| f.query.as_str() == "star").unwrap();
        assert!(!stale.completed);
    }

    /// Issues a newer ticket from inside the fetch that completes the older
    /// one, so the outcome arrives after its generation is already stale.
    struct OvertakingClient {
        shared: std::sync::OnceLock<std::sync::Weak<Shared>>,
    }

    #[async_trait::async_trait]
    impl MetadataClient for OvertakingClient {
        async fn fetch(&self, query: &Query) -> SearchOutcome {
            if query.as_str() == "alien" {
                if let Some(shared) = self.shared.get().and_then(std::sync::Weak::upgrade) {
                    shared.issue(Query::new("aliens"));
                }
            }
            SearchOutcome::Success(vec![fixtures::movie(348, "Alien")])
        }

        fn name(&self) -> &str {
            "overtaking"
        }
    }

    #[tokio::test]
    async fn test_outcome_completed_after_newer_ticket_is_discarded() {
        let client = Arc::new(OvertakingClient {
            shared: std::sync::OnceLock::new(),
        });
        let store = Arc::new(MockTrendingStore::new());
        let orch = SearchOrchestrator::new(
            SearchConfig::default(),
            Arc::clone(&client) as Arc<dyn MetadataClient>,
            Arc::clone(&store) as Arc<dyn TrendingStore>,
        );
        client
            .shared
            .set(Arc::downgrade(&orch.shared))
            .unwrap_or_else(|_| panic!("shared already set"));

        let disposition = orch.on_debounced_query(Query::new("alien")).await;

        assert_eq!(disposition, FetchDisposition::Superseded);
        let state = orch.snapshot();
        assert_eq!(state.debounced_search_term, "aliens");
        assert_eq!(state.phase, SearchPhase::Loading);
        assert!(state.is_loading);
        assert!(state.movie_list.is_empty());
        assert!(store.recorded_hits().await.is_empty());
    }

    #[tokio::test]
    async fn test_loading_cleared_when_client_panics() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata.set_panic("boom").await;
        let orch = Arc::new(orchestrator(&metadata, &store));

        let task = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.on_debounced_query(Query::new("boom")).await })
        };
        assert!(task.await.is_err());

        let state = orch.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.phase, SearchPhase::Failure);
        assert_eq!(state.error_message, REQUEST_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_load_trending_fills_view() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        for (id, times) in [(1, 2), (2, 5), (3, 1)] {
            for _ in 0..times {
                store
                    .record_hit(&Query::new("seed"), &fixtures::movie(id, "Seed"))
                    .await
                    .unwrap();
            }
        }
        let orch = orchestrator(&metadata, &store);

        assert!(orch.load_trending().await);

        let counts: Vec<u64> = orch
            .snapshot()
            .trending_movies
            .iter()
            .map(|r| r.count)
            .collect();
        assert_eq!(counts, vec![5, 2, 1]);
    }

    #[tokio::test]
    async fn test_load_trending_failure_is_absorbed() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        store.set_failing(true).await;
        let orch = orchestrator(&metadata, &store);

        assert!(!orch.load_trending().await);
        let state = orch.snapshot();
        assert!(state.trending_movies.is_empty());
        assert!(state.error_message.is_empty());
    }

    #[tokio::test]
    async fn test_query_change_before_start_only_stores_text() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        let orch = orchestrator(&metadata, &store);

        orch.on_query_change("  dune ").await;

        let state = orch.snapshot();
        assert_eq!(state.search_term, "  dune ");
        assert_eq!(state.phase, SearchPhase::Idle);
        assert!(metadata.recorded_fetches().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_runs_discover_and_trending() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        store
            .record_hit(&Query::new("alien"), &fixtures::movie(348, "Alien"))
            .await
            .unwrap();
        store.clear_recorded().await;
        metadata
            .set_outcome("", SearchOutcome::Success(fixtures::movies(20)))
            .await;
        let orch = orchestrator(&metadata, &store);
        let mut rx = orch.subscribe();

        orch.start().await;
        let state = wait_until(&mut rx, |s| {
            s.phase == SearchPhase::Success && s.trending_movies.len() == 1
        })
        .await;

        assert_eq!(state.movie_list.len(), 20);
        assert_eq!(state.debounced_search_term, "");
        assert!(store.recorded_hits().await.is_empty());

        orch.stop().await;
        assert!(!orch.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_dispatches_last_value_once() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        metadata
            .set_outcome("bat", SearchOutcome::Success(fixtures::movies(3)))
            .await;
        let orch = orchestrator(&metadata, &store);
        let mut rx = orch.subscribe();
        orch.start().await;

        for text in ["b", "ba", "bat"] {
            orch.on_query_change(text).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let state = wait_until(&mut rx, |s| {
            s.debounced_search_term == "bat" && !s.is_loading
        })
        .await;
        assert_eq!(state.search_term, "bat");

        // Same text again after the quiet period: no second fetch
        orch.on_query_change("bat ").await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let term_fetches: Vec<String> = metadata
            .recorded_fetches()
            .await
            .into_iter()
            .filter(|f| !f.query.is_discover())
            .map(|f| f.query.to_string())
            .collect();
        assert_eq!(term_fetches, vec!["bat".to_string()]);
        assert_eq!(store.recorded_hits().await.len(), 1);

        orch.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_pending_query() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        let orch = orchestrator(&metadata, &store);
        orch.start().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        orch.on_query_change("dune").await;
        orch.stop().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(metadata
            .recorded_fetches()
            .await
            .iter()
            .all(|f| f.query.is_discover()));
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let metadata = Arc::new(MockMetadataClient::new());
        let store = Arc::new(MockTrendingStore::new());
        let orch = orchestrator(&metadata, &store);

        orch.start().await;
        orch.start().await;
        assert!(orch.is_running());

        orch.stop().await;
        orch.stop().await;
        assert!(!orch.is_running());
    }
}
