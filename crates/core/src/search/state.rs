use serde::{Deserialize, Serialize};

use crate::metadata::{Query, SearchOutcome, SearchResult};
use crate::trending::TrendingRecord;

/// Where the search view is in its fetch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// No query has been dispatched yet.
    #[default]
    Idle,
    Loading,
    Success,
    EmptyResult,
    Failure,
}

/// Observable state read by presentation code.
///
/// Owned by [`SearchOrchestrator`](super::SearchOrchestrator); readers get
/// snapshots or subscribe to changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Live query text, updated on every keystroke.
    pub search_term: String,
    /// Query text of the latest dispatched fetch.
    pub debounced_search_term: String,
    pub movie_list: Vec<SearchResult>,
    pub trending_movies: Vec<TrendingRecord>,
    /// Empty when there is no error.
    pub error_message: String,
    pub is_loading: bool,
    pub phase: SearchPhase,
}

impl ViewState {
    /// Enter the loading state for a newly dispatched query.
    ///
    /// Results from the previous query stay visible until the new outcome is
    /// applied; the previous error is cleared.
    pub(crate) fn begin_loading(&mut self, query: &Query) {
        self.debounced_search_term = query.as_str().to_string();
        self.error_message.clear();
        self.is_loading = true;
        self.phase = SearchPhase::Loading;
    }

    /// Apply the outcome of the current fetch.
    pub(crate) fn apply(&mut self, outcome: &SearchOutcome) {
        match outcome {
            SearchOutcome::Success(results) => {
                self.movie_list = results.clone();
                self.error_message.clear();
                self.phase = SearchPhase::Success;
            }
            SearchOutcome::EmptyResult(message) => {
                self.movie_list.clear();
                self.error_message = message.clone();
                self.phase = SearchPhase::EmptyResult;
            }
            SearchOutcome::Failure(message) => {
                self.movie_list.clear();
                self.error_message = message.clone();
                self.phase = SearchPhase::Failure;
            }
        }
        self.is_loading = false;
    }
}
