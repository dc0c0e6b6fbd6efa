//! Search view API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use cinetrend_core::{TrendingRecord, ViewState};

use crate::state::AppState;

/// Longest accepted search term, in characters.
const MAX_SEARCH_TERM_CHARS: usize = 200;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryChangeRequest {
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Current view state.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<ViewState> {
    Json(state.orchestrator().snapshot())
}

/// Live query text changed (one call per keystroke).
///
/// Returns 202: the fetch happens after the debounce period, observe it via
/// `GET /state` or the WebSocket.
pub async fn update_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryChangeRequest>,
) -> Response {
    if request.search_term.chars().count() > MAX_SEARCH_TERM_CHARS {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!(
                    "searchTerm must be at most {} characters",
                    MAX_SEARCH_TERM_CHARS
                ),
            }),
        )
            .into_response();
    }

    let orchestrator = state.orchestrator();
    orchestrator.on_query_change(request.search_term).await;
    (StatusCode::ACCEPTED, Json(orchestrator.snapshot())).into_response()
}

/// Trending list currently shown.
pub async fn get_trending(State(state): State<Arc<AppState>>) -> Json<Vec<TrendingRecord>> {
    Json(state.orchestrator().snapshot().trending_movies)
}

/// Reload the trending list from the store.
pub async fn refresh_trending(State(state): State<Arc<AppState>>) -> Response {
    let orchestrator = state.orchestrator();
    if orchestrator.load_trending().await {
        Json(orchestrator.snapshot().trending_movies).into_response()
    } else {
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: "Trending store unavailable".to_string(),
            }),
        )
            .into_response()
    }
}
