//! Search orchestration.
//!
//! Turns keystrokes into debounced metadata fetches, keeps [`ViewState`] in
//! sync with the latest outcome and records trending hits.

mod orchestrator;
mod state;

pub use orchestrator::{FetchDisposition, SearchOrchestrator, TrendRecording};
pub use state::{SearchPhase, ViewState};
