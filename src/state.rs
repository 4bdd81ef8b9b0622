//! Observable pipeline state.
//!
//! [`PipelineState`] is the single value a presentation layer renders: is a
//! document selected, is a run in flight, how far along it is, what went
//! wrong, and the output accumulated so far. Only
//! [`crate::controller::PipelineController`] mutates it; everyone else reads
//! snapshots.
//!
//! Three ways to follow it:
//!
//! * poll [`crate::controller::PipelineController::state`];
//! * hold a `tokio::sync::watch::Receiver` from `subscribe()` (latest value
//!   only, intermediate states may be skipped);
//! * register a [`StateObserver`], called synchronously for every
//!   transition, in order.

use crate::config::OutputType;
use serde::Serialize;
use std::sync::Arc;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No run has started since the last selection or clear.
    #[default]
    Idle,
    Extracting,
    Summarizing,
    Done,
    Failed,
}

/// Snapshot of everything a presentation layer shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PipelineState {
    pub has_document: bool,
    pub document_name: Option<String>,
    pub loading: bool,
    /// 0–100; `round(100 × chunks_done / chunks_total)` during summary runs.
    pub progress: u8,
    pub error: Option<String>,
    pub output_type: OutputType,
    pub model: String,
    /// Output accumulated so far; complete once `phase` is `Done`.
    pub output: String,
    pub phase: Phase,
    pub chunks_done: usize,
    pub chunks_total: usize,
}

impl PipelineState {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Drop everything tied to the current document and run, keeping the
    /// user's selections.
    pub(crate) fn reset_run(&mut self) {
        self.loading = false;
        self.progress = 0;
        self.error = None;
        self.output.clear();
        self.phase = Phase::Idle;
        self.chunks_done = 0;
        self.chunks_total = 0;
    }
}

/// `round(100 × done / total)` with halves rounded up; 100 when `total` is 0.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (200 * done.min(total) + total) / (2 * total);
    pct as u8
}

/// Receives every state transition, in order.
///
/// Called while the controller holds its state lock: implementations must
/// be quick and must not call back into the controller.
pub trait StateObserver: Send + Sync {
    fn on_state_change(&self, state: &PipelineState);
}

/// Convenience alias for registered observers.
pub type SharedObserver = Arc<dyn StateObserver>;

impl<F> StateObserver for F
where
    F: Fn(&PipelineState) + Send + Sync,
{
    fn on_state_change(&self, state: &PipelineState) {
        self(state)
    }
}
