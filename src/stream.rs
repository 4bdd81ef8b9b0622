//! Streaming view of the pipeline state.
//!
//! A [`StateStream`] yields the current [`PipelineState`] immediately and
//! then every time it changes. It is built on a `watch` channel, so a slow
//! consumer sees the latest state rather than a backlog: good for redrawing
//! a UI, not for auditing every transition (register a
//! [`crate::state::StateObserver`] for that).

use crate::state::PipelineState;
use std::pin::Pin;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;

/// A boxed stream of state snapshots.
pub type StateStream = Pin<Box<dyn Stream<Item = PipelineState> + Send>>;

/// Wrap a watch receiver as a [`StateStream`].
pub fn state_stream(rx: watch::Receiver<PipelineState>) -> StateStream {
    Box::pin(WatchStream::new(rx))
}

/// Wait until `predicate` holds for the current state and return it.
///
/// Returns `None` if the sending side is dropped first.
pub async fn wait_for(
    rx: &mut watch::Receiver<PipelineState>,
    mut predicate: impl FnMut(&PipelineState) -> bool,
) -> Option<PipelineState> {
    rx.wait_for(|s| predicate(s)).await.ok().map(|s| s.clone())
}
