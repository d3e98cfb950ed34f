//! Bridge trait for event producers
//!
//! A bridge connects to a monitored process (or replays a recording of one)
//! and pushes [`EventEnvelope`]s into the session. The session applies them
//! through a single writer, [`pump`], so trackers never see concurrent
//! mutation even when the bridge runs on another task.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::reducer::{EventEnvelope, reduce};
use crate::state::SharedDashboard;

#[async_trait]
pub trait Bridge: Send {
    /// Human-readable name of this bridge
    fn name(&self) -> &'static str;

    /// Run the bridge until it has nothing more to send.
    ///
    /// Returning drops `event_tx`, which lets the pump finish once the
    /// queue drains.
    async fn run(&mut self, event_tx: mpsc::Sender<EventEnvelope>);
}

/// Summary of a pump run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub applied: u64,
    pub rejected: u64,
}

/// Drain the event queue into the shared session, returning how many
/// events were applied and rejected once the queue closes.
///
/// Each event is reduced under one write-lock acquisition, so readers see
/// either none or all of an event's effects. Rejected events are logged and
/// skipped.
pub async fn pump(state: SharedDashboard, mut event_rx: mpsc::Receiver<EventEnvelope>) -> PumpStats {
    let mut stats = PumpStats::default();

    while let Some(env) = event_rx.recv().await {
        let mut guard = state.write().await;
        match reduce(&mut guard, &env) {
            Ok(()) => {
                stats.applied += 1;
                tracing::debug!(
                    event_id = env.id,
                    tracker = %env.event.tracker_id(),
                    "applied bridge event"
                );
            }
            Err(e) => {
                stats.rejected += 1;
                tracing::warn!(event_id = env.id, error = %e, "rejected bridge event");
            }
        }
    }

    tracing::info!(
        applied = stats.applied,
        rejected = stats.rejected,
        "event queue closed"
    );
    stats
}
