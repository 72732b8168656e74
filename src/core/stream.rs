//! Incremental event delivery.
//!
//! The orchestrator stays transport-free: it pushes every completed
//! artifact into an [`EventSink`] and keeps going. The streamer wires a
//! channel-backed sink to a spawned run so callers can consume events
//! as they happen; dropping the receiver cancels the run at the next
//! stage boundary.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::{CollaborationSession, StreamEvent};

use super::orchestrator::Orchestrator;

/// Where the orchestrator reports progress.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Returns `false` once the consumer is gone;
    /// the orchestrator stops emitting and cancels after that.
    fn emit(&self, event: StreamEvent) -> bool;
}

/// Sink for non-streaming runs; accepts and discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: StreamEvent) -> bool {
        true
    }
}

/// Sink backed by an unbounded channel. Send failure means the
/// receiver was dropped, which the orchestrator treats as cancellation.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: StreamEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Wraps an orchestrator so each artifact is emitted the instant it is
/// ready instead of buffering until the run completes.
pub struct EventStreamer {
    orchestrator: Arc<Orchestrator>,
}

impl EventStreamer {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Start a run in the background. Returns the event receiver and
    /// the handle resolving to the completed (or degraded) session.
    pub fn stream(
        &self,
        query: impl Into<String>,
    ) -> (
        mpsc::UnboundedReceiver<StreamEvent>,
        JoinHandle<CollaborationSession>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = Arc::clone(&self.orchestrator);
        let query = query.into();

        let handle = tokio::spawn(async move {
            let sink = ChannelSink::new(tx);
            orchestrator.run_with_sink(&query, &sink).await
        });

        (rx, handle)
    }
}
