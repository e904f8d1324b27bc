use crate::state::RecordingState;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Typed events flowing from the pipeline to a display or caller
///
/// The worker and orchestrator enqueue; the consuming side drains on its own
/// schedule. Pipeline threads never mutate display state directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Lifecycle change (idle / recording / processing)
    StateChanged(RecordingState),
    /// Transcript accumulated so far, emitted after each chunk
    PartialTranscript(String),
    /// Chunked-transcription progress in samples
    Progress { processed: usize, total: usize },
    /// Human-readable status, e.g. a session rejection reason
    Status(String),
}

/// Sending half of the session event channel.
///
/// Delivery is best-effort: if the consumer has fallen behind and the channel
/// is full, the event is dropped rather than stalling the pipeline.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<SessionEvent>,
}

impl EventSender {
    pub fn send(&self, event: SessionEvent) {
        if let Err(e) = self.tx.try_send(event) {
            debug!("Dropping session event (consumer behind): {}", e);
        }
    }
}

/// Create a session event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<SessionEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender { tx }, rx)
}
