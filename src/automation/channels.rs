// Communication channel from the poll worker to the caller thread
use super::types::StatusEvent;
use tokio::sync::mpsc;

pub type EventSender = mpsc::UnboundedSender<StatusEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<StatusEvent>;

/// Helper function to create the status event channel.
///
/// Unbounded: sending must never park the worker.
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
