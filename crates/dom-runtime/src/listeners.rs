//! State-changed listeners (UI push layer boundary)

use std::sync::Arc;

use dom_core::UiState;
use thiserror::Error;
use tokio::sync::mpsc;

/// A unique identifier for a subscribed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Consistent view of all UI-capable blocks, shared with every listener
pub type UiSnapshot = Arc<Vec<UiState>>;

/// Failure to hand a snapshot to one listener
///
/// Never propagated into the tick: the runtime logs it and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListenerDeliveryError {
    /// The listener went away; the runtime unsubscribes it
    #[error("listener closed")]
    Closed,

    /// The listener is lagging; this snapshot is dropped for it
    #[error("listener queue full")]
    Full,

    #[error("listener failed: {0}")]
    Failed(String),
}

/// Receiver of periodic state-changed notifications
///
/// Called from the tick thread, so implementations must not block.
pub trait StateChangedListener: Send + Sync {
    fn state_changed(&self, snapshot: &UiSnapshot) -> Result<(), ListenerDeliveryError>;
}

/// Listener forwarding snapshots into a bounded tokio channel
pub struct ChannelListener {
    tx: mpsc::Sender<UiSnapshot>,
}

impl ChannelListener {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<UiSnapshot>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl StateChangedListener for ChannelListener {
    fn state_changed(&self, snapshot: &UiSnapshot) -> Result<(), ListenerDeliveryError> {
        self.tx.try_send(Arc::clone(snapshot)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ListenerDeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => ListenerDeliveryError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_listener_reports_full_and_closed() {
        let (listener, mut rx) = ChannelListener::new(1);
        let snapshot: UiSnapshot = Arc::new(vec![UiState::new("hall", "lamp", "", "on")]);

        assert_eq!(listener.state_changed(&snapshot), Ok(()));
        assert_eq!(
            listener.state_changed(&snapshot),
            Err(ListenerDeliveryError::Full)
        );
        assert_eq!(rx.try_recv().unwrap()[0].state, "on");

        drop(rx);
        assert_eq!(
            listener.state_changed(&snapshot),
            Err(ListenerDeliveryError::Closed)
        );
    }

    #[test]
    fn test_waiting_receiver_woken_by_delivery() {
        let (listener, mut rx) = ChannelListener::new(4);
        let mut recv = tokio_test::task::spawn(rx.recv());
        tokio_test::assert_pending!(recv.poll());

        let snapshot: UiSnapshot = Arc::new(vec![UiState::new("hall", "lamp", "", "off")]);
        listener.state_changed(&snapshot).unwrap();

        assert!(recv.is_woken());
        let delivered = tokio_test::assert_ready!(recv.poll());
        assert_eq!(delivered.unwrap()[0].name, "hall");
    }
}
