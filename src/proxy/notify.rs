//! Live Update Notifications
//!
//! Fan-out of "fresh data" signals to server-sent-event subscribers.

use tokio::sync::broadcast;
use tracing::debug;

/// Message pushed when the live collection is refetched.
pub const SPIN_UPDATE_MESSAGE: &str = "new spin data";

// == Update Observer ==
/// Receives a signal after a successful fetch of the live collection.
///
/// Called on the response path, so implementations must return promptly
/// and must not fail the request.
pub trait UpdateObserver: Send + Sync {
    fn notify(&self, message: &str);
}

// == Spin Events ==
/// Broadcast hub for spin updates. Each SSE client holds a receiver.
#[derive(Debug, Clone)]
pub struct SpinEvents {
    tx: broadcast::Sender<String>,
}

impl SpinEvents {
    /// Creates a hub buffering up to `capacity` undelivered messages per
    /// subscriber; slow subscribers skip ahead.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SpinEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

impl UpdateObserver for SpinEvents {
    fn notify(&self, message: &str) {
        // Err only means nobody is listening.
        match self.tx.send(message.to_string()) {
            Ok(delivered) => debug!(delivered, "sse.broadcast"),
            Err(_) => debug!("sse.broadcast: no subscribers"),
        }
    }
}
