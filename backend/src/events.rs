//! In-process notifications for point changes.
//!
//! Wallet-displaying views subscribe and refresh when a child's points move.
//! This is a best-effort cache-invalidation signal, not a durability
//! mechanism: the ledger is the source of truth and a missed event only
//! delays a refresh. The bus lives on the application state so tests can
//! instantiate isolated instances.

use tokio::sync::broadcast;

/// Published after a point award lands for a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsChanged {
    pub child_id: String,
}

#[derive(Clone)]
pub struct PointsEvents {
    tx: broadcast::Sender<PointsChanged>,
}

impl PointsEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PointsChanged> {
        self.tx.subscribe()
    }

    /// Best effort: publishing with no subscribers is not an error.
    pub fn publish(&self, event: PointsChanged) {
        let _ = self.tx.send(event);
    }
}

impl Default for PointsEvents {
    fn default() -> Self {
        Self::new()
    }
}
