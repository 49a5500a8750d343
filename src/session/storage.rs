use std::time::Duration;

/// Stores whose idle entries the [`ExpirySweeper`](super::ExpirySweeper) can evict.
pub trait ExpiringStore: Send + Sync {
    /// Remove entries idle for longer than `idle_timeout`, returning how many went.
    fn sweep_expired(&self, idle_timeout: Duration) -> usize;
}
