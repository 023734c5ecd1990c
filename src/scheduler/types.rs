//! Scheduler type definitions

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::errors::LoadResult;
use crate::fetch::MediaHandle;

/// A load request waiting for a dispatch slot
///
/// Owned by the scheduler until dispatched; completion ownership then
/// transfers to the requester through the result sink.
#[derive(Debug)]
pub struct QueuedLoad {
    /// Unique request instance identifier (used in logs)
    pub id: Uuid,
    /// URL actually fetched (may carry a cache-defeating suffix)
    pub url: String,
    /// Key the settled result is cached and registry-marked under
    pub key: String,
    /// Lower values are more urgent
    pub priority: i32,
    /// Submission sequence number; breaks priority ties FIFO
    pub seq: u64,
    /// When the request entered the queue
    pub enqueued_at: DateTime<Utc>,
    /// Where the settled result is delivered
    pub sink: oneshot::Sender<LoadResult<MediaHandle>>,
}

impl PartialEq for QueuedLoad {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedLoad {}

impl PartialOrd for QueuedLoad {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedLoad {
    /// Requests are ordered by ascending priority, ties broken by submission
    /// order (stable FIFO)
    fn cmp(&self, other: &Self) -> Ordering {
        match self.priority.cmp(&other.priority) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            priority_order => priority_order,
        }
    }
}

/// Statistics about the scheduler state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Requests waiting for a dispatch slot
    pub pending: usize,
    /// Requests currently dispatched and not yet settled
    pub in_flight: usize,
    /// Configured concurrency bound
    pub concurrency: usize,
}
