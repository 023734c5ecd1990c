//! Priority load scheduler
//!
//! Bounded-concurrency dispatcher for media loads. Pending requests sit in a
//! min-heap ordered by (priority, submission order); a dispatcher task woken
//! through [`Notify`] pulls the most urgent request whenever a slot is free.
//! At most the configured number of loads are in flight at any instant.
//!
//! The scheduler performs no retries: a failed load rejects its result sink
//! and retry policy lives entirely in the retry controller layered on top.
//! Dispatch order follows priority-then-FIFO; completion order is whatever
//! network latency makes it, and nothing here assumes otherwise.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::MediaCache;
use crate::config::SchedulerConfig;
use crate::errors::LoadResult;
use crate::fetch::{MediaHandle, ResourceLoader};
use crate::registry::LoadedRegistry;

pub mod types;

pub use types::{QueuedLoad, SchedulerStats};

struct SchedulerState {
    /// Pending requests (min-heap via Reverse)
    pending: BinaryHeap<Reverse<QueuedLoad>>,
    /// Loads dispatched and not yet settled
    in_flight: usize,
    /// Monotonic submission counter for stable FIFO tie-breaking
    next_seq: u64,
}

/// Bounded-concurrency priority dispatcher for media loads
pub struct LoadScheduler {
    /// All queue mutations happen under this lock in one synchronous step
    state: Mutex<SchedulerState>,
    wake: Arc<Notify>,
    concurrency: usize,
    pub(crate) cache: Arc<MediaCache>,
    pub(crate) registry: Arc<LoadedRegistry>,
    loader: Arc<dyn ResourceLoader>,
}

impl LoadScheduler {
    /// Create a scheduler and spawn its dispatcher task
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: &SchedulerConfig,
        cache: Arc<MediaCache>,
        registry: Arc<LoadedRegistry>,
        loader: Arc<dyn ResourceLoader>,
    ) -> Arc<Self> {
        let scheduler = Arc::new(Self {
            state: Mutex::new(SchedulerState {
                pending: BinaryHeap::new(),
                in_flight: 0,
                next_seq: 0,
            }),
            wake: Arc::new(Notify::new()),
            concurrency: config.concurrency.max(1),
            cache,
            registry,
            loader,
        });

        scheduler.spawn_dispatcher();
        scheduler
    }

    /// Submit a load request
    ///
    /// Returns a receiver that resolves with the loaded handle or rejects
    /// with the load error. A live cache hit resolves immediately without
    /// occupying a concurrency slot. Queue saturation is not an error; the
    /// request simply waits for a free slot.
    pub async fn submit(
        &self,
        url: &str,
        priority: i32,
    ) -> oneshot::Receiver<LoadResult<MediaHandle>> {
        self.submit_keyed(url, url, priority).await
    }

    /// Submit a load fetched from `url` but settled under `key`
    ///
    /// The retry layer fetches cache-defeating variants of a resource; the
    /// one-shot URL must not leak into the cache or registry, so success side
    /// effects land under the key the consumer will ask about.
    pub async fn submit_keyed(
        &self,
        url: &str,
        key: &str,
        priority: i32,
    ) -> oneshot::Receiver<LoadResult<MediaHandle>> {
        let (sink, receiver) = oneshot::channel();

        if let Some(handle) = self.cache.get(key).await {
            debug!("Cache hit for {}, resolving without dispatch", key);
            let _ = sink.send(Ok(handle));
            return receiver;
        }

        let id = Uuid::new_v4();
        {
            let mut state = self.locked();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(Reverse(QueuedLoad {
                id,
                url: url.to_string(),
                key: key.to_string(),
                priority,
                seq,
                enqueued_at: Utc::now(),
                sink,
            }));
        }

        debug!("Enqueued load {} (priority {}): {}", id, priority, url);
        self.wake.notify_one();
        receiver
    }

    /// Remove a queued-but-undispatched request for the given URL
    ///
    /// True cancellation at zero cost. Returns `false` when no pending
    /// request matches; an already-dispatched load cannot be aborted and is
    /// left to settle (its result is discarded upstream by the generation
    /// check).
    pub fn cancel_pending(&self, url: &str) -> bool {
        let mut state = self.locked();

        let before = state.pending.len();
        let retained: BinaryHeap<Reverse<QueuedLoad>> = state
            .pending
            .drain()
            .filter(|Reverse(item)| item.url != url)
            .collect();
        let removed = before - retained.len();
        state.pending = retained;

        if removed > 0 {
            debug!("Cancelled {} pending load(s) for {}", removed, url);
        }
        removed > 0
    }

    /// Snapshot of queue depth and in-flight count
    pub fn stats(&self) -> SchedulerStats {
        let state = self.locked();
        SchedulerStats {
            pending: state.pending.len(),
            in_flight: state.in_flight,
            concurrency: self.concurrency,
        }
    }

    fn locked(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn_dispatcher(self: &Arc<Self>) {
        let wake = Arc::clone(&self.wake);
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                wake.notified().await;
                match weak.upgrade() {
                    Some(scheduler) => scheduler.dispatch_ready(),
                    None => break,
                }
            }
        });
    }

    /// Pull pending requests while free slots remain
    ///
    /// Each pop-and-dispatch is one synchronous step under the state lock.
    fn dispatch_ready(self: &Arc<Self>) {
        loop {
            let item = {
                let mut state = self.locked();
                if state.in_flight >= self.concurrency {
                    return;
                }
                match state.pending.pop() {
                    Some(Reverse(item)) => {
                        state.in_flight += 1;
                        item
                    }
                    None => return,
                }
            };

            self.spawn_fetch(item);
        }
    }

    fn spawn_fetch(self: &Arc<Self>, item: QueuedLoad) {
        let scheduler = Arc::clone(self);

        tokio::spawn(async move {
            let _slot = SlotGuard {
                scheduler: Arc::clone(&scheduler),
            };

            debug!(
                "Dispatching load {} (priority {}, queued at {}): {}",
                item.id,
                item.priority,
                item.enqueued_at.format("%H:%M:%S%.3f"),
                item.url
            );

            let result = scheduler.loader.fetch(&item.url).await;

            match &result {
                Ok(handle) => {
                    scheduler.cache.set(&item.key, handle.clone()).await;
                    scheduler.registry.mark(&item.key).await;
                    debug!("Load {} settled successfully: {}", item.id, item.key);
                }
                Err(err) => {
                    warn!("Load {} failed: {}", item.id, err);
                }
            }

            if item.sink.send(result).is_err() {
                debug!("Requester for load {} went away before settlement", item.id);
            }
        });
    }
}

/// Releases a concurrency slot when its fetch task ends, panic included
///
/// A loader panic unwinds the task before any explicit bookkeeping runs;
/// tying the decrement to `Drop` keeps the in-flight count honest anyway.
struct SlotGuard {
    scheduler: Arc<LoadScheduler>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        {
            let mut state = self.scheduler.locked();
            state.in_flight -= 1;
        }
        self.scheduler.wake.notify_one();
    }
}
