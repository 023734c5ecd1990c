//! Per-attempt retry state machine
//!
//! Layered on top of the scheduler, one controller per consumer. A failed
//! load is retried with exponential backoff and a cache-defeating suffix, and
//! after retries are exhausted the controller switches to the fallback
//! resource exactly once. Transient failures never surface to the consumer as
//! errors: the terminal outcome is always a resolved display state, fallback
//! or otherwise.
//!
//! Every change of the desired resource increments a generation counter that
//! in-flight callbacks capture; a callback whose generation no longer matches
//! is discarded, so a slow response for an old resource can never clobber a
//! newer one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::defaults::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES};
use crate::config::duration_serde;
use crate::errors::{LoadError, LoadResult};
use crate::fetch::MediaHandle;
use crate::scheduler::LoadScheduler;
use crate::utils::UrlUtils;

/// Retry/backoff policy for load attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries of the original source before falling back
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent one
    #[serde(with = "duration_serde::duration", default = "default_base_delay")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following `retries_used` failed attempts
    fn backoff_delay(&self, retries_used: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        Duration::from_millis(base_ms.saturating_mul(1 << retries_used.min(16)))
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_delay() -> Duration {
    Duration::from_millis(DEFAULT_BASE_DELAY_MS)
}

/// Lifecycle phase of a load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// No resource requested yet
    Idle,
    /// A load (original, retry, or fallback) is outstanding
    Requesting,
    /// Terminal: the current resource rendered
    Succeeded,
    /// Terminal: nothing further to try; the fallback stays displayed
    Failed,
}

/// What the consumer should currently display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    /// Resource the consumer should show (fallback once switched)
    pub current_url: Option<String>,
    pub phase: AttemptPhase,
    /// Error flag: the fallback resource is being displayed
    pub using_fallback: bool,
    /// Retries of the original source consumed so far
    pub retries_used: u32,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            current_url: None,
            phase: AttemptPhase::Idle,
            using_fallback: false,
            retries_used: 0,
        }
    }
}

struct AttemptInner {
    /// Incremented whenever the desired resource changes; captured by
    /// in-flight callbacks to detect staleness
    generation: u64,
    display: DisplayState,
}

enum Transition {
    /// Terminal state reached or result discarded
    Done,
    /// Sleep, then re-attempt the (cache-busted) original
    Backoff(Duration),
    /// Re-attempt immediately (fallback switch)
    Immediate,
}

/// Per-consumer retry state machine over the load scheduler
pub struct RetryController {
    scheduler: Arc<LoadScheduler>,
    fallback_url: String,
    policy: RetryPolicy,
    inner: Mutex<AttemptInner>,
    watch_tx: watch::Sender<DisplayState>,
}

impl RetryController {
    /// Create a controller bound to a scheduler and a fallback resource
    pub fn new(scheduler: Arc<LoadScheduler>, fallback_url: String, policy: RetryPolicy) -> Arc<Self> {
        let (watch_tx, _) = watch::channel(DisplayState::default());
        Arc::new(Self {
            scheduler,
            fallback_url,
            policy,
            inner: Mutex::new(AttemptInner {
                generation: 0,
                display: DisplayState::default(),
            }),
            watch_tx,
        })
    }

    /// Current display state
    pub fn display_state(&self) -> DisplayState {
        self.locked().display.clone()
    }

    /// Observe display state changes
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.watch_tx.subscribe()
    }

    /// Change the desired resource
    ///
    /// Supersedes any outstanding attempt: its eventual results are discarded
    /// by the generation check. An empty or whitespace source skips loading
    /// entirely and shows the fallback immediately.
    pub fn request(self: &Arc<Self>, url: &str, priority: i32) {
        let trimmed = url.trim();

        let (generation, source) = {
            let mut inner = self.locked();
            inner.generation += 1;

            let (source, using_fallback) = if trimmed.is_empty() {
                debug!("Empty source, falling back immediately");
                (self.fallback_url.clone(), true)
            } else {
                (trimmed.to_string(), false)
            };

            inner.display = DisplayState {
                current_url: Some(source.clone()),
                phase: AttemptPhase::Requesting,
                using_fallback,
                retries_used: 0,
            };
            let _ = self.watch_tx.send(inner.display.clone());
            (inner.generation, source)
        };

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.drive(generation, source, priority).await;
        });
    }

    async fn drive(self: Arc<Self>, generation: u64, original: String, priority: i32) {
        loop {
            // The fetched URL may carry a cache-defeating suffix; the settle
            // key is always the resource the consumer will ask about
            let (request_url, key) = {
                let inner = self.locked();
                if inner.generation != generation {
                    return;
                }
                let display = &inner.display;
                if display.using_fallback {
                    (self.fallback_url.clone(), self.fallback_url.clone())
                } else if display.retries_used > 0 {
                    (
                        Self::cache_busted(&original, display.retries_used),
                        original.clone(),
                    )
                } else {
                    (original.clone(), original.clone())
                }
            };

            let receiver = self.scheduler.submit_keyed(&request_url, &key, priority).await;
            let result = match receiver.await {
                Ok(result) => result,
                Err(_) => Err(LoadError::ChannelClosed),
            };

            match self.transition(generation, result) {
                Transition::Done => return,
                Transition::Backoff(delay) => sleep(delay).await,
                Transition::Immediate => {}
            }
        }
    }

    /// Apply one settled result to the state machine
    ///
    /// The generation re-check and the state change happen under one lock so
    /// a superseding `request` cannot interleave between them.
    fn transition(&self, generation: u64, result: LoadResult<MediaHandle>) -> Transition {
        let mut inner = self.locked();

        if inner.generation != generation {
            debug!("Discarding stale result from superseded attempt");
            return Transition::Done;
        }

        let next = match result {
            Ok(_) => {
                inner.display.phase = AttemptPhase::Succeeded;
                Transition::Done
            }
            Err(err) => {
                if inner.display.using_fallback {
                    // Already showing the fallback; there is no further fallback
                    warn!("Fallback resource failed, giving up: {}", err);
                    inner.display.phase = AttemptPhase::Failed;
                    Transition::Done
                } else if err.is_retryable() && inner.display.retries_used < self.policy.max_retries {
                    let delay = self.policy.backoff_delay(inner.display.retries_used);
                    inner.display.retries_used += 1;
                    warn!(
                        "Load failed ({}), retry {}/{} in {:?}",
                        err, inner.display.retries_used, self.policy.max_retries, delay
                    );
                    Transition::Backoff(delay)
                } else {
                    debug!("Switching to fallback resource after: {}", err);
                    inner.display.using_fallback = true;
                    inner.display.current_url = Some(self.fallback_url.clone());
                    Transition::Immediate
                }
            }
        };

        let _ = self.watch_tx.send(inner.display.clone());
        next
    }

    /// Re-request the original with a cache-defeating suffix so an
    /// intermediate cache cannot hand back the same failure
    fn cache_busted(url: &str, attempt: u32) -> String {
        let with_retry = UrlUtils::append_query_param(url, "retry", &attempt.to_string());
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        UrlUtils::append_query_param(&with_retry, "cb", &millis.to_string())
    }

    fn locked(&self) -> MutexGuard<'_, AttemptInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
