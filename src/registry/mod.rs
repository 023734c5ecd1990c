//! Loaded-resource registry
//!
//! Presence-only record of URLs known to have rendered successfully at least
//! once, surviving UI remounts independently of the media cache. Eviction is
//! strict insertion order (FIFO), not LRU: re-marking an existing key and
//! looking a key up both leave its eviction position untouched. That is
//! deliberate — the registry only suppresses redundant entry animations, so
//! evicting a recently looked-up key costs one extra fade-in, nothing more.

use std::collections::{HashSet, VecDeque};

use tokio::sync::RwLock;
use tracing::debug;

use crate::config::RegistryConfig;

struct RegistryInner {
    marked: HashSet<String>,
    /// Insertion order, oldest at the front
    order: VecDeque<String>,
}

/// Bounded FIFO set of keys that have rendered successfully
pub struct LoadedRegistry {
    inner: RwLock<RegistryInner>,
    capacity: usize,
}

impl LoadedRegistry {
    /// Create a registry from configuration
    pub fn new(config: &RegistryConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            inner: RwLock::new(RegistryInner {
                marked: HashSet::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Record a key as having rendered successfully
    ///
    /// Idempotent: re-marking a present key is a strict no-op and does not
    /// refresh its eviction position.
    pub async fn mark(&self, key: &str) {
        let mut inner = self.inner.write().await;

        if inner.marked.contains(key) {
            return;
        }

        inner.marked.insert(key.to_string());
        inner.order.push_back(key.to_string());

        if inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.marked.remove(&oldest);
                debug!("Registry at capacity, evicting oldest-inserted key: {}", oldest);
            }
        }
    }

    /// Whether the key is known to have rendered at least once
    pub async fn is_marked(&self, key: &str) -> bool {
        self.inner.read().await.marked.contains(key)
    }

    /// Number of keys currently tracked
    pub async fn len(&self) -> usize {
        self.inner.read().await.marked.len()
    }

    /// Whether no keys are tracked
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.marked.is_empty()
    }
}
