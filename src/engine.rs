//! Media engine facade
//!
//! Wires the cache, registry, scheduler, probe, and variant builder into one
//! explicitly constructed service value. Nothing here is a hidden global:
//! consumers (and tests) create as many isolated engines as they need and
//! share one per process by choice, not by construction.

use std::sync::{Arc, Weak};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStats, MediaCache};
use crate::config::EngineConfig;
use crate::errors::LoadResult;
use crate::fetch::{HttpResourceLoader, MediaHandle, ResourceLoader};
use crate::format_probe::FormatProbe;
use crate::registry::LoadedRegistry;
use crate::retry::RetryController;
use crate::scheduler::{LoadScheduler, SchedulerStats};
use crate::variants::{SizeClass, UrlVariantBuilder};

/// Client-side media acquisition and caching engine
pub struct MediaEngine {
    config: EngineConfig,
    cache: Arc<MediaCache>,
    registry: Arc<LoadedRegistry>,
    scheduler: Arc<LoadScheduler>,
    probe: Arc<FormatProbe>,
    variants: UrlVariantBuilder,
}

impl MediaEngine {
    /// Create an engine over an injected resource loader
    ///
    /// Spawns the scheduler's dispatcher and the one-time format probe, so
    /// this must run within a tokio runtime.
    pub fn new(config: EngineConfig, loader: Arc<dyn ResourceLoader>) -> Arc<Self> {
        let cache = Arc::new(MediaCache::new(&config.cache));
        let registry = Arc::new(LoadedRegistry::new(&config.registry));
        let scheduler = LoadScheduler::new(
            &config.scheduler,
            Arc::clone(&cache),
            Arc::clone(&registry),
            loader,
        );
        let probe = Arc::new(FormatProbe::new());
        let variants = UrlVariantBuilder::new(config.providers.clone(), Arc::clone(&probe));

        // One-shot probe in the background; variant URLs pick the next-gen
        // format up as soon as it resolves
        {
            let probe = Arc::clone(&probe);
            tokio::spawn(async move {
                probe.detect().await;
            });
        }

        info!(
            "Media engine started (cache capacity {}, registry capacity {}, concurrency {})",
            config.cache.capacity, config.registry.capacity, config.scheduler.concurrency
        );

        Arc::new(Self {
            config,
            cache,
            registry,
            scheduler,
            probe,
            variants,
        })
    }

    /// Create an engine backed by the bundled HTTP loader
    pub fn with_http_loader(config: EngineConfig) -> Arc<Self> {
        Self::new(config, Arc::new(HttpResourceLoader::new()))
    }

    /// Request a media load at the given priority (lower = more urgent)
    ///
    /// The returned receiver resolves with the loaded handle or rejects with
    /// the load error. Consumers wanting retry/fallback semantics should go
    /// through [`MediaEngine::new_attempt`] instead.
    pub async fn request_load(
        &self,
        url: &str,
        priority: i32,
    ) -> oneshot::Receiver<LoadResult<MediaHandle>> {
        self.scheduler.submit(url, priority).await
    }

    /// Create a retry controller bound to this engine's scheduler
    pub fn new_attempt(&self, fallback_url: &str) -> Arc<RetryController> {
        RetryController::new(
            Arc::clone(&self.scheduler),
            fallback_url.to_string(),
            self.config.retry.clone(),
        )
    }

    /// Whether the URL is known to have rendered successfully at least once
    pub async fn is_loaded(&self, url: &str) -> bool {
        self.registry.is_marked(url).await
    }

    /// Record a render success observed outside this engine's fetch path
    /// (e.g. a native image element's completion signal)
    pub async fn mark_loaded(&self, url: &str) {
        self.registry.mark(url).await;
    }

    /// Build the provider variant URL for a size class
    pub fn variant_url(&self, url: &str, size: SizeClass) -> String {
        self.variants.variant_url(url, size)
    }

    /// Remove a queued-but-undispatched load for the URL
    pub fn cancel_pending(&self, url: &str) -> bool {
        self.scheduler.cancel_pending(url)
    }

    /// Cache observability snapshot
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Scheduler observability snapshot
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Run the format probe to completion
    pub async fn detect_formats(&self) -> bool {
        self.probe.detect().await
    }

    /// Spawn the periodic cache expiry sweep
    ///
    /// The sweep runs every `cache.cleanup_interval` (default 2 minutes) off
    /// the request path, and stops once the engine is dropped.
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let interval = self.config.cache.cleanup_interval;
        let weak: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(engine) => {
                        let removed = engine.cache.cleanup().await;
                        if removed > 0 {
                            debug!("Periodic sweep removed {} expired entries", removed);
                        }
                    }
                    None => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoadError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;
    use tokio::time::{advance, sleep};

    struct StaticLoader;

    #[async_trait]
    impl ResourceLoader for StaticLoader {
        async fn fetch(&self, url: &str) -> LoadResult<MediaHandle> {
            if url.contains("missing") {
                return Err(LoadError::transient(url, "HTTP 404"));
            }
            Ok(MediaHandle {
                url: url.to_string(),
                content_type: Some("image/jpeg".to_string()),
                bytes: Bytes::from_static(b"pixels"),
            })
        }
    }

    fn engine() -> Arc<MediaEngine> {
        MediaEngine::new(EngineConfig::default(), Arc::new(StaticLoader))
    }

    #[tokio::test]
    async fn test_request_load_populates_registry_and_cache() {
        let engine = engine();
        let rx = engine.request_load("http://cdn/a.jpg", 2).await;
        assert!(rx.await.expect("settled").is_ok());

        assert!(engine.is_loaded("http://cdn/a.jpg").await);
        assert_eq!(engine.cache_stats().await.size, 1);
    }

    #[tokio::test]
    async fn test_mark_loaded_external_signal() {
        let engine = engine();
        assert!(!engine.is_loaded("http://cdn/native.jpg").await);

        engine.mark_loaded("http://cdn/native.jpg").await;
        assert!(engine.is_loaded("http://cdn/native.jpg").await);

        // External marking does not touch the cache
        assert_eq!(engine.cache_stats().await.size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_cleanup_sweeps_expired_entries() {
        let engine = engine();
        let _sweeper = engine.spawn_cleanup();

        let rx = engine.request_load("http://cdn/old.jpg", 0).await;
        assert!(rx.await.expect("settled").is_ok());
        assert_eq!(engine.cache_stats().await.size, 1);

        // Past TTL (10m) plus one sweep interval (2m)
        advance(Duration::from_secs(740)).await;
        sleep(Duration::from_millis(5)).await;

        assert_eq!(engine.cache_stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_variant_url_through_engine() {
        let engine = engine();
        engine.detect_formats().await;

        assert_eq!(
            engine.variant_url("https://images.unsplash.com/p-1", SizeClass::Thumb),
            "https://images.unsplash.com/p-1?w=160&q=70&fm=webp"
        );
        // Unknown providers pass through
        assert_eq!(
            engine.variant_url("https://example.org/p.jpg", SizeClass::Thumb),
            "https://example.org/p.jpg"
        );
    }
}
