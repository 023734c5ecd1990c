//! Client-side media acquisition and caching engine
//!
//! The engine fetches, caches, retries, and schedules the loading of remote
//! media (photographs, thumbnails, short videos) on behalf of rendering
//! components that may show thousands of items at once. It provides:
//!
//! - a capacity- and TTL-bounded LRU cache of resolved media handles,
//! - a FIFO registry of resources known to have rendered at least once
//!   (used to skip redundant entry animations across UI remounts),
//! - a bounded-concurrency priority load scheduler,
//! - a per-consumer retry controller with exponential backoff, fallback
//!   switching, and stale-result suppression via generation counters,
//! - a CDN URL variant builder driven by per-provider rewrite rules,
//! - a one-shot probe of next-gen image format decode support.
//!
//! All state is in-memory and rebuilt each process; transport is an injected
//! [`fetch::ResourceLoader`] capability with a bundled reqwest implementation.

pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod format_probe;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod utils;
pub mod variants;

pub use cache::{CacheStats, MediaCache};
pub use config::EngineConfig;
pub use engine::MediaEngine;
pub use errors::{LoadError, LoadResult};
pub use fetch::{HttpResourceLoader, MediaHandle, ResourceLoader};
pub use format_probe::FormatProbe;
pub use registry::LoadedRegistry;
pub use retry::{AttemptPhase, DisplayState, RetryController, RetryPolicy};
pub use scheduler::{LoadScheduler, SchedulerStats};
pub use variants::{SizeClass, UrlVariantBuilder};
