//! Configuration default values
//!
//! All tunable defaults live here so they are changeable in one central
//! location.

// Cache defaults
pub const DEFAULT_CACHE_CAPACITY: usize = 500;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600; // 10 minutes
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 120; // 2 minutes

// Registry defaults
pub const DEFAULT_REGISTRY_CAPACITY: usize = 2000;

// Scheduler defaults
pub const DEFAULT_CONCURRENCY: usize = 4;

// Retry defaults
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

// Variant size classes: (width, quality)
pub const THUMB_VARIANT: (u32, u8) = (160, 70);
pub const SMALL_VARIANT: (u32, u8) = (320, 75);
pub const MEDIUM_VARIANT: (u32, u8) = (640, 80);
pub const LARGE_VARIANT: (u32, u8) = (1280, 82);
pub const FULL_VARIANT: (u32, u8) = (2048, 90);
pub const BLUR_VARIANT: (u32, u8) = (32, 30);
pub const DEFAULT_BLUR_AMOUNT: u32 = 40;
