//! Format capability detection
//!
//! One-shot probe of whether this runtime can decode the next-gen compressed
//! image format. The probe decodes a minimal embedded WebP at most once per
//! probe instance; until that resolves, the synchronous read conservatively
//! reports no support so URL variants stay on universally decodable formats.

use tokio::sync::OnceCell;
use tracing::debug;

/// Minimal 1x1 lossless WebP used as the decode probe
const WEBP_PROBE: [u8; 34] = [
    0x52, 0x49, 0x46, 0x46, 0x1A, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38,
    0x4C, 0x0D, 0x00, 0x00, 0x00, 0x2F, 0x00, 0x00, 0x00, 0x10, 0x07, 0x10, 0x11, 0x11, 0x88,
    0x88, 0xFE, 0x07, 0x00,
];

/// Memoized next-gen image format capability probe
#[derive(Debug, Default)]
pub struct FormatProbe {
    support: OnceCell<bool>,
}

impl FormatProbe {
    /// Create an unresolved probe
    pub fn new() -> Self {
        Self {
            support: OnceCell::new(),
        }
    }

    /// Run the probe, computing the result at most once
    ///
    /// Subsequent calls return the memoized value without re-decoding.
    pub async fn detect(&self) -> bool {
        *self
            .support
            .get_or_init(|| async {
                let supported = image::load_from_memory(&WEBP_PROBE).is_ok();
                debug!("Next-gen image format probe resolved: supported={supported}");
                supported
            })
            .await
    }

    /// Synchronous read of the probe result
    ///
    /// Returns `false` while the probe has not yet resolved.
    pub fn detected(&self) -> bool {
        self.support.get().copied().unwrap_or(false)
    }
}
