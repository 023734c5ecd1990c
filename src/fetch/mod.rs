//! Network fetch boundary
//!
//! The engine never implements transport itself; it drives an opaque
//! [`ResourceLoader`] capability. [`HttpResourceLoader`] is the bundled
//! reqwest-backed implementation used in production; tests substitute stub
//! loaders that settle on demand.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::errors::{LoadError, LoadResult};

/// Opaque handle for a successfully loaded media resource
///
/// Cloning is cheap: the payload is reference-counted.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    /// URL the resource was fetched from, verbatim
    pub url: String,
    /// Declared or sniffed media type, when known
    pub content_type: Option<String>,
    /// Raw resource payload
    pub bytes: Bytes,
}

/// Network-capable resource loading primitive
///
/// One outstanding `fetch` per dispatched load; the scheduler alone decides
/// how many may be in flight at once.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Fetch a resource, resolving with a handle or a classified error
    async fn fetch(&self, url: &str) -> LoadResult<MediaHandle>;
}

/// Default HTTP implementation of [`ResourceLoader`] using reqwest
pub struct HttpResourceLoader {
    client: Client,
}

impl HttpResourceLoader {
    /// Create a loader with the default connect timeout
    pub fn new() -> Self {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Create a loader with only a connection timeout (no total request
    /// timeout) so slow transfers of large media are not cut off
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Classify a payload as media, preferring the declared content type and
    /// falling back to magic-byte sniffing
    fn classify(url: &str, declared: Option<&str>, bytes: &[u8]) -> LoadResult<Option<String>> {
        if let Some(declared) = declared {
            if is_media_type(declared) {
                return Ok(Some(declared.to_string()));
            }
        }

        if let Some(kind) = infer::get(bytes) {
            let mime = kind.mime_type();
            if is_media_type(mime) {
                return Ok(Some(mime.to_string()));
            }
            return Err(LoadError::unsupported(url, mime));
        }

        match declared {
            Some(other) => Err(LoadError::unsupported(url, other)),
            None => Err(LoadError::unsupported(url, "unknown")),
        }
    }
}

impl Default for HttpResourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_media_type(mime: &str) -> bool {
    mime.starts_with("image/") || mime.starts_with("video/")
}

#[async_trait]
impl ResourceLoader for HttpResourceLoader {
    async fn fetch(&self, url: &str) -> LoadResult<MediaHandle> {
        if url.trim().is_empty() {
            return Err(LoadError::EmptyOrInvalidSource {
                url: url.to_string(),
            });
        }

        debug!("Fetching media resource: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::transient(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::transient(
                url,
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::transient(url, format!("failed to read body: {e}")))?;

        debug!("Fetched {} bytes from {}", bytes.len(), url);

        let content_type = Self::classify(url, declared.as_deref(), &bytes)?;

        Ok(MediaHandle {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 black PNG
    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ];

    #[test]
    fn test_classify_prefers_declared_media_type() {
        let result =
            HttpResourceLoader::classify("http://a/b.jpg", Some("image/jpeg"), &[0u8; 4]).unwrap();
        assert_eq!(result.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_classify_sniffs_when_declared_is_not_media() {
        let result =
            HttpResourceLoader::classify("http://a/b", Some("application/octet-stream"), PNG_BYTES)
                .unwrap();
        assert_eq!(result.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_classify_rejects_non_media() {
        let err = HttpResourceLoader::classify("http://a/b", Some("text/html"), b"<html></html>")
            .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedResourceType { .. }));
        assert!(!err.is_retryable());
    }
}
