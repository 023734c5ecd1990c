//! URL utilities for consistent URL handling
//!
//! Small pure helpers shared by the variant builder and the retry
//! controller's cache-busting path. Keys are used verbatim elsewhere in the
//! engine; nothing here normalizes a URL on behalf of a caller.

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Extract the host from a URL
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to extract the host from
    ///
    /// # Returns
    ///
    /// * `Some(String)` - Host if successfully parsed
    /// * `None` - If the URL is invalid or has no host
    pub fn extract_host(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }

    /// Append a query parameter to a URL string
    ///
    /// Uses `&` when the URL already carries a query string and `?` otherwise.
    /// Existing parameters are never touched; callers that apply this
    /// repeatedly will accumulate duplicates.
    pub fn append_query_param(url: &str, key: &str, value: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{key}={value}")
    }

    /// Whether a source string is empty after trimming
    pub fn is_blank(url: &str) -> bool {
        url.trim().is_empty()
    }

    /// Check if a URL is parseable
    pub fn is_valid(url: &str) -> bool {
        Url::parse(url).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        assert_eq!(
            UrlUtils::extract_host("https://images.example.com/a.jpg"),
            Some("images.example.com".to_string())
        );
        assert_eq!(UrlUtils::extract_host("not-a-url"), None);
    }

    #[test]
    fn test_append_query_param() {
        assert_eq!(
            UrlUtils::append_query_param("https://a.com/p.jpg", "w", "320"),
            "https://a.com/p.jpg?w=320"
        );
        assert_eq!(
            UrlUtils::append_query_param("https://a.com/p.jpg?x=1", "w", "320"),
            "https://a.com/p.jpg?x=1&w=320"
        );
    }

    #[test]
    fn test_is_blank() {
        assert!(UrlUtils::is_blank(""));
        assert!(UrlUtils::is_blank("   "));
        assert!(!UrlUtils::is_blank("https://a.com"));
    }

    #[test]
    fn test_is_valid() {
        assert!(UrlUtils::is_valid("https://example.com/photo.jpg"));
        assert!(!UrlUtils::is_valid("not a url"));
    }
}
