//! Error type definitions for the media engine
//!
//! The taxonomy matters to the retry controller: transient failures drive the
//! backoff sequence, while unsupported or invalid sources go straight to the
//! fallback resource without burning retries.

use thiserror::Error;

/// Errors produced while acquiring a media resource
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// Retryable network or server failure
    #[error("transient load failure for {url}: {message}")]
    Transient { url: String, message: String },

    /// The payload is not a decodable media type; never retried
    #[error("unsupported resource type for {url}: {detected}")]
    UnsupportedResourceType { url: String, detected: String },

    /// Empty or unparseable source URL; no load is attempted at all
    #[error("empty or invalid source url: {url:?}")]
    EmptyOrInvalidSource { url: String },

    /// The result channel closed before the load settled
    #[error("load result channel closed before completion")]
    ChannelClosed,
}

impl LoadError {
    /// Create a transient error with a custom message
    pub fn transient<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Transient {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-type error
    pub fn unsupported<U: Into<String>, D: Into<String>>(url: U, detected: D) -> Self {
        Self::UnsupportedResourceType {
            url: url.into(),
            detected: detected.into(),
        }
    }

    /// Whether the retry controller should attempt this load again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient { .. } | Self::ChannelClosed => true,
            Self::UnsupportedResourceType { .. } | Self::EmptyOrInvalidSource { .. } => false,
        }
    }
}
