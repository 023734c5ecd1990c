//! Shared utilities

pub mod url;

pub use url::UrlUtils;
