//! Error handling for the media engine
//!
//! All failures that can reach a consumer are expressed as [`LoadError`];
//! convenience aliases keep signatures short throughout the crate.

pub mod types;

pub use types::LoadError;

/// Result alias used by load paths throughout the engine
pub type LoadResult<T> = Result<T, LoadError>;
