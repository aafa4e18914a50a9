//! Signed asset URL cache.
//!
//! [`AssetManager`] hands out signed URLs for `(bucket, path)` pairs, reusing a
//! cached URL while it is valid, sharing one backend request between concurrent
//! callers, and refreshing each URL in the background shortly before it expires.

mod manager;
mod signer;

pub use manager::{AssetCallback, AssetManager, AssetManagerConfig, Subscription};
pub use signer::{AssetSigner, HttpAssetSigner};

/// Errors produced while obtaining a signed URL.
///
/// `Clone` because one fetch result is delivered to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to get signed URL: {0}")]
    Signing(String),

    #[error("Signed URL for {0} was already expired")]
    AlreadyExpired(String),

    #[error("Asset manager has been disposed")]
    Disposed,

    #[error("Signed URL request was aborted")]
    Aborted,
}
