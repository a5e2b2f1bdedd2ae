//! Named-blob storage over the Uplyfile CDN
//!
//! Adapts the API client and the filename mapper to a generic storage
//! contract, so frameworks can treat Uplyfile like any other file backend.

pub mod backend;

pub use backend::UplyStorage;

use crate::Result;
use async_trait::async_trait;

/// Storage contract consumed by external frameworks: named blobs in, URLs
/// out. Implementations decide where the bytes live.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `content` under `name` and return the stored name.
    async fn save(&self, name: &str, content: &[u8]) -> Result<String>;

    /// Fetch the stored content for `name`.
    async fn open(&self, name: &str) -> Result<Vec<u8>>;

    /// True when `name` is known and the backing file still answers.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Public URL for `name`.
    fn url(&self, name: &str) -> Result<String>;

    /// Sanitize a proposed name into one the backend accepts.
    fn validate_name(&self, name: &str) -> String;
}
