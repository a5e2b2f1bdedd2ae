//! Uplyfile API integration
//!
//! Signed HTTP access to the project file listing and upload endpoints,
//! with an etag-keyed cache for upload deduplication.

pub mod client;
pub mod etag;
pub mod mock;
pub mod sign;

pub use client::UplyClient;
pub use mock::MockUplyClient;

use crate::models::HostedFile;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UplyApi: Send + Sync {
    /// List every file in the project. Refreshes the etag cache.
    async fn list_project_files(&self) -> Result<Vec<HostedFile>>;

    /// Upload `content` under `name`, returning the hosted URL.
    async fn upload(&self, name: &str, content: &[u8]) -> Result<String>;

    /// True iff the CDN answers 200 for `url`.
    async fn file_exists(&self, url: &str) -> Result<bool>;

    /// Resolve already-hosted content to its URL by etag, or `None` when the
    /// project doesn't hold it. With `use_cached` the listing is only
    /// fetched when the cache is empty.
    async fn file_url_for(&self, content: &[u8], use_cached: bool) -> Result<Option<String>>;
}
