//! Client library and storage backend for the Uplyfile CDN
//!
//! Uploads files to Uplyfile's hosting API with signed requests and content
//! deduplication, caches filename-to-URL mappings in a local JSON file, and
//! builds image-transformation URLs served by the CDN.

pub mod api;
pub mod error;
pub mod image;
pub mod insight;
pub mod mapper;
pub mod models;
pub mod storage;

pub use error::{Error, Result};
