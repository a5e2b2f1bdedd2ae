//! Data models and structures
//!
//! Defines the core data structures for hosted files, configuration, and
//! the image classification metadata returned by the CDN.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// URL variants the API reports for a hosted file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileUrl {
    pub base: String,
    pub full: String,
    pub name: String,
    pub operational: String,
}

/// One file in a project listing. Files are created remotely on upload and
/// immutable from the client's perspective; `etag` is the service's content
/// hash and the dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedFile {
    pub etag: String,
    pub uid: String,
    pub project_name: String,
    pub original_name: String,
    pub content_type: String,
    pub file_size_bytes: u64,
    pub is_original_file: bool,
    pub operations_string: String,
    pub versions_num: u32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub url: FileUrl,
}

/// A label the classification service attached to an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedLabel {
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// A localized object with its bounding polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub bounding_poly: Vec<Vertex>,
}

/// Classification document served for a hosted image.
///
/// `safe_search` maps category names (`adult`, `racy`, `violence`, ...) to
/// likelihood strings such as `VERY_LIKELY`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageInsights {
    #[serde(default)]
    pub labels: Vec<DetectedLabel>,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub safe_search: BTreeMap<String, String>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub public_key: String,
    pub secret_key: String,
    pub base_api_url: String,
    pub api_version: String,
    pub signature_expiration: i64,
    pub mappings_file: String,
}

impl Config {
    pub const DEFAULT_API_URL: &'static str = "https://uplycdn.com/api";
    pub const DEFAULT_API_VERSION: &'static str = "v1";
    pub const DEFAULT_SIGNATURE_EXPIRATION: i64 = 60 * 60 * 24;
    pub const DEFAULT_MAPPINGS_FILE: &'static str = "uplyfile.json";

    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let signature_expiration = match std::env::var("UPLYFILE_SIGNATURE_EXPIRATION") {
            Ok(raw) => raw.parse::<i64>().map_err(|_| {
                crate::Error::Config(format!(
                    "UPLYFILE_SIGNATURE_EXPIRATION is not an integer: {}",
                    raw
                ))
            })?,
            Err(_) => Self::DEFAULT_SIGNATURE_EXPIRATION,
        };

        Self::validate_expiration(signature_expiration)?;

        Ok(Self {
            public_key: std::env::var("UPLYFILE_PUBLIC_KEY")
                .map_err(|_| crate::Error::Config("UPLYFILE_PUBLIC_KEY not set".to_string()))?,
            secret_key: std::env::var("UPLYFILE_SECRET_KEY")
                .map_err(|_| crate::Error::Config("UPLYFILE_SECRET_KEY not set".to_string()))?,
            base_api_url: std::env::var("UPLYFILE_API_URL")
                .unwrap_or_else(|_| Self::DEFAULT_API_URL.to_string()),
            api_version: std::env::var("UPLYFILE_API_VERSION")
                .unwrap_or_else(|_| Self::DEFAULT_API_VERSION.to_string()),
            signature_expiration,
            mappings_file: std::env::var("UPLYFILE_MAPPINGS_FILE")
                .unwrap_or_else(|_| Self::DEFAULT_MAPPINGS_FILE.to_string()),
        })
    }

    pub fn validate_expiration(seconds: i64) -> crate::Result<()> {
        if seconds < 0 {
            return Err(crate::Error::Config(
                "Expiration time can't have a negative value".to_string(),
            ));
        }
        Ok(())
    }
}
