//! Filename-to-URL mapping cache
//!
//! A flat JSON object on disk associating logical file names with their
//! hosted URLs. The whole document is read at load and written wholesale by
//! [`FileUrlMapper::persist`]; dropping the mapper flushes as a last
//! resort so no exit path loses updates silently.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileUrlMapper {
    path: PathBuf,
    mappings: BTreeMap<String, String>,
}

impl FileUrlMapper {
    /// Load mappings from `path`. A missing or unreadable document starts
    /// the mapper empty; the error is logged, matching a first run.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mappings = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(mappings) => mappings,
                Err(e) => {
                    tracing::error!(
                        "Error occurred while reading mappings file {}: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) => {
                tracing::error!(
                    "Error occurred while reading mappings file {}: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }
        };

        Self { path, mappings }
    }

    /// Record a mapping in memory. Last write wins; nothing touches disk
    /// until [`persist`](Self::persist).
    pub fn save(&mut self, filename: &str, url: &str) {
        self.mappings.insert(filename.to_string(), url.to_string());
    }

    pub fn get(&self, filename: &str) -> Result<String> {
        self.mappings.get(filename).cloned().ok_or_else(|| {
            Error::NotMapped(format!("Filename {} not mapped to any URL", filename))
        })
    }

    pub fn is_mapped(&self, filename: &str) -> bool {
        self.mappings.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Overwrite the mappings document with the in-memory state.
    pub fn persist(&self) -> Result<()> {
        let encoded = serde_json::to_string(&self.mappings)?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }
}

impl Drop for FileUrlMapper {
    fn drop(&mut self) {
        if let Err(e) = self.persist() {
            tracing::error!(
                "Error occurred while writing mappings file {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
