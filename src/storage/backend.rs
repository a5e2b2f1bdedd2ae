use super::BlobStorage;
use crate::api::{UplyApi, UplyClient};
use crate::mapper::FileUrlMapper;
use crate::models::Config;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Uplyfile-backed blob storage.
///
/// Uploads are deduplicated against the project listing by content etag;
/// resolved URLs are recorded in the mapper, which flushes to its JSON
/// document on [`persist`](UplyStorage::persist) and on drop.
pub struct UplyStorage {
    api: Box<dyn UplyApi>,
    mapper: Mutex<FileUrlMapper>,
    http: Client,
}

impl UplyStorage {
    pub fn new(api: Box<dyn UplyApi>, mapper: FileUrlMapper) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            api,
            mapper: Mutex::new(mapper),
            http,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api = UplyClient::from_config(config)?;
        let mapper = FileUrlMapper::load(&config.mappings_file);
        Ok(Self::new(Box::new(api), mapper))
    }

    /// Store a local file under its own file name.
    pub async fn save_path(&self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidPath(format!("{} has no file name", path.display())))?
            .to_string();
        let content = std::fs::read(path)?;
        self.save(&name, &content).await
    }

    /// Flush the mapper to its JSON document now.
    pub fn persist(&self) -> Result<()> {
        self.mapper.lock().expect("mapper poisoned").persist()
    }

    fn mapped_url(&self, name: &str) -> Result<String> {
        self.mapper.lock().expect("mapper poisoned").get(name)
    }
}

#[async_trait]
impl BlobStorage for UplyStorage {
    async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
        let url = match self.api.file_url_for(content, true).await? {
            Some(url) => {
                tracing::debug!("{} already hosted at {}", name, url);
                url
            }
            None => self.api.upload(name, content).await?,
        };

        self.mapper
            .lock()
            .expect("mapper poisoned")
            .save(name, &url);
        Ok(name.to_string())
    }

    async fn open(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.mapped_url(name)?;

        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::Api(format!(
                "File {} isn't uploaded to Uplyfile",
                name
            )));
        }
        let response = response.error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let url = match self.mapped_url(name) {
            Ok(url) => url,
            Err(Error::NotMapped(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        self.api.file_exists(&url).await
    }

    fn url(&self, name: &str) -> Result<String> {
        self.mapped_url(name)
    }

    fn validate_name(&self, name: &str) -> String {
        deunicode::deunicode(name)
    }
}
