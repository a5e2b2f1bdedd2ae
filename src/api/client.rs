use super::sign::{self, SignedHeaders};
use super::{etag, UplyApi};
use crate::models::{Config, HostedFile};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Signed reqwest client for the Uplyfile API.
///
/// Keeps an in-memory etag cache of the last project listing so repeated
/// dedup lookups don't refetch the listing.
pub struct UplyClient {
    client: Client,
    public_key: String,
    secret_key: String,
    signature_expiration: i64,
    base_api_url: String,
    api_version: String,
    cache: Mutex<HashMap<String, HostedFile>>,
}

impl UplyClient {
    pub fn new(public_key: String, secret_key: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            public_key,
            secret_key,
            signature_expiration: Config::DEFAULT_SIGNATURE_EXPIRATION,
            base_api_url: Config::DEFAULT_API_URL.to_string(),
            api_version: Config::DEFAULT_API_VERSION.to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Config::validate_expiration(config.signature_expiration)?;
        Ok(Self::new(config.public_key.clone(), config.secret_key.clone())
            .with_base_url(config.base_api_url.clone())
            .with_api_version(config.api_version.clone())
            .with_signature_expiration(config.signature_expiration))
    }

    pub fn with_base_url(mut self, base_api_url: String) -> Self {
        self.base_api_url = base_api_url;
        self
    }

    pub fn with_api_version(mut self, api_version: String) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_signature_expiration(mut self, seconds: i64) -> Self {
        self.signature_expiration = seconds;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_api_url.trim_end_matches('/'),
            self.api_version,
            path
        )
    }

    fn signed(&self) -> SignedHeaders {
        SignedHeaders::new(&self.public_key, &self.secret_key, self.signature_expiration)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Uplyfile rejected request credentials: {}", body);
            return Err(Error::Auth(format!(
                "Permission denied, check your API keys. Detailed info: {}",
                body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Uplyfile API error (status {}): {}", status, body);
            return Err(Error::Api(format!(
                "API error (status {}): {}",
                status, body
            )));
        }
        Ok(response)
    }

    fn refresh_cache(&self, files: &[HostedFile]) {
        let mut cache = self.cache.lock().expect("etag cache poisoned");
        *cache = files
            .iter()
            .map(|file| (file.etag.clone(), file.clone()))
            .collect();
    }

    fn cached_url(&self, etag: &str) -> Option<String> {
        let cache = self.cache.lock().expect("etag cache poisoned");
        cache.get(etag).map(|file| file.url.full.clone())
    }

    fn cache_is_empty(&self) -> bool {
        self.cache.lock().expect("etag cache poisoned").is_empty()
    }
}

#[async_trait]
impl UplyApi for UplyClient {
    async fn list_project_files(&self) -> Result<Vec<HostedFile>> {
        let url = self.endpoint("files/");
        let headers = self.signed();

        tracing::debug!("Listing project files from {}", url);
        let response = self
            .client
            .get(&url)
            .header(sign::PUBLIC_KEY_HEADER, &headers.public_key)
            .header(sign::EXPIRES_HEADER, &headers.expires)
            .header(sign::SIGNATURE_HEADER, &headers.signature)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to list project files: {}", e);
                e
            })?;

        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        let files: Vec<HostedFile> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse project listing: {}\nBody: {}", e, body);
            Error::Api(format!("Failed to parse project listing: {}", e))
        })?;

        self.refresh_cache(&files);
        Ok(files)
    }

    async fn upload(&self, name: &str, content: &[u8]) -> Result<String> {
        let url = self.endpoint("upload/");
        let headers = self.signed();
        let mime = mime_guess::from_path(name).first_or_octet_stream();

        let part = multipart::Part::bytes(content.to_vec())
            .file_name(name.to_string())
            .mime_str(mime.as_ref())?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!("Uploading {} ({} bytes)", name, content.len());
        let response = self
            .client
            .post(&url)
            .header(sign::PUBLIC_KEY_HEADER, &headers.public_key)
            .header(sign::EXPIRES_HEADER, &headers.expires)
            .header(sign::SIGNATURE_HEADER, &headers.signature)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to upload {}: {}", name, e);
                e
            })?;

        let response = Self::check_status(response).await?;
        // The API redirects to the hosted file; the final URL after
        // redirects is the file's address.
        Ok(response.url().to_string())
    }

    async fn file_exists(&self, url: &str) -> Result<bool> {
        let response = self.client.head(url).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    async fn file_url_for(&self, content: &[u8], use_cached: bool) -> Result<Option<String>> {
        let etag = etag::etag_of(content);

        if !use_cached || self.cache_is_empty() {
            self.list_project_files().await?;
        }

        Ok(self.cached_url(&etag))
    }
}
