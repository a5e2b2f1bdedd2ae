use super::{etag, UplyApi};
use crate::models::{FileUrl, HostedFile};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory stand-in for the Uplyfile API, for tests and dry runs.
#[derive(Clone)]
pub struct MockUplyClient {
    files: Arc<Mutex<Vec<HostedFile>>>,
    cache: Arc<Mutex<HashMap<String, String>>>,
    base_url: String,
    list_count: Arc<Mutex<usize>>,
    upload_count: Arc<Mutex<usize>>,
}

impl MockUplyClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(Vec::new())),
            cache: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://uplycdn.com/MockPrj".to_string(),
            list_count: Arc::new(Mutex::new(0)),
            upload_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Pre-seed the project with a hosted file.
    pub fn with_hosted_content(self, name: &str, content: &[u8]) -> Self {
        let file = self.hosted_file(name, content);
        self.files.lock().unwrap().push(file);
        self
    }

    pub fn get_list_count(&self) -> usize {
        *self.list_count.lock().unwrap()
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    fn hosted_file(&self, name: &str, content: &[u8]) -> HostedFile {
        let etag = etag::etag_of(content);
        let uid: String = etag.chars().take(12).collect();
        let now = Utc::now();
        HostedFile {
            etag,
            uid: uid.clone(),
            project_name: "MockPrj".to_string(),
            original_name: name.to_string(),
            content_type: mime_guess::from_path(name)
                .first_or_octet_stream()
                .to_string(),
            file_size_bytes: content.len() as u64,
            is_original_file: true,
            operations_string: String::new(),
            versions_num: 0,
            created: now,
            modified: now,
            url: FileUrl {
                base: format!("{}/{}", self.base_url, uid),
                full: format!("{}/{}/{}", self.base_url, uid, name),
                name: name.to_string(),
                operational: format!("{}/{}/", self.base_url, uid),
            },
        }
    }

    fn rebuild_cache(&self, files: &[HostedFile]) {
        let mut cache = self.cache.lock().unwrap();
        *cache = files
            .iter()
            .map(|file| (file.etag.clone(), file.url.full.clone()))
            .collect();
    }
}

impl Default for MockUplyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UplyApi for MockUplyClient {
    async fn list_project_files(&self) -> Result<Vec<HostedFile>> {
        let mut count = self.list_count.lock().unwrap();
        *count += 1;

        let files = self.files.lock().unwrap().clone();
        self.rebuild_cache(&files);
        Ok(files)
    }

    async fn upload(&self, name: &str, content: &[u8]) -> Result<String> {
        let mut count = self.upload_count.lock().unwrap();
        *count += 1;

        let file = self.hosted_file(name, content);
        let url = file.url.full.clone();
        self.files.lock().unwrap().push(file);
        Ok(url)
    }

    async fn file_exists(&self, url: &str) -> Result<bool> {
        let files = self.files.lock().unwrap();
        Ok(files.iter().any(|file| file.url.full == url))
    }

    async fn file_url_for(&self, content: &[u8], use_cached: bool) -> Result<Option<String>> {
        let needs_refresh = !use_cached || self.cache.lock().unwrap().is_empty();
        if needs_refresh {
            self.list_project_files().await?;
        }

        let etag = etag::etag_of(content);
        Ok(self.cache.lock().unwrap().get(&etag).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uploaded_content_resolves_to_same_url() {
        let client = MockUplyClient::new();

        let uploaded = client.upload("sans.webp", b"skeleton").await.unwrap();
        let resolved = client.file_url_for(b"skeleton", false).await.unwrap();

        assert_eq!(resolved.as_deref(), Some(uploaded.as_str()));
    }

    #[tokio::test]
    async fn test_unknown_content_resolves_to_none() {
        let client = MockUplyClient::new().with_hosted_content("dog.webp", b"dog");
        let resolved = client.file_url_for(b"cat", false).await.unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_cached_lookup_lists_at_most_once() {
        let client = MockUplyClient::new().with_hosted_content("dog.webp", b"dog");

        client.file_url_for(b"dog", true).await.unwrap();
        client.file_url_for(b"dog", true).await.unwrap();

        assert_eq!(client.get_list_count(), 1);
    }

    #[tokio::test]
    async fn test_file_exists_matches_full_url() {
        let client = MockUplyClient::new();
        let url = client.upload("a.txt", b"abc").await.unwrap();

        assert!(client.file_exists(&url).await.unwrap());
        assert!(!client
            .file_exists("https://uplycdn.com/MockPrj/none/a.txt")
            .await
            .unwrap());
    }
}
