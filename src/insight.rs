//! Content-inspection fetches for hosted images
//!
//! The CDN serves a classification document for every hosted image under
//! the `info` operation token. [`ImageInspector`] fetches that document and
//! reshapes it into label lists, object details and explicit-content
//! checks. No classification happens locally.

use crate::image::UplyImage;
use crate::models::{DetectedObject, ImageInsights};
use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Likelihood levels that count as a positive classification.
const EXPLICIT_LIKELIHOODS: [&str; 3] = ["VERY_LIKELY", "LIKELY", "POSSIBLE"];

pub struct ImageInspector {
    client: Client,
}

impl ImageInspector {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    fn info_url(image: &UplyImage) -> String {
        format!(
            "{}info/{}{}",
            image.base_url(),
            image.stem(),
            image.extension()
        )
    }

    pub async fn fetch(&self, image: &UplyImage) -> Result<ImageInsights> {
        let url = Self::info_url(image);
        tracing::debug!("Fetching image insights from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!("Failed to fetch image insights: {}", e);
            e
        })?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "Permission denied, check your API keys. Detailed info: {}",
                body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "API error (status {}): {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse insights document: {}\nBody: {}", e, body);
            Error::Api(format!("Failed to parse insights document: {}", e))
        })
    }

    /// Descriptions of every label attached to the image.
    pub async fn labels(&self, image: &UplyImage) -> Result<Vec<String>> {
        let insights = self.fetch(image).await?;
        Ok(insights
            .labels
            .into_iter()
            .map(|label| label.description)
            .collect())
    }

    /// Names of every localized object.
    pub async fn objects(&self, image: &UplyImage) -> Result<Vec<String>> {
        let insights = self.fetch(image).await?;
        Ok(insights.objects.into_iter().map(|obj| obj.name).collect())
    }

    /// Localized objects with scores and bounding polygons.
    pub async fn object_details(&self, image: &UplyImage) -> Result<Vec<DetectedObject>> {
        Ok(self.fetch(image).await?.objects)
    }

    /// SafeSearch categories whose likelihood is at least `POSSIBLE`.
    pub async fn explicit_categories(&self, image: &UplyImage) -> Result<Vec<String>> {
        let insights = self.fetch(image).await?;
        Ok(explicit_categories_of(&insights))
    }

    /// True when the `adult` likelihood is at least `POSSIBLE`.
    pub async fn is_adult(&self, image: &UplyImage) -> Result<bool> {
        let insights = self.fetch(image).await?;
        Ok(explicit_categories_of(&insights)
            .iter()
            .any(|category| category == "adult"))
    }

    /// Comma-joined label descriptions, usable as an `alt` attribute.
    pub async fn alt_text(&self, image: &UplyImage) -> Result<String> {
        Ok(self.labels(image).await?.join(", "))
    }
}

impl Default for ImageInspector {
    fn default() -> Self {
        Self::new()
    }
}

fn explicit_categories_of(insights: &ImageInsights) -> Vec<String> {
    insights
        .safe_search
        .iter()
        .filter(|(_, likelihood)| EXPLICIT_LIKELIHOODS.contains(&likelihood.as_str()))
        .map(|(category, _)| category.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn insights_body() -> serde_json::Value {
        serde_json::json!({
            "labels": [
                {"description": "dog", "score": 0.98},
                {"description": "grass", "score": 0.81}
            ],
            "objects": [
                {
                    "name": "Dog",
                    "score": 0.92,
                    "bounding_poly": [
                        {"x": 0.1, "y": 0.2},
                        {"x": 0.8, "y": 0.2},
                        {"x": 0.8, "y": 0.9},
                        {"x": 0.1, "y": 0.9}
                    ]
                }
            ],
            "safe_search": {
                "adult": "VERY_UNLIKELY",
                "medical": "UNLIKELY",
                "racy": "POSSIBLE",
                "spoof": "LIKELY",
                "violence": "VERY_UNLIKELY"
            }
        })
    }

    async fn mounted_image(server: &MockServer, body: serde_json::Value) -> UplyImage {
        Mock::given(method("GET"))
            .and(path("/P1/F1/info/pic.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;

        UplyImage::parse(&format!("{}/P1/F1/pic.jpg", server.uri())).unwrap()
    }

    #[test]
    fn test_info_url_ignores_pending_operations() {
        let image = UplyImage::parse("https://uplycdn.com/P1/F1/pic.jpg")
            .unwrap()
            .blur(None);
        assert_eq!(
            ImageInspector::info_url(&image),
            "https://uplycdn.com/P1/F1/info/pic.jpg"
        );
    }

    #[tokio::test]
    async fn test_labels_extracts_descriptions() {
        let server = MockServer::start().await;
        let image = mounted_image(&server, insights_body()).await;

        let labels = ImageInspector::new().labels(&image).await.unwrap();
        assert_eq!(labels, vec!["dog", "grass"]);
    }

    #[tokio::test]
    async fn test_objects_and_details() {
        let server = MockServer::start().await;
        let image = mounted_image(&server, insights_body()).await;
        let inspector = ImageInspector::new();

        let objects = inspector.objects(&image).await.unwrap();
        assert_eq!(objects, vec!["Dog"]);

        let details = inspector.object_details(&image).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].bounding_poly.len(), 4);
        assert!(details[0].score > 0.9);
    }

    #[tokio::test]
    async fn test_explicit_categories_filters_by_likelihood() {
        let server = MockServer::start().await;
        let image = mounted_image(&server, insights_body()).await;

        let categories = ImageInspector::new()
            .explicit_categories(&image)
            .await
            .unwrap();
        assert_eq!(categories, vec!["racy", "spoof"]);
    }

    #[tokio::test]
    async fn test_is_adult_respects_allow_list() {
        let server = MockServer::start().await;
        let image = mounted_image(
            &server,
            serde_json::json!({"safe_search": {"adult": "POSSIBLE"}}),
        )
        .await;

        assert!(ImageInspector::new().is_adult(&image).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_adult_false_for_unlikely() {
        let server = MockServer::start().await;
        let image = mounted_image(&server, insights_body()).await;

        assert!(!ImageInspector::new().is_adult(&image).await.unwrap());
    }

    #[tokio::test]
    async fn test_alt_text_joins_labels() {
        let server = MockServer::start().await;
        let image = mounted_image(&server, insights_body()).await;

        let alt = ImageInspector::new().alt_text(&image).await.unwrap();
        assert_eq!(alt, "dog, grass");
    }

    #[tokio::test]
    async fn test_missing_document_surfaces_api_error() {
        let server = MockServer::start().await;
        let image = UplyImage::parse(&format!("{}/P1/F1/pic.jpg", server.uri())).unwrap();

        let err = ImageInspector::new().labels(&image).await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
    }
}
