use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Image hosting capability. The pipeline only needs a short-lived URL the
/// vision model can fetch; hosting internals stay behind this seam.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &[u8], ttl: Duration) -> Result<UploadedImage>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    #[serde(default)]
    pub public_id: String,
    #[serde(alias = "secure_url")]
    pub url: String,
}

/// Multipart upload client for a Cloudinary-style image host. The uploaded
/// asset expires after the requested TTL.
pub struct HttpImageHost {
    endpoint: String,
    client: Client,
}

impl HttpImageHost {
    pub fn new(endpoint: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.to_string(),
            client,
        }
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload(&self, image: &[u8], ttl: Duration) -> Result<UploadedImage> {
        let file_id = Uuid::new_v4().to_string()[..8].to_string();
        let date = Utc::now().format("%Y-%m-%d");
        let file_name = format!("{file_id}_{date}.jpg");

        let part = Part::bytes(image.to_vec())
            .file_name(file_name)
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .part("file", part)
            .text("ttl_minutes", (ttl.as_secs() / 60).to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| anyhow!("Image upload request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Image host error ({}): {}", status, body));
        }

        let uploaded: UploadedImage = response.json().await?;
        if uploaded.url.is_empty() {
            return Err(anyhow!("Image host returned no URL"));
        }

        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_image_accepts_secure_url_alias() {
        let parsed: UploadedImage =
            serde_json::from_str("{\"public_id\": \"abc\", \"secure_url\": \"https://cdn/x.jpg\"}")
                .unwrap();
        assert_eq!(parsed.url, "https://cdn/x.jpg");

        let parsed: UploadedImage = serde_json::from_str("{\"url\": \"https://cdn/y.jpg\"}").unwrap();
        assert_eq!(parsed.url, "https://cdn/y.jpg");
        assert!(parsed.public_id.is_empty());
    }
}
