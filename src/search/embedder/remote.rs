use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{l2_normalize, Embedder};

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint (a local TEI or
/// vLLM server in the usual deployment). Vectors are normalized client-side
/// so cosine ranking does not depend on server configuration.
pub struct RemoteEmbedder {
    endpoint: String,
    model: String,
    dimensions: usize,
    client: Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    index: usize,
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(endpoint: &str, model: &str, dimensions: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            client,
        }
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow!(
                        "Cannot connect to embedding server at {}. Is it running?",
                        self.endpoint
                    )
                } else {
                    anyhow!("Embedding request failed: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Embedding server error ({}): {}", status, body));
        }

        let embed_response: EmbedResponse = response.json().await?;

        // The API does not guarantee response order
        let mut items = embed_response.data;
        items.sort_by_key(|item| item.index);

        if items.len() != texts.len() {
            return Err(anyhow!(
                "Embedding server returned {} vectors for {} inputs",
                items.len(),
                texts.len()
            ));
        }

        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            if item.embedding.len() != self.dimensions {
                return Err(anyhow!(
                    "Expected {}-dim embeddings, got {}",
                    self.dimensions,
                    item.embedding.len()
                ));
            }
            let mut vector = item.embedding;
            l2_normalize(&mut vector);
            vectors.push(vector);
        }

        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<()> {
        let probe = self.embed_batch(&["ping".to_string()]).await?;
        if probe.is_empty() {
            return Err(anyhow!("Embedding server health check returned nothing"));
        }
        Ok(())
    }
}
