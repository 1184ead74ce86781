use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::llm::ImageDetail;

/// Top-level application configuration. Every section has working defaults;
/// a `skinlens.toml` in the working directory overrides them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub upload: UploadConfig,
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder holding the source corpus (PDF and TXT papers).
    pub data_dir: PathBuf,
    /// Persisted vector index file.
    pub index_path: PathBuf,
    /// Per-request analysis logs.
    pub logs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/papers"),
            index_path: PathBuf::from("index/chunks.json"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks shorter than this after whitespace trimming are discarded.
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
            min_chunk_size: 240,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// RRF rank constant, 60 per the original paper.
    pub rrf_k: f32,
    /// Run the vision-model query-rewrite stage before retrieval.
    pub query_rewrite: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            rrf_k: 60.0,
            query_rewrite: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint.
    pub endpoint: String,
    pub model: String,
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            model: "intfloat/multilingual-e5-large".to_string(),
            dimensions: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat endpoint.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub image_detail: ImageDetail,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            image_detail: ImageDetail::Low,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Image host upload endpoint.
    pub endpoint: String,
    /// How long uploaded images stay accessible.
    pub ttl_minutes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9090/upload".to_string(),
            ttl_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Per-hit preview length in the prompt, in characters.
    pub preview_chars: usize,
    /// Per-hit preview length in the persisted log.
    pub log_preview_chars: usize,
    /// Pass full chunk text to the model instead of previews.
    pub full_content_in_prompt: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            preview_chars: 200,
            log_preview_chars: 300,
            full_content_in_prompt: false,
        }
    }
}

/// Snapshot of the settings that shape one analysis, echoed into every
/// persisted log record.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub generation_model: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub image_detail: ImageDetail,
}

impl AppConfig {
    pub const DEFAULT_FILE: &'static str = "skinlens.toml";

    /// Load configuration, overlaying `path` (or `skinlens.toml` if present)
    /// on top of the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_FILE));

        if !candidate.exists() {
            if path.is_some() {
                anyhow::bail!("config file not found: {}", candidate.display());
            }
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&candidate)
            .with_context(|| format!("failed to read {}", candidate.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", candidate.display()))?;
        Ok(config)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            generation_model: self.generation.model.clone(),
            embedding_model: self.embedding.model.clone(),
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
            top_k: self.retrieval.top_k,
            image_detail: self.generation.image_detail,
        }
    }
}
