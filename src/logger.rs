use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::config::ConfigSnapshot;
use crate::search::FusedHit;
use crate::types::DocKind;

/// Immutable snapshot of one request: the configuration it ran under, the
/// inputs, full retrieval provenance and the final analysis. Written once,
/// never mutated.
#[derive(Debug, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub config_snapshot: ConfigSnapshot,
    pub input: InputEcho,
    pub retrieval: Vec<RetrievalRecord>,
    pub analysis: Value,
}

#[derive(Debug, Serialize)]
pub struct InputEcho {
    pub image_url: String,
    pub user_state: String,
    /// Rewritten retrieval query, when the rewrite stage ran and succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    /// Structured image reading carried forward from the rewrite stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<Value>,
}

/// Per-hit provenance. The prompt only ever sees a bounded preview; the log
/// keeps the full chunk text so retrieval quality stays auditable.
#[derive(Debug, Serialize)]
pub struct RetrievalRecord {
    pub rank: usize,
    pub source: String,
    pub kind: DocKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<(usize, usize)>,
    pub dense_score: Option<f32>,
    pub lexical_score: Option<f32>,
    pub rrf_score: f32,
    pub content_preview: String,
    pub full_content: String,
}

impl RetrievalRecord {
    pub fn from_hits(hits: &[FusedHit], preview_chars: usize) -> Vec<Self> {
        hits.iter()
            .enumerate()
            .map(|(i, hit)| Self {
                rank: i + 1,
                source: hit.chunk.source_name.clone(),
                kind: hit.chunk.kind,
                page: hit.chunk.page_range,
                dense_score: hit.dense_score,
                lexical_score: hit.lexical_score,
                rrf_score: hit.rrf_score,
                content_preview: hit.chunk.text.chars().take(preview_chars).collect(),
                full_content: hit.chunk.text.clone(),
            })
            .collect()
    }
}

/// Writes one JSON file per analyzed request into the logs folder.
pub struct AnalysisLogger {
    log_dir: PathBuf,
}

impl AnalysisLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn save(&self, record: &LogRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.log_dir)
            .with_context(|| format!("cannot create log dir {}", self.log_dir.display()))?;

        let stamp = record.timestamp.format("%Y%m%d_%H%M%S");
        let short_id = Uuid::new_v4().to_string()[..8].to_string();
        let path = self.log_dir.join(format!("analysis_{stamp}_{short_id}.json"));

        let json = serde_json::to_vec_pretty(record)?;
        fs::write(&path, json)
            .with_context(|| format!("cannot write log file {}", path.display()))?;

        info!(path = %path.display(), "analysis log saved");
        Ok(path)
    }
}
