use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::extract::extract_analysis;
use crate::llm::ChatModel;
use crate::logger::{AnalysisLogger, InputEcho, LogRecord, RetrievalRecord};
use crate::prompt;
use crate::rewrite::QueryRewriter;
use crate::search::{reciprocal_rank_fusion, Embedder, FusedHit, HybridRetriever, VectorStore};
use crate::types::{AnalysisRequest, AnalysisResponse};
use crate::upload::ImageHost;

/// The analysis pipeline as one explicit service object, constructed at
/// process start and shared by reference across requests. Collaborators are
/// injected; only the retriever's lexical index holds lazily built state.
pub struct AnalysisService {
    config: AppConfig,
    retriever: HybridRetriever,
    model: Arc<dyn ChatModel>,
    image_host: Arc<dyn ImageHost>,
    rewriter: Option<QueryRewriter>,
    logger: AnalysisLogger,
}

impl AnalysisService {
    /// Build the service over a persisted index. A missing or corrupt index
    /// is fatal here — the service refuses to start rather than serve
    /// requests it cannot answer.
    pub async fn open(
        config: AppConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
        image_host: Arc<dyn ImageHost>,
    ) -> Result<Self, PipelineError> {
        if let Err(e) = store.load().await {
            return Err(PipelineError::IndexUnavailable {
                path: config.paths.index_path.clone(),
                reason: format!("{e:#}"),
            });
        }

        let retriever = HybridRetriever::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            config.retrieval.top_k,
        );
        let rewriter = config
            .retrieval
            .query_rewrite
            .then(|| QueryRewriter::new(Arc::clone(&model)));
        let logger = AnalysisLogger::new(config.paths.logs_dir.clone());

        Ok(Self {
            config,
            retriever,
            model,
            image_host,
            rewriter,
            logger,
        })
    }

    /// One request/response cycle. Upstream failures (upload, retrieval,
    /// generation) terminate the request as `status: "error"`; rewrite and
    /// extraction problems degrade instead. No call is retried.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResponse {
        // Upload before retrieval; on failure the pipeline aborts with
        // nothing logged
        let ttl = Duration::from_secs(self.config.upload.ttl_minutes * 60);
        let uploaded = match self.image_host.upload(&request.image, ttl).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                let err = PipelineError::UploadFailed(format!("{e:#}"));
                error!("{err}");
                return AnalysisResponse::error(err.to_string());
            }
        };
        info!(url = %uploaded.url, "image uploaded");

        let detail = self.config.generation.image_detail;

        let rewrite = match &self.rewriter {
            Some(rewriter) => {
                rewriter
                    .rewrite(&request.user_state, &uploaded.url, detail)
                    .await
            }
            None => None,
        };
        let query = rewrite
            .as_ref()
            .map(|r| r.search_query.as_str())
            .unwrap_or(request.user_state.as_str());

        let retrieved = match self.retriever.retrieve(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("retrieval failed: {e:#}");
                return AnalysisResponse::error(format!("retrieval failed: {e:#}"));
            }
        };
        if retrieved.lexical_degraded {
            warn!("serving dense-only results for this request");
        }

        let fused = reciprocal_rank_fusion(
            &retrieved.dense,
            &retrieved.lexical,
            self.config.retrieval.rrf_k,
            self.config.retrieval.top_k,
        );

        let messages = prompt::assemble_messages(
            &request.user_state,
            &fused,
            &uploaded.url,
            detail,
            &self.config.prompt,
        );

        let raw_response = match self.model.generate(&messages).await {
            Ok(text) => text,
            Err(e) => {
                let err = PipelineError::GenerationFailed(format!("{e:#}"));
                error!("{err}");
                return AnalysisResponse::error(err.to_string());
            }
        };

        let analysis = match extract_analysis(&raw_response) {
            Ok(map) => map,
            Err(e) => {
                error!("{e}");
                return AnalysisResponse::error(e.to_string());
            }
        };

        let record = LogRecord {
            timestamp: Utc::now(),
            config_snapshot: self.config.snapshot(),
            input: InputEcho {
                image_url: uploaded.url.clone(),
                user_state: request.user_state.clone(),
                search_query: rewrite.as_ref().map(|r| r.search_query.clone()),
                image_analysis: rewrite.map(|r| r.image_analysis),
            },
            retrieval: RetrievalRecord::from_hits(&fused, self.config.prompt.log_preview_chars),
            analysis: Value::Object(analysis.clone()),
        };
        if let Err(e) = self.logger.save(&record) {
            warn!("failed to persist analysis log: {e:#}");
        }

        AnalysisResponse::success(analysis, references_of(&fused))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Source names of the fused hits, best-first, first occurrence wins.
fn references_of(fused: &[FusedHit]) -> Vec<String> {
    let mut seen = Vec::new();
    for hit in fused {
        if !seen.contains(&hit.chunk.source_name) {
            seen.push(hit.chunk.source_name.clone());
        }
    }
    seen
}
