use std::path::PathBuf;
use thiserror::Error;

/// Terminal failures of the analysis pipeline.
///
/// Per-file ingestion errors, lexical-index degradation, rewrite failures and
/// malformed model output are all handled in place and never surface through
/// this type.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The persisted vector index is missing or unreadable. Fatal at startup.
    #[error("vector index unavailable at {path}: {reason}")]
    IndexUnavailable { path: PathBuf, reason: String },

    /// Image upload failed before retrieval ran. Fatal to the request.
    #[error("image upload failed: {0}")]
    UploadFailed(String),

    /// The generation call itself failed. Fatal to the request.
    #[error("generation call failed: {0}")]
    GenerationFailed(String),

    /// The generation call returned an empty string.
    #[error("model returned an empty response")]
    EmptyResponse,
}
