use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::PipelineError;

/// Widest brace-delimited span: first `{` to last `}`. One recovery
/// candidate, one parse attempt, matching the upstream extraction policy.
static BRACE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Extract the structured analysis from raw model output.
///
/// Tiered: parse the whole trimmed text; else parse the widest
/// brace-delimited substring; else return a degraded object carrying the raw
/// text and a failure flag. Only an empty input is an error — callers never
/// see a parse failure from the fallback tiers.
pub fn extract_analysis(text: &str) -> Result<Map<String, Value>, PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::EmptyResponse);
    }

    let trimmed = text.trim();
    if let Some(map) = parse_object(trimmed) {
        return Ok(map);
    }

    if let Some(span) = BRACE_SPAN.find(trimmed) {
        if let Some(map) = parse_object(span.as_str().trim()) {
            return Ok(map);
        }
    }

    warn!("JSON extraction failed, returning raw response");
    let mut degraded = Map::new();
    degraded.insert(
        "raw_response".to_string(),
        Value::String(text.to_string()),
    );
    degraded.insert(
        "error".to_string(),
        Value::String("failed to parse model output as JSON".to_string()),
    );
    degraded.insert("parsing_attempted".to_string(), Value::Bool(true));
    Ok(degraded)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
