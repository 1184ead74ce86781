use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of source file a document was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Pdf,
    Text,
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocKind::Pdf => write!(f, "pdf"),
            DocKind::Text => write!(f, "text"),
        }
    }
}

/// One ingested source file. PDF pages are merged into a single document
/// before chunking so that chunk boundaries follow semantic units rather
/// than page breaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source_name: String,
    pub kind: DocKind,
    pub raw_text: String,
    /// Inclusive page range the text covers, for PDFs.
    pub page_range: Option<(usize, usize)>,
}

/// Inbound request: a photo plus the user's free-text state description.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: Vec<u8>,
    pub user_state: String,
}

/// Outbound result of one analysis request.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub status: String,
    pub analysis: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn success(analysis: Map<String, Value>, references: Vec<String>) -> Self {
        Self {
            status: "success".to_string(),
            analysis,
            references: Some(references),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            analysis: Map::new(),
            references: None,
            error: Some(message.into()),
        }
    }
}

/// Typed view over a cleanly parsed analysis. Degraded extractions stay as
/// raw JSON and never pass through this struct.
#[derive(Debug, Clone, Deserialize)]
pub struct CoachingReport {
    pub skin_condition: ReportCategory,
    pub lifestyle_factors: ReportCategory,
    pub care_routine: ReportCategory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportCategory {
    pub summary: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl CoachingReport {
    /// Try to interpret an extracted analysis as the expected three-category
    /// report. Returns `None` for degraded or off-schema output.
    pub fn from_analysis(analysis: &Map<String, Value>) -> Option<Self> {
        serde_json::from_value(Value::Object(analysis.clone())).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes() {
        let ok = AnalysisResponse::success(Map::new(), vec!["paper.pdf".to_string()]);
        assert_eq!(ok.status, "success");
        assert!(ok.error.is_none());

        let err = AnalysisResponse::error("upload failed");
        assert_eq!(err.status, "error");
        assert!(err.analysis.is_empty());
        assert_eq!(err.error.as_deref(), Some("upload failed"));
    }

    #[test]
    fn test_coaching_report_from_analysis() {
        let json = serde_json::json!({
            "skin_condition": { "summary": "mild puffiness", "tips": ["cold compress"] },
            "lifestyle_factors": { "summary": "high sodium intake" },
            "care_routine": { "summary": "keep it simple", "tips": [] }
        });
        let Value::Object(map) = json else { unreachable!() };
        let report = CoachingReport::from_analysis(&map).unwrap();
        assert_eq!(report.skin_condition.tips.len(), 1);
        assert!(report.lifestyle_factors.tips.is_empty());
    }

    #[test]
    fn test_coaching_report_rejects_degraded() {
        let json = serde_json::json!({
            "raw_response": "no json here",
            "error": "extraction failed",
            "parsing_attempted": true
        });
        let Value::Object(map) = json else { unreachable!() };
        assert!(CoachingReport::from_analysis(&map).is_none());
    }
}
