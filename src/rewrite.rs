use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, ChatModel, ImageDetail};

const REWRITE_PROMPT: &str = "\
Look at the attached photo and the user's state description. Produce a search \
query for a corpus of dermatology and nutrition papers that would best support \
coaching this user, plus a short structured reading of the photo.

Respond with a single JSON object and nothing else:

{
  \"search_query\": \"...\",
  \"image_analysis\": { \"visible_features\": [\"...\"], \"overall_impression\": \"...\" }
}";

/// What a successful rewrite carries forward: the substituted retrieval
/// query and the model's structured reading of the photo, kept for
/// provenance logging.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteOutcome {
    pub search_query: String,
    #[serde(default)]
    pub image_analysis: Value,
}

/// Optional pre-retrieval stage that asks the vision model for a better
/// search query. Never fails outward: any model error, unparseable reply or
/// empty query resolves to `None` and the caller retrieves with the raw
/// user text.
pub struct QueryRewriter {
    model: Arc<dyn ChatModel>,
}

impl QueryRewriter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn rewrite(
        &self,
        user_state: &str,
        image_url: &str,
        detail: ImageDetail,
    ) -> Option<RewriteOutcome> {
        let messages = vec![
            ChatMessage::system(REWRITE_PROMPT),
            ChatMessage::user_with_image(
                format!("User state: {user_state}"),
                image_url,
                detail,
            ),
        ];

        let reply = match self.model.generate(&messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("query rewrite call failed, using raw user text: {e:#}");
                return None;
            }
        };

        match parse_reply(&reply) {
            Some(outcome) => {
                debug!(search_query = %outcome.search_query, "query rewritten");
                Some(outcome)
            }
            None => {
                warn!("query rewrite reply unusable, using raw user text");
                None
            }
        }
    }
}

fn parse_reply(reply: &str) -> Option<RewriteOutcome> {
    let trimmed = reply.trim();

    let parsed: Option<RewriteOutcome> = serde_json::from_str(trimmed).ok().or_else(|| {
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        serde_json::from_str(&trimmed[start..=end]).ok()
    });

    parsed.filter(|outcome| !outcome.search_query.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    struct CannedModel {
        reply: Result<String, String>,
    }

    impl CannedModel {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("boom".to_string()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn generate(&self, _messages: &[ChatMessage]) -> Result<String> {
            self.reply
                .clone()
                .map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[tokio::test]
    async fn test_rewrite_success() {
        let model = CannedModel::ok(
            "{\"search_query\": \"sodium facial edema\", \"image_analysis\": {\"overall_impression\": \"puffy\"}}",
        );
        let rewriter = QueryRewriter::new(model);

        let outcome = rewriter
            .rewrite("I ate ramen late", "https://img/x.jpg", ImageDetail::Low)
            .await
            .unwrap();
        assert_eq!(outcome.search_query, "sodium facial edema");
        assert_eq!(outcome.image_analysis["overall_impression"], "puffy");
    }

    #[tokio::test]
    async fn test_rewrite_recovers_json_from_prose() {
        let model = CannedModel::ok("Sure! {\"search_query\": \"water retention\"} hope that helps");
        let rewriter = QueryRewriter::new(model);

        let outcome = rewriter
            .rewrite("puffy", "https://img/x.jpg", ImageDetail::Low)
            .await
            .unwrap();
        assert_eq!(outcome.search_query, "water retention");
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_none() {
        let model = CannedModel::ok("I cannot answer in JSON today");
        let rewriter = QueryRewriter::new(model);

        assert!(rewriter
            .rewrite("puffy", "https://img/x.jpg", ImageDetail::Low)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_search_query_is_none() {
        let model = CannedModel::ok("{\"search_query\": \"  \"}");
        let rewriter = QueryRewriter::new(model);

        assert!(rewriter
            .rewrite("puffy", "https://img/x.jpg", ImageDetail::Low)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_model_failure_is_none() {
        let rewriter = QueryRewriter::new(CannedModel::failing());

        assert!(rewriter
            .rewrite("puffy", "https://img/x.jpg", ImageDetail::Low)
            .await
            .is_none());
    }
}
