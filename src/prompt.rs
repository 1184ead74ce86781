use crate::config::PromptConfig;
use crate::llm::{ChatMessage, ImageDetail};
use crate::search::FusedHit;

/// Coaching persona and output policy for the generation call.
pub const SYSTEM_PROMPT: &str = "\
You are a careful, encouraging skin-wellness coach. The user sends a photo of \
their face together with a short description of their current state. You also \
receive excerpts from dermatology and nutrition papers retrieved for this \
request. Ground every observation in what is visible in the photo and in the \
retrieved excerpts; do not invent conditions, do not diagnose disease, and \
recommend seeing a professional for anything that looks medical.

Respond with a single JSON object and nothing else, in this shape:

{
  \"skin_condition\": { \"summary\": \"...\", \"tips\": [\"...\"] },
  \"lifestyle_factors\": { \"summary\": \"...\", \"tips\": [\"...\"] },
  \"care_routine\": { \"summary\": \"...\", \"tips\": [\"...\"] }
}

Each summary is one or two sentences. Each tips list holds at most three \
short, actionable items. Write in the user's language.";

/// Render fused hits for the content segment: `rank. source` then an
/// indented bounded preview. Full chunk text is kept for the log only,
/// unless full-content prompting is switched on.
pub fn format_hits(hits: &[FusedHit], config: &PromptConfig) -> String {
    if hits.is_empty() {
        return "No supporting passages were retrieved.".to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let body = if config.full_content_in_prompt {
                hit.chunk.text.clone()
            } else {
                let preview: String = hit.chunk.text.chars().take(config.preview_chars).collect();
                format!("{preview}...")
            };
            format!("{}. {}\n   {}", i + 1, hit.chunk.source_name, body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_user_text(user_state: &str, formatted_hits: &str) -> String {
    format!(
        "User state: {user_state}\n\nRetrieved supporting passages:\n{formatted_hits}"
    )
}

/// Two-segment generation input: the persona instruction, then the user
/// content with the image attached as its own structured element.
pub fn assemble_messages(
    user_state: &str,
    hits: &[FusedHit],
    image_url: &str,
    detail: ImageDetail,
    config: &PromptConfig,
) -> Vec<ChatMessage> {
    let formatted = format_hits(hits, config);
    let user_text = build_user_text(user_state, &formatted);

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user_with_image(user_text, image_url, detail),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ContentPart, MessageContent, Role};
    use crate::search::{content_hash, Chunk, RankedHit, RetrieverKind};
    use crate::types::DocKind;
    use chrono::Utc;

    fn fused(text: &str, source: &str) -> FusedHit {
        let chunk = Chunk {
            id: format!("{source}:0"),
            source_name: source.to_string(),
            kind: DocKind::Pdf,
            page_range: None,
            seq: 0,
            text: text.to_string(),
            hash: content_hash(text),
            embedding: vec![],
            indexed_at: Utc::now(),
        };
        let hit = RankedHit {
            chunk,
            rank: 0,
            retriever: RetrieverKind::Dense,
            score: 0.9,
        };
        crate::search::reciprocal_rank_fusion(&[hit], &[], 60.0, 10)
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_format_hits_rank_source_preview() {
        let config = PromptConfig {
            preview_chars: 10,
            ..Default::default()
        };
        let hits = vec![
            fused("a very long passage about sodium", "salt.pdf"),
            fused("short", "water.txt"),
        ];

        let rendered = format_hits(&hits, &config);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "1. salt.pdf");
        assert_eq!(lines[1], "   a very lon...");
        assert_eq!(lines[2], "2. water.txt");
    }

    #[test]
    fn test_format_hits_empty() {
        let rendered = format_hits(&[], &PromptConfig::default());
        assert_eq!(rendered, "No supporting passages were retrieved.");
    }

    #[test]
    fn test_full_content_flag_bypasses_preview() {
        let config = PromptConfig {
            preview_chars: 5,
            full_content_in_prompt: true,
            ..Default::default()
        };
        let hits = vec![fused("the entire passage text", "a.pdf")];
        let rendered = format_hits(&hits, &config);
        assert!(rendered.contains("the entire passage text"));
        assert!(!rendered.contains("..."));
    }

    #[test]
    fn test_assemble_messages_structure() {
        let hits = vec![fused("context passage", "a.pdf")];
        let messages = assemble_messages(
            "my cheeks feel puffy",
            &hits,
            "https://img.example/x.jpg",
            ImageDetail::High,
            &PromptConfig::default(),
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);

        // Image travels as its own part, not concatenated into the text
        let MessageContent::Parts(parts) = &messages[1].content else {
            panic!("user message should be multi-part");
        };
        assert!(matches!(parts[0], ContentPart::ImageUrl { .. }));
        let ContentPart::Text { text } = &parts[1] else {
            panic!("second part should be text");
        };
        assert!(text.contains("my cheeks feel puffy"));
        assert!(text.contains("1. a.pdf"));
        assert!(!text.contains("https://img.example/x.jpg"));
    }
}
