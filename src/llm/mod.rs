mod openai;

pub use openai::OpenAiChat;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Generation capability consumed by the pipeline. A message may carry an
/// image reference plus text; the reply is the model's raw text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Detail hint forwarded with the image reference. "low" keeps vision token
/// cost flat; "high" lets the model tile the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    High,
}

impl Default for ImageDetail {
    fn default() -> Self {
        ImageDetail::Low
    }
}

impl std::fmt::Display for ImageDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageDetail::Low => write!(f, "low"),
            ImageDetail::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for ImageDetail {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(ImageDetail::Low),
            "high" => Ok(ImageDetail::High),
            other => anyhow::bail!("image detail must be \"low\" or \"high\", got \"{other}\""),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRef {
    pub url: String,
    pub detail: ImageDetail,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message carrying the image first and the text second, the order
    /// vision endpoints expect for grounded analysis.
    pub fn user_with_image(text: impl Into<String>, url: impl Into<String>, detail: ImageDetail) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageRef {
                        url: url.into(),
                        detail,
                    },
                },
                ContentPart::Text { text: text.into() },
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multimodal_message_wire_format() {
        let msg = ChatMessage::user_with_image("analyze this", "https://img.example/a.jpg", ImageDetail::Low);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "user");
        let parts = json["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "image_url");
        assert_eq!(parts[0]["image_url"]["url"], "https://img.example/a.jpg");
        assert_eq!(parts[0]["image_url"]["detail"], "low");
        assert_eq!(parts[1]["type"], "text");
        assert_eq!(parts[1]["text"], "analyze this");
    }

    #[test]
    fn test_plain_text_message_stays_a_string() {
        let msg = ChatMessage::system("be helpful");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "be helpful");
    }

    #[test]
    fn test_image_detail_parse() {
        assert_eq!("low".parse::<ImageDetail>().unwrap(), ImageDetail::Low);
        assert_eq!("high".parse::<ImageDetail>().unwrap(), ImageDetail::High);
        assert!("medium".parse::<ImageDetail>().is_err());
    }
}
