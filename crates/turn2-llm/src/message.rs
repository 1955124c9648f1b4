use serde::{Deserialize, Serialize};
use turn2_core::{ContentBlock, ImageFormat, Turn1Artifact};

/// Role of a converse-API message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// A message authored by the calling application.
    User,
    /// A message authored by the model.
    Assistant,
}

/// One message in the converse-API message list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverseMessage {
    /// Who authored this message.
    pub role: MessageRole,
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
}

/// The full converse-API request: system prompt in its own slot (never
/// duplicated into the message list, §4.5) plus the ordered message list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverseRequest {
    /// System prompt text.
    pub system: String,
    /// Ordered messages.
    pub messages: Vec<ConverseMessage>,
    /// Model id to invoke.
    pub model_id: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling parameter.
    pub top_p: f64,
    /// Maximum output tokens.
    pub max_tokens: u32,
}

/// Build the ordered converse message list (§4.5):
///
/// 1. System content goes in `system`, not the message list (caller's
///    responsibility via [`ConverseRequest::system`]).
/// 2. Turn-1 user text.
/// 3. Turn-1 assistant text, omitted entirely if empty/whitespace-only
///    (inserting an empty text block is a provider-side validation
///    failure — invariant #7).
/// 4. Turn-2 user: rendered prompt text + the checking image.
pub fn build_messages(
    turn1: &Turn1Artifact,
    turn2_prompt: &str,
    checking_image_base64: &str,
    checking_image_format: ImageFormat,
) -> Vec<ConverseMessage> {
    let mut messages = Vec::with_capacity(3);

    messages.push(ConverseMessage {
        role: MessageRole::User,
        content: vec![ContentBlock::Text {
            text: turn1.prompt.clone(),
        }],
    });

    if !turn1.response.content.trim().is_empty() {
        messages.push(ConverseMessage {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::Text {
                text: turn1.response.content.clone(),
            }],
        });
    }

    messages.push(ConverseMessage {
        role: MessageRole::User,
        content: vec![
            ContentBlock::Text {
                text: turn2_prompt.to_string(),
            },
            ContentBlock::Image {
                format: checking_image_format,
                data: checking_image_base64.to_string(),
            },
        ],
    });

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use turn2_core::{BedrockMetadata, Turn1Response};

    fn turn1_with_content(content: &str) -> Turn1Artifact {
        Turn1Artifact {
            turn_id: 1,
            prompt: "Analyze the reference image".into(),
            response: Turn1Response {
                content: content.into(),
                thinking: None,
            },
            token_usage: None,
            bedrock_metadata: Some(BedrockMetadata::default()),
        }
    }

    #[test]
    fn includes_all_four_messages_when_turn1_assistant_non_empty() {
        let turn1 = turn1_with_content("Looks correct");
        let messages = build_messages(&turn1, "Compare now", "YWJj", ImageFormat::Jpeg);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[2].role, MessageRole::User);
    }

    #[test]
    fn omits_turn1_assistant_message_when_content_empty() {
        let turn1 = turn1_with_content("");
        let messages = build_messages(&turn1, "Compare now", "YWJj", ImageFormat::Jpeg);
        assert_eq!(messages.len(), 2, "S4: message list length must be 2");
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::User);
    }

    #[test]
    fn omits_turn1_assistant_message_when_content_whitespace_only() {
        let turn1 = turn1_with_content("   \n\t  ");
        let messages = build_messages(&turn1, "Compare now", "YWJj", ImageFormat::Jpeg);
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn turn2_user_message_carries_text_and_image_blocks() {
        let turn1 = turn1_with_content("Looks correct");
        let messages = build_messages(&turn1, "Compare now", "YWJj", ImageFormat::Png);
        let turn2_user = &messages[2];
        assert_eq!(turn2_user.content.len(), 2);
        assert!(matches!(turn2_user.content[0], ContentBlock::Text { .. }));
        assert!(matches!(turn2_user.content[1], ContentBlock::Image { .. }));
    }

    #[test]
    fn no_assistant_message_is_ever_empty_or_whitespace() {
        for content in ["Looks correct", "", "   "] {
            let turn1 = turn1_with_content(content);
            let messages = build_messages(&turn1, "p", "d", ImageFormat::Jpeg);
            for m in &messages {
                if m.role == MessageRole::Assistant {
                    for block in &m.content {
                        if let ContentBlock::Text { text } = block {
                            assert!(!text.trim().is_empty());
                        }
                    }
                }
            }
        }
    }
}
