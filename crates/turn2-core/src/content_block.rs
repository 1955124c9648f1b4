use serde::{Deserialize, Serialize};

/// Image encoding used by the converse API and by persisted checking
/// images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG.
    Jpeg,
    /// PNG.
    Png,
}

impl ImageFormat {
    /// Parse a format string, normalizing the common `jpg` spelling to
    /// `jpeg` (§4.5).
    pub fn parse_normalized(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// A single block of content from an LLM provider response (or built for
/// an outbound request).
///
/// This is the Rust-native replacement for the source's reflective
/// traversal over an evolving SDK's content-block types: unknown variants
/// degrade to [`ContentBlock::Other`] with the raw JSON preserved rather
/// than faulting. `Serialize`/`Deserialize` are implemented by hand (rather
/// than derived) because the `Other` variant must carry arbitrary JSON
/// shapes that a tagged-enum derive cannot express.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Plain text content.
    Text {
        /// The text.
        text: String,
    },
    /// Extended-reasoning content, returned only when thinking mode is
    /// enabled.
    Thinking {
        /// The reasoning text.
        thinking: String,
    },
    /// Inline image bytes.
    Image {
        /// Image encoding.
        format: ImageFormat,
        /// Base64-encoded bytes.
        data: String,
    },
    /// Any block type not recognised by this version of the adapter.
    /// Carries the raw JSON so nothing is lost.
    Other(serde_json::Value),
}

impl Serialize for ContentBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ContentBlock::Text { text } => {
                serde_json::json!({"type": "text", "text": text}).serialize(serializer)
            }
            ContentBlock::Thinking { thinking } => {
                serde_json::json!({"type": "thinking", "thinking": thinking}).serialize(serializer)
            }
            ContentBlock::Image { format, data } => {
                serde_json::json!({"type": "image", "format": format, "data": data})
                    .serialize(serializer)
            }
            ContentBlock::Other(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let ty = raw.get("type").and_then(|v| v.as_str());
        match ty {
            Some("text") => {
                let text = raw
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Ok(ContentBlock::Text { text })
            }
            Some("thinking") => {
                let thinking = raw
                    .get("thinking")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Ok(ContentBlock::Thinking { thinking })
            }
            Some("image") => {
                let format = raw
                    .get("format")
                    .and_then(|v| v.as_str())
                    .and_then(ImageFormat::parse_normalized);
                let data = raw
                    .get("data")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                match format {
                    Some(format) => Ok(ContentBlock::Image { format, data }),
                    None => Ok(ContentBlock::Other(raw)),
                }
            }
            _ => Ok(ContentBlock::Other(raw)),
        }
    }
}

impl ContentBlock {
    /// Concatenate the text of all `Text` blocks in order (§4.5, "extract
    /// text" bullet 1).
    #[must_use]
    pub fn concat_text(blocks: &[ContentBlock]) -> String {
        blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// True if this is a dedicated thinking/reasoning block.
    #[must_use]
    pub fn is_thinking(&self) -> bool {
        matches!(self, ContentBlock::Thinking { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_jpg_to_jpeg() {
        assert_eq!(ImageFormat::parse_normalized("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::parse_normalized("JPEG"), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn rejects_unknown_format() {
        assert_eq!(ImageFormat::parse_normalized("gif"), None);
    }

    #[test]
    fn concat_text_joins_only_text_blocks_in_order() {
        let blocks = vec![
            ContentBlock::Text { text: "a".into() },
            ContentBlock::Thinking {
                thinking: "reasoning".into(),
            },
            ContentBlock::Text { text: "b".into() },
        ];
        assert_eq!(ContentBlock::concat_text(&blocks), "ab");
    }

    #[test]
    fn unknown_variant_degrades_to_other_without_panicking() {
        let json = r#"{"type":"redacted_thinking","signature":"abc"}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        match block {
            ContentBlock::Other(raw) => {
                assert_eq!(raw["signature"], serde_json::json!("abc"));
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn image_with_unrecognised_format_degrades_to_other() {
        let json = r#"{"type":"image","format":"bmp","data":"abc"}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        assert!(matches!(block, ContentBlock::Other(_)));
    }

    #[test]
    fn is_thinking_detects_only_thinking_variant() {
        let t = ContentBlock::Thinking {
            thinking: "x".into(),
        };
        assert!(t.is_thinking());
        let o = ContentBlock::Text { text: "x".into() };
        assert!(!o.is_thinking());
    }

    #[test]
    fn text_block_roundtrips() {
        let block = ContentBlock::Text {
            text: "hello".into(),
        };
        let json = serde_json::to_string(&block).unwrap();
        let back: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn image_block_roundtrips() {
        let block = ContentBlock::Image {
            format: ImageFormat::Png,
            data: "YWJj".into(),
        };
        let json = serde_json::to_string(&block).unwrap();
        let back: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }
}
