use crate::metrics::TokenUsage;
use serde::{Deserialize, Serialize};

/// Bedrock invocation metadata carried alongside a Turn response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockMetadata {
    /// Model identifier used for the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Provider-assigned request id, for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Why the model stopped generating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// The assistant side of a Turn-1 exchange: content plus optional thinking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Turn1Response {
    /// Assistant text. MUST be non-empty after recovery (§3.1).
    pub content: String,
    /// Extended-reasoning text, if the model emitted one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

/// Parsed Turn-1 payload, after schema recovery (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn1Artifact {
    /// Always `1`.
    pub turn_id: u8,
    /// The user text used in Turn-1. MUST be non-empty after recovery.
    pub prompt: String,
    /// The assistant response.
    pub response: Turn1Response,
    /// Token usage reported for the Turn-1 call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    /// Bedrock invocation metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrock_metadata: Option<BedrockMetadata>,
}

impl Turn1Artifact {
    /// Returns `true` if both `prompt` and `response.content` are
    /// non-empty, the precondition the LLM Adapter requires before
    /// building the converse request (§3.1, §4.5).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.prompt.trim().is_empty() && !self.response.content.trim().is_empty()
    }
}

/// The two persisted shapes of a Turn-1 raw response (§4.3).
///
/// Shape (a) has a scalar `response.content`; shape (b) is legacy and
/// represents `response.content` as an ordered sequence of typed blocks.
/// This deserializer attempts (a) first and falls back to (b), flattening
/// it into the same [`Turn1Artifact`] shape. It does not attempt a third
/// shape (§9 design note).
pub fn deserialize_turn1_raw(raw: &serde_json::Value) -> Result<Turn1Artifact, serde_json::Error> {
    // Shape (a): response.content is a scalar string.
    if let Ok(artifact) = serde_json::from_value::<Turn1Artifact>(raw.clone()) {
        return Ok(artifact);
    }

    // Shape (b): response.content is `[{type, text}, ...]`.
    #[derive(Deserialize)]
    struct LegacyBlock {
        #[serde(rename = "type")]
        kind: String,
        text: String,
    }
    #[derive(Deserialize)]
    struct LegacyResponse {
        content: Vec<LegacyBlock>,
    }
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct LegacyArtifact {
        turn_id: u8,
        #[serde(default)]
        prompt: String,
        response: LegacyResponse,
        #[serde(default)]
        token_usage: Option<TokenUsage>,
        #[serde(default)]
        bedrock_metadata: Option<BedrockMetadata>,
    }

    let legacy: LegacyArtifact = serde_json::from_value(raw.clone())?;
    let content = legacy
        .response
        .content
        .iter()
        .find(|b| b.kind == "text")
        .map(|b| b.text.clone())
        .unwrap_or_default();
    let thinking = legacy
        .response
        .content
        .iter()
        .find(|b| b.kind == "thinking")
        .map(|b| b.text.clone());

    Ok(Turn1Artifact {
        turn_id: legacy.turn_id,
        prompt: legacy.prompt,
        response: crate::turn1::Turn1Response { content, thinking },
        token_usage: legacy.token_usage,
        bedrock_metadata: legacy.bedrock_metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_shape_decodes_directly() {
        let raw = json!({
            "turnId": 1,
            "prompt": "Analyze the reference image",
            "response": {"content": "Looks correct"},
        });
        let artifact = deserialize_turn1_raw(&raw).unwrap();
        assert_eq!(artifact.prompt, "Analyze the reference image");
        assert_eq!(artifact.response.content, "Looks correct");
        assert!(artifact.is_complete());
    }

    #[test]
    fn block_array_shape_flattens_to_scalar_equivalently() {
        let raw = json!({
            "turnId": 1,
            "prompt": "Analyze the reference image",
            "response": {
                "content": [
                    {"type": "thinking", "text": "considering layout"},
                    {"type": "text", "text": "Looks correct"}
                ]
            },
        });
        let artifact = deserialize_turn1_raw(&raw).unwrap();
        assert_eq!(artifact.response.content, "Looks correct");
        assert_eq!(
            artifact.response.thinking.as_deref(),
            Some("considering layout")
        );
    }

    #[test]
    fn empty_prompt_and_content_is_incomplete() {
        let raw = json!({"turnId": 1, "prompt": "", "response": {"content": ""}});
        let artifact = deserialize_turn1_raw(&raw).unwrap();
        assert!(!artifact.is_complete());
    }

    #[test]
    fn whitespace_only_content_is_incomplete() {
        let raw = json!({"turnId": 1, "prompt": "p", "response": {"content": "   "}});
        let artifact = deserialize_turn1_raw(&raw).unwrap();
        assert!(!artifact.is_complete());
    }
}
