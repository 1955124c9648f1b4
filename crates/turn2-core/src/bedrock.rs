use crate::metrics::TokenUsage;
use serde::{Deserialize, Serialize};

/// Normalized LLM provider output, after content-block extraction (§3.1,
/// §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockResponse {
    /// Concatenated text content.
    pub content: String,
    /// Extracted thinking content, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Token usage for the call.
    pub token_usage: TokenUsage,
    /// Model identifier used.
    pub model_id: String,
    /// Provider-assigned request id, if returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Why the model stopped generating.
    pub stop_reason: String,
    /// Wall-clock latency of the call, in milliseconds.
    pub latency_ms: u64,
}
