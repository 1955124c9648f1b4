use crate::message::ConverseRequest;
use async_trait::async_trait;
use std::sync::Mutex;
use turn2_core::{BedrockResponse, ContentBlock, TokenUsage};
use turn2_error::Turn2Error;

/// The external LLM "converse" API collaborator (§1, out of scope —
/// interface only). Implementations invoke the provider with the
/// assembled request and return the raw content blocks plus usage; block
/// extraction itself happens in [`crate::extract`], not here.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Invoke the provider. The LLM Adapter does not retry this call —
    /// the outer workflow is responsible for whole-invocation retry (§7).
    async fn converse(&self, request: &ConverseRequest) -> Result<RawConverseResult, Turn2Error>;
}

/// What a provider call returns before content-block extraction.
#[derive(Debug, Clone)]
pub struct RawConverseResult {
    /// Raw content blocks, in order.
    pub content_blocks: Vec<ContentBlock>,
    /// Token usage as reported by the provider.
    pub token_usage: TokenUsage,
    /// Model id that served the request.
    pub model_id: String,
    /// Provider-assigned request id, if any.
    pub request_id: Option<String>,
    /// Why the model stopped.
    pub stop_reason: String,
    /// Call latency in milliseconds.
    pub latency_ms: u64,
}

impl RawConverseResult {
    /// Reduce to the normalized [`BedrockResponse`] shape, running text
    /// and thinking extraction over the content blocks (§4.5).
    #[must_use]
    pub fn into_bedrock_response(self) -> BedrockResponse {
        let text = crate::extract::extract_text(&self.content_blocks);
        let thinking = crate::extract::extract_thinking(&self.content_blocks, &text);
        BedrockResponse {
            content: text,
            thinking,
            token_usage: self.token_usage,
            model_id: self.model_id,
            request_id: self.request_id,
            stop_reason: self.stop_reason,
            latency_ms: self.latency_ms,
        }
    }
}

/// Canned-response test double for [`LlmProvider`], recording every
/// request it received (mirrors the in-workspace pattern of a mock
/// backend used in place of a real SDK for tests).
pub struct MockLlmProvider {
    response: RawConverseResult,
    received: Mutex<Vec<ConverseRequest>>,
}

impl MockLlmProvider {
    /// Build a mock that always returns `response`.
    #[must_use]
    pub fn new(response: RawConverseResult) -> Self {
        Self {
            response,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn received(&self) -> Vec<ConverseRequest> {
        self.received.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn converse(&self, request: &ConverseRequest) -> Result<RawConverseResult, Turn2Error> {
        self.received
            .lock()
            .expect("mock lock poisoned")
            .push(request.clone());
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ConverseMessage, MessageRole};

    fn sample_request() -> ConverseRequest {
        ConverseRequest {
            system: "system prompt".into(),
            messages: vec![ConverseMessage {
                role: MessageRole::User,
                content: vec![ContentBlock::Text { text: "hi".into() }],
            }],
            model_id: "anthropic.claude-3-5-sonnet".into(),
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: 1024,
        }
    }

    fn sample_result() -> RawConverseResult {
        RawConverseResult {
            content_blocks: vec![ContentBlock::Text {
                text: "Verification Outcome: CORRECT".into(),
            }],
            token_usage: TokenUsage::new(10, 20, 0),
            model_id: "anthropic.claude-3-5-sonnet".into(),
            request_id: Some("req-1".into()),
            stop_reason: "end_turn".into(),
            latency_ms: 500,
        }
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_response() {
        let mock = MockLlmProvider::new(sample_result());
        let result = mock.converse(&sample_request()).await.unwrap();
        assert_eq!(result.model_id, "anthropic.claude-3-5-sonnet");
    }

    #[tokio::test]
    async fn mock_provider_records_requests() {
        let mock = MockLlmProvider::new(sample_result());
        mock.converse(&sample_request()).await.unwrap();
        mock.converse(&sample_request()).await.unwrap();
        assert_eq!(mock.received().len(), 2);
    }

    #[test]
    fn into_bedrock_response_extracts_text() {
        let resp = sample_result().into_bedrock_response();
        assert_eq!(resp.content, "Verification Outcome: CORRECT");
        assert_eq!(resp.token_usage.total, 30);
    }
}
