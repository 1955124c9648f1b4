//! Conversation Builder (§4.4, §4.7): assembles the converse-API request
//! and the distinct persisted-conversation artifact shape.

use turn2_core::{BedrockResponse, ImageFormat, S3Reference, Turn1Artifact};
use turn2_config::Turn2Config;
use turn2_llm::{build_messages, ConverseRequest};

/// Build the converse-API request sent to the provider (§4.4, §4.5). The
/// system prompt goes in its own `system` slot, never duplicated into the
/// message list.
#[must_use]
pub fn build_converse_request(
    config: &Turn2Config,
    system_prompt: &str,
    turn1: &Turn1Artifact,
    turn2_prompt: &str,
    checking_image_base64: &str,
    checking_image_format: ImageFormat,
) -> ConverseRequest {
    let messages = build_messages(turn1, turn2_prompt, checking_image_base64, checking_image_format);
    ConverseRequest {
        system: system_prompt.to_string(),
        messages,
        model_id: config.bedrock_model.clone(),
        temperature: config.temperature,
        top_p: config.top_p,
        max_tokens: config.max_tokens,
    }
}

/// Build the persisted conversation artifact (§4.7): unlike the API
/// request, the system prompt is its own message, and the Turn-2 image is
/// an `s3://bucket/key` URI rather than inline bytes.
#[must_use]
pub fn build_persisted_conversation(
    system_prompt: &str,
    turn1: &Turn1Artifact,
    turn2_prompt: &str,
    checking_image_ref: &S3Reference,
    turn2_response: Option<&BedrockResponse>,
) -> serde_json::Value {
    let mut messages = vec![serde_json::json!({
        "role": "system",
        "content": system_prompt,
    })];

    messages.push(serde_json::json!({
        "role": "user",
        "content": turn1.prompt,
    }));

    if !turn1.response.content.trim().is_empty() {
        messages.push(serde_json::json!({
            "role": "assistant",
            "content": turn1.response.content,
        }));
    }

    messages.push(serde_json::json!({
        "role": "user",
        "content": turn2_prompt,
        "image": format!("s3://{}/{}", checking_image_ref.bucket, checking_image_ref.key),
    }));

    if let Some(response) = turn2_response {
        messages.push(serde_json::json!({
            "role": "assistant",
            "content": response.content,
        }));
    }

    let (token_usage, latency_ms, model_id, request_id, stop_reason) = match turn2_response {
        Some(r) => (
            serde_json::to_value(r.token_usage).unwrap_or_default(),
            r.latency_ms,
            r.model_id.clone(),
            r.request_id.clone(),
            r.stop_reason.clone(),
        ),
        None => (serde_json::Value::Null, 0, String::new(), None, String::new()),
    };

    serde_json::json!({
        "messages": messages,
        "tokenUsage": token_usage,
        "latencyMs": latency_ms,
        "bedrockMetadata": {
            "modelId": model_id,
            "requestId": request_id,
            "stopReason": stop_reason,
        },
    })
}
