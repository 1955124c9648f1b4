//! Response Builder (§4.9): merges the inbound reference tree with the
//! newly written artifact references and produces the outbound envelope.

use serde_json::Value;
use std::collections::BTreeMap;
use turn2_core::{BedrockResponse, ParsedTurn2Data, Summary, Turn2Request, Turn2Response, VerificationStatus};
use turn2_store::WrittenArtifacts;

/// Build the outbound envelope (§4.9, §6.2, invariant #1: output
/// `s3References` is a superset of the input).
#[must_use]
pub fn build_response(
    request: &Turn2Request,
    status: VerificationStatus,
    written: &WrittenArtifacts,
    rendered_prompt_ref: Option<&turn2_core::S3Reference>,
    parsed: &ParsedTurn2Data,
    bedrock_response: &BedrockResponse,
    processing_time_ms: u64,
    dynamodb_updated: bool,
) -> Turn2Response {
    let mut tree = Value::Object(
        request
            .input_s3_references
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );

    set_nested(&mut tree, &["responses", "turn2Raw"], reference_value(&written.raw_response));
    set_nested(
        &mut tree,
        &["responses", "turn2Processed"],
        reference_value(&written.processed_markdown),
    );
    set_nested(
        &mut tree,
        &["responses", "turn2Conversation"],
        reference_value(&written.conversation),
    );
    if let Some(prompt_ref) = rendered_prompt_ref {
        set_nested(&mut tree, &["prompts", "turn2Prompt"], reference_value(prompt_ref));
    }
    set_nested(
        &mut tree,
        &["processing", "initialization"],
        reference_value(&written.initialization),
    );

    let s3_references: BTreeMap<String, Value> = match tree {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    };

    Turn2Response {
        verification_id: request.verification_context.verification_id.clone(),
        status,
        s3_references,
        summary: Summary {
            analysis_stage: "COMPARISON_ANALYSIS".to_string(),
            verification_type: request.verification_context.verification_type,
            processing_time_ms,
            token_usage: bedrock_response.token_usage,
            bedrock_latency_ms: bedrock_response.latency_ms,
            bedrock_request_id: bedrock_response.request_id.clone(),
            discrepancies_found: parsed.discrepancies.len(),
            comparison_completed: true,
            conversation_completed: true,
            dynamodb_updated,
            s3_storage_completed: true,
        },
        discrepancies: parsed.discrepancies.clone(),
        verification_outcome: parsed.verification_outcome,
    }
}

fn reference_value(reference: &turn2_core::S3Reference) -> Value {
    serde_json::to_value(reference).unwrap_or(Value::Null)
}

fn set_nested(root: &mut Value, path: &[&str], value: Value) {
    if !root.is_object() {
        *root = Value::Object(serde_json::Map::new());
    }
    let mut current = root;
    for segment in &path[..path.len() - 1] {
        let obj = current.as_object_mut().expect("ensured object above");
        current = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
    }
    let last = path[path.len() - 1];
    current
        .as_object_mut()
        .expect("ensured object above")
        .insert(last.to_string(), value);
}
