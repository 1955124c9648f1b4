//! Event Transformer (§4.1): parses the inbound envelope of artifact
//! references into a typed [`Turn2Request`], normalizing legacy/nested
//! reference shapes.

use serde_json::Value;
use std::collections::BTreeMap;
use turn2_core::{
    ImagesInput, PromptsInput, S3Reference, Turn1Input, Turn2Request, VerificationContext,
};
use turn2_error::Turn2Error;

/// Parse the raw inbound JSON envelope into a [`Turn2Request`].
///
/// # Errors
///
/// Returns [`Turn2Error::validation`] if `verificationContext` doesn't
/// parse, or if any required reference is missing or has an empty
/// `bucket`/`key`.
pub fn transform(raw: &Value) -> Result<Turn2Request, Turn2Error> {
    let verification_context: VerificationContext =
        serde_json::from_value(raw.get("verificationContext").cloned().unwrap_or(Value::Null))
            .map_err(|e| {
                Turn2Error::validation("invalid or missing verificationContext").with_source(e)
            })?;

    let refs = raw.get("s3References").cloned().unwrap_or(Value::Null);

    let system = required_ref(&refs, &["prompts", "system"], "prompts.system")?;
    let checking_base64 = required_ref(&refs, &["images", "checkingBase64"], "images.checkingBase64")?;
    let checking_image_format = optional_image_format(&refs);

    let turn1_processed = required_ref(
        &refs,
        &["responses", "turn1Processed"],
        "responses.turn1Processed",
    )?;
    let turn1_raw = required_ref(&refs, &["responses", "turn1Raw"], "responses.turn1Raw")?;
    let turn1_conversation = required_ref(
        &refs,
        &["responses", "turn1Conversation"],
        "responses.turn1Conversation",
    )?;

    let processing_initialization = required_processing_initialization(&refs)?;

    let input_s3_references: BTreeMap<String, Value> = match refs.as_object() {
        Some(obj) => obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        None => BTreeMap::new(),
    };

    Ok(Turn2Request {
        verification_context,
        prompts: PromptsInput { system },
        images: ImagesInput {
            checking_base64,
            checking_image_format,
        },
        turn1: Turn1Input {
            processed_response: turn1_processed,
            raw_response: turn1_raw,
            conversation: turn1_conversation,
        },
        input_s3_references,
        processing_initialization,
    })
}

/// Look up a reference at `path` (nested) or, failing that, at a flat
/// legacy key equal to `path`'s last segment — accepting either the
/// nested-under-`responses` shape or a legacy flat shape.
fn required_ref(refs: &Value, path: &[&str], label: &str) -> Result<S3Reference, Turn2Error> {
    let found = lookup(refs, path).or_else(|| lookup(refs, &[path[path.len() - 1]]));
    let value = found.ok_or_else(|| {
        Turn2Error::validation(format!("missing required reference: {label}"))
            .with_context("reference", label)
    })?;
    to_reference(value, label)
}

fn required_processing_initialization(refs: &Value) -> Result<S3Reference, Turn2Error> {
    let found = lookup(refs, &["processing", "initialization"])
        .or_else(|| lookup(refs, &["processing_initialization"]));
    let value = found.ok_or_else(|| {
        Turn2Error::validation("missing required reference: processing_initialization")
    })?;
    let mut reference = to_reference(value, "processing_initialization")?;
    reference.key = normalize_processing_initialization_key(&reference.key);
    Ok(reference)
}

/// Rewrite a `processing_initialization` key that is missing the
/// `processing/` segment so it resolves under
/// `.../processing/initialization.json` (§4.1).
fn normalize_processing_initialization_key(key: &str) -> String {
    if key.ends_with("/processing/initialization.json") || key == "processing/initialization.json"
    {
        return key.to_string();
    }
    match key.rsplit_once('/') {
        Some((prefix, _file)) => format!("{prefix}/processing/initialization.json"),
        None => "processing/initialization.json".to_string(),
    }
}

fn optional_image_format(refs: &Value) -> Option<String> {
    lookup(refs, &["images", "checkingImageFormat"])
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| {
            lookup(refs, &["images", "metadata"])
                .and_then(|v| v.get("checkingImageFormat"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

fn to_reference(value: &Value, label: &str) -> Result<S3Reference, Turn2Error> {
    let bucket = value
        .get("bucket")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let key = value.get("key").and_then(|v| v.as_str()).unwrap_or_default();
    let size = value.get("size").and_then(|v| v.as_u64());

    let reference = S3Reference::new(bucket, key)
        .map_err(|e| e.with_context("reference", label))?;
    Ok(match size {
        Some(s) => reference.with_size(s),
        None => reference,
    })
}
