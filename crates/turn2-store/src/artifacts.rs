use crate::key::{self, Category};
use crate::object_store::ObjectStore;
use chrono::NaiveDate;
use turn2_core::S3Reference;
use turn2_error::Turn2Error;

/// Content type for `.json` artifacts (§6.3).
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Content type for `.md` artifacts (§6.3).
pub const CONTENT_TYPE_MARKDOWN: &str = "text/markdown; charset=utf-8";

/// References to every artifact written for one Turn-2 invocation (§4.7).
#[derive(Debug, Clone)]
pub struct WrittenArtifacts {
    /// `prompts/turn2-prompt.json`
    pub prompt: S3Reference,
    /// `responses/turn2-raw-response.json`
    pub raw_response: S3Reference,
    /// `responses/turn2-processed-response.md`
    pub processed_markdown: S3Reference,
    /// `responses/turn2-conversation.json`
    pub conversation: S3Reference,
    /// `processing/initialization.json`
    pub initialization: S3Reference,
}

/// If `raw_response.response.thinking` is present, mirror it to a
/// top-level `thinking` field before the response is persisted (§4.7).
/// Leaves `raw_response` untouched if the nested field is absent.
pub fn mirror_thinking_to_top_level(raw_response: &mut serde_json::Value) {
    let nested = raw_response
        .get("response")
        .and_then(|r| r.get("thinking"))
        .cloned();
    if let Some(thinking) = nested {
        if let Some(obj) = raw_response.as_object_mut() {
            obj.insert("thinking".to_string(), thinking);
        }
    }
}

/// Serialize `value` to bytes, writing it as raw JSON rather than a
/// double-encoded JSON string when `value` is already a string holding
/// valid JSON (§4.7, `turn2-prompt.json` storer note).
fn to_json_bytes(value: &serde_json::Value) -> Result<Vec<u8>, Turn2Error> {
    let unwrapped = match value.as_str() {
        Some(s) => match serde_json::from_str::<serde_json::Value>(s) {
            Ok(parsed) => parsed,
            Err(_) => value.clone(),
        },
        None => value.clone(),
    };
    serde_json::to_vec_pretty(&unwrapped)
        .map_err(|e| Turn2Error::new(turn2_error::ErrorKind::Internal, "failed to serialize artifact").with_source(e))
}

/// Write all five canonical Turn-2 artifacts. Writes are independent and
/// proceed concurrently (§4.7); if any fails the others are still awaited
/// to avoid leaking in-flight work, and the first error is returned.
#[allow(clippy::too_many_arguments)]
pub async fn write_turn2_artifacts(
    store: &dyn ObjectStore,
    bucket: &str,
    date: NaiveDate,
    verification_id: &str,
    prompt_json: &serde_json::Value,
    mut raw_response_json: serde_json::Value,
    processed_markdown: &str,
    conversation_json: &serde_json::Value,
    initialization_json: &serde_json::Value,
) -> Result<WrittenArtifacts, Turn2Error> {
    mirror_thinking_to_top_level(&mut raw_response_json);

    let prompt_key = key::build(date, verification_id, Category::Prompts, "turn2-prompt.json")?;
    let raw_key = key::build(date, verification_id, Category::Responses, "turn2-raw-response.json")?;
    let markdown_key = key::build(date, verification_id, Category::Responses, "turn2-processed-response.md")?;
    let conversation_key = key::build(date, verification_id, Category::Responses, "turn2-conversation.json")?;
    let init_key = key::build(date, verification_id, Category::Processing, "initialization.json")?;

    let prompt_bytes = to_json_bytes(prompt_json)?;
    let raw_bytes = to_json_bytes(&raw_response_json)?;
    let conversation_bytes = to_json_bytes(conversation_json)?;
    let init_bytes = to_json_bytes(initialization_json)?;
    let markdown_bytes = processed_markdown.as_bytes().to_vec();

    let (prompt, raw_response, processed_markdown, conversation, initialization) = tokio::join!(
        store.put(bucket, &prompt_key, prompt_bytes, CONTENT_TYPE_JSON),
        store.put(bucket, &raw_key, raw_bytes, CONTENT_TYPE_JSON),
        store.put(bucket, &markdown_key, markdown_bytes, CONTENT_TYPE_MARKDOWN),
        store.put(bucket, &conversation_key, conversation_bytes, CONTENT_TYPE_JSON),
        store.put(bucket, &init_key, init_bytes, CONTENT_TYPE_JSON),
    );

    Ok(WrittenArtifacts {
        prompt: prompt?,
        raw_response: raw_response?,
        processed_markdown: processed_markdown?,
        conversation: conversation?,
        initialization: initialization?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::InMemoryObjectStore;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn writes_all_five_artifacts_under_the_date_partition() {
        let store = InMemoryObjectStore::new();
        let written = write_turn2_artifacts(
            &store,
            "bucket",
            date(),
            "verif-1",
            &json!({"system": "prompt text"}),
            json!({"response": {"content": "ok"}}),
            "# Result\nCORRECT",
            &json!({"messages": []}),
            &json!({"status": "TURN2_COMPLETED"}),
        )
        .await
        .unwrap();

        assert_eq!(written.prompt.key, "2025/06/01/verif-1/prompts/turn2-prompt.json");
        assert_eq!(
            written.processed_markdown.key,
            "2025/06/01/verif-1/responses/turn2-processed-response.md"
        );
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn processed_markdown_has_markdown_content_type() {
        let store = InMemoryObjectStore::new();
        let written = write_turn2_artifacts(
            &store,
            "bucket",
            date(),
            "verif-1",
            &json!({}),
            json!({}),
            "# Result",
            &json!({}),
            &json!({}),
        )
        .await
        .unwrap();

        assert_eq!(
            store.content_type_of("bucket", &written.processed_markdown.key),
            Some(CONTENT_TYPE_MARKDOWN.to_string())
        );
    }

    #[test]
    fn mirrors_nested_thinking_to_top_level() {
        let mut raw = json!({"response": {"content": "x", "thinking": "reasoning trace"}});
        mirror_thinking_to_top_level(&mut raw);
        assert_eq!(raw["thinking"], json!("reasoning trace"));
    }

    #[test]
    fn leaves_raw_response_untouched_when_no_nested_thinking() {
        let mut raw = json!({"response": {"content": "x"}});
        let before = raw.clone();
        mirror_thinking_to_top_level(&mut raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn prompt_json_already_a_string_is_not_double_encoded() {
        let value = json!("{\"system\":\"hi\"}");
        let bytes = to_json_bytes(&value).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, json!({"system": "hi"}));
    }
}
