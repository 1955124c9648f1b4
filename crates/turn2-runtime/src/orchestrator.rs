//! Orchestrator (§4.10, §7): drives Transform → Load → Generate → Converse
//! → Parse → Store → Update → Build response in order, owns the status
//! state machine, and writes a best-effort error state on fatal failure.

use crate::context_loader::ContextLoader;
use crate::conversation::{build_converse_request, build_persisted_conversation};
use crate::response::build_response;
use crate::transform::transform;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Instant;
use turn2_config::Turn2Config;
use turn2_core::{
    ImageFormat, ParsedTurn2Data, StageMetrics, TokenUsage, Turn2Request, Turn2Response,
    VerificationOutcome, VerificationStatus,
};
use turn2_error::Turn2Error;
use turn2_llm::{validate_thinking_mode, LlmProvider};
use turn2_records::{RecordStore, RecordUpdater};
use turn2_store::{write_turn2_artifacts, ObjectStore};
use turn2_templates::TemplateRegistry;

const COMPONENT: &str = "Orchestrator";

/// Drives one Turn-2 invocation end to end.
pub struct Turn2Orchestrator<'a> {
    object_store: &'a dyn ObjectStore,
    record_store: &'a dyn RecordStore,
    provider: &'a dyn LlmProvider,
    config: Turn2Config,
    templates: TemplateRegistry,
    record_updater: RecordUpdater,
}

impl<'a> Turn2Orchestrator<'a> {
    /// Build an orchestrator over the given collaborators and configuration.
    #[must_use]
    pub fn new(
        object_store: &'a dyn ObjectStore,
        record_store: &'a dyn RecordStore,
        provider: &'a dyn LlmProvider,
        config: Turn2Config,
    ) -> Self {
        let templates = TemplateRegistry::new(config.turn2_template_version.clone());
        let record_updater = RecordUpdater::new(config.max_retries);
        Self {
            object_store,
            record_store,
            provider,
            config,
            templates,
            record_updater,
        }
    }

    /// Run one invocation against the raw inbound envelope.
    ///
    /// # Errors
    ///
    /// Returns the first fatal, enriched [`Turn2Error`] encountered. On any
    /// such error a best-effort (bounded-retry, swallowed-on-failure)
    /// attempt is made to record `TURN2_ERROR` into the initialization
    /// artifact and the verification record before returning.
    pub async fn run(&self, raw_envelope: &Value) -> Result<Turn2Response, Turn2Error> {
        let invocation_start = Instant::now();
        let started_at = Utc::now().to_rfc3339();
        let today = Utc::now().date_naive();

        let verification_id_hint = raw_envelope
            .get("verificationContext")
            .and_then(|v| v.get("verificationId"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let request = match transform(raw_envelope) {
            Ok(request) => request,
            Err(err) => {
                let err = err.enrich(&verification_id_hint, "EventTransformer", "transform");
                self.write_error_state(
                    &verification_id_hint,
                    today,
                    VerificationStatus::Turn2Error,
                    &err,
                )
                .await;
                return Err(err);
            }
        };
        let verification_id = request.verification_context.verification_id.clone();

        self.write_status(&request, today, VerificationStatus::Turn2Started).await;

        let loaded = match ContextLoader::new(self.object_store).load(&request).await {
            Ok(loaded) => loaded,
            Err(err) => {
                let err = err.enrich(&verification_id, "ContextLoader", "load");
                self.write_error_state(
                    &verification_id,
                    today,
                    VerificationStatus::ContextLoadingFailed,
                    &err,
                )
                .await;
                return Err(err);
            }
        };

        let (rendered_prompt, template_processor) = self.templates.render(
            &request.verification_context,
            &loaded.system_prompt,
            &loaded.turn1,
        );
        self.write_status(&request, today, VerificationStatus::Turn2PromptPrepared).await;

        if let Err(err) = validate_thinking_mode(&self.config) {
            let err = err.enrich(&verification_id, "LlmAdapter", "validate_thinking_mode");
            self.write_error_state(&verification_id, today, VerificationStatus::Turn2Error, &err)
                .await;
            return Err(err);
        }

        let image_format = ImageFormat::parse_normalized(&loaded.checking_image_format)
            .unwrap_or(ImageFormat::Jpeg);
        let converse_request = build_converse_request(
            &self.config,
            &loaded.system_prompt,
            &loaded.turn1,
            &rendered_prompt,
            &loaded.checking_image_base64,
            image_format,
        );

        self.write_status(&request, today, VerificationStatus::BedrockProcessing).await;

        let bedrock_call_start = Instant::now();
        let raw_result = match self.provider.converse(&converse_request).await {
            Ok(result) => result,
            Err(err) => {
                let err = err.enrich(&verification_id, "LlmAdapter", "converse");
                self.write_error_state(
                    &verification_id,
                    today,
                    VerificationStatus::BedrockProcessingFailed,
                    &err,
                )
                .await;
                return Err(err);
            }
        };
        let bedrock_latency_ms = bedrock_call_start.elapsed().as_millis() as u64;
        let bedrock_response = raw_result.into_bedrock_response();

        let parsed = turn2_parser::parse(&bedrock_response.content);

        let checking_image_ref = request.images.checking_base64.clone();
        let persisted_conversation = build_persisted_conversation(
            &loaded.system_prompt,
            &loaded.turn1,
            &rendered_prompt,
            &checking_image_ref,
            Some(&bedrock_response),
        );
        let processed_markdown = render_processed_markdown(&bedrock_response, &parsed);
        let prompt_json = json!({
            "prompt": rendered_prompt,
            "templateProcessor": template_processor,
        });
        let raw_response_json =
            serde_json::to_value(&bedrock_response).unwrap_or_else(|_| json!({}));

        let init_json = self
            .read_initialization(&request)
            .await
            .unwrap_or_else(|| json!({}));
        let init_json = with_status(init_json, VerificationStatus::Turn2Completed);

        let written = match write_turn2_artifacts(
            self.object_store,
            &self.config.s3_bucket,
            today,
            &verification_id,
            &prompt_json,
            raw_response_json,
            &processed_markdown,
            &persisted_conversation,
            &init_json,
        )
        .await
        {
            Ok(written) => written,
            Err(err) => {
                let err = err.enrich(&verification_id, "ArtifactStore", "write_turn2_artifacts");
                self.write_error_state(&verification_id, today, VerificationStatus::Turn2Error, &err)
                    .await;
                return Err(err);
            }
        };

        let stage_metrics = StageMetrics {
            start_time: started_at.clone(),
            end_time: Utc::now().to_rfc3339(),
            total_time_ms: invocation_start.elapsed().as_millis() as u64,
            bedrock_latency_ms,
            token_usage: bedrock_response.token_usage,
        };

        // Partial success (§7): a failed record update does not fail the
        // whole invocation; it only flips `summary.dynamodbUpdated`.
        let dynamodb_updated = self
            .record_updater
            .update_verification(
                self.record_store,
                &verification_id,
                VerificationStatus::Turn2Completed,
                &stage_metrics.end_time,
                stage_metrics.clone(),
                parsed.verification_outcome,
                parsed.discrepancies.clone(),
                parsed.comparison_summary.clone(),
            )
            .await
            .is_ok();
        if dynamodb_updated {
            let _ = self
                .record_updater
                .update_conversation(
                    self.record_store,
                    &verification_id,
                    persisted_conversation
                        .get("messages")
                        .and_then(|m| m.as_array())
                        .cloned()
                        .unwrap_or_default(),
                )
                .await;
        }

        self.write_status(&request, today, VerificationStatus::Turn2Completed).await;

        Ok(build_response(
            &request,
            VerificationStatus::Turn2Completed,
            &written,
            Some(&written.prompt),
            &parsed,
            &bedrock_response,
            stage_metrics.total_time_ms,
            dynamodb_updated,
        ))
    }

    async fn read_initialization(&self, request: &Turn2Request) -> Option<Value> {
        let bytes = self
            .object_store
            .get(&request.processing_initialization)
            .await
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Best-effort write of the current status into the initialization
    /// artifact. Failures are logged and swallowed: this is an auxiliary
    /// progress record, not the source of truth for the outcome.
    async fn write_status(&self, request: &Turn2Request, date: chrono::NaiveDate, status: VerificationStatus) {
        let init_json = self
            .read_initialization(request)
            .await
            .unwrap_or_else(|| json!({"verificationId": request.verification_context.verification_id}));
        let init_json = with_status(init_json, status);
        if let Ok(bytes) = serde_json::to_vec_pretty(&init_json) {
            let key = match turn2_store::build_key(
                date,
                &request.verification_context.verification_id,
                turn2_store::Category::Processing,
                "initialization.json",
            ) {
                Ok(key) => key,
                Err(_) => return,
            };
            if let Err(err) = self
                .object_store
                .put(&self.config.s3_bucket, &key, bytes, turn2_store::CONTENT_TYPE_JSON)
                .await
            {
                tracing::warn!(target: "turn2.orchestrator", verification_id = %request.verification_context.verification_id, error = %err, "failed to write status to initialization artifact");
            }
        }
    }

    /// Best-effort error-state recording (§7): write `TURN2_ERROR` into the
    /// initialization artifact and attempt an error-tracking verification
    /// record update. Both are bounded-retry internally and both swallow
    /// their own failures — this function never itself returns an error.
    async fn write_error_state(
        &self,
        verification_id: &str,
        date: chrono::NaiveDate,
        status: VerificationStatus,
        error: &Turn2Error,
    ) {
        if verification_id.trim().is_empty() {
            return;
        }

        let key = match turn2_store::build_key(
            date,
            verification_id,
            turn2_store::Category::Processing,
            "initialization.json",
        ) {
            Ok(key) => key,
            Err(_) => return,
        };
        let init_json = json!({
            "verificationId": verification_id,
            "status": status,
            "error": error.to_dto(),
        });
        if let Ok(bytes) = serde_json::to_vec_pretty(&init_json) {
            let _ = self
                .object_store
                .put(&self.config.s3_bucket, &key, bytes, turn2_store::CONTENT_TYPE_JSON)
                .await;
        }

        let now = Utc::now().to_rfc3339();
        let error_metrics = StageMetrics {
            start_time: now.clone(),
            end_time: now.clone(),
            total_time_ms: 0,
            bedrock_latency_ms: 0,
            token_usage: TokenUsage::new(0, 0, 0),
        };
        let _ = self
            .record_updater
            .update_verification(
                self.record_store,
                verification_id,
                status,
                &now,
                error_metrics,
                VerificationOutcome::Unknown,
                Vec::new(),
                error.message.clone(),
            )
            .await;
    }
}

fn with_status(mut value: Value, status: VerificationStatus) -> Value {
    let status_value = serde_json::to_value(status).unwrap_or(Value::Null);
    if !value.is_object() {
        value = json!({});
    }
    if let Some(obj) = value.as_object_mut() {
        obj.insert("status".to_string(), status_value);
    }
    value
}

/// Render the canonical Turn-2 processed markdown (§4.7): a discrepancy
/// table when the parser found structured rows, the outcome line, and the
/// comparison summary. This is the artifact the output envelope's
/// `responses.turn2Processed` reference points to.
fn render_processed_markdown(response: &turn2_core::BedrockResponse, parsed: &ParsedTurn2Data) -> String {
    let mut out = String::from("# Turn 2 Verification Result\n\n");

    if !parsed.discrepancies.is_empty() {
        out.push_str("| Position | Expected | Found | Issue |\n");
        out.push_str("|---|---|---|---|\n");
        for d in &parsed.discrepancies {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                d.position, d.expected, d.found, d.issue
            ));
        }
        out.push('\n');
    }

    let outcome = match parsed.verification_outcome {
        VerificationOutcome::Correct => "CORRECT",
        VerificationOutcome::Incorrect => "INCORRECT",
        VerificationOutcome::Unknown => "",
    };
    if !outcome.is_empty() {
        out.push_str(&format!("Verification Outcome: {outcome}\n\n"));
    }
    if !parsed.comparison_summary.is_empty() {
        out.push_str(&format!("Summary: {}\n", parsed.comparison_summary));
    } else if !response.content.is_empty() {
        out.push_str(&format!("Summary: {}\n", response.content));
    }

    out
}
