use crate::model::{ConversationRecord, StatusHistoryEntry, VerificationRecord};
use turn2_core::{Discrepancy, ProcessingMetrics, StageMetrics, VerificationOutcome, VerificationStatus};
use turn2_error::Turn2Error;

/// Apply the Turn-2 update to a verification record (§4.8). `existing` is
/// `None` when the item hasn't been loaded (callers pass the load result
/// straight through). `processingMetrics` is merged as a whole attribute
/// via [`ProcessingMetrics::with_turn2`] — never a nested-path update
/// against a possibly-absent parent.
#[must_use]
pub fn apply_turn2_update(
    existing: Option<VerificationRecord>,
    verification_id: &str,
    status: VerificationStatus,
    timestamp: impl Into<String>,
    turn2_metrics: StageMetrics,
    verification_outcome: VerificationOutcome,
    discrepancies: Vec<Discrepancy>,
    verification_summary: String,
) -> VerificationRecord {
    let mut status_history = existing
        .as_ref()
        .map(|r| r.status_history.clone())
        .unwrap_or_default();
    status_history.push(StatusHistoryEntry {
        status,
        timestamp: timestamp.into(),
    });

    let processing_metrics = ProcessingMetrics::with_turn2(
        existing.as_ref().map(|r| r.processing_metrics.clone()),
        turn2_metrics,
    );

    VerificationRecord {
        verification_id: verification_id.to_string(),
        current_status: status,
        status_history,
        processing_metrics,
        verification_status: verification_outcome,
        discrepancies,
        verification_summary,
    }
}

/// Apply the Turn-2 update to a conversation record (§4.8). Refuses to
/// proceed for an empty `verification_id` — the caller MUST NOT reach the
/// store in that case.
///
/// # Errors
///
/// Returns [`Turn2Error::validation`] when `verification_id` is empty.
pub fn apply_turn2_conversation_update(
    existing: Option<ConversationRecord>,
    verification_id: &str,
    new_messages: Vec<serde_json::Value>,
) -> Result<ConversationRecord, Turn2Error> {
    if verification_id.trim().is_empty() {
        return Err(Turn2Error::validation(
            "conversation update refused: empty verificationId",
        ));
    }

    let mut record = existing.unwrap_or_else(|| ConversationRecord::blank(verification_id));
    if !record.metadata.is_object() {
        record.metadata = serde_json::json!({});
    }
    record.history.extend(new_messages);
    record.current_turn = 2;
    record.turn_status = "COMPLETED".to_string();

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use turn2_core::TokenUsage;

    fn stage() -> StageMetrics {
        StageMetrics {
            start_time: "2025-06-01T12:00:00Z".into(),
            end_time: "2025-06-01T12:00:05Z".into(),
            total_time_ms: 5000,
            bedrock_latency_ms: 4200,
            token_usage: TokenUsage::new(100, 50, 0),
        }
    }

    #[test]
    fn initializes_status_history_when_missing() {
        let record = apply_turn2_update(
            None,
            "verif-1",
            VerificationStatus::Turn2Completed,
            "2025-06-01T12:00:05Z",
            stage(),
            VerificationOutcome::Correct,
            vec![],
            "all good".into(),
        );
        assert_eq!(record.status_history.len(), 1);
    }

    #[test]
    fn appends_to_existing_status_history() {
        let existing = VerificationRecord {
            verification_id: "verif-1".into(),
            current_status: VerificationStatus::BedrockProcessing,
            status_history: vec![StatusHistoryEntry {
                status: VerificationStatus::Turn2Started,
                timestamp: "2025-06-01T12:00:00Z".into(),
            }],
            processing_metrics: ProcessingMetrics::default(),
            verification_status: VerificationOutcome::Unknown,
            discrepancies: vec![],
            verification_summary: String::new(),
        };
        let record = apply_turn2_update(
            Some(existing),
            "verif-1",
            VerificationStatus::Turn2Completed,
            "2025-06-01T12:00:05Z",
            stage(),
            VerificationOutcome::Correct,
            vec![],
            "all good".into(),
        );
        assert_eq!(record.status_history.len(), 2);
    }

    #[test]
    fn preserves_turn1_metrics_across_the_update() {
        let existing = VerificationRecord {
            verification_id: "verif-1".into(),
            current_status: VerificationStatus::BedrockProcessing,
            status_history: vec![],
            processing_metrics: ProcessingMetrics {
                turn1: Some(stage()),
                turn2: None,
            },
            verification_status: VerificationOutcome::Unknown,
            discrepancies: vec![],
            verification_summary: String::new(),
        };
        let record = apply_turn2_update(
            Some(existing),
            "verif-1",
            VerificationStatus::Turn2Completed,
            "2025-06-01T12:00:05Z",
            stage(),
            VerificationOutcome::Correct,
            vec![],
            "all good".into(),
        );
        assert!(record.processing_metrics.turn1.is_some());
        assert!(record.processing_metrics.turn2.is_some());
    }

    #[test]
    fn conversation_update_refuses_empty_verification_id() {
        let result = apply_turn2_conversation_update(None, "", vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn conversation_update_initializes_blank_record_when_absent() {
        let record = apply_turn2_conversation_update(
            None,
            "verif-1",
            vec![serde_json::json!({"role": "user"})],
        )
        .unwrap();
        assert_eq!(record.current_turn, 2);
        assert_eq!(record.turn_status, "COMPLETED");
        assert_eq!(record.history.len(), 1);
    }

    #[test]
    fn conversation_update_appends_to_existing_history() {
        let mut existing = ConversationRecord::blank("verif-1");
        existing.history.push(serde_json::json!({"role": "system"}));
        let record = apply_turn2_conversation_update(
            Some(existing),
            "verif-1",
            vec![serde_json::json!({"role": "user"})],
        )
        .unwrap();
        assert_eq!(record.history.len(), 2);
    }
}
