use serde::{Deserialize, Serialize};
use turn2_core::{Discrepancy, ProcessingMetrics, VerificationOutcome, VerificationStatus};

/// One entry in `statusHistory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    /// Status at this point in time.
    pub status: VerificationStatus,
    /// ISO-8601 timestamp of the transition.
    pub timestamp: String,
}

/// The verification record (§4.8), keyed by `verificationId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Partition key.
    pub verification_id: String,
    /// Most recent status.
    pub current_status: VerificationStatus,
    /// Append-only transition log. Initialized empty if absent on load.
    pub status_history: Vec<StatusHistoryEntry>,
    /// Whole-attribute processing metrics (`turn1`/`turn2` slots).
    pub processing_metrics: ProcessingMetrics,
    /// Mirrors the aggregate comparison judgment.
    pub verification_status: VerificationOutcome,
    /// Structured discrepancies from the parsed response.
    pub discrepancies: Vec<Discrepancy>,
    /// Prose summary of the comparison.
    pub verification_summary: String,
}

/// The conversation record (§4.8), keyed by `verificationId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    /// Partition key.
    pub verification_id: String,
    /// Which turn the conversation is currently on.
    pub current_turn: u8,
    /// `"COMPLETED"` once Turn-2 messages are appended.
    pub turn_status: String,
    /// Free-form metadata bag. Initialized to an empty object if absent
    /// on load.
    pub metadata: serde_json::Value,
    /// Full message list, appended to (never replaced). Initialized
    /// empty if absent on load (§4.8, §6.4).
    pub history: Vec<serde_json::Value>,
}

impl ConversationRecord {
    /// A fresh record for a verification id that has no prior row,
    /// with `metadata`/`history` already initialized (§4.8).
    #[must_use]
    pub fn blank(verification_id: impl Into<String>) -> Self {
        Self {
            verification_id: verification_id.into(),
            current_turn: 0,
            turn_status: "IN_PROGRESS".to_string(),
            metadata: serde_json::json!({}),
            history: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_conversation_record_has_initialized_collections() {
        let record = ConversationRecord::blank("verif-1");
        assert!(record.metadata.is_object());
        assert!(record.history.is_empty());
    }
}
