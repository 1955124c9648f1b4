use crate::context::VerificationType;
use crate::metrics::TokenUsage;
use crate::parsed::{Discrepancy, VerificationOutcome};
use crate::status::VerificationStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `summary` block of the output envelope (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Always `"COMPARISON_ANALYSIS"`.
    pub analysis_stage: String,
    /// Verification type, echoed from the request.
    pub verification_type: VerificationType,
    /// Total processing time for this invocation.
    pub processing_time_ms: u64,
    /// Token usage for the Turn-2 call.
    pub token_usage: TokenUsage,
    /// Provider call latency.
    pub bedrock_latency_ms: u64,
    /// Provider-assigned request id, if returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrock_request_id: Option<String>,
    /// `len(discrepancies)` — invariant #2.
    pub discrepancies_found: usize,
    /// Always `true` on return (comparison ran to completion).
    pub comparison_completed: bool,
    /// Always `true` on return (conversation record finalized).
    pub conversation_completed: bool,
    /// Whether the record-store update succeeded. `false` on partial
    /// success (§7, "Partial success").
    pub dynamodb_updated: bool,
    /// Always `true` on return (artifacts were written).
    pub s3_storage_completed: bool,
}

/// The outbound invocation envelope (§3.1, §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn2Response {
    /// Verification id, echoed from the request.
    pub verification_id: String,
    /// Terminal status.
    pub status: VerificationStatus,
    /// Merged reference tree. JSON field name MUST be `s3References`, not
    /// `s3Refs` (§3.1).
    pub s3_references: BTreeMap<String, serde_json::Value>,
    /// Processing summary.
    pub summary: Summary,
    /// Structured discrepancies.
    pub discrepancies: Vec<Discrepancy>,
    /// Aggregate judgment.
    pub verification_outcome: VerificationOutcome,
}
