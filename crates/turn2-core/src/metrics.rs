use serde::{Deserialize, Serialize};

/// Token usage for one LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input (prompt) tokens.
    pub input: u64,
    /// Output (completion) tokens.
    pub output: u64,
    /// Thinking/reasoning tokens, if the provider reports them. Defaults
    /// to 0 per invariant #4.
    #[serde(default)]
    pub thinking: u64,
    /// `input + output + thinking`. Recomputed by [`TokenUsage::new`]
    /// rather than trusted from the wire, so invariant #4 always holds
    /// for values this crate constructs.
    pub total: u64,
}

impl TokenUsage {
    /// Build a usage record, computing `total` from the parts.
    #[must_use]
    pub fn new(input: u64, output: u64, thinking: u64) -> Self {
        Self {
            input,
            output,
            thinking,
            total: input + output + thinking,
        }
    }
}

/// Timing and usage for one stage (Turn-1 or Turn-2) of processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageMetrics {
    /// ISO-8601 start instant.
    pub start_time: String,
    /// ISO-8601 end instant.
    pub end_time: String,
    /// Wall-clock duration of the stage.
    pub total_time_ms: u64,
    /// Time spent in the provider call specifically.
    pub bedrock_latency_ms: u64,
    /// Token usage for the stage.
    pub token_usage: TokenUsage,
}

/// Processing metrics stored as a whole attribute on the verification
/// record. `turn1` and `turn2` are independent slots; the Turn-2 updater
/// MUST only ever set `turn2`, merging with any pre-existing `turn1`
/// (§3.2, §4.8, invariant #6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Turn-1 stage metrics, if previously recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn1: Option<StageMetrics>,
    /// Turn-2 stage metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn2: Option<StageMetrics>,
}

impl ProcessingMetrics {
    /// Merge `turn2` metrics into a possibly-absent existing
    /// `ProcessingMetrics`, preserving any existing `turn1` slot
    /// untouched. This is the only supported way to set `turn2` — see
    /// the "no nested-path attribute updates" design note.
    #[must_use]
    pub fn with_turn2(existing: Option<ProcessingMetrics>, turn2: StageMetrics) -> Self {
        let turn1 = existing.and_then(|m| m.turn1);
        Self {
            turn1,
            turn2: Some(turn2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stage() -> StageMetrics {
        StageMetrics {
            start_time: "2025-06-01T12:00:00Z".into(),
            end_time: "2025-06-01T12:00:05Z".into(),
            total_time_ms: 5000,
            bedrock_latency_ms: 4200,
            token_usage: TokenUsage::new(100, 50, 0),
        }
    }

    #[test]
    fn token_usage_total_is_sum_of_parts() {
        let usage = TokenUsage::new(10, 20, 5);
        assert_eq!(usage.total, 35);
    }

    #[test]
    fn thinking_defaults_to_zero_when_absent_on_wire() {
        let json = r#"{"input":10,"output":20,"total":30}"#;
        let usage: TokenUsage = serde_json::from_str(json).unwrap();
        assert_eq!(usage.thinking, 0);
    }

    #[test]
    fn with_turn2_preserves_existing_turn1() {
        let existing = ProcessingMetrics {
            turn1: Some(sample_stage()),
            turn2: None,
        };
        let merged = ProcessingMetrics::with_turn2(Some(existing), sample_stage());
        assert!(merged.turn1.is_some());
        assert!(merged.turn2.is_some());
    }

    #[test]
    fn with_turn2_handles_absent_parent() {
        let merged = ProcessingMetrics::with_turn2(None, sample_stage());
        assert!(merged.turn1.is_none());
        assert!(merged.turn2.is_some());
    }

    #[test]
    fn with_turn2_never_overwrites_turn1_with_turn2_data() {
        let existing = ProcessingMetrics {
            turn1: Some(sample_stage()),
            turn2: None,
        };
        let new_turn2 = StageMetrics {
            total_time_ms: 9999,
            ..sample_stage()
        };
        let merged = ProcessingMetrics::with_turn2(Some(existing), new_turn2);
        assert_eq!(merged.turn1.unwrap().total_time_ms, 5000);
        assert_eq!(merged.turn2.unwrap().total_time_ms, 9999);
    }
}
