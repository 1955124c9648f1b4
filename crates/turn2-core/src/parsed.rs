use serde::{Deserialize, Serialize};

/// Aggregate judgment of the comparison. Serializes to the exact strings
/// the wire contract expects, including the empty string for "unknown"
/// (§3.1, invariant round-trip note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationOutcome {
    /// No discrepancies found.
    Correct,
    /// One or more discrepancies found.
    Incorrect,
    /// Neither structured parsing nor keyword fallback could classify the
    /// response.
    #[default]
    Unknown,
}

impl VerificationOutcome {
    /// Wire representation: `"CORRECT"`, `"INCORRECT"`, or `""`.
    #[must_use]
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::Correct => "CORRECT",
            Self::Incorrect => "INCORRECT",
            Self::Unknown => "",
        }
    }
}

impl Serialize for VerificationOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_wire_str())
    }
}

impl<'de> Deserialize<'de> for VerificationOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "CORRECT" => Self::Correct,
            "INCORRECT" => Self::Incorrect,
            _ => Self::Unknown,
        })
    }
}

/// One structured mismatch between the reference and checking states.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    /// Position identifier (e.g. a slot code).
    pub position: String,
    /// What was expected at this position.
    pub expected: String,
    /// What was actually found.
    pub found: String,
    /// Free-text description of the mismatch.
    pub issue: String,
    /// Model-reported confidence, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Result of parsing the assistant's Turn-2 response text (§4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTurn2Data {
    /// Aggregate judgment.
    pub verification_outcome: VerificationOutcome,
    /// Prose summary of the comparison.
    pub comparison_summary: String,
    /// Ordered list of discrepancies. MAY be empty — the parser always
    /// returns a value, never a nil/missing result.
    pub discrepancies: Vec<Discrepancy>,
}
