use crate::VerificationStatus;
use serde::{Deserialize, Serialize};

/// Verification type, selecting the Turn-2 prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationType {
    /// Compare the checking image against the layout.
    LayoutVsChecking,
    /// Compare the checking image against a previous checking image.
    PreviousVsCurrent,
}

/// Identity and type of one verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationContext {
    /// Primary key across stores. Non-empty.
    pub verification_id: String,
    /// ISO-8601 instant the verification was created.
    pub verification_at: String,
    /// Verification type, selecting the Turn-2 template.
    pub verification_type: VerificationType,
    /// Vending machine identifier, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vending_machine_id: Option<String>,
    /// Layout identifier, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    /// Layout prefix, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_prefix: Option<String>,
    /// Current status. Absent on the inbound envelope unless this is a
    /// re-drive; the orchestrator sets it for every subsequent transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VerificationStatus>,
}

impl VerificationContext {
    /// Returns `true` if `verification_id` is non-empty, as required before
    /// any store operation keyed by it.
    #[must_use]
    pub fn has_valid_id(&self) -> bool {
        !self.verification_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VerificationContext {
        VerificationContext {
            verification_id: "verif-20250601120000-abcd".into(),
            verification_at: "2025-06-01T12:00:00Z".into(),
            verification_type: VerificationType::LayoutVsChecking,
            vending_machine_id: None,
            layout_id: None,
            layout_prefix: None,
            status: None,
        }
    }

    #[test]
    fn valid_id_detected() {
        assert!(sample().has_valid_id());
    }

    #[test]
    fn empty_id_detected() {
        let mut ctx = sample();
        ctx.verification_id.clear();
        assert!(!ctx.has_valid_id());
    }

    #[test]
    fn serializes_type_as_screaming_snake_case() {
        let ctx = sample();
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"LAYOUT_VS_CHECKING\""));
        assert!(!json.contains("vendingMachineId"));
    }

    #[test]
    fn roundtrips_with_optional_fields_set() {
        let mut ctx = sample();
        ctx.vending_machine_id = Some("vm-1".into());
        ctx.status = Some(VerificationStatus::Turn2Completed);
        let json = serde_json::to_string(&ctx).unwrap();
        let back: VerificationContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vending_machine_id.as_deref(), Some("vm-1"));
        assert_eq!(back.status, Some(VerificationStatus::Turn2Completed));
    }
}
