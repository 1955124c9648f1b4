use turn2_core::{ParsedTurn2Data, VerificationOutcome};

const CORRECT_SUMMARY: &str =
    "Analysis indicates all positions are properly filled with expected products.";
const INCORRECT_SUMMARY: &str = "Analysis indicates potential discrepancies in product placement.";

/// Keyword-based inference used only when the structured pass finds
/// neither discrepancy rows nor an explicit outcome line (§4.6).
pub fn parse_fallback(text: &str) -> ParsedTurn2Data {
    let lower = text.to_ascii_lowercase();

    let verification_outcome = if lower.contains("all") && (lower.contains("filled") || lower.contains("products")) {
        VerificationOutcome::Correct
    } else if lower.contains("discrepanc") || lower.contains("missing") || lower.contains("incorrect") {
        VerificationOutcome::Incorrect
    } else {
        VerificationOutcome::Unknown
    };

    let comparison_summary = match verification_outcome {
        VerificationOutcome::Correct => CORRECT_SUMMARY.to_string(),
        VerificationOutcome::Incorrect => INCORRECT_SUMMARY.to_string(),
        VerificationOutcome::Unknown => String::new(),
    };

    ParsedTurn2Data {
        verification_outcome,
        comparison_summary,
        discrepancies: Vec::new(),
    }
}
