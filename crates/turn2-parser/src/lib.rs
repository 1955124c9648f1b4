//! Response Parser (§4.6): two-pass extraction of structured
//! discrepancies and a verification outcome from the assistant's
//! markdown/prose response.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fallback;
mod structured;

use turn2_core::{ParsedTurn2Data, VerificationOutcome};

/// Parse the assistant's Turn-2 text, trying the structured pass first
/// and falling back to keyword inference when it yields nothing (§4.6).
/// Always returns a value — discrepancies MAY be empty, outcome MAY be
/// [`VerificationOutcome::Unknown`], but the result is never absent.
#[must_use]
pub fn parse(assistant_text: &str) -> ParsedTurn2Data {
    let structured = structured::parse_structured(assistant_text);

    if !structured.discrepancies.is_empty()
        || structured.verification_outcome != VerificationOutcome::Unknown
    {
        return structured;
    }

    fallback::parse_fallback(assistant_text)
}
