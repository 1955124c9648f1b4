use regex::Regex;
use std::sync::OnceLock;
use turn2_core::{Discrepancy, ParsedTurn2Data, VerificationOutcome};

/// Scan for a markdown discrepancy table, a `Verification Outcome:` line,
/// and a `Summary:` paragraph. Rows that don't match the expected column
/// count are skipped rather than treated as a parse failure — a response
/// with a malformed row still yields whatever rows it can read.
pub fn parse_structured(text: &str) -> ParsedTurn2Data {
    let discrepancies = table_rows(text);
    let verification_outcome = outcome_line(text).unwrap_or(VerificationOutcome::Unknown);
    let comparison_summary = summary_paragraph(text).unwrap_or_default();

    ParsedTurn2Data {
        verification_outcome,
        comparison_summary,
        discrepancies,
    }
}

fn table_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*\|\s*([^|\n]+?)\s*\|\s*([^|\n]+?)\s*\|\s*([^|\n]+?)\s*\|\s*([^|\n]+?)\s*\|").unwrap()
    })
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\s|:-]+$").unwrap())
}

fn header_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^position$|^expected$|^found$|^issue$").unwrap())
}

fn table_rows(text: &str) -> Vec<Discrepancy> {
    let mut rows = Vec::new();
    for caps in table_row_re().captures_iter(text) {
        let position = caps[1].trim();
        let expected = caps[2].trim();
        let found = caps[3].trim();
        let issue = caps[4].trim();

        if separator_re().is_match(position) {
            continue;
        }
        if header_words_re().is_match(position) {
            continue;
        }

        rows.push(Discrepancy {
            position: position.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
            issue: issue.to_string(),
            confidence: None,
        });
    }
    rows
}

fn outcome_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)verification\s+outcome:\s*(correct|incorrect)").unwrap())
}

fn outcome_line(text: &str) -> Option<VerificationOutcome> {
    let caps = outcome_re().captures(text)?;
    match caps[1].to_ascii_lowercase().as_str() {
        "correct" => Some(VerificationOutcome::Correct),
        "incorrect" => Some(VerificationOutcome::Incorrect),
        _ => None,
    }
}

fn summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^summary:\s*(.+)$").unwrap())
}

fn summary_paragraph(text: &str) -> Option<String> {
    let caps = summary_re().captures(text)?;
    let s = caps[1].trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
