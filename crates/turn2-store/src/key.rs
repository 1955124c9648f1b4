use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use turn2_error::Turn2Error;

/// One of the fixed artifact categories under a date partition (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// `prompts/`
    Prompts,
    /// `responses/`
    Responses,
    /// `processing/`
    Processing,
    /// `images/`
    Images,
}

impl Category {
    fn as_str(self) -> &'static str {
        match self {
            Category::Prompts => "prompts",
            Category::Responses => "responses",
            Category::Processing => "processing",
            Category::Images => "images",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}/\d{2}/\d{2}/verif-[^/]+/(prompts|responses|processing|images)/[^/]+$")
            .unwrap()
    })
}

/// Build and validate a date-partitioned artifact key (§6.3, invariant #5).
///
/// # Errors
///
/// Returns [`Turn2Error::validation`] if `verification_id` or `file` is
/// empty, or if the assembled key fails the invariant-#5 regex (e.g. a
/// `verification_id` containing a `/`).
pub fn build(
    date: NaiveDate,
    verification_id: &str,
    category: Category,
    file: &str,
) -> Result<String, Turn2Error> {
    if verification_id.trim().is_empty() {
        return Err(Turn2Error::validation("artifact key verification_id is empty"));
    }
    if file.trim().is_empty() {
        return Err(Turn2Error::validation("artifact key file name is empty"));
    }

    let key = format!(
        "{}/{verification_id}/{category}/{file}",
        date.format("%Y/%m/%d")
    );

    if !key_re().is_match(&key) {
        return Err(Turn2Error::validation(format!(
            "artifact key '{key}' does not match the required date-partition format"
        )));
    }

    Ok(key)
}
