use regex::Regex;
use std::sync::OnceLock;
use turn2_core::ContentBlock;

/// Concatenate text from all `Text` blocks in order (§4.5 bullet 1). For
/// `Other` blocks, attempt the "single matching string field of
/// reasonable length" fallback the spec calls for in place of the
/// source's reflective field walk; failing that, the block is ignored.
#[must_use]
pub fn extract_text(blocks: &[ContentBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            ContentBlock::Text { text } => out.push_str(text),
            ContentBlock::Other(raw) => {
                if let Some(text) = plausible_string_field(raw) {
                    out.push_str(&text);
                }
            }
            _ => {}
        }
    }
    out
}

/// Extract thinking content by, in priority order (§4.5 bullet 2):
/// (a) dedicated `Thinking` blocks, (b) `<reasoning>…</reasoning>`,
/// (c) `<thinking>…</thinking>`, (d) ` ```thinking ` fenced code block,
/// (e) section headers `# Thinking`, `## Thinking`, `Thinking:` up to the
/// next section header.
#[must_use]
pub fn extract_thinking(blocks: &[ContentBlock], assistant_text: &str) -> Option<String> {
    for block in blocks {
        if let ContentBlock::Thinking { thinking } = block {
            if !thinking.trim().is_empty() {
                return Some(thinking.clone());
            }
        }
    }

    if let Some(m) = reasoning_tag_re().captures(assistant_text) {
        return Some(m[1].trim().to_string());
    }
    if let Some(m) = thinking_tag_re().captures(assistant_text) {
        return Some(m[1].trim().to_string());
    }
    if let Some(m) = fenced_thinking_re().captures(assistant_text) {
        return Some(m[1].trim().to_string());
    }
    if let Some(m) = thinking_header_re().captures(assistant_text) {
        return Some(m[1].trim().to_string());
    }

    None
}

fn reasoning_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<reasoning>(.*?)</reasoning>").unwrap())
}

fn thinking_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<thinking>(.*?)</thinking>").unwrap())
}

fn fenced_thinking_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```thinking\s*\n(.*?)```").unwrap())
}

fn thinking_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?ims)^(?:#{1,2}\s*Thinking\s*$|Thinking:)\s*\n?(.*?)(?:\n#{1,2}\s|\n[A-Z][A-Za-z ]*:|\z)")
            .unwrap()
    })
}

/// Reasonable-length string-field heuristic replacing the source's
/// reflective traversal: takes the first string value (other than
/// `"type"`) between 1 and 4000 characters.
fn plausible_string_field(raw: &serde_json::Value) -> Option<String> {
    let obj = raw.as_object()?;
    for (key, value) in obj {
        if key == "type" {
            continue;
        }
        if let Some(s) = value.as_str() {
            if !s.is_empty() && s.len() <= 4000 {
                return Some(s.to_string());
            }
        }
    }
    None
}
