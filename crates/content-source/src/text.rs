//! Plain-text normalization shared by every source adapter.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

fn control_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x1F\x7F-\x9F]").expect("valid control pattern"))
}

fn whitespace_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn entity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[xX]?[0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity pattern"))
}

fn slug_strip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug pattern"))
}

fn hyphen_run_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("valid hyphen pattern"))
}

fn named_entity(name: &str) -> Option<&'static str> {
    let decoded = match name.to_ascii_lowercase().as_str() {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "rsquo" | "lsquo" => "'",
        "ldquo" | "rdquo" => "\"",
        "ndash" | "mdash" => "-",
        "hellip" => "...",
        _ => return None,
    };
    Some(decoded)
}

fn numeric_entity(reference: &str) -> Option<char> {
    let code = match reference.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => reference.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

/// Decodes the supported named entities plus decimal and hex character
/// references. Anything unrecognized is left as written.
pub fn decode_html_entities(text: &str) -> String {
    entity_pattern()
        .replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            let entity = &caps[1];
            match entity.strip_prefix('#') {
                Some(reference) => numeric_entity(reference)
                    .map(String::from)
                    .unwrap_or_else(|| whole.to_string()),
                None => named_entity(entity)
                    .map(String::from)
                    .unwrap_or_else(|| whole.to_string()),
            }
        })
        .into_owned()
}

/// Removes markup, flattens whitespace and control characters to single
/// spaces, trims, then decodes entities.
pub fn strip_html(raw: &str) -> String {
    let text = tag_pattern().replace_all(raw, "");
    let text = control_pattern().replace_all(&text, " ");
    let text = whitespace_pattern().replace_all(&text, " ");
    decode_html_entities(text.trim())
}

/// Lower-cases and reduces `text` to `[a-z0-9-]`, joining words with single
/// hyphens.
pub fn to_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept = slug_strip_pattern().replace_all(lowered.trim(), "");
    let hyphenated = whitespace_pattern().replace_all(&kept, "-");
    hyphen_run_pattern()
        .replace_all(&hyphenated, "-")
        .into_owned()
}

/// Cuts `text` to at most `max_chars` characters, appending `...` only when
/// something was removed.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
