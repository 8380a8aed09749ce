//! Text, trial identifier and year normalization.
//!
//! Both acquisition paths run their raw strings through these helpers so that
//! identifiers and titles compare equal regardless of which source produced them.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// `NCT` followed by at least four digits, tolerating a space after the prefix.
static NCT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNCT\s*([0-9]{4,})\b").expect("valid NCT regex"));

/// A 19xx/20xx token standing on its own.
static PLAUSIBLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)[0-9]{2}\b").expect("valid year regex"));

/// Any run of four ASCII digits.
static ANY_FOUR_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("valid digit regex"));

/// Zero-width and directional marks plus the byte-order mark.
fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{FEFF}')
}

/// Normalize non-breaking spaces and invisible characters, collapse whitespace
/// runs to a single space and trim.
pub fn clean_text(raw: &str) -> String {
    let visible: String = raw
        .chars()
        .filter(|c| !is_invisible(*c))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect();
    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`clean_text`], mapping an empty result to `None`.
pub fn clean_non_empty(raw: &str) -> Option<String> {
    Some(clean_text(raw)).filter(|s| !s.is_empty())
}

/// [`clean_non_empty`] over an optional value.
pub fn clean_optional(raw: Option<&str>) -> Option<String> {
    raw.and_then(clean_non_empty)
}

/// Canonical trial identifier.
///
/// Returns `NCT<digits>` when the cleaned text contains an NCT number, the
/// cleaned text itself when it does not, and `None` when nothing is left after
/// cleaning. Applying it twice gives the same answer as applying it once.
pub fn canonical_nct(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    match NCT_PATTERN.captures(&cleaned).and_then(|caps| caps.get(1)) {
        Some(digits) => Some(format!("NCT{}", digits.as_str())),
        None => Some(cleaned),
    }
}

/// First plausible four-digit year in `text`.
///
/// A standalone 19xx/20xx token wins; otherwise the first run of four digits is
/// taken, which can pick up unrelated numbers (phone or identifier fragments).
pub fn extract_year(text: &str) -> Option<i32> {
    if let Some(m) = PLAUSIBLE_YEAR.find(text) {
        return m.as_str().parse().ok();
    }
    let m = ANY_FOUR_DIGITS.find(text)?;
    debug!(text, token = m.as_str(), "No 19xx/20xx token, using first four-digit run");
    m.as_str().parse().ok()
}

/// Title-case each whitespace-separated word, collapsing whitespace.
///
/// Characters whose uppercase form expands to several characters are left
/// lowercase so the result is stable under repeated application.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => {
                    let mut upper = first.to_uppercase();
                    let head = match (upper.next(), upper.next()) {
                        (Some(single), None) => single,
                        _ => first,
                    };
                    std::iter::once(head).chain(chars).collect::<String>()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
