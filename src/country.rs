//! Country name canonicalization.
//!
//! Lookup order: manual alias table, exact ISO 3166 lookup (codes, names and
//! alternates), fuzzy lookup, then title-cased input. Every step is
//! case-insensitive and whitespace-insensitive, so feeding a canonical name back
//! in returns it unchanged.

use crate::countries::COUNTRIES;
use crate::text::{clean_text, title_case};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Abbreviations and political-name variants seen in registry data.
const MANUAL_ALIASES: &[(&str, &str)] = &[
    ("USA", "United States"),
    ("U.S.", "United States"),
    ("U.S.A.", "United States"),
    ("US", "United States"),
    ("UK", "United Kingdom"),
    ("U.K.", "United Kingdom"),
    ("England", "United Kingdom"),
    ("Scotland", "United Kingdom"),
    ("Wales", "United Kingdom"),
    ("Northern Ireland", "United Kingdom"),
    ("Great Britain", "United Kingdom"),
    ("Korea", "South Korea"),
    ("Korea, Republic of", "South Korea"),
    ("People's Republic of China", "China"),
    ("PRC", "China"),
];

/// Shortest query the fuzzy lookup will try to place inside a country name.
const MIN_FUZZY_LEN: usize = 3;

static ALIASES: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    MANUAL_ALIASES
        .iter()
        .map(|(alias, name)| (fold(alias), *name))
        .collect()
});

/// Folded spelling -> canonical name. Canonical names are inserted first so
/// they always resolve to themselves.
static INDEX: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for country in COUNTRIES {
        index.insert(fold(country.name), country.name);
    }
    for country in COUNTRIES {
        let keys = [country.alpha2, country.alpha3]
            .into_iter()
            .chain(country.alternates.iter().copied());
        for key in keys {
            index.entry(fold(key)).or_insert(country.name);
        }
    }
    index
});

fn fold(raw: &str) -> String {
    clean_text(raw).to_lowercase()
}

/// Canonical country name, or `None` for blank input.
///
/// Never fails: unknown names come back title-cased.
pub fn canonicalize_country(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    let key = cleaned.to_lowercase();

    if let Some(name) = ALIASES.get(&key) {
        return Some((*name).to_string());
    }
    if let Some(name) = INDEX.get(&key) {
        return Some((*name).to_string());
    }
    if let Some(name) = fuzzy_lookup(&key) {
        debug!(input = %cleaned, country = name, "Fuzzy country match");
        return Some(name.to_string());
    }
    Some(title_case(&cleaned))
}

/// [`canonicalize_country`] over an optional value.
pub fn canonicalize_optional(raw: Option<&str>) -> Option<String> {
    raw.and_then(canonicalize_country)
}

/// Best partial match for an already-folded key.
///
/// A country name containing the key beats the key containing a country name
/// as a whole word; within each kind the closest length wins, then table order.
fn fuzzy_lookup(key: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .filter_map(|country| {
            country
                .names()
                .filter_map(|name| {
                    let folded = fold(name);
                    if key.chars().count() >= MIN_FUZZY_LEN && folded.contains(key) {
                        Some((0u8, folded.len() - key.len()))
                    } else if contains_word(key, &folded) {
                        Some((1u8, key.len() - folded.len()))
                    } else {
                        None
                    }
                })
                .min()
                .map(|score| (score, country.name))
        })
        .min_by_key(|(score, _)| *score)
        .map(|(_, name)| name)
}

/// Whether `needle` occurs in `haystack` bounded by non-alphanumeric characters.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: &str) -> Option<String> {
        canonicalize_country(raw)
    }

    #[test]
    fn test_manual_aliases() {
        assert_eq!(canon("USA").as_deref(), Some("United States"));
        assert_eq!(canon("U.K.").as_deref(), Some("United Kingdom"));
        assert_eq!(canon("Korea, Republic of").as_deref(), Some("South Korea"));
        assert_eq!(canon("PRC").as_deref(), Some("China"));
    }

    #[test]
    fn test_exact_lookup() {
        assert_eq!(canon("germany").as_deref(), Some("Germany"));
        assert_eq!(canon("DEU").as_deref(), Some("Germany"));
        assert_eq!(canon("Russian Federation").as_deref(), Some("Russia"));
        assert_eq!(canon("  Viet   Nam ").as_deref(), Some("Vietnam"));
        assert_eq!(canon("Iran, Islamic Republic of").as_deref(), Some("Iran"));
    }

    #[test]
    fn test_fuzzy_lookup() {
        assert_eq!(canon("Berlin, Germany").as_deref(), Some("Germany"));
        assert_eq!(canon("Emirates").as_deref(), Some("United Arab Emirates"));
        // "niger" inside "nigeria" is not a whole word
        assert_eq!(canon("Nigeria State").as_deref(), Some("Nigeria"));
    }

    #[test]
    fn test_fallback_title_case() {
        assert_eq!(canon("atlantis").as_deref(), Some("Atlantis"));
        assert_eq!(canon("   "), None);
        assert_eq!(canon(""), None);
    }

    #[test]
    fn test_idempotent() {
        let inputs = COUNTRIES
            .iter()
            .map(|c| c.name)
            .chain(["USA", "england", "Berlin, Germany", "atlantis", "xx yy", "Korea", "ab"]);
        for raw in inputs {
            let once = canon(raw);
            let twice = once.as_deref().and_then(canonicalize_country);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("lagos, nigeria", "nigeria"));
        assert!(!contains_word("nigeria", "niger"));
        assert!(!contains_word("anything", ""));
    }
}
