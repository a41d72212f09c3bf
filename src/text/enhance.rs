//! Story Enhancer & Pronunciation Mapper (spec §4.3) — converts
//! parentheticals to comma-pauses, normalizes chapter/scene headings and a
//! handful of punctuation substitutions, then applies a user-supplied
//! pronunciation map.

use std::collections::HashMap;

use fancy_regex::{Captures, Regex};
use once_cell::sync::Lazy;

static RE_PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

fn rewrite_parentheticals(text: &str) -> String {
    RE_PARENTHETICAL
        .replace_all(text, |caps: &Captures| format!(", {},", &caps[1]))
        .into_owned()
}

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^(kapitel\s+\d+|szene\s+\d+)").unwrap());

fn rewrite_headings(text: &str) -> String {
    RE_HEADING.replace_all(text, "$1. ").into_owned()
}

static RE_SHIFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?])\s*(Doch|Aber|Plötzlich|Dann)\b").unwrap());

fn prefix_topic_shifters(text: &str) -> String {
    RE_SHIFTER.replace_all(text, "$1 … $2").into_owned()
}

fn apply_punctuation_substitutions(text: &str) -> String {
    let text = text.replace(';', ". ");
    let text = text.replace('/', " oder ");
    let text = text.replace('&', " und ");
    collapse_ellipsis_runs(&text)
}

static RE_ELLIPSIS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}").unwrap());

fn collapse_ellipsis_runs(text: &str) -> String {
    RE_ELLIPSIS_RUN.replace_all(text, "…").into_owned()
}

/// Applies a word-boundary, case-insensitive pronunciation substitution
/// table built from `EngineConfig::custom_pronunciations`.
pub fn apply_custom_pronunciations(text: &str, pronunciations: &HashMap<String, String>) -> String {
    let mut out = text.to_string();
    for (name, phonetic) in pronunciations {
        let pattern = format!(r"(?i)\b{}\b", escape_literal(name));
        if let Ok(re) = Regex::new(&pattern) {
            out = re.replace_all(&out, phonetic.as_str()).into_owned();
        }
    }
    out
}

fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        if ".\\+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Applies the Story Enhancer rewrite chain (spec §4.3), excluding the
/// pronunciation map which is applied separately via
/// [`apply_custom_pronunciations`] since it depends on per-request config.
pub fn enhance(text: &str) -> String {
    let text = rewrite_parentheticals(text);
    let text = rewrite_headings(&text);
    let text = apply_punctuation_substitutions(&text);
    prefix_topic_shifters(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parentheticals_become_comma_pauses() {
        let out = enhance("Sie ging (langsam) nach Hause.");
        assert!(out.contains(", langsam,"), "got: {}", out);
    }

    #[test]
    fn chapter_headings_get_sentence_break() {
        let out = enhance("Kapitel 3\nEs war einmal...");
        assert!(out.starts_with("Kapitel 3. "), "got: {}", out);
    }

    #[test]
    fn semicolons_become_periods() {
        let out = enhance("Er kam; sie ging.");
        assert!(out.contains(". "), "got: {}", out);
        assert!(!out.contains(';'));
    }

    #[test]
    fn slash_and_ampersand_substitution() {
        let out = enhance("Tee/Kaffee & Kuchen");
        assert!(out.contains("oder"));
        assert!(out.contains("und"));
    }

    #[test]
    fn topic_shifters_get_ellipsis_prefix() {
        let out = enhance("Sie lachte. Dann weinte sie.");
        assert!(out.contains("… Dann"), "got: {}", out);
    }

    #[test]
    fn custom_pronunciations_applied() {
        let mut map = HashMap::new();
        map.insert("Hermine".to_string(), "her-MEE-oh-neh".to_string());
        let out = apply_custom_pronunciations("Hermine lief schnell.", &map);
        assert!(out.contains("her-MEE-oh-neh"));
    }
}
