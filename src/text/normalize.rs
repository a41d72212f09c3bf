//! Text Normalizer — deterministic rewrites applied first in the pipeline:
//! abbreviation expansion, time-of-day spelling, quote unification, markdown
//! stripping, number ranges, dash replacement, whitespace collapsing.

use fancy_regex::{Captures, Regex};
use once_cell::sync::Lazy;

use super::numbers::number_to_german;

/// Closed set of German abbreviation expansions, applied in this order.
/// `u.s.w.` (alternate spelling of `usw.`) and `abs.` are carried over from
/// the original source as a supplement to spec.md's list.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("z.B.", "zum Beispiel"),
    ("d.h.", "das heißt"),
    ("u.a.", "unter anderem"),
    ("bzw.", "beziehungsweise"),
    ("u.s.w.", "und so weiter"),
    ("usw.", "und so weiter"),
    ("ca.", "circa"),
    ("Dr.", "Doktor"),
    ("Prof.", "Professor"),
    ("Hr.", "Herr"),
    ("Fr.", "Frau"),
    ("Nr.", "Nummer"),
    ("Str.", "Straße"),
    ("St.", "Sankt"),
    ("o.ä.", "oder ähnliches"),
    ("s.o.", "siehe oben"),
    ("ggf.", "gegebenenfalls"),
    ("evtl.", "eventuell"),
    ("Mio.", "Millionen"),
    ("Mrd.", "Milliarden"),
    ("z.T.", "zum Teil"),
    ("v.a.", "vor allem"),
    ("i.d.R.", "in der Regel"),
    ("sog.", "sogenannt"),
    ("ehem.", "ehemalig"),
    ("abs.", "absolut"),
];

static RE_ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbr, expansion)| {
            let pattern = format!(r"\b{}", regex_escape(abbr));
            (Regex::new(&pattern).unwrap(), *expansion)
        })
        .collect()
});

fn regex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        if ".\\+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn expand_abbreviations(text: &str) -> String {
    let mut text = text.to_string();
    for (re, expansion) in RE_ABBREVIATIONS.iter() {
        text = re.replace_all(&text, *expansion).into_owned();
    }
    text
}

static RE_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());

fn expand_time(text: &str) -> String {
    RE_TIME
        .replace_all(text, |caps: &Captures| {
            let h: i64 = caps[1].parse().unwrap_or(0);
            let m: i64 = caps[2].parse().unwrap_or(0);
            crate::text::numbers::time_to_german(h, m)
        })
        .into_owned()
}

const QUOTE_CHARS: &[char] = &['„', '"', '"', '»', '«', '›', '‹'];

fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| if QUOTE_CHARS.contains(&c) { '"' } else { c })
        .collect()
}

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());

fn strip_markdown(text: &str) -> String {
    let text = RE_BOLD.replace_all(text, "$1").into_owned();
    let text = RE_ITALIC.replace_all(&text, "$1").into_owned();
    let text = RE_LINK.replace_all(&text, "$1").into_owned();
    RE_HEADING.replace_all(&text, "").into_owned()
}

static RE_SCENE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[\*\-]{3,}\s*$").unwrap());

fn replace_scene_markers(text: &str) -> String {
    RE_SCENE_MARKER.replace_all(text, "…").into_owned()
}

static RE_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvon\s+(\d+)\s+bis\s+(\d+)\b").unwrap());

fn expand_number_ranges(text: &str) -> String {
    RE_RANGE
        .replace_all(text, |caps: &Captures| {
            let lo: i64 = caps[1].parse().unwrap_or(0);
            let hi: i64 = caps[2].parse().unwrap_or(0);
            format!("von {} bis {}", number_to_german(lo), number_to_german(hi))
        })
        .into_owned()
}

fn replace_dashes(text: &str) -> String {
    text.replace('—', ", ").replace('–', ", ")
}

static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_whitespace(text: &str) -> String {
    let text = RE_NEWLINES.replace_all(text, "\n\n").into_owned();
    RE_SPACES.replace_all(&text, " ").into_owned()
}

/// Applies the Text Normalizer's fixed-order rewrite chain (spec §4.1).
pub fn normalize(text: &str) -> String {
    let text = expand_abbreviations(text);
    let text = expand_time(&text);
    let text = normalize_quotes(&text);
    let text = strip_markdown(&text);
    let text = replace_scene_markers(&text);
    let text = expand_number_ranges(&text);
    let text = replace_dashes(&text);
    let text = collapse_whitespace(&text);
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_abbreviations() {
        let out = normalize("Ich bin z.B. müde.");
        assert!(out.contains("zum Beispiel"), "got: {}", out);
    }

    #[test]
    fn expands_usw_and_variant() {
        assert!(normalize("und so weiter, usw.").contains("und so weiter"));
        assert!(normalize("u.s.w. und mehr").contains("und so weiter"));
    }

    #[test]
    fn expands_time() {
        let out = normalize("Es ist 14:30 Uhr.");
        assert!(out.contains("vierzehn Uhr dreißig"), "got: {}", out);
    }

    #[test]
    fn time_with_zero_minutes_omits_minute_word() {
        let out = normalize("Um 9:00 trafen sie sich.");
        assert!(out.contains("neun Uhr"), "got: {}", out);
        assert!(!out.contains("neun Uhr null"), "got: {}", out);
    }

    #[test]
    fn normalizes_quotes() {
        let out = normalize("„Hallo“ sagte er »leise«.");
        assert_eq!(out.matches('"').count(), 4);
    }

    #[test]
    fn strips_markdown() {
        let out = normalize("**Wichtig**: das ist *kursiv* # Überschrift [hier](http://x)");
        assert!(!out.contains('*'));
        assert!(out.contains("hier"));
        assert!(!out.contains("http://x"));
    }

    #[test]
    fn expands_number_ranges() {
        let out = normalize("Es waren von 3 bis 7 Kinder da.");
        assert!(out.contains("von drei bis sieben"), "got: {}", out);
    }

    #[test]
    fn replaces_dashes() {
        let out = normalize("Das Haus – alt und grau — stand da.");
        assert!(!out.contains('–'));
        assert!(!out.contains('—'));
    }

    #[test]
    fn collapses_whitespace() {
        let out = normalize("Zeile eins\n\n\n\nZeile zwei   mit   Leerzeichen");
        assert!(out.contains("\n\n"));
        assert!(!out.contains("\n\n\n"));
        assert!(!out.contains("  "));
    }
}
