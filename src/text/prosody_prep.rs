//! Prosody Preparer — inserts micro-pause punctuation, dialogue pauses,
//! interjection commas and emphasis markers ahead of chunking (spec §4.2).

use fancy_regex::{Captures, Regex};
use once_cell::sync::Lazy;

use super::numbers::number_to_german;

const SPEECH_VERBS: &str = "sagte|rief|flüsterte|fragte|antwortete|meinte|murmelte|schrie|lachte|\
erklärte|bat|dachte|brummte|seufzte|stöhnte|jubelte|wisperte|knurrte|hauchte|schluchzte|\
jammerte|staunte|schnaubte|zischte|sang|brüllte";

const SUBORDINATE_CONJUNCTIONS: &str = "wenn|als|weil|dass|aber|doch|denn|obwohl|damit|bevor|\
nachdem|während|sobald|ob|falls|solange";

const INTERJECTIONS: &str = "Ach|Oh|Ah|Ooh|Wow|Hey|Hm|Hmm|Na|Naja|Tja|Aha|Ohje|Hoppla|Hurra|Ups|\
Autsch|Aua|Igitt|Pfui|Juhu|Oje|Mensch|Mist|Donnerwetter";

/// Pronouns/conjunctions exempted from all-caps capitalize-normalization.
/// spec.md states the whitelist is binding; see DESIGN.md for the
/// discrepancy with the original source's inert check.
const ALLCAPS_WHITELIST: &[&str] = &[
    "ICH", "DU", "ER", "SIE", "WIR", "IHR", "DAS", "DIE", "DER", "UND", "MIT",
];

/// Onomatopoeia stretch table: each word doubles an interior vowel for
/// rhythmic emphasis. Carried over verbatim from the original source.
const ONOMATOPOEIA: &[(&str, &str)] = &[
    ("Platsch", "Plaatsch"),
    ("platsch", "plaatsch"),
    ("Bumm", "Buumm"),
    ("bumm", "buumm"),
    ("Puff", "Puuff"),
    ("puff", "puuff"),
    ("Knall", "Knaall"),
    ("knall", "knaall"),
    ("Zisch", "Ziisch"),
    ("zisch", "ziisch"),
    ("Klopf", "Kloopf"),
    ("klopf", "kloopf"),
    ("Plopp", "Ploopp"),
    ("plopp", "ploopp"),
    ("Krach", "Kraach"),
    ("krach", "kraach"),
    ("Huiii", "Huuiii"),
    ("Pssst", "Psssst"),
    ("Huch", "Huuch"),
    ("huch", "huuch"),
    ("Wusch", "Wuusch"),
    ("wusch", "wuusch"),
    ("Schwupp", "Schwuupp"),
    ("schwupp", "schwuupp"),
    ("Rums", "Ruums"),
    ("rums", "ruums"),
    ("Piep", "Pieep"),
    ("piep", "pieep"),
    ("Miau", "Miauu"),
    ("miau", "miauu"),
    ("Wuff", "Wuuff"),
    ("wuff", "wuuff"),
    ("Brumm", "Bruumm"),
    ("brumm", "bruumm"),
    ("Ratsch", "Raatsch"),
    ("ratsch", "raatsch"),
    ("Klirr", "Kliirr"),
    ("klirr", "kliirr"),
    ("Kling", "Kliing"),
    ("kling", "kliing"),
    ("Dong", "Doong"),
    ("dong", "doong"),
    ("Tock", "Toock"),
    ("tock", "toock"),
    ("Tick", "Tiick"),
    ("tick", "tiick"),
];

static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());
static RE_DOUBLE_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2}(?!\.)").unwrap());

fn insert_paragraph_break_pause(text: &str) -> String {
    let text = RE_PARAGRAPH_BREAK.replace_all(text, ".\n\n").into_owned();
    RE_DOUBLE_PERIOD.replace_all(&text, ".").into_owned()
}

static RE_PRE_QUOTE_PAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])\s*\x22").unwrap());
static RE_POST_QUOTE_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"\x22\s*,?\s*({})\b"#, SPEECH_VERBS)).unwrap()
});
static RE_NAME_COLON_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w{3,}):\s*\x22").unwrap());

fn insert_dialogue_pauses(text: &str) -> String {
    let text = RE_PRE_QUOTE_PAUSE
        .replace_all(text, "$1 ... \"")
        .into_owned();
    let text = RE_POST_QUOTE_VERB
        .replace_all(&text, "\" ... $1")
        .into_owned();
    RE_NAME_COLON_QUOTE
        .replace_all(&text, "$1: ... \"")
        .into_owned()
}

static RE_EXCLAIM_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\s").unwrap());
static RE_QUESTION_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?\s").unwrap());
static RE_EXCLAIM_REPEAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").unwrap());
static RE_QUESTION_REPEAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").unwrap());

/// Mutually-exclusive per spec.md §9 Open Question: phoneme-silence relies
/// on the model's own punctuation-driven pauses, so duplicated punctuation
/// is collapsed instead of layered on top.
fn apply_emphasis_punctuation(text: &str, enable_phoneme_silence: bool) -> String {
    if enable_phoneme_silence {
        let text = RE_EXCLAIM_REPEAT.replace_all(text, "!").into_owned();
        RE_QUESTION_REPEAT.replace_all(&text, "?").into_owned()
    } else {
        let text = RE_EXCLAIM_SINGLE.replace_all(text, "!! ").into_owned();
        RE_QUESTION_SINGLE.replace_all(&text, "?? ").into_owned()
    }
}

static RE_SUBORDINATE_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(\w{{4,}})\s+({})\b", SUBORDINATE_CONJUNCTIONS)).unwrap()
});
static RE_UND_ODER_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w{6,})\s+(und|oder)\s+(\w{4,})").unwrap());

fn insert_clause_commas(text: &str) -> String {
    let text = RE_SUBORDINATE_COMMA
        .replace_all(text, "$1, $2")
        .into_owned();
    RE_UND_ODER_COMMA
        .replace_all(&text, "$1, $2 $3")
        .into_owned()
}

static RE_INTERJECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b({})[,!]?\s", INTERJECTIONS)).unwrap());

fn insert_interjection_pause(text: &str) -> String {
    RE_INTERJECTION.replace_all(text, "$1, ... ").into_owned()
}

static RE_BARE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());

fn replace_bare_integers(text: &str) -> String {
    RE_BARE_INTEGER
        .replace_all(text, |caps: &Captures| {
            let n: i64 = caps[0].parse().unwrap_or(-1);
            number_to_german(n)
        })
        .into_owned()
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

static RE_ONOMATOPOEIA: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    ONOMATOPOEIA
        .iter()
        .map(|(word, stretched)| {
            let pattern = format!(r"\b{}\b", escape_literal(word));
            (Regex::new(&pattern).unwrap(), *stretched)
        })
        .collect()
});

fn stretch_onomatopoeia(text: &str) -> String {
    let mut out = text.to_string();
    for (re, stretched) in RE_ONOMATOPOEIA.iter() {
        out = re.replace_all(&out, *stretched).into_owned();
    }
    out
}

static RE_TRAILING_ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.])(\n\n)").unwrap());

fn add_trailing_ellipsis(text: &str) -> String {
    RE_TRAILING_ELLIPSIS
        .replace_all(text, "$1 …$2")
        .into_owned()
}

static RE_ALLCAPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-ZÄÖÜ]{3,}\b").unwrap());

fn capitalize_german(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// All-caps words of 3+ characters capitalize-normalize, except the pronoun
/// whitelist (spec.md §4.2 step 9; see DESIGN.md for the intentional
/// divergence from the original source's inert exception check).
fn normalize_allcaps(text: &str) -> String {
    RE_ALLCAPS
        .replace_all(text, |caps: &Captures| {
            let word = &caps[0];
            if ALLCAPS_WHITELIST.contains(&word) {
                word.to_string()
            } else {
                capitalize_german(word)
            }
        })
        .into_owned()
}

static RE_DIRECT_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([A-ZÄÖÜ][a-zäöüß]+)\s*,").unwrap());

fn space_direct_address(text: &str) -> String {
    RE_DIRECT_ADDRESS
        .replace_all(text, ", $1, ")
        .into_owned()
}

static RE_DOUBLE_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*,").unwrap());
static RE_COMMA_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s*,").unwrap());
static RE_PERIOD_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*\.").unwrap());
static RE_QUAD_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").unwrap());
static RE_TRIPLE_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3}").unwrap());
static RE_PRE_PUNCT_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.!?,…])").unwrap());

fn cleanup_artifacts(text: &str) -> String {
    let text = RE_DOUBLE_COMMA.replace_all(text, ",").into_owned();
    let text = RE_COMMA_PERIOD.replace_all(&text, ".").into_owned();
    let text = RE_PERIOD_COMMA.replace_all(&text, ".").into_owned();
    let text = RE_QUAD_DOT.replace_all(&text, "…").into_owned();
    let text = RE_TRIPLE_DOT.replace_all(&text, "…").into_owned();
    RE_PRE_PUNCT_SPACE.replace_all(&text, "$1").into_owned()
}

/// Applies the Prosody Preparer's fixed-order rewrite chain (spec §4.2).
pub fn prepare_for_tts(text: &str, enable_phoneme_silence: bool) -> String {
    let text = insert_paragraph_break_pause(text);
    let text = insert_dialogue_pauses(&text);
    let text = apply_emphasis_punctuation(&text, enable_phoneme_silence);
    let text = insert_clause_commas(&text);
    let text = insert_interjection_pause(&text);
    let text = replace_bare_integers(&text);
    let text = stretch_onomatopoeia(&text);
    let text = add_trailing_ellipsis(&text);
    let text = normalize_allcaps(&text);
    let text = space_direct_address(&text);
    cleanup_artifacts(&text)
}
