//! Chunker (spec §4.4) — splits prepared text into synthesis units bounded
//! by character and sentence limits, respecting sentence and dialogue
//! boundaries and never splitting mid-word.

use fancy_regex::Regex;
use once_cell::sync::Lazy;

use crate::prosody::emotion::{detect_emotion, Emotion};
use crate::prosody::voice::extract_speaker_hint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalClass {
    Scene,
    Exclaim,
    Question,
    Period,
    Comma,
    Other,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub has_dialogue: bool,
    pub sentence_count: usize,
    pub terminal_class: TerminalClass,
    pub speaker: Option<String>,
    pub emotion: Option<Emotion>,
}

fn strip_trailing_quotes(text: &str) -> &str {
    text.trim_end().trim_end_matches(['"', '\''])
}

pub fn classify_terminal(text: &str) -> TerminalClass {
    let tail = strip_trailing_quotes(text);
    if tail.ends_with('…') || tail.ends_with("...") {
        TerminalClass::Scene
    } else if tail.ends_with('!') {
        TerminalClass::Exclaim
    } else if tail.ends_with('?') {
        TerminalClass::Question
    } else if tail.ends_with('.') {
        TerminalClass::Period
    } else if tail.ends_with(',') || tail.ends_with(':') || tail.ends_with(';') {
        TerminalClass::Comma
    } else {
        TerminalClass::Other
    }
}

fn has_dialogue(text: &str) -> bool {
    text.contains('"')
}

fn build_chunk(text: String) -> Chunk {
    let terminal_class = classify_terminal(&text);
    let dialogue = has_dialogue(&text);
    let speaker = extract_speaker_hint(&text);
    let emotion = detect_emotion(&text);
    Chunk {
        has_dialogue: dialogue,
        sentence_count: 0,
        terminal_class,
        speaker,
        emotion,
        text,
    }
}

static RE_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s).+?(?:[.!?]+(?:["')\]]+)?)(?=\s+|$)|.+"#).unwrap());

/// Splits a paragraph into sentences, keeping trailing closing quotes
/// attached to their sentence-ending punctuation.
pub fn split_sentences_preserve_quotes(paragraph: &str) -> Vec<String> {
    RE_SENTENCE
        .find_iter(paragraph)
        .filter_map(|m| m.ok())
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

const PREFERRED_SEPARATORS: &[&str] = &[
    ", ", "; ", ": ", " - ", " – ", " und ", " oder ", " aber ",
];

/// Recursively splits a sentence longer than `max_chars` at the preferred
/// separator occurrence nearest the string's center, falling back to a hard
/// word boundary. Never splits mid-word.
pub fn split_overlong_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    if sentence.len() <= max_chars {
        return vec![sentence.to_string()];
    }

    let center = sentence.len() / 2;
    let mut best: Option<(usize, usize)> = None; // (start, end) of separator
    let mut best_distance = usize::MAX;
    for sep in PREFERRED_SEPARATORS {
        let mut search_from = 0;
        while let Some(rel) = sentence[search_from..].find(sep) {
            let start = search_from + rel;
            let end = start + sep.len();
            let distance = (start as isize - center as isize).unsigned_abs();
            if distance < best_distance {
                best_distance = distance;
                best = Some((start, end));
            }
            search_from = end;
        }
    }

    if let Some((start, end)) = best {
        let left = sentence[..start].trim();
        let right = sentence[end..].trim();
        if !left.is_empty() && !right.is_empty() {
            let mut parts = split_overlong_sentence(left, max_chars);
            parts.extend(split_overlong_sentence(right, max_chars));
            return parts;
        }
    }

    // Hard word-boundary fallback.
    let split_at = match sentence[..max_chars.min(sentence.len())].rfind(' ') {
        Some(pos) if pos as f64 >= max_chars as f64 * 0.55 => pos,
        _ => sentence[max_chars.min(sentence.len())..]
            .find(' ')
            .map(|p| p + max_chars.min(sentence.len()))
            .unwrap_or(sentence.len()),
    };

    if split_at == 0 || split_at >= sentence.len() {
        return vec![sentence.to_string()];
    }

    let left = sentence[..split_at].trim();
    let right = sentence[split_at..].trim();
    if left.is_empty() || right.is_empty() {
        return vec![sentence.to_string()];
    }
    let mut parts = split_overlong_sentence(left, max_chars);
    parts.extend(split_overlong_sentence(right, max_chars));
    parts
}

/// Splits prepared text into `Chunk`s bounded by `max_chunk_chars` and
/// `max_sentences_per_chunk`, separating dialogue/narration transitions
/// (spec §4.4).
pub fn split_text_into_chunks(text: &str, max_chunk_chars: usize, max_sentences_per_chunk: usize) -> Vec<Chunk> {
    let max_sentences = max_sentences_per_chunk.max(1);
    let mut chunks: Vec<Chunk> = Vec::new();

    let mut current = String::new();
    let mut current_sentence_count = 0usize;
    let mut current_has_dialogue = false;

    let flush = |current: &mut String, current_sentence_count: &mut usize, chunks: &mut Vec<Chunk>| {
        if !current.trim().is_empty() {
            let mut chunk = build_chunk(current.trim().to_string());
            chunk.sentence_count = *current_sentence_count;
            chunks.push(chunk);
        }
        current.clear();
        *current_sentence_count = 0;
    };

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        for raw_sentence in split_sentences_preserve_quotes(paragraph) {
            for sentence in split_overlong_sentence(&raw_sentence, max_chunk_chars) {
                let sentence_dialogue = has_dialogue(&sentence);
                let would_exceed = current.len() + sentence.len() + 1 > max_chunk_chars;
                let sentence_limit_hit = current_sentence_count >= max_sentences;
                let dialogue_boundary =
                    sentence_dialogue != current_has_dialogue && current.len() > 40;

                if !current.is_empty() && (would_exceed || sentence_limit_hit || dialogue_boundary) {
                    flush(&mut current, &mut current_sentence_count, &mut chunks);
                    current_has_dialogue = sentence_dialogue;
                }

                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&sentence);
                current_sentence_count += 1;
                current_has_dialogue = sentence_dialogue;
            }
        }
        // A paragraph boundary always aligns with a chunk boundary.
        flush(&mut current, &mut current_sentence_count, &mut chunks);
        current_has_dialogue = false;
    }
    flush(&mut current, &mut current_sentence_count, &mut chunks);

    chunks
}
