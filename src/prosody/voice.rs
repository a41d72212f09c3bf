//! Speaker-hint extraction and deterministic per-speaker prosody profiles
//! (spec §4.5). The hash formula must be bit-reproducible across runs since
//! it is the only source of per-character voice variation absent an explicit
//! `character_voice_profiles` entry.

use std::collections::HashMap;

use fancy_regex::Regex;
use once_cell::sync::Lazy;

use crate::config::VoiceProfile;

const SPEECH_VERBS: &[&str] = &[
    "sagte", "fragte", "rief", "flüsterte", "antwortete", "murmelte", "schrie",
    "erwiderte", "meinte", "brummte", "seufzte", "lachte", "knurrte", "stotterte",
    "flehte", "befahl", "verkündete", "gestand", "wisperte", "fauchte", "grollte",
    "kicherte", "schluchzte", "stöhnte", "jubelte", "donnerte",
];

static RE_QUOTE_NAME_COLON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w{2,}):\s*["„]"#).unwrap());

static RE_NAME_VERB_QUOTE: Lazy<Regex> = Lazy::new(|| {
    let verbs = SPEECH_VERBS.join("|");
    Regex::new(&format!(r#"["“]\s*,?\s*(\w{{2,}})\s+({verbs})\b"#)).unwrap()
});

static RE_VERB_NAME_QUOTE: Lazy<Regex> = Lazy::new(|| {
    let verbs = SPEECH_VERBS.join("|");
    Regex::new(&format!(r#"(\w{{2,}})\s+({verbs})\s*:?\s*["„]"#)).unwrap()
});

/// Extracts the most likely speaker name from dialogue attribution patterns:
/// `Name: "..."`, `"..." Name sagte`, and `Name sagte: "..."`.
pub fn extract_speaker_hint(text: &str) -> Option<String> {
    if let Ok(Some(caps)) = RE_QUOTE_NAME_COLON.captures(text) {
        return Some(caps[1].to_string());
    }
    if let Ok(Some(caps)) = RE_NAME_VERB_QUOTE.captures(text) {
        return Some(caps[1].to_string());
    }
    if let Ok(Some(caps)) = RE_VERB_NAME_QUOTE.captures(text) {
        return Some(caps[1].to_string());
    }
    None
}

/// Deterministic per-character prosody offsets derived from a name's
/// codepoints when no explicit `character_voice_profiles` entry exists.
///
/// `seed = sum((i + 1) * codepoint)` over the name's chars, 0-indexed.
/// This formula and the modulo ranges below must stay bit-exact.
pub fn hash_profile(name: &str) -> VoiceProfile {
    let seed: u64 = name
        .chars()
        .enumerate()
        .map(|(i, c)| (i as u64 + 1) * c as u64)
        .sum();

    let length_multiplier = 0.96 + ((seed % 9) as f32) / 100.0;
    let noise_delta = (((seed / 17) % 11) as i64 - 5) as f32 / 100.0;
    let noise_w_delta = (((seed / 255) % 11) as i64 - 5) as f32 / 100.0;

    VoiceProfile {
        length_multiplier,
        noise_delta,
        noise_w_delta,
    }
}

/// Resolves a speaker's profile: explicit config entry (case-insensitive
/// lookup) takes priority, falling back to the deterministic hash.
pub fn resolve_profile(name: &str, configured: &HashMap<String, VoiceProfile>) -> VoiceProfile {
    let key = name.to_lowercase();
    configured
        .get(&key)
        .cloned()
        .unwrap_or_else(|| hash_profile(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_colon_quote_pattern() {
        assert_eq!(
            extract_speaker_hint("Leo: \"Komm mit!\""),
            Some("Leo".to_string())
        );
    }

    #[test]
    fn quote_then_name_verb_pattern() {
        let hint = extract_speaker_hint("\"Komm mit\", Leo rief laut.");
        assert_eq!(hint, Some("Leo".to_string()));
    }

    #[test]
    fn name_verb_then_quote_pattern() {
        let hint = extract_speaker_hint("Leo sagte: \"Komm mit!\"");
        assert_eq!(hint, Some("Leo".to_string()));
    }

    #[test]
    fn no_dialogue_returns_none() {
        assert_eq!(extract_speaker_hint("Der Wald war still."), None);
    }

    #[test]
    fn hash_profile_is_deterministic() {
        let a = hash_profile("leo");
        let b = hash_profile("leo");
        assert_eq!(a.length_multiplier, b.length_multiplier);
        assert_eq!(a.noise_delta, b.noise_delta);
        assert_eq!(a.noise_w_delta, b.noise_w_delta);
    }

    #[test]
    fn hash_profile_stays_in_range() {
        for name in ["leo", "mira", "der alte könig", "x"] {
            let p = hash_profile(name);
            assert!(p.length_multiplier >= 0.96 && p.length_multiplier < 1.04);
            assert!(p.noise_delta >= -0.05 && p.noise_delta <= 0.05);
            assert!(p.noise_w_delta >= -0.05 && p.noise_w_delta <= 0.05);
        }
    }

    #[test]
    fn configured_profile_takes_priority() {
        let mut configured = HashMap::new();
        configured.insert(
            "leo".to_string(),
            VoiceProfile {
                length_multiplier: 1.5,
                noise_delta: 0.0,
                noise_w_delta: 0.0,
            },
        );
        let resolved = resolve_profile("Leo", &configured);
        assert_eq!(resolved.length_multiplier, 1.5);
    }
}
