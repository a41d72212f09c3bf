//! Silence Inserter (spec §4.8) — chooses a content-dependent pause
//! duration between adjacent chunks and renders it as a zero-filled WAV
//! fragment matching the surrounding audio's format.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::chunk::{Chunk, TerminalClass};
use crate::config::EngineConfig;

/// Picks the pause length (ms) for the boundary between `left` and `right`,
/// per the condition table in spec §4.8. Dialogue-ness mismatch takes
/// priority over `left`'s terminal punctuation except for the scene marker.
pub fn boundary_duration_ms(left: &Chunk, right: &Chunk, config: &EngineConfig) -> u32 {
    if left.terminal_class == TerminalClass::Scene {
        return config.silence_scene_ms;
    }
    if left.has_dialogue != right.has_dialogue {
        return config.silence_dialogue_ms;
    }
    match left.terminal_class {
        TerminalClass::Exclaim => config.silence_exclaim_ms,
        TerminalClass::Question => config.silence_question_ms,
        TerminalClass::Period => config.silence_period_ms,
        TerminalClass::Comma => config.silence_comma_ms,
        TerminalClass::Scene => unreachable!("handled above"),
        TerminalClass::Other => config.silence_default_ms,
    }
}

/// Renders `duration_ms` of silence as a standalone mono/stereo PCM WAV
/// fragment matching `sample_rate`/`channels`/`bits_per_sample`.
pub fn render_silence(sample_rate: u32, channels: u16, bits_per_sample: u16, duration_ms: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("valid wav spec");
        let sample_count =
            (sample_rate as u64 * duration_ms as u64 / 1000) as u32 * channels as u32;
        for _ in 0..sample_count {
            writer.write_sample(0i16).expect("writing silence sample");
        }
        writer.finalize().expect("finalizing silence wav");
    }
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityMode;

    fn chunk(terminal: TerminalClass, dialogue: bool) -> Chunk {
        Chunk {
            text: "text".to_string(),
            has_dialogue: dialogue,
            sentence_count: 1,
            terminal_class: terminal,
            speaker: None,
            emotion: None,
        }
    }

    #[test]
    fn scene_marker_wins_over_everything() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let left = chunk(TerminalClass::Scene, true);
        let right = chunk(TerminalClass::Period, false);
        assert_eq!(
            boundary_duration_ms(&left, &right, &config),
            config.silence_scene_ms
        );
    }

    #[test]
    fn dialogue_transition_outranks_punctuation() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let left = chunk(TerminalClass::Period, true);
        let right = chunk(TerminalClass::Period, false);
        assert_eq!(
            boundary_duration_ms(&left, &right, &config),
            config.silence_dialogue_ms
        );
    }

    #[test]
    fn plain_terminal_classes_map_through() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let right = chunk(TerminalClass::Period, false);
        assert_eq!(
            boundary_duration_ms(&chunk(TerminalClass::Exclaim, false), &right, &config),
            config.silence_exclaim_ms
        );
        assert_eq!(
            boundary_duration_ms(&chunk(TerminalClass::Comma, false), &right, &config),
            config.silence_comma_ms
        );
        assert_eq!(
            boundary_duration_ms(&chunk(TerminalClass::Other, false), &right, &config),
            config.silence_default_ms
        );
    }

    #[test]
    fn rendered_silence_has_correct_sample_count() {
        let bytes = render_silence(24000, 1, 16, 500);
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.len(), 12000);
    }
}
