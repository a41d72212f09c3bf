//! Per-chunk prosody derivation (spec §4.5): combines the request's base
//! parameters with content-length, character-voice, and emotion tuning,
//! then clamps to the configured absolute ranges and selects the
//! synthesis model/speaker.

use crate::chunk::Chunk;
use crate::config::EngineConfig;
use crate::prosody::emotion;
use crate::prosody::voice::resolve_profile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkParams {
    pub length_scale: f32,
    pub noise_scale: f32,
    pub noise_w: f32,
    pub speaker: Option<u32>,
    pub use_emotional_model: bool,
}

fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Model-selection rule (spec §4.5, original source `_select_model_for_chunk`):
/// dialogue chunks route to the emotional model whenever any emotion was
/// detected; narration-only chunks route only for the three high-intensity
/// emotions, leaving routine narration (joy/sadness/calm) on the narration
/// voice.
fn select_emotional_model(chunk: &Chunk) -> bool {
    match chunk.emotion {
        None => false,
        Some(_) if chunk.has_dialogue => true,
        Some(emotion::Emotion::Anger) | Some(emotion::Emotion::Fear) | Some(emotion::Emotion::Suspense) => true,
        Some(_) => false,
    }
}

/// Derives the raw (pre-smoothing) prosody parameters for one chunk.
pub fn derive_chunk_params(
    chunk: &Chunk,
    config: &EngineConfig,
    base_length_scale: f32,
    base_noise_scale: f32,
    base_noise_w: f32,
) -> ChunkParams {
    let mut length_scale = base_length_scale;
    let mut noise_scale = base_noise_scale;
    let mut noise_w = base_noise_w;

    if config.enable_dynamic_chunk_tuning && chunk.text.len() > config.long_chunk_threshold {
        length_scale *= config.long_chunk_length_mult;
    }

    if config.enable_character_voice_variation {
        if let Some(name) = &chunk.speaker {
            let profile = resolve_profile(name, &config.character_voice_profiles);
            let relative = clamp(
                profile.length_multiplier,
                config.min_relative_length_mult,
                config.max_relative_length_mult,
            );
            length_scale *= relative;
            noise_scale += profile.noise_delta;
            noise_w += profile.noise_w_delta;
        }
    }

    if config.enable_emotion_variation {
        if let Some(emo) = chunk.emotion {
            let (length_mult, noise_delta, noise_w_delta) = emotion::tuning(emo);
            length_scale *= length_mult;
            noise_scale += noise_delta;
            noise_w += noise_w_delta;
        }
    }

    length_scale = clamp(length_scale, config.min_length_scale, config.max_length_scale);
    noise_scale = clamp(noise_scale, config.min_noise_scale, config.max_noise_scale);
    noise_w = clamp(noise_w, config.min_noise_w, config.max_noise_w);

    let use_emotional_model = config.enable_emotional_model && select_emotional_model(chunk);
    let speaker = if use_emotional_model {
        chunk.emotion.map(emotion::speaker_index)
    } else {
        None
    };

    ChunkParams {
        length_scale,
        noise_scale,
        noise_w,
        speaker,
        use_emotional_model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::TerminalClass;
    use crate::config::QualityMode;

    fn sample_chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            has_dialogue: false,
            sentence_count: 1,
            terminal_class: TerminalClass::Period,
            speaker: None,
            emotion: None,
        }
    }

    #[test]
    fn long_chunks_get_length_reduction() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let long_text = "x".repeat(config.long_chunk_threshold + 10);
        let chunk = sample_chunk(&long_text);
        let params = derive_chunk_params(&chunk, &config, 1.30, 0.50, 0.60);
        assert!(params.length_scale < 1.30);
    }

    #[test]
    fn emotion_tuning_applied_when_enabled() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let mut chunk = sample_chunk("kurz");
        chunk.emotion = Some(emotion::Emotion::Sadness);
        let params = derive_chunk_params(&chunk, &config, 1.30, 0.50, 0.60);
        assert!(params.length_scale > 1.30);
    }

    #[test]
    fn clamped_to_absolute_range() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Max);
        config.max_length_scale = 1.0;
        let chunk = sample_chunk("text");
        let params = derive_chunk_params(&chunk, &config, 1.38, 0.44, 0.54);
        assert_eq!(params.length_scale, 1.0);
    }

    #[test]
    fn dialogue_chunk_with_any_emotion_routes_to_emotional_model() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_emotional_model = true;
        let mut chunk = sample_chunk("text");
        chunk.has_dialogue = true;
        chunk.emotion = Some(emotion::Emotion::Joy);
        let params = derive_chunk_params(&chunk, &config, 1.30, 0.50, 0.60);
        assert_eq!(params.speaker, Some(0));
        assert!(params.use_emotional_model);
    }

    #[test]
    fn narration_with_routine_emotion_stays_on_narration_model() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_emotional_model = true;
        let mut chunk = sample_chunk("text");
        chunk.has_dialogue = false;
        chunk.emotion = Some(emotion::Emotion::Joy);
        let params = derive_chunk_params(&chunk, &config, 1.30, 0.50, 0.60);
        assert_eq!(params.speaker, None);
        assert!(!params.use_emotional_model);
    }

    #[test]
    fn narration_with_high_intensity_emotion_routes_to_emotional_model() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_emotional_model = true;
        for emo in [
            emotion::Emotion::Anger,
            emotion::Emotion::Fear,
            emotion::Emotion::Suspense,
        ] {
            let mut chunk = sample_chunk("text");
            chunk.has_dialogue = false;
            chunk.emotion = Some(emo);
            let params = derive_chunk_params(&chunk, &config, 1.30, 0.50, 0.60);
            assert!(params.use_emotional_model, "{emo:?} should route to emotional model");
            assert_eq!(params.speaker, Some(emotion::speaker_index(emo)));
        }
    }

    #[test]
    fn dialogue_chunk_with_no_detected_emotion_stays_on_narration_model() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_emotional_model = true;
        let mut chunk = sample_chunk("text");
        chunk.has_dialogue = true;
        chunk.emotion = None;
        let params = derive_chunk_params(&chunk, &config, 1.30, 0.50, 0.60);
        assert_eq!(params.speaker, None);
        assert!(!params.use_emotional_model);
    }

    #[test]
    fn no_emotional_model_means_no_speaker_routing() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let mut chunk = sample_chunk("text");
        chunk.has_dialogue = true;
        chunk.emotion = Some(emotion::Emotion::Joy);
        let params = derive_chunk_params(&chunk, &config, 1.30, 0.50, 0.60);
        assert_eq!(params.speaker, None);
    }
}
