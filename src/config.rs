//! Process-wide configuration. Constructed once at startup and threaded
//! explicitly through the pipeline — no ambient/global state.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-speaker prosody offsets, either configured explicitly or derived by
/// [`crate::prosody::voice::hash_profile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub length_multiplier: f32,
    pub noise_delta: f32,
    pub noise_w_delta: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityMode {
    Fast,
    Balanced,
    Max,
}

impl FromStr for QualityMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(QualityMode::Fast),
            "balanced" => Ok(QualityMode::Balanced),
            "max" => Ok(QualityMode::Max),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub quality_mode: QualityMode,

    pub max_parallel: usize,
    pub max_chunk_chars: usize,
    pub max_sentences_per_chunk: usize,
    pub job_workers: usize,

    pub default_length_scale: f32,
    pub default_noise_scale: f32,
    pub default_noise_w: f32,

    pub silence_scene_ms: u32,
    pub silence_dialogue_ms: u32,
    pub silence_exclaim_ms: u32,
    pub silence_question_ms: u32,
    pub silence_period_ms: u32,
    pub silence_comma_ms: u32,
    pub silence_default_ms: u32,

    pub enable_dynamic_chunk_tuning: bool,
    pub enable_output_normalization: bool,
    pub output_target_peak: f32,
    pub output_edge_fade_ms: u32,
    pub enable_character_voice_variation: bool,
    pub enable_emotion_variation: bool,
    pub enable_phoneme_silence: bool,

    pub phoneme_silence_comma: f32,
    pub phoneme_silence_period: f32,
    pub phoneme_silence_question: f32,
    pub phoneme_silence_exclaim: f32,
    pub phoneme_silence_colon: f32,
    pub phoneme_silence_semicolon: f32,
    pub phoneme_silence_ellipsis: f32,

    pub enable_emotional_model: bool,
    pub enable_ffmpeg_postprocess: bool,
    pub ffmpeg_filter_chain: String,

    pub min_length_scale: f32,
    pub max_length_scale: f32,
    pub min_noise_scale: f32,
    pub max_noise_scale: f32,
    pub min_noise_w: f32,
    pub max_noise_w: f32,
    pub min_relative_length_mult: f32,
    pub max_relative_length_mult: f32,

    pub long_chunk_threshold: usize,
    pub long_chunk_length_mult: f32,

    pub enable_prosody_smoothing: bool,
    pub max_length_scale_step: f32,
    pub max_noise_scale_step: f32,
    pub max_noise_w_step: f32,

    pub custom_pronunciations: HashMap<String, String>,
    pub character_voice_profiles: HashMap<String, VoiceProfile>,

    pub narration_model_path: String,
    pub emotional_model_path: String,
    pub tts_binary_path: String,

    /// [AMBIENT] minimum `tracing` level to install at startup.
    pub log_level: String,
    /// [AMBIENT] path to the external audio-filter binary, overridable for tests.
    pub ffmpeg_binary_path: String,
}

/// Phoneme-silence reduction applied uniformly across presets when
/// `enable_phoneme_silence` is true. (offset_ms, floor_ms)
const SILENCE_REDUCTION: SilenceReduction = SilenceReduction {
    scene: (280, 50),
    dialogue: (220, 50),
    exclaim: (300, 50),
    question: (350, 50),
    period: (300, 50),
    comma: (160, 30),
    default_: (220, 50),
};

struct SilenceReduction {
    scene: (u32, u32),
    dialogue: (u32, u32),
    exclaim: (u32, u32),
    question: (u32, u32),
    period: (u32, u32),
    comma: (u32, u32),
    default_: (u32, u32),
}

fn reduce(duration_ms: u32, reduction: (u32, u32)) -> u32 {
    let (offset, floor) = reduction;
    duration_ms.saturating_sub(offset).max(floor)
}

impl EngineConfig {
    /// Builds a preset baseline for one of the three quality modes, with the
    /// literal values carried over from the original source.
    pub fn from_quality_mode(mode: QualityMode) -> Self {
        let (
            max_parallel,
            max_chunk_chars,
            max_sentences_per_chunk,
            job_workers,
            default_length_scale,
            default_noise_scale,
            default_noise_w,
            silence_scene_ms,
            silence_dialogue_ms,
            silence_exclaim_ms,
            silence_question_ms,
            silence_period_ms,
            silence_comma_ms,
            silence_default_ms,
        ) = match mode {
            QualityMode::Fast => (
                6, 260, 3, 4, 1.20, 0.56, 0.66, 540, 390, 330, 340, 260, 180, 270,
            ),
            QualityMode::Balanced => (
                4, 340, 2, 3, 1.30, 0.50, 0.60, 620, 460, 410, 430, 320, 220, 330,
            ),
            QualityMode::Max => (
                2, 560, 1, 2, 1.38, 0.44, 0.54, 700, 520, 450, 500, 380, 260, 360,
            ),
        };

        let enable_phoneme_silence = false;
        let silence = |base: u32, reduction: (u32, u32)| {
            if enable_phoneme_silence {
                reduce(base, reduction)
            } else {
                base
            }
        };

        Self {
            quality_mode: mode,
            max_parallel,
            max_chunk_chars,
            max_sentences_per_chunk,
            job_workers,
            default_length_scale,
            default_noise_scale,
            default_noise_w,
            silence_scene_ms: silence(silence_scene_ms, SILENCE_REDUCTION.scene),
            silence_dialogue_ms: silence(silence_dialogue_ms, SILENCE_REDUCTION.dialogue),
            silence_exclaim_ms: silence(silence_exclaim_ms, SILENCE_REDUCTION.exclaim),
            silence_question_ms: silence(silence_question_ms, SILENCE_REDUCTION.question),
            silence_period_ms: silence(silence_period_ms, SILENCE_REDUCTION.period),
            silence_comma_ms: silence(silence_comma_ms, SILENCE_REDUCTION.comma),
            silence_default_ms: silence(silence_default_ms, SILENCE_REDUCTION.default_),

            enable_dynamic_chunk_tuning: true,
            enable_output_normalization: true,
            output_target_peak: 0.93,
            output_edge_fade_ms: 6,
            enable_character_voice_variation: true,
            enable_emotion_variation: true,
            enable_phoneme_silence,

            phoneme_silence_comma: 0.20,
            phoneme_silence_period: 0.35,
            phoneme_silence_question: 0.42,
            phoneme_silence_exclaim: 0.35,
            phoneme_silence_colon: 0.18,
            phoneme_silence_semicolon: 0.22,
            phoneme_silence_ellipsis: 0.55,

            enable_emotional_model: false,
            enable_ffmpeg_postprocess: false,
            ffmpeg_filter_chain:
                "highpass=f=60,acompressor=threshold=0.06:ratio=2.5:attack=8:release=150:makeup=1.5,alimiter=limit=0.95"
                    .to_string(),

            min_length_scale: 1.00,
            max_length_scale: 1.95,
            min_noise_scale: 0.05,
            max_noise_scale: 1.30,
            min_noise_w: 0.05,
            max_noise_w: 1.30,
            min_relative_length_mult: 0.94,
            max_relative_length_mult: 1.10,

            long_chunk_threshold: 180,
            long_chunk_length_mult: 0.96,

            enable_prosody_smoothing: true,
            max_length_scale_step: 0.12,
            max_noise_scale_step: 0.08,
            max_noise_w_step: 0.08,

            custom_pronunciations: HashMap::new(),
            character_voice_profiles: HashMap::new(),

            narration_model_path: String::new(),
            emotional_model_path: String::new(),
            tts_binary_path: String::new(),

            log_level: "info".to_string(),
            ffmpeg_binary_path: "ffmpeg".to_string(),
        }
    }

    /// Re-applies the phoneme-silence reduction after `enable_phoneme_silence`
    /// was toggled post-construction (e.g. by an env override read later).
    fn apply_phoneme_silence_reduction(&mut self, fast_preset: &EngineConfig) {
        let silence = |base: u32, reduction: (u32, u32)| {
            if self.enable_phoneme_silence {
                reduce(base, reduction)
            } else {
                base
            }
        };
        self.silence_scene_ms = silence(fast_preset.silence_scene_ms, SILENCE_REDUCTION.scene);
        self.silence_dialogue_ms =
            silence(fast_preset.silence_dialogue_ms, SILENCE_REDUCTION.dialogue);
        self.silence_exclaim_ms =
            silence(fast_preset.silence_exclaim_ms, SILENCE_REDUCTION.exclaim);
        self.silence_question_ms =
            silence(fast_preset.silence_question_ms, SILENCE_REDUCTION.question);
        self.silence_period_ms = silence(fast_preset.silence_period_ms, SILENCE_REDUCTION.period);
        self.silence_comma_ms = silence(fast_preset.silence_comma_ms, SILENCE_REDUCTION.comma);
        self.silence_default_ms =
            silence(fast_preset.silence_default_ms, SILENCE_REDUCTION.default_);
    }

    /// Loads configuration from `QUALITY_MODE` plus per-field environment
    /// overrides, named like the uppercased field (`MAX_PARALLEL`,
    /// `ENABLE_PHONEME_SILENCE`, ...). Malformed values are ignored with a
    /// warning and the preset default is kept — non-fatal per the startup
    /// error policy.
    pub fn from_env() -> Self {
        let mode = std::env::var("QUALITY_MODE")
            .ok()
            .and_then(|v| QualityMode::from_str(&v).ok())
            .unwrap_or(QualityMode::Balanced);

        // Keep an unreduced baseline around so a later ENABLE_PHONEME_SILENCE
        // override can recompute the silence durations correctly.
        let unreduced = EngineConfig::from_quality_mode(match mode {
            QualityMode::Fast => QualityMode::Fast,
            QualityMode::Balanced => QualityMode::Balanced,
            QualityMode::Max => QualityMode::Max,
        });
        let mut cfg = unreduced.clone();

        macro_rules! env_parse {
            ($field:ident, $env:expr, $ty:ty) => {
                if let Ok(raw) = std::env::var($env) {
                    match raw.parse::<$ty>() {
                        Ok(v) => cfg.$field = v,
                        Err(_) => warn!(env = $env, value = %raw, "ignoring malformed override"),
                    }
                }
            };
        }

        env_parse!(max_parallel, "MAX_PARALLEL", usize);
        env_parse!(max_chunk_chars, "MAX_CHUNK_CHARS", usize);
        env_parse!(max_sentences_per_chunk, "MAX_SENTENCES_PER_CHUNK", usize);
        env_parse!(job_workers, "JOB_WORKERS", usize);
        env_parse!(default_length_scale, "DEFAULT_LENGTH_SCALE", f32);
        env_parse!(default_noise_scale, "DEFAULT_NOISE_SCALE", f32);
        env_parse!(default_noise_w, "DEFAULT_NOISE_W", f32);
        env_parse!(enable_dynamic_chunk_tuning, "ENABLE_DYNAMIC_CHUNK_TUNING", bool);
        env_parse!(enable_output_normalization, "ENABLE_OUTPUT_NORMALIZATION", bool);
        env_parse!(output_target_peak, "OUTPUT_TARGET_PEAK", f32);
        env_parse!(output_edge_fade_ms, "OUTPUT_EDGE_FADE_MS", u32);
        env_parse!(
            enable_character_voice_variation,
            "ENABLE_CHARACTER_VOICE_VARIATION",
            bool
        );
        env_parse!(enable_emotion_variation, "ENABLE_EMOTION_VARIATION", bool);
        env_parse!(enable_phoneme_silence, "ENABLE_PHONEME_SILENCE", bool);
        env_parse!(phoneme_silence_comma, "PHONEME_SILENCE_COMMA", f32);
        env_parse!(phoneme_silence_period, "PHONEME_SILENCE_PERIOD", f32);
        env_parse!(phoneme_silence_question, "PHONEME_SILENCE_QUESTION", f32);
        env_parse!(phoneme_silence_exclaim, "PHONEME_SILENCE_EXCLAIM", f32);
        env_parse!(phoneme_silence_colon, "PHONEME_SILENCE_COLON", f32);
        env_parse!(phoneme_silence_semicolon, "PHONEME_SILENCE_SEMICOLON", f32);
        env_parse!(phoneme_silence_ellipsis, "PHONEME_SILENCE_ELLIPSIS", f32);
        env_parse!(enable_emotional_model, "ENABLE_EMOTIONAL_MODEL", bool);
        env_parse!(enable_ffmpeg_postprocess, "ENABLE_FFMPEG_POSTPROCESS", bool);
        if let Ok(v) = std::env::var("FFMPEG_FILTER_CHAIN") {
            cfg.ffmpeg_filter_chain = v;
        }
        env_parse!(min_length_scale, "MIN_LENGTH_SCALE", f32);
        env_parse!(max_length_scale, "MAX_LENGTH_SCALE", f32);
        env_parse!(min_noise_scale, "MIN_NOISE_SCALE", f32);
        env_parse!(max_noise_scale, "MAX_NOISE_SCALE", f32);
        env_parse!(min_noise_w, "MIN_NOISE_W", f32);
        env_parse!(max_noise_w, "MAX_NOISE_W", f32);
        env_parse!(min_relative_length_mult, "MIN_RELATIVE_LENGTH_MULT", f32);
        env_parse!(max_relative_length_mult, "MAX_RELATIVE_LENGTH_MULT", f32);
        env_parse!(long_chunk_threshold, "LONG_CHUNK_THRESHOLD", usize);
        env_parse!(long_chunk_length_mult, "LONG_CHUNK_LENGTH_MULT", f32);
        env_parse!(enable_prosody_smoothing, "ENABLE_PROSODY_SMOOTHING", bool);
        env_parse!(max_length_scale_step, "MAX_LENGTH_SCALE_STEP", f32);
        env_parse!(max_noise_scale_step, "MAX_NOISE_SCALE_STEP", f32);
        env_parse!(max_noise_w_step, "MAX_NOISE_W_STEP", f32);

        if let Ok(v) = std::env::var("NARRATION_MODEL_PATH") {
            cfg.narration_model_path = v;
        }
        if let Ok(v) = std::env::var("EMOTIONAL_MODEL_PATH") {
            cfg.emotional_model_path = v;
        }
        if let Ok(v) = std::env::var("TTS_BINARY_PATH") {
            cfg.tts_binary_path = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            cfg.log_level = v;
        }
        if let Ok(v) = std::env::var("FFMPEG_BINARY_PATH") {
            cfg.ffmpeg_binary_path = v;
        }

        if let Ok(v) = std::env::var("CUSTOM_PRONUNCIATIONS") {
            cfg.custom_pronunciations = parse_pronunciations(&v);
        }
        if let Ok(v) = std::env::var("CHARACTER_VOICE_PROFILES") {
            cfg.character_voice_profiles = parse_voice_profiles(&v);
        }

        cfg.apply_phoneme_silence_reduction(&unreduced);
        crate::startup::validate_model_paths(&mut cfg);
        cfg
    }
}

/// Parses `"Name=phonetic;Name2=phonetic2"` into a lookup table.
pub fn parse_pronunciations(raw: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for entry in raw.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if let Some((name, phonetic)) = entry.split_once('=') {
            let name = name.trim();
            let phonetic = phonetic.trim();
            if !name.is_empty() && !phonetic.is_empty() {
                map.insert(name.to_string(), phonetic.to_string());
            }
        }
    }
    map
}

/// Parses `"name=len_mult,noise_delta,noise_w_delta;..."`, lowercasing
/// names. Entries without exactly three comma-separated numeric values are
/// skipped.
pub fn parse_voice_profiles(raw: &str) -> HashMap<String, VoiceProfile> {
    let mut map = HashMap::new();
    for entry in raw.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((name, values)) = entry.split_once('=') else {
            continue;
        };
        let parts: Vec<&str> = values.split(',').map(|s| s.trim()).collect();
        if parts.len() != 3 {
            continue;
        }
        let parsed: Option<Vec<f32>> = parts.iter().map(|p| p.parse::<f32>().ok()).collect();
        if let Some(values) = parsed {
            map.insert(
                name.trim().to_lowercase(),
                VoiceProfile {
                    length_multiplier: values[0],
                    noise_delta: values[1],
                    noise_w_delta: values[2],
                },
            );
        }
    }
    map
}
