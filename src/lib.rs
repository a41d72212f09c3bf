//! # narration-engine
//!
//! A long-form German narration synthesis engine. Given narrative prose and
//! three base synthesis parameters (length scale, noise scale, noise
//! weight), produces a single mono PCM WAV file by driving an external
//! neural text-to-speech binary chunk by chunk and smoothing the result into
//! one continuous performance.
//!
//! ## Pipeline
//! 1. **Normalize** — abbreviations, numbers, quotes, markdown (§4.1).
//! 2. **Prepare for TTS** — pauses, emphasis, onomatopoeia stretching (§4.2).
//! 3. **Enhance** — parentheticals, headings, pronunciation map (§4.3).
//! 4. **Chunk** — sentence/dialogue-respecting, length-bounded split (§4.4).
//! 5. **Derive & smooth prosody** per chunk (§4.5, §4.6).
//! 6. **Synthesize** each chunk via the external TTS binary (§4.7).
//! 7. **Splice** silence between chunks and concatenate (§4.8, §4.9).
//! 8. **Post-process**: filter chain or fallback normalization (§4.10).
//!
//! ## Quick start
//!
//! ```no_run
//! use narration_engine::{config::EngineConfig, synthesize};
//!
//! let config = EngineConfig::from_env();
//! let wav_bytes = synthesize(&config, "Hallo, Welt! Wie geht es dir?", None, None, None).unwrap();
//! std::fs::write("out.wav", wav_bytes).unwrap();
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod postprocess;
pub mod prosody;
pub mod silence;
pub mod startup;
pub mod synth;
pub mod text;
pub mod wav;

use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::prosody::deriver::{derive_chunk_params, ChunkParams};
use crate::prosody::smoother::smooth_sequence;
use crate::wav::{concatenate, parse_fragment, AudioFragment};

/// Installs a `tracing` subscriber reading its level from `config.log_level`.
/// Safe to call more than once; later calls are no-ops.
pub fn install_tracing(config: &EngineConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

fn prepare_text(text: &str, config: &EngineConfig) -> Result<String> {
    if text.trim().is_empty() {
        return Err(EngineError::Input("input text is empty".to_string()));
    }
    let normalized = text::normalize::normalize(text);
    let prepared = text::prosody_prep::prepare_for_tts(&normalized, config.enable_phoneme_silence);
    let enhanced = text::enhance::enhance(&prepared);
    Ok(text::enhance::apply_custom_pronunciations(
        &enhanced,
        &config.custom_pronunciations,
    ))
}

fn params_for_chunks(chunks: &[Chunk], config: &EngineConfig, base: (f32, f32, f32)) -> Vec<ChunkParams> {
    let (length_scale, noise_scale, noise_w) = base;
    let mut params: Vec<ChunkParams> = chunks
        .iter()
        .map(|chunk| derive_chunk_params(chunk, config, length_scale, noise_scale, noise_w))
        .collect();
    smooth_sequence(&mut params, config);
    params
}

/// Synthesizes `text` into a complete WAV file. `length_scale`/`noise_scale`/
/// `noise_w` fall back to `config`'s defaults when omitted.
pub fn synthesize(
    config: &EngineConfig,
    text: &str,
    length_scale: Option<f32>,
    noise_scale: Option<f32>,
    noise_w: Option<f32>,
) -> Result<Vec<u8>> {
    let prepared = prepare_text(text, config)?;
    let chunks = chunk::split_text_into_chunks(
        &prepared,
        config.max_chunk_chars,
        config.max_sentences_per_chunk,
    );
    if chunks.is_empty() {
        return Err(EngineError::Input(
            "prepared text produced no chunks".to_string(),
        ));
    }
    info!(chunk_count = chunks.len(), "synthesizing narration");

    let base = (
        length_scale.unwrap_or(config.default_length_scale),
        noise_scale.unwrap_or(config.default_noise_scale),
        noise_w.unwrap_or(config.default_noise_w),
    );
    let params = params_for_chunks(&chunks, config, base);

    let items: Vec<(String, ChunkParams)> = chunks
        .iter()
        .zip(params.iter())
        .map(|(chunk, params)| (chunk.text.clone(), *params))
        .collect();
    let audio = synth::synthesize_chunks(&items, config)?;

    let mut fragments: Vec<AudioFragment> = Vec::with_capacity(audio.len() * 2 - 1);
    for (index, bytes) in audio.iter().enumerate() {
        let fragment = parse_fragment(bytes)?;
        if index > 0 {
            let duration_ms = silence::boundary_duration_ms(&chunks[index - 1], &chunks[index], config);
            let silence_bytes = silence::render_silence(
                fragment.format.sample_rate,
                fragment.format.channels,
                fragment.format.bits_per_sample,
                duration_ms,
            );
            fragments.push(parse_fragment(&silence_bytes)?);
            debug!(chunk = index, duration_ms, "inserted silence boundary");
        }
        fragments.push(fragment);
    }

    let concatenated = concatenate(&fragments)?;
    postprocess::postprocess(&concatenated, config)
}

/// Synthesizes a batch of `(id, text)` items against shared base parameters.
/// Each item's failure is isolated into its own result slot.
pub fn synthesize_batch(
    config: &EngineConfig,
    items: &[(String, String)],
    length_scale: Option<f32>,
    noise_scale: Option<f32>,
    noise_w: Option<f32>,
) -> Vec<(String, Result<Vec<u8>>)> {
    items
        .iter()
        .map(|(id, text)| {
            let outcome = synthesize(config, text, length_scale, noise_scale, noise_w)
                .map_err(|source| EngineError::BatchItem {
                    id: id.clone(),
                    source: Box::new(source),
                });
            (id.clone(), outcome)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityMode;

    #[test]
    fn empty_text_is_rejected() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let result = synthesize(&config, "   ", None, None, None);
        assert!(matches!(result, Err(EngineError::Input(_))));
    }

    #[test]
    fn batch_isolates_per_item_failures() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let items = vec![
            ("a".to_string(), "   ".to_string()),
            ("b".to_string(), "   ".to_string()),
        ];
        let results = synthesize_batch(&config, &items, None, None, None);
        assert_eq!(results.len(), 2);
        for (id, result) in &results {
            match result {
                Err(EngineError::BatchItem { id: failed_id, .. }) => assert_eq!(failed_id, id),
                other => panic!("expected BatchItem error, got {other:?}"),
            }
        }
    }
}
