//! Bounded-step smoothing of derived prosody parameters across adjacent
//! chunks (spec §4.6), preventing audible jumps between consecutive chunks
//! while keeping every value inside its configured absolute range.

use crate::config::EngineConfig;
use crate::prosody::deriver::ChunkParams;

fn step_clamp(target: f32, previous: f32, max_step: f32) -> f32 {
    target.max(previous - max_step).min(previous + max_step)
}

/// Smooths a sequence of per-chunk parameters in place, chunk by chunk. The
/// first chunk is never smoothed since there is no predecessor.
pub fn smooth_sequence(params: &mut [ChunkParams], config: &EngineConfig) {
    if !config.enable_prosody_smoothing || params.is_empty() {
        return;
    }
    for i in 1..params.len() {
        let previous = params[i - 1];
        let smoothed = smooth_one(params[i], previous, config);
        params[i] = smoothed;
    }
}

fn smooth_one(target: ChunkParams, previous: ChunkParams, config: &EngineConfig) -> ChunkParams {
    let mut length_scale = step_clamp(
        target.length_scale,
        previous.length_scale,
        config.max_length_scale_step,
    );
    let mut noise_scale = step_clamp(
        target.noise_scale,
        previous.noise_scale,
        config.max_noise_scale_step,
    );
    let mut noise_w = step_clamp(target.noise_w, previous.noise_w, config.max_noise_w_step);

    length_scale = length_scale.max(config.min_length_scale).min(config.max_length_scale);
    noise_scale = noise_scale.max(config.min_noise_scale).min(config.max_noise_scale);
    noise_w = noise_w.max(config.min_noise_w).min(config.max_noise_w);

    ChunkParams {
        length_scale,
        noise_scale,
        noise_w,
        ..target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityMode;

    fn params(length_scale: f32, noise_scale: f32, noise_w: f32) -> ChunkParams {
        ChunkParams {
            length_scale,
            noise_scale,
            noise_w,
            speaker: None,
            use_emotional_model: false,
        }
    }

    #[test]
    fn first_chunk_is_unsmoothed() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let mut seq = vec![params(1.80, 0.90, 0.90), params(1.30, 0.50, 0.60)];
        smooth_sequence(&mut seq, &config);
        assert_eq!(seq[0], params(1.80, 0.90, 0.90));
    }

    #[test]
    fn large_jump_is_bounded_by_step() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let mut seq = vec![params(1.00, 0.50, 0.60), params(1.90, 0.50, 0.60)];
        smooth_sequence(&mut seq, &config);
        assert!((seq[1].length_scale - 1.00).abs() <= config.max_length_scale_step + 1e-6);
    }

    #[test]
    fn smoothing_disabled_leaves_params_untouched() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_prosody_smoothing = false;
        let mut seq = vec![params(1.00, 0.50, 0.60), params(1.90, 0.50, 0.60)];
        smooth_sequence(&mut seq, &config);
        assert_eq!(seq[1].length_scale, 1.90);
    }

    #[test]
    fn chain_stays_within_absolute_range() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let mut seq = vec![params(1.00, 0.50, 0.60); 20];
        seq[10] = params(config.max_length_scale + 5.0, 0.50, 0.60);
        smooth_sequence(&mut seq, &config);
        for p in &seq {
            assert!(p.length_scale <= config.max_length_scale + 1e-6);
        }
    }
}
