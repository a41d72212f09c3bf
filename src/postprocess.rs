//! Post-Processor (spec §4.10) — optionally pipes the concatenated WAV
//! through an external filter-chain binary, falling back to in-process peak
//! normalization and edge fades when the filter chain is disabled, missing,
//! or fails.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::wav::{concatenate, parse_fragment, AudioFragment};

const FILTER_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_VALID_OUTPUT_LEN: usize = 44; // a bare WAV header with no payload

/// Runs the configured external filter chain over `wav_bytes`, or falls back
/// to peak normalization with edge fades per spec §4.10.
pub fn postprocess(wav_bytes: &[u8], config: &EngineConfig) -> Result<Vec<u8>> {
    if config.enable_ffmpeg_postprocess {
        match run_filter_chain(wav_bytes, config) {
            Some(filtered) if filtered.len() >= MIN_VALID_OUTPUT_LEN => return Ok(filtered),
            Some(_) => warn!("filter chain produced too-small output, falling back"),
            None => warn!("filter chain unavailable or failed, falling back"),
        }
    }

    if config.enable_output_normalization {
        normalize_and_fade(wav_bytes, config)
    } else {
        Ok(wav_bytes.to_vec())
    }
}

fn run_filter_chain(wav_bytes: &[u8], config: &EngineConfig) -> Option<Vec<u8>> {
    let mut child = Command::new(&config.ffmpeg_binary_path)
        .arg("-y")
        .arg("-i")
        .arg("pipe:0")
        .arg("-af")
        .arg(&config.ffmpeg_filter_chain)
        .arg("-ar")
        .arg("22050")
        .arg("-ac")
        .arg("1")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-f")
        .arg("wav")
        .arg("pipe:1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    {
        let mut stdin = child.stdin.take()?;
        stdin.write_all(wav_bytes).ok()?;
    }

    let started = Instant::now();
    loop {
        if let Ok(Some(_status)) = child.try_wait() {
            break;
        }
        if started.elapsed() > FILTER_TIMEOUT {
            let _ = child.kill();
            return None;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(output.stdout)
}

/// Scans for peak absolute amplitude, scales toward `config.output_target_peak`
/// (gain clamped to `[0.60, 2.50]`), then applies linear edge fades.
fn normalize_and_fade(wav_bytes: &[u8], config: &EngineConfig) -> Result<Vec<u8>> {
    let fragment = parse_fragment(wav_bytes)?;
    let AudioFragment { format, mut samples } = fragment;

    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    if peak > 0 {
        let target = config.output_target_peak * 32767.0;
        let gain = (target / peak as f32).clamp(0.60, 2.50);
        for sample in samples.iter_mut() {
            let scaled = (*sample as f32) * gain;
            *sample = scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
    }

    apply_edge_fades(&mut samples, format.sample_rate, format.channels, config.output_edge_fade_ms);

    concatenate(&[AudioFragment { format, samples }])
}

fn apply_edge_fades(samples: &mut [i16], sample_rate: u32, channels: u16, fade_ms: u32) {
    let fade_frames = (sample_rate as u64 * fade_ms as u64 / 1000) as usize;
    if fade_frames == 0 {
        return;
    }
    let channels = channels.max(1) as usize;
    let total_frames = samples.len() / channels;
    let fade_frames = fade_frames.min(total_frames / 2);
    if fade_frames == 0 {
        return;
    }

    for frame in 0..fade_frames {
        let gain = frame as f32 / fade_frames as f32;
        scale_frame(samples, frame, channels, gain);
        let tail_frame = total_frames - 1 - frame;
        scale_frame(samples, tail_frame, channels, gain);
    }
}

fn scale_frame(samples: &mut [i16], frame: usize, channels: usize, gain: f32) {
    for ch in 0..channels {
        let idx = frame * channels + ch;
        if let Some(sample) = samples.get_mut(idx) {
            *sample = (*sample as f32 * gain) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityMode;
    use crate::silence::render_silence;

    fn tone(sample_rate: u32, amplitude: i16, frames: usize) -> Vec<u8> {
        use hound::{SampleFormat, WavSpec, WavWriter};
        use std::io::Cursor;

        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..frames {
                writer.write_sample(amplitude).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn disabled_normalization_passes_through() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_output_normalization = false;
        config.enable_ffmpeg_postprocess = false;
        let input = render_silence(24000, 1, 16, 50);
        let out = postprocess(&input, &config).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn normalization_scales_toward_target_peak() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_ffmpeg_postprocess = false;
        config.output_edge_fade_ms = 0;
        let input = tone(24000, 8000, 1000);
        let out = postprocess(&input, &config).unwrap();
        let fragment = parse_fragment(&out).unwrap();
        let peak = fragment.samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        let expected = (config.output_target_peak * 32767.0) as u16;
        assert!((peak as i32 - expected as i32).abs() < 200);
    }

    #[test]
    fn edge_fades_taper_first_and_last_frame() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_ffmpeg_postprocess = false;
        config.output_edge_fade_ms = 10;
        let input = tone(24000, 8000, 2000);
        let out = postprocess(&input, &config).unwrap();
        let fragment = parse_fragment(&out).unwrap();
        assert_eq!(fragment.samples[0], 0);
    }

    #[test]
    fn missing_filter_binary_falls_back_to_normalization() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.enable_ffmpeg_postprocess = true;
        config.ffmpeg_binary_path = "/nonexistent/definitely-not-ffmpeg".to_string();
        let input = tone(24000, 8000, 500);
        let out = postprocess(&input, &config).unwrap();
        assert!(!out.is_empty());
    }
}
