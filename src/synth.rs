//! Synthesis Driver (spec §4.7) — drives the external TTS binary over a
//! bounded worker pool, one subprocess invocation per chunk, feeding text on
//! stdin and reading a WAV fragment back from stdout.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, error, warn};

use crate::config::EngineConfig;
use crate::error::{truncate_stderr, EngineError, Result};
use crate::prosody::deriver::ChunkParams;

/// Runs the TTS binary once for a single chunk, returning the raw WAV bytes
/// written to stdout.
pub fn run_chunk(config: &EngineConfig, text: &str, params: &ChunkParams, index: usize) -> Result<Vec<u8>> {
    let model_path = if params.use_emotional_model {
        &config.emotional_model_path
    } else {
        &config.narration_model_path
    };

    let mut command = Command::new(&config.tts_binary_path);
    command
        .arg("--model")
        .arg(model_path)
        .arg("--output_file")
        .arg("-")
        .arg("--length_scale")
        .arg(params.length_scale.to_string())
        .arg("--noise_scale")
        .arg(params.noise_scale.to_string())
        .arg("--noise_w")
        .arg(params.noise_w.to_string());
    if let Some(speaker) = params.speaker {
        command.arg("--speaker").arg(speaker.to_string());
    }
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(chunk = index, model = %model_path, "spawning synthesis subprocess");

    let mut child = command.spawn().map_err(|e| EngineError::ChunkSynthesis {
        index,
        stderr: e.to_string(),
    })?;

    // Chunk text is bounded by max_chunk_chars, so writing it fully before
    // draining stdout cannot deadlock on the stdin pipe buffer.
    {
        let mut stdin = child
            .stdin
            .take()
            .expect("stdin was requested via Stdio::piped");
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| EngineError::ChunkSynthesis {
                index,
                stderr: e.to_string(),
            })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| EngineError::ChunkSynthesis {
            index,
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = truncate_stderr(&String::from_utf8_lossy(&output.stderr));
        error!(chunk = index, %stderr, "synthesis subprocess exited non-zero");
        return Err(EngineError::ChunkSynthesis { index, stderr });
    }
    if !output.stderr.is_empty() {
        warn!(chunk = index, stderr = %truncate_stderr(&String::from_utf8_lossy(&output.stderr)), "subprocess wrote to stderr on success");
    }

    Ok(output.stdout)
}

/// Synthesizes every `(text, params)` item across a bounded pool of
/// `config.max_parallel` worker threads, returning results in original
/// chunk order. The first chunk failure short-circuits the whole batch.
pub fn synthesize_chunks(items: &[(String, ChunkParams)], config: &EngineConfig) -> Result<Vec<Vec<u8>>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let worker_count = config.max_parallel.max(1).min(items.len());
    let next_index = AtomicUsize::new(0);
    let results: Mutex<Vec<Option<Result<Vec<u8>>>>> =
        Mutex::new((0..items.len()).map(|_| None).collect());

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let index = next_index.fetch_add(1, Ordering::SeqCst);
                if index >= items.len() {
                    break;
                }
                let (text, params) = &items[index];
                let outcome = run_chunk(config, text, params, index);
                results.lock().expect("results mutex poisoned")[index] = Some(outcome);
            });
        }
    });

    let slots = results.into_inner().expect("results mutex poisoned");
    let mut audio = Vec::with_capacity(slots.len());
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(bytes)) => audio.push(bytes),
            Some(Err(err)) => return Err(err),
            None => {
                return Err(EngineError::ChunkSynthesis {
                    index,
                    stderr: "worker pool did not produce a result".to_string(),
                })
            }
        }
    }
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityMode;

    fn params() -> ChunkParams {
        ChunkParams {
            length_scale: 1.0,
            noise_scale: 0.5,
            noise_w: 0.6,
            speaker: None,
            use_emotional_model: false,
        }
    }

    #[test]
    fn empty_batch_returns_empty() {
        let config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        let result = synthesize_chunks(&[], &config).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn missing_binary_surfaces_chunk_synthesis_error() {
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.tts_binary_path = "/nonexistent/definitely-not-a-binary".to_string();
        let items = vec![("hallo".to_string(), params())];
        let result = synthesize_chunks(&items, &config);
        assert!(matches!(result, Err(EngineError::ChunkSynthesis { index: 0, .. })));
    }

    /// A stub binary ignoring its CLI args and echoing stdin to stdout,
    /// standing in for the real TTS binary (spec §14 stub-binary testing
    /// approach).
    fn write_cat_stub() -> tempfile::TempPath {
        use std::io::Write as _;
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"#!/bin/sh\ncat\n").unwrap();
        let mut perms = file.as_file().metadata().unwrap().permissions();
        perms.set_mode(0o755);
        file.as_file().set_permissions(perms).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn stub_binary_roundtrips_stdin_to_stdout() {
        let stub = write_cat_stub();
        let mut config = EngineConfig::from_quality_mode(QualityMode::Balanced);
        config.tts_binary_path = stub.to_string_lossy().into_owned();
        let items = vec![
            ("erster".to_string(), params()),
            ("zweiter".to_string(), params()),
        ];
        let result = synthesize_chunks(&items, &config).unwrap();
        assert_eq!(result[0], b"erster");
        assert_eq!(result[1], b"zweiter");
    }
}
