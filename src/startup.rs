//! Phoneme-Silence Config Injection (spec §4.11) — idempotently patches each
//! model's companion JSON configuration with the configured per-punctuation
//! pause durations, run once before the first synthesis request.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::config::EngineConfig;

/// Builds the `{punctuation: seconds}` map injected into
/// `inference.phoneme_silence`.
fn phoneme_silence_map(config: &EngineConfig) -> Value {
    serde_json::json!({
        ",": config.phoneme_silence_comma,
        ".": config.phoneme_silence_period,
        "?": config.phoneme_silence_question,
        "!": config.phoneme_silence_exclaim,
        ":": config.phoneme_silence_colon,
        ";": config.phoneme_silence_semicolon,
        "…": config.phoneme_silence_ellipsis,
    })
}

/// Patches a single model's companion JSON config file in place. Missing
/// files and JSON errors are non-fatal: a warning is logged and the call
/// returns `Ok(())` either way, matching the startup error policy.
pub fn inject_phoneme_silence(config_path: &Path, config: &EngineConfig) -> anyhow::Result<()> {
    let raw = match std::fs::read_to_string(config_path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %config_path.display(), error = %err, "phoneme-silence config missing, skipping");
            return Ok(());
        }
    };

    let mut doc: Value = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(path = %config_path.display(), error = %err, "phoneme-silence config is not valid json, skipping");
            return Ok(());
        }
    };

    let inference = doc
        .as_object_mut()
        .and_then(|obj| {
            obj.entry("inference")
                .or_insert_with(|| Value::Object(Default::default()))
                .as_object_mut()
        });

    match inference {
        Some(inference) => {
            inference.insert("phoneme_silence".to_string(), phoneme_silence_map(config));
        }
        None => {
            warn!(path = %config_path.display(), "phoneme-silence config root is not a json object, skipping");
            return Ok(());
        }
    }

    let patched = serde_json::to_string_pretty(&doc)?;
    std::fs::write(config_path, patched)?;
    Ok(())
}

/// Runs [`inject_phoneme_silence`] against every model path configured,
/// skipping any path left empty. No-op entirely when
/// `enable_phoneme_silence` is false.
pub fn run_startup_injection(config: &EngineConfig) {
    if !config.enable_phoneme_silence {
        return;
    }
    for model_path in [&config.narration_model_path, &config.emotional_model_path] {
        if model_path.is_empty() {
            continue;
        }
        let config_path = companion_config_path(model_path);
        if let Err(err) = inject_phoneme_silence(&config_path, config) {
            warn!(path = %config_path.display(), error = %err, "phoneme-silence injection failed");
        }
    }
}

fn companion_config_path(model_path: &str) -> std::path::PathBuf {
    Path::new(model_path).with_extension("json")
}

/// Disables features whose backing model file is missing on disk (spec.md's
/// startup error policy, original source: `if not os.path.exists(...):
/// ENABLE_EMOTIONAL_MODEL = False`). Non-fatal: the request still succeeds,
/// just routed entirely through the narration model.
pub fn validate_model_paths(config: &mut EngineConfig) {
    if config.enable_emotional_model && !Path::new(&config.emotional_model_path).exists() {
        warn!(
            path = %config.emotional_model_path,
            "emotional model file missing, disabling emotional model"
        );
        config.enable_emotional_model = false;
    }
}
