//! Public error taxonomy for the narration engine.
//!
//! Internal plumbing uses `anyhow` for ergonomic `?`-propagation; at each
//! module boundary facing the public API (`synthesize`/`synthesize_batch`)
//! errors are converted into one of these variants.

use thiserror::Error;

/// A parsed PCM-WAV format descriptor, used to report format mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Hz/{}ch/{}bit",
            self.sample_rate, self.channels, self.bits_per_sample
        )
    }
}

/// Maximum length of captured subprocess stderr surfaced in an error message.
pub const MAX_STDERR_LEN: usize = 2000;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("chunk {index} synthesis failed: {stderr}")]
    ChunkSynthesis { index: usize, stderr: String },

    #[error(
        "wav format mismatch at fragment {fragment_index}: expected {expected}, found {found}"
    )]
    FormatMismatch {
        expected: AudioFormat,
        found: AudioFormat,
        fragment_index: usize,
    },

    #[error("post-processing failed: {0}")]
    PostProcessing(String),

    #[error("startup error: {0}")]
    Startup(String),

    #[error("batch item {id} failed: {source}")]
    BatchItem { id: String, source: Box<EngineError> },
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub(crate) fn truncate_stderr(stderr: &str) -> String {
    if stderr.len() <= MAX_STDERR_LEN {
        stderr.to_string()
    } else {
        let mut end = MAX_STDERR_LEN;
        while end > 0 && !stderr.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &stderr[..end])
    }
}
