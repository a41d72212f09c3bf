//! Prosody pipeline stages: emotion/speaker detection (§4.5), per-chunk
//! parameter derivation (§4.5), and cross-chunk smoothing (§4.6).

pub mod deriver;
pub mod emotion;
pub mod smoother;
pub mod voice;
