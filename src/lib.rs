//! livecap - Live captions from your microphone
//!
//! Offline-first speech-to-caption pipeline with optional translation.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
pub mod caption;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod output;
pub mod session;
pub mod stt;
pub mod translate;
pub mod vad;

// Core traits (source → segment → sink)
pub use stt::SpeechToText;
pub use translate::Translator;
pub use vad::VoiceActivityDetector;

// Session
pub use session::{SessionHandle, SpeechSegmenter};

// Error handling
pub use error::{LivecapError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
