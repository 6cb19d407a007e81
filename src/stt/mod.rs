//! Speech-to-text: the engine capability boundary and the transcription sink.

pub mod engine;
pub mod sink;
pub mod whisper;

pub use engine::{MockSttEngine, SpeechToText};
pub use sink::{TranscriberStats, TranscriptionSink};

use crate::config::SttConfig;
use crate::error::Result;

/// Build the configured speech-to-text engine.
///
/// # Errors
/// Engine initialization failure is fatal for the session.
#[cfg(feature = "whisper")]
pub fn create_engine(config: &SttConfig) -> Result<Box<dyn SpeechToText>> {
    let engine = whisper::WhisperSttEngine::new(whisper::WhisperSttConfig {
        model_path: whisper::resolve_model_path(&config.model),
        language: config.language.clone(),
        threads: None,
    })?;
    Ok(Box::new(engine))
}

/// Build the configured speech-to-text engine.
///
/// # Errors
/// Always errors in builds without an STT backend.
#[cfg(not(feature = "whisper"))]
pub fn create_engine(_config: &SttConfig) -> Result<Box<dyn SpeechToText>> {
    Err(crate::error::LivecapError::SttInit {
        message: "no speech-to-text backend compiled in (enable the `whisper` feature)"
            .to_string(),
    })
}
