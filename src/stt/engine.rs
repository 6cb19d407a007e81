//! The speech-to-text capability boundary.

use crate::error::{LivecapError, Result};
use std::sync::{Arc, Mutex};

/// Speech-to-text engine over mono f32 samples at 16kHz.
///
/// Implementations must tolerate an all-zero warm-up call (made once at
/// sink construction to pay model load/JIT cost outside the real-time
/// loop) and return a benign empty result for silent or near-empty input.
pub trait SpeechToText: Send {
    /// Decode one sample buffer to plain text.
    fn transcribe(&mut self, samples: &[f32]) -> Result<String>;

    /// Name of the loaded model.
    fn model_name(&self) -> &str;
}

/// Deterministic engine for tests and smoke runs.
///
/// Records the length of every buffer it is asked to decode; the log is
/// shared so callers can inspect it after handing the engine to a sink.
#[derive(Debug, Clone)]
pub struct MockSttEngine {
    model_name: String,
    response: String,
    should_fail: bool,
    call_log: Arc<Mutex<Vec<usize>>>,
}

impl MockSttEngine {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            should_fail: false,
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure the mock to return a specific response.
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Shared handle to the call log (buffer lengths, in call order).
    pub fn call_log(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.call_log)
    }
}

impl SpeechToText for MockSttEngine {
    fn transcribe(&mut self, samples: &[f32]) -> Result<String> {
        if let Ok(mut log) = self.call_log.lock() {
            log.push(samples.len());
        }
        if self.should_fail {
            Err(LivecapError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else if samples.iter().all(|&s| s == 0.0) {
            // Silence decodes to nothing, like a real engine
            Ok(String::new())
        } else {
            Ok(self.response.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
