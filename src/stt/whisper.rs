//! Whisper-based speech-to-text engine using whisper-rs.
//!
//! # Feature Gate
//!
//! The real engine requires the `whisper` feature and cmake to build:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::defaults;
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use crate::error::{LivecapError, Result};
#[cfg(feature = "whisper")]
use crate::stt::engine::SpeechToText;
#[cfg(feature = "whisper")]
use std::sync::Once;
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Whisper refuses buffers shorter than about a second; shorter input is
/// zero-padded up to this length before inference.
#[cfg(feature = "whisper")]
const MIN_INFERENCE_SAMPLES: usize = defaults::SAMPLE_RATE as usize;

/// Configuration for the Whisper engine.
#[derive(Debug, Clone)]
pub struct WhisperSttConfig {
    /// Path to the ggml model file.
    pub model_path: PathBuf,
    /// Language code (e.g., "en", "de") or "auto" for detection.
    pub language: String,
    /// Number of threads for inference (None = auto-detect).
    pub threads: Option<usize>,
}

impl Default for WhisperSttConfig {
    fn default() -> Self {
        Self {
            model_path: resolve_model_path(defaults::DEFAULT_MODEL),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
        }
    }
}

/// Resolve a model name or path to a model file path.
///
/// Anything containing a path separator or ending in `.bin` is taken as a
/// path; bare names like "base" map to the shared model directory.
pub fn resolve_model_path(model: &str) -> PathBuf {
    if model.contains('/') || model.ends_with(".bin") {
        PathBuf::from(model)
    } else {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("livecap")
            .join("models")
            .join(format!("ggml-{}.bin", model))
    }
}

/// Whisper-based speech-to-text engine.
#[cfg(feature = "whisper")]
pub struct WhisperSttEngine {
    context: WhisperContext,
    config: WhisperSttConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperSttEngine {
    /// Load the model from disk.
    ///
    /// # Errors
    /// Returns `LivecapError::ModelNotFound` if the model file doesn't exist,
    /// `LivecapError::SttInit` if loading fails.
    pub fn new(config: WhisperSttConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(LivecapError::ModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = config
            .model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let context_params = WhisperContextParameters::default();
        let context = WhisperContext::new_with_params(
            config.model_path.to_str().ok_or_else(|| LivecapError::SttInit {
                message: "Invalid UTF-8 in model path".to_string(),
            })?,
            context_params,
        )
        .map_err(|e| LivecapError::SttInit {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context,
            config,
            model_name,
        })
    }
}

#[cfg(feature = "whisper")]
impl SpeechToText for WhisperSttEngine {
    fn transcribe(&mut self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Ok(String::new());
        }

        let padded;
        let audio = if samples.len() < MIN_INFERENCE_SAMPLES {
            padded = {
                let mut buf = samples.to_vec();
                buf.resize(MIN_INFERENCE_SAMPLES, 0.0);
                buf
            };
            &padded[..]
        } else {
            samples
        };

        let mut state = self
            .context
            .create_state()
            .map_err(|e| LivecapError::Transcription {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, audio)
            .map_err(|e| LivecapError::Transcription {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let mut transcription = String::new();
        for segment in state.as_iter() {
            transcription.push_str(&segment.to_string());
        }

        Ok(transcription.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_path_bare_name() {
        let path = resolve_model_path("base");
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("livecap"));
        assert!(path_str.ends_with("ggml-base.bin"));
    }

    #[test]
    fn test_resolve_model_path_explicit_file() {
        let path = resolve_model_path("/models/ggml-small.bin");
        assert_eq!(path, PathBuf::from("/models/ggml-small.bin"));
    }

    #[test]
    fn test_resolve_model_path_relative_bin() {
        let path = resolve_model_path("custom.bin");
        assert_eq!(path, PathBuf::from("custom.bin"));
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_missing_model_file_is_reported() {
        let config = WhisperSttConfig {
            model_path: PathBuf::from("/nonexistent/ggml-missing.bin"),
            ..Default::default()
        };
        assert!(matches!(
            WhisperSttEngine::new(config),
            Err(LivecapError::ModelNotFound { .. })
        ));
    }
}
