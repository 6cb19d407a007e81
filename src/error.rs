//! Error types for livecap.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivecapError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Speech-to-text errors
    #[error("Transcription model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Speech-to-text engine failed to initialize: {message}")]
    SttInit { message: String },

    #[error("Transcription inference failed: {message}")]
    Transcription { message: String },

    // Translation errors
    #[error("Translation backend failed to initialize: {message}")]
    TranslatorInit { message: String },

    #[error("Translation failed: {message}")]
    Translation { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LivecapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_audio_device_not_found_display() {
        let error = LivecapError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_capture_display() {
        let error = LivecapError::AudioCapture {
            message: "buffer overflow".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: buffer overflow");
    }

    #[test]
    fn test_model_not_found_display() {
        let error = LivecapError::ModelNotFound {
            path: "/models/ggml-base.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription model not found at /models/ggml-base.bin"
        );
    }

    #[test]
    fn test_transcription_display() {
        let error = LivecapError::Transcription {
            message: "out of memory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription inference failed: out of memory"
        );
    }

    #[test]
    fn test_translator_init_display() {
        let error = LivecapError::TranslatorInit {
            message: "no package for en -> xx".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Translation backend failed to initialize: no package for en -> xx"
        );
    }

    #[test]
    fn test_translation_display() {
        let error = LivecapError::Translation {
            message: "endpoint unreachable".to_string(),
        };
        assert_eq!(error.to_string(), "Translation failed: endpoint unreachable");
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = LivecapError::ConfigInvalidValue {
            key: "segmenter.min_refresh_secs".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for segmenter.min_refresh_secs: must be positive"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: LivecapError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: LivecapError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LivecapError>();
        assert_sync::<LivecapError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
