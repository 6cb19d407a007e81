use crate::defaults;
use crate::error::{LivecapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub segmenter: SegmenterSettings,
    pub stt: SttConfig,
    pub translation: TranslationConfig,
}

/// Audio capture and voice-activity configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub vad_threshold: f32,
    pub silence_duration_ms: u32,
}

/// Utterance segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmenterSettings {
    pub lookback_chunks: usize,
    pub max_speech_secs: f32,
    pub min_refresh_secs: f32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub model: String,
    pub language: String,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    pub backend: TranslationBackend,
    pub source_lang: String,
    pub target_lang: String,
    /// HTTP endpoint for the `api` backend.
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key, if the
    /// endpoint requires one. The key itself is never stored on disk.
    pub api_key_env: Option<String>,
}

/// Translation backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    /// Pass transcripts through untranslated.
    #[default]
    None,
    /// Remote HTTP translation endpoint (requires the `api-translate` feature).
    Api,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            vad_threshold: defaults::VAD_THRESHOLD,
            silence_duration_ms: defaults::SILENCE_DURATION_MS,
        }
    }
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            lookback_chunks: defaults::LOOKBACK_CHUNKS,
            max_speech_secs: defaults::MAX_SPEECH_SECS,
            min_refresh_secs: defaults::MIN_REFRESH_SECS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackend::None,
            source_lang: "en".to_string(),
            target_lang: "en".to_string(),
            endpoint: None,
            api_key_env: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML or invalid values.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = toml::from_str(&contents)?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.audio.vad_threshold) {
            return Err(LivecapError::ConfigInvalidValue {
                key: "audio.vad_threshold".to_string(),
                message: format!("must be in 0.0..=1.0, got {}", self.audio.vad_threshold),
            });
        }
        if self.segmenter.lookback_chunks == 0 {
            return Err(LivecapError::ConfigInvalidValue {
                key: "segmenter.lookback_chunks".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.segmenter.max_speech_secs <= 0.0 {
            return Err(LivecapError::ConfigInvalidValue {
                key: "segmenter.max_speech_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if !(0.2..=5.0).contains(&self.segmenter.min_refresh_secs) {
            return Err(LivecapError::ConfigInvalidValue {
                key: "segmenter.min_refresh_secs".to_string(),
                message: format!(
                    "must be in 0.2..=5.0, got {}",
                    self.segmenter.min_refresh_secs
                ),
            });
        }
        if self.translation.backend == TranslationBackend::Api
            && self.translation.endpoint.is_none()
        {
            return Err(LivecapError::ConfigInvalidValue {
                key: "translation.endpoint".to_string(),
                message: "required when translation.backend = \"api\"".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LIVECAP_MODEL → stt.model
    /// - LIVECAP_LANGUAGE → stt.language
    /// - LIVECAP_AUDIO_DEVICE → audio.device
    /// - LIVECAP_TARGET_LANG → translation.target_lang
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("LIVECAP_MODEL")
            && !model.is_empty()
        {
            self.stt.model = model;
        }

        if let Ok(language) = std::env::var("LIVECAP_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(device) = std::env::var("LIVECAP_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(lang) = std::env::var("LIVECAP_TARGET_LANG")
            && !lang.is_empty()
        {
            self.translation.target_lang = lang;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/livecap/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("livecap")
            .join("config.toml")
    }
}
