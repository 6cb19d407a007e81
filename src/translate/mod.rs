//! Translation capability behind a single polymorphic interface.
//!
//! One backend is live per session, selected by configuration. Backend
//! failures are degraded, never fatal: the sink falls back to the
//! untranslated text.

#[cfg(feature = "api-translate")]
pub mod api;

use crate::config::{TranslationBackend, TranslationConfig};
use crate::error::{LivecapError, Result};

/// Text-to-text translation backend.
pub trait Translator: Send {
    /// Translate text from the configured source to the target language.
    fn translate(&mut self, text: &str) -> Result<String>;

    /// Human-readable backend name for status messages.
    fn name(&self) -> &str;

    /// Release backend resources (network clients, device memory).
    ///
    /// Must be idempotent; called on every session exit path.
    fn close(&mut self) {}
}

/// Pass-through "translator" returning the input unchanged.
#[derive(Debug, Default)]
pub struct NoTranslator;

impl Translator for NoTranslator {
    fn translate(&mut self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "No Translation"
    }
}

/// Scriptable translator for tests.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    prefix: String,
    should_fail: bool,
    closed: bool,
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            prefix: "[xx] ".to_string(),
            should_fail: false,
            closed: false,
        }
    }

    /// Prefix prepended to every translated string.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Configure the mock to fail on translate.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Translator for MockTranslator {
    fn translate(&mut self, text: &str) -> Result<String> {
        if self.should_fail {
            Err(LivecapError::Translation {
                message: "mock translation failure".to_string(),
            })
        } else {
            Ok(format!("{}{}", self.prefix, text))
        }
    }

    fn name(&self) -> &str {
        "Mock Translator"
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Build the configured translation backend.
///
/// Returns `None` for the `none` backend (no translator object at all,
/// saving the per-call trim/translate dance in the sink).
///
/// # Errors
/// Returns `LivecapError::TranslatorInit` if the selected backend is not
/// compiled in or fails to initialize. Callers treat this as degraded:
/// log it and continue untranslated.
pub fn create_translator(config: &TranslationConfig) -> Result<Option<Box<dyn Translator>>> {
    match config.backend {
        TranslationBackend::None => Ok(None),
        #[cfg(feature = "api-translate")]
        TranslationBackend::Api => {
            let translator = api::ApiTranslator::new(config)?;
            Ok(Some(Box::new(translator)))
        }
        #[cfg(not(feature = "api-translate"))]
        TranslationBackend::Api => Err(LivecapError::TranslatorInit {
            message: "built without the `api-translate` feature".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_translator_passes_through() {
        let mut translator = NoTranslator;
        assert_eq!(translator.translate("hello").unwrap(), "hello");
        assert_eq!(translator.name(), "No Translation");
    }

    #[test]
    fn test_mock_translator_prefixes() {
        let mut translator = MockTranslator::new().with_prefix("[de] ");
        assert_eq!(translator.translate("hello").unwrap(), "[de] hello");
    }

    #[test]
    fn test_mock_translator_failure() {
        let mut translator = MockTranslator::new().with_failure();
        let result = translator.translate("hello");
        match result {
            Err(LivecapError::Translation { message }) => {
                assert_eq!(message, "mock translation failure");
            }
            _ => panic!("Expected Translation error"),
        }
    }

    #[test]
    fn test_mock_translator_close_is_idempotent() {
        let mut translator = MockTranslator::new();
        assert!(!translator.is_closed());
        translator.close();
        translator.close();
        assert!(translator.is_closed());
    }

    #[test]
    fn test_factory_none_backend() {
        let config = TranslationConfig::default();
        let translator = create_translator(&config).unwrap();
        assert!(translator.is_none());
    }

    #[cfg(not(feature = "api-translate"))]
    #[test]
    fn test_factory_api_backend_without_feature() {
        let config = TranslationConfig {
            backend: TranslationBackend::Api,
            endpoint: Some("http://localhost:1234/translate".to_string()),
            ..Default::default()
        };
        let result = create_translator(&config);
        assert!(matches!(result, Err(LivecapError::TranslatorInit { .. })));
    }

    #[test]
    fn test_translator_trait_is_object_safe() {
        let mut translator: Box<dyn Translator> = Box::new(NoTranslator);
        assert_eq!(translator.translate("text").unwrap(), "text");
    }
}
