//! Remote HTTP translation backend.
//!
//! Posts `{text, source_lang, target_lang}` as JSON to a configured
//! endpoint and expects `{text}` back. Works with LibreTranslate-style
//! services and simple proxy shims in front of commercial APIs.
//!
//! # Feature Gate
//!
//! Requires the `api-translate` feature:
//!
//! ```bash
//! cargo build --features api-translate
//! ```

use crate::config::TranslationConfig;
use crate::error::{LivecapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout. A stalled endpoint must not freeze the caption
/// pipeline longer than this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    text: String,
}

/// Translator backed by a remote HTTP endpoint.
pub struct ApiTranslator {
    client: Option<reqwest::blocking::Client>,
    endpoint: String,
    api_key: Option<String>,
    source_lang: String,
    target_lang: String,
    name: String,
}

impl ApiTranslator {
    /// Build the client from configuration.
    ///
    /// The API key is read from the environment variable named in
    /// `translation.api_key_env`, never from the config file itself.
    ///
    /// # Errors
    /// Returns `LivecapError::TranslatorInit` if the endpoint is missing,
    /// the named key variable is unset, or the HTTP client cannot be built.
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| LivecapError::TranslatorInit {
                message: "translation.endpoint is not set".to_string(),
            })?;

        let api_key = match &config.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| LivecapError::TranslatorInit {
                message: format!("environment variable {} is not set", var),
            })?),
            None => None,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LivecapError::TranslatorInit {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client: Some(client),
            name: format!("API ({} -> {})", config.source_lang, config.target_lang),
            endpoint,
            api_key,
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
        })
    }
}

impl super::Translator for ApiTranslator {
    fn translate(&mut self, text: &str) -> Result<String> {
        let client = self.client.as_ref().ok_or_else(|| LivecapError::Translation {
            message: "translator already closed".to_string(),
        })?;

        let mut request = client.post(&self.endpoint).json(&TranslateRequest {
            text,
            source_lang: &self.source_lang,
            target_lang: &self.target_lang,
        });

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| LivecapError::Translation {
            message: format!("request failed: {}", e),
        })?;

        if !response.status().is_success() {
            return Err(LivecapError::Translation {
                message: format!("endpoint returned {}", response.status()),
            });
        }

        let body: TranslateResponse =
            response.json().map_err(|e| LivecapError::Translation {
                message: format!("invalid response body: {}", e),
            })?;

        Ok(body.text)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        // Dropping the client tears down its connection pool.
        self.client = None;
    }
}
