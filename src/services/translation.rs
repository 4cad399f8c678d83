//! Text translation
//!
//! Descriptions and episode text are translated best-effort: a failed call
//! leaves the original text in place and is not cached, so a later resolution
//! may try again.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

use super::cache::{MemoCache, ResolverCache};
use super::providers::ProviderError;
use super::rate_limiter::RateLimitedClient;

const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Http(#[from] ProviderError),

    #[error("unexpected translation response: {0}")]
    Decode(String),

    #[error("translation returned no text")]
    Empty,
}

/// A translation backend
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

/// Google's public web endpoint (`client=gtx`)
pub struct GoogleTranslator {
    client: Arc<RateLimitedClient>,
    base_url: String,
    source: String,
    target: String,
}

impl GoogleTranslator {
    pub fn new(client: Arc<RateLimitedClient>, source: &str, target: &str) -> Self {
        Self {
            client,
            base_url: GOOGLE_TRANSLATE_URL.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let query = [
            ("client", "gtx"),
            ("sl", self.source.as_str()),
            ("tl", self.target.as_str()),
            ("dt", "t"),
            ("q", text),
        ];
        let body: JsonValue = self.client.get_json(&self.base_url, &query).await?;
        parse_google_response(&body)
    }
}

/// Join the translated segments of a `translate_a/single` response.
///
/// The body looks like `[[["Merhaba","Hello",null,null,1], ...], null, "en"]`.
fn parse_google_response(body: &JsonValue) -> Result<String, TranslationError> {
    let segments = body
        .get(0)
        .and_then(JsonValue::as_array)
        .ok_or_else(|| TranslationError::Decode("missing segment list".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(JsonValue::as_str))
        .collect();

    if text.trim().is_empty() {
        Err(TranslationError::Empty)
    } else {
        Ok(text)
    }
}

/// Returns its input unchanged
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}

/// Cached, infallible front for a [`Translator`]
#[derive(Clone)]
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    cache: Arc<MemoCache<String, String>>,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn Translator>, cache: &ResolverCache) -> Self {
        Self {
            translator,
            cache: cache.translations.clone(),
        }
    }

    /// Translate `text`; blank input gives an empty string, failures give the input back
    pub async fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let key = text.to_string();
        if let Some(cached) = self.cache.get(&key) {
            debug!(len = text.len(), "Translation cache hit");
            return cached;
        }

        match self.translator.translate(text).await {
            Ok(translated) => {
                self.cache.set(key, translated.clone());
                translated
            }
            Err(e) => {
                warn!(error = %e, "Translation failed, keeping original text");
                key
            }
        }
    }

    /// Translate an optional field
    pub async fn translate_opt(&self, text: Option<&str>) -> String {
        match text {
            Some(t) => self.translate(t).await,
            None => String::new(),
        }
    }
}
