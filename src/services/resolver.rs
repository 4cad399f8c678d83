//! Resolution orchestrator
//!
//! `resolve()` runs one filename through parse, identifier extraction, the
//! primary provider and then the secondary provider. The first provider that
//! yields a complete record wins. Every failure along the way degrades to a
//! fallback or to `None`; nothing is returned as an error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ResolverConfig;

use super::cache::ResolverCache;
use super::filename_parser::{ParsedFilename, parse_filename};
use super::gate::ConcurrencyGate;
use super::identifier::{ExternalIdentifier, extract_from_sources};
use super::imdb::ImdbClient;
use super::locator::{Base64LocatorEncoder, LocatorEncoder, SourceRef};
use super::metadata::MediaRecord;
use super::normalizer::Normalizer;
use super::providers::{
    PrimaryAdapter, PrimaryApi, ProviderError, ProviderOutcome, ProviderRecord, SecondaryAdapter,
    SecondaryApi,
};
use super::rate_limiter::RateLimitedClient;
use super::tmdb::TmdbClient;
use super::translation::{GoogleTranslator, TranslationService, Translator};

/// Per-call input besides the filename
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// Where the file was posted; encoded into the record's locator
    pub source: SourceRef,
    /// Caption or other text that may carry an explicit identifier
    pub auxiliary_text: Option<String>,
}

impl ResolveContext {
    pub fn new(source: SourceRef) -> Self {
        Self {
            source,
            auxiliary_text: None,
        }
    }

    pub fn with_auxiliary_text(mut self, text: impl Into<String>) -> Self {
        self.auxiliary_text = Some(text.into());
        self
    }
}

/// Resolves filenames into canonical media records
#[derive(Clone)]
pub struct MetadataResolver {
    primary: PrimaryAdapter,
    secondary: SecondaryAdapter,
    normalizer: Normalizer,
    encoder: Arc<dyn LocatorEncoder>,
    cache: ResolverCache,
    gate: ConcurrencyGate,
    /// Identifier text used when the context carries none
    default_id_text: Option<String>,
}

impl MetadataResolver {
    /// Assemble a resolver from its collaborators. The cache and gate are
    /// shared by both adapters and the translation service.
    pub fn new(
        primary: Arc<dyn PrimaryApi>,
        secondary: Arc<dyn SecondaryApi>,
        translator: Arc<dyn Translator>,
        cache: ResolverCache,
        gate: ConcurrencyGate,
    ) -> Self {
        let translation = TranslationService::new(translator, &cache);
        Self {
            primary: PrimaryAdapter::new(primary, cache.clone(), gate.clone()),
            secondary: SecondaryAdapter::new(secondary, cache.clone(), gate.clone()),
            normalizer: Normalizer::new(translation),
            encoder: Arc::new(Base64LocatorEncoder),
            cache,
            gate,
            default_id_text: None,
        }
    }

    /// Build the HTTP-backed resolver described by `config`
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ProviderError> {
        let imdb_http = Arc::new(RateLimitedClient::for_imdb(config.http_timeout)?);
        let tmdb_http = Arc::new(RateLimitedClient::for_tmdb(config.http_timeout)?);
        let translate_http = Arc::new(RateLimitedClient::for_translation(config.http_timeout)?);

        let imdb = ImdbClient::new(imdb_http, &config.imdb_api_url);
        let tmdb = TmdbClient::new(
            tmdb_http,
            config.tmdb_api_key.clone(),
            &config.tmdb_language,
            &config.tmdb_region,
        )
        .with_base_url(&config.tmdb_api_url);
        if !tmdb.has_api_key() {
            warn!("TMDB_API_KEY not set, secondary provider lookups will fail");
        }
        let translator = GoogleTranslator::new(
            translate_http,
            &config.translate_source,
            &config.translate_target,
        )
        .with_base_url(&config.translate_api_url);

        let resolver = Self::new(
            Arc::new(imdb),
            Arc::new(tmdb),
            Arc::new(translator),
            ResolverCache::new(),
            ConcurrencyGate::new("provider-api", config.api_concurrency),
        );
        Ok(match &config.default_id_text {
            Some(text) => resolver.with_default_id_text(text.clone()),
            None => resolver,
        })
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn LocatorEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_default_id_text(mut self, text: impl Into<String>) -> Self {
        self.default_id_text = Some(text.into());
        self
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Locator for a source, as it would appear on a resolved record
    pub fn encode_locator(&self, source: &SourceRef) -> String {
        self.encoder.encode(source)
    }

    /// Resolve one filename. `None` means no provider could produce a record.
    pub async fn resolve(&self, filename: &str, context: &ResolveContext) -> Option<MediaRecord> {
        let hints = match parse_filename(filename) {
            Ok(hints) => hints,
            Err(reason) => {
                debug!(filename = %filename, reason = %reason, "Filename cannot be resolved");
                return None;
            }
        };

        let auxiliary = context
            .auxiliary_text
            .as_deref()
            .or(self.default_id_text.as_deref());
        let identifier = extract_from_sources(auxiliary, filename);
        debug!(
            filename = %filename,
            title = %hints.title,
            kind = %hints.media_kind(),
            ?identifier,
            "Parsed filename"
        );

        let Some(record) = self.lookup(&hints, identifier).await else {
            info!(filename = %filename, title = %hints.title, "No provider resolved filename");
            return None;
        };

        let locator = self.encode_locator(&context.source);
        let normalized = self.normalizer.normalize(&record, &hints, locator).await;
        info!(
            filename = %filename,
            title = %normalized.title,
            kind = %normalized.kind(),
            provider = ?record.provider(),
            "Resolved filename"
        );
        Some(normalized)
    }

    /// Provider cascade; the primary provider always goes first
    async fn lookup(
        &self,
        hints: &ParsedFilename,
        identifier: Option<ExternalIdentifier>,
    ) -> Option<ProviderRecord> {
        let kind = hints.media_kind();
        let episode = hints.episode_numbers();

        let mut imdb_id = identifier
            .as_ref()
            .and_then(|id| id.imdb_id())
            .map(String::from);
        let mut tmdb_id = identifier.as_ref().and_then(|id| id.tmdb_id());

        if imdb_id.is_none() && tmdb_id.is_none() {
            imdb_id = self.primary.search(&hints.title, kind).await.found();
        }

        if let Some(id) = &imdb_id {
            match self.primary.fetch_details(id, kind, episode).await {
                ProviderOutcome::Found(record) => return Some(record),
                _ => debug!(imdb_id = %id, "Falling back to secondary provider"),
            }
        }

        if tmdb_id.is_none() {
            tmdb_id = self
                .secondary
                .search(&hints.title, kind, hints.year)
                .await
                .found();
        }

        let id = tmdb_id?;
        self.secondary.fetch_details(id, kind, episode).await.found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = ResolveContext::new(SourceRef::new(1, 2)).with_auxiliary_text("tt123");
        assert_eq!(ctx.source.msg_id, 2);
        assert_eq!(ctx.auxiliary_text.as_deref(), Some("tt123"));
    }

    #[test]
    fn test_from_config_without_tmdb_key() {
        let config = ResolverConfig {
            api_concurrency: 3,
            default_id_text: Some("tt0111161".to_string()),
            ..ResolverConfig::default()
        };
        let resolver = MetadataResolver::from_config(&config).unwrap();
        assert_eq!(resolver.gate().capacity(), 3);
        assert!(resolver.cache().imdb_search.is_empty());
        assert_eq!(resolver.default_id_text.as_deref(), Some("tt0111161"));
    }
}
