//! Resolver configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Resolver configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// TMDB API key (secondary provider is disabled without it)
    pub tmdb_api_key: Option<String>,

    /// Language sent with every TMDB request
    pub tmdb_language: String,

    /// Region sent with every TMDB request
    pub tmdb_region: String,

    /// Base URL of the IMDb-style title API
    pub imdb_api_url: String,

    /// Base URL of the TMDB v3 API
    pub tmdb_api_url: String,

    /// Endpoint of the translation API
    pub translate_api_url: String,

    /// Free text that may carry a default identifier (e.g. a pasted IMDb link)
    pub default_id_text: Option<String>,

    /// Maximum simultaneous outbound provider calls
    pub api_concurrency: usize,

    /// Per-request network timeout
    pub http_timeout: Duration,

    /// Source language for text translation
    pub translate_source: String,

    /// Target language for text translation
    pub translate_target: String,

    /// Maximum filenames resolved at once during bulk ingest
    pub ingest_concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_language: "tr-TR".to_string(),
            tmdb_region: "TR".to_string(),
            imdb_api_url: "https://imdb-api.projects.thetuhin.com".to_string(),
            tmdb_api_url: "https://api.themoviedb.org/3".to_string(),
            translate_api_url: "https://translate.googleapis.com/translate_a/single".to_string(),
            default_id_text: None,
            api_concurrency: 12,
            http_timeout: Duration::from_secs(20),
            translate_source: "en".to_string(),
            translate_target: "tr".to_string(),
            ingest_concurrency: 8,
        }
    }
}

impl ResolverConfig {
    /// Load `.env` (if present) and then read the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let api_concurrency = match env::var("API_CONCURRENCY") {
            Ok(v) => v.parse().context("Invalid API_CONCURRENCY")?,
            Err(_) => defaults.api_concurrency,
        };
        if api_concurrency == 0 {
            anyhow::bail!("API_CONCURRENCY must be at least 1");
        }

        let http_timeout = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(v.parse().context("Invalid HTTP_TIMEOUT_SECS")?),
            Err(_) => defaults.http_timeout,
        };

        let ingest_concurrency = match env::var("INGEST_CONCURRENCY") {
            Ok(v) => v.parse().context("Invalid INGEST_CONCURRENCY")?,
            Err(_) => defaults.ingest_concurrency,
        };

        Ok(Self {
            tmdb_api_key: env::var("TMDB_API_KEY").ok().filter(|k| !k.is_empty()),

            tmdb_language: env::var("TMDB_LANGUAGE").unwrap_or(defaults.tmdb_language),

            tmdb_region: env::var("TMDB_REGION").unwrap_or(defaults.tmdb_region),

            imdb_api_url: env::var("IMDB_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.imdb_api_url),

            tmdb_api_url: env::var("TMDB_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.tmdb_api_url),

            translate_api_url: env::var("TRANSLATE_API_URL").unwrap_or(defaults.translate_api_url),

            default_id_text: env::var("USE_DEFAULT_ID").ok().filter(|t| !t.trim().is_empty()),

            api_concurrency,
            http_timeout,

            translate_source: env::var("TRANSLATE_SOURCE").unwrap_or(defaults.translate_source),

            translate_target: env::var("TRANSLATE_TARGET").unwrap_or(defaults.translate_target),

            ingest_concurrency: ingest_concurrency.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.api_concurrency, 12);
        assert_eq!(config.tmdb_language, "tr-TR");
        assert_eq!(config.translate_target, "tr");
        assert!(config.tmdb_api_key.is_none());
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
    }
}
