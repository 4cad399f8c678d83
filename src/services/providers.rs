//! Provider adapters
//!
//! Each upstream API sits behind a small trait so the resolver can be driven
//! by mocks. The adapters wrap those traits with the shared caches and the
//! concurrency gate, and fold every failure into a [`ProviderOutcome`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::cache::{ResolverCache, TmdbDetailKey, TmdbDetails};
use super::gate::ConcurrencyGate;
use super::imdb::{ImdbEpisode, ImdbTitle};
use super::metadata::{MediaKind, MetadataProvider};
use super::tmdb::{TmdbEpisode, TmdbMovieDetails, TmdbSearchHit, TmdbTvDetails};

/// Errors from provider calls
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("unauthorized")]
    Unauthorized,

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("concurrency gate closed")]
    GateClosed,

    #[error("{0}")]
    Other(String),
}

/// Result of one adapter operation
#[derive(Debug)]
pub enum ProviderOutcome<T> {
    /// A usable result
    Found(T),
    /// The provider answered, but had nothing
    Empty,
    /// The call failed; the reason is only logged
    Failed(ProviderError),
}

impl<T> ProviderOutcome<T> {
    /// Not-found responses count as empty rather than failed
    pub fn from_result(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(ProviderError::NotFound) => Self::Empty,
            Err(e) => Self::Failed(e),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderOutcome<U> {
        match self {
            Self::Found(value) => ProviderOutcome::Found(f(value)),
            Self::Empty => ProviderOutcome::Empty,
            Self::Failed(e) => ProviderOutcome::Failed(e),
        }
    }
}

impl<T> From<Option<T>> for ProviderOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::Empty,
        }
    }
}

/// Primary (IMDb-style) provider API
#[async_trait]
pub trait PrimaryApi: Send + Sync {
    /// Id of the best match for a title, if any
    async fn search_title(&self, title: &str, kind: MediaKind)
        -> Result<Option<String>, ProviderError>;

    async fn get_detail(&self, imdb_id: &str, kind: MediaKind) -> Result<ImdbTitle, ProviderError>;

    async fn get_episode(
        &self,
        imdb_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<ImdbEpisode, ProviderError>;
}

/// Secondary (TMDB) provider API
#[async_trait]
pub trait SecondaryApi: Send + Sync {
    /// First search hit; `year` only narrows movie searches
    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<u32>,
    ) -> Result<Option<TmdbSearchHit>, ProviderError>;

    /// Movie details with artwork
    async fn movie_details(&self, id: u64) -> Result<TmdbMovieDetails, ProviderError>;

    /// Series details with artwork
    async fn series_details(&self, id: u64) -> Result<TmdbTvDetails, ProviderError>;

    async fn episode_details(
        &self,
        id: u64,
        season: u32,
        episode: u32,
    ) -> Result<TmdbEpisode, ProviderError>;
}

/// Raw provider payload handed to the normalizer
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRecord {
    ImdbMovie {
        imdb_id: String,
        title: ImdbTitle,
    },
    ImdbEpisode {
        imdb_id: String,
        series: ImdbTitle,
        episode: ImdbEpisode,
        season_number: u32,
        episode_number: u32,
    },
    TmdbMovie(Arc<TmdbMovieDetails>),
    TmdbEpisode {
        series: Arc<TmdbTvDetails>,
        episode: Arc<TmdbEpisode>,
        season_number: u32,
        episode_number: u32,
    },
}

impl ProviderRecord {
    pub fn provider(&self) -> MetadataProvider {
        match self {
            Self::ImdbMovie { .. } | Self::ImdbEpisode { .. } => MetadataProvider::Imdb,
            Self::TmdbMovie(_) | Self::TmdbEpisode { .. } => MetadataProvider::Tmdb,
        }
    }
}

/// Log a failed outcome and hand it back
fn log_outcome<T>(provider: &str, operation: &str, outcome: ProviderOutcome<T>) -> ProviderOutcome<T> {
    match &outcome {
        ProviderOutcome::Failed(e) => {
            warn!(provider, operation, error = %e, "Provider call failed");
        }
        ProviderOutcome::Empty => {
            debug!(provider, operation, "Provider returned no result");
        }
        ProviderOutcome::Found(_) => {}
    }
    outcome
}

/// Cached, gated access to the primary provider
#[derive(Clone)]
pub struct PrimaryAdapter {
    api: Arc<dyn PrimaryApi>,
    cache: ResolverCache,
    gate: ConcurrencyGate,
}

impl PrimaryAdapter {
    pub fn new(api: Arc<dyn PrimaryApi>, cache: ResolverCache, gate: ConcurrencyGate) -> Self {
        Self { api, cache, gate }
    }

    /// Search by (kind, title). Answered searches are cached, misses included.
    pub async fn search(&self, title: &str, kind: MediaKind) -> ProviderOutcome<String> {
        let key = (kind, title.to_string());
        if let Some(cached) = self.cache.imdb_search.get(&key) {
            debug!(title = %title, kind = %kind, "IMDb search cache hit");
            return cached.into();
        }

        let result = self
            .gate
            .run(|| self.api.search_title(title, kind))
            .await;

        let outcome: ProviderOutcome<String> = match result {
            Ok(hit) => {
                self.cache.imdb_search.set(key, hit.clone());
                hit.into()
            }
            Err(e) => ProviderOutcome::Failed(e),
        };
        log_outcome("imdb", "search", outcome)
    }

    /// Fetch a movie, or a series plus one episode when `episode` is given
    pub async fn fetch_details(
        &self,
        imdb_id: &str,
        kind: MediaKind,
        episode: Option<(u32, u32)>,
    ) -> ProviderOutcome<ProviderRecord> {
        let outcome = match (kind, episode) {
            (MediaKind::Movie, _) => self.fetch_title(imdb_id, kind).await.map(|title| {
                ProviderRecord::ImdbMovie {
                    imdb_id: imdb_id.to_string(),
                    title,
                }
            }),
            (MediaKind::Series, Some((season, number))) => {
                match self.fetch_title(imdb_id, kind).await {
                    ProviderOutcome::Found(series) => ProviderOutcome::from_result(
                        self.gate
                            .run(|| self.api.get_episode(imdb_id, season, number))
                            .await,
                    )
                    .map(|episode| ProviderRecord::ImdbEpisode {
                        imdb_id: imdb_id.to_string(),
                        series,
                        episode,
                        season_number: season,
                        episode_number: number,
                    }),
                    ProviderOutcome::Empty => ProviderOutcome::Empty,
                    ProviderOutcome::Failed(e) => ProviderOutcome::Failed(e),
                }
            }
            (MediaKind::Series, None) => ProviderOutcome::Empty,
        };
        log_outcome("imdb", "details", outcome)
    }

    async fn fetch_title(&self, imdb_id: &str, kind: MediaKind) -> ProviderOutcome<ImdbTitle> {
        ProviderOutcome::from_result(self.gate.run(|| self.api.get_detail(imdb_id, kind)).await)
    }
}

/// Cached, gated access to the secondary provider
#[derive(Clone)]
pub struct SecondaryAdapter {
    api: Arc<dyn SecondaryApi>,
    cache: ResolverCache,
    gate: ConcurrencyGate,
}

impl SecondaryAdapter {
    pub fn new(api: Arc<dyn SecondaryApi>, cache: ResolverCache, gate: ConcurrencyGate) -> Self {
        Self { api, cache, gate }
    }

    /// Search by (kind, title, year). Answered searches are cached, misses included.
    pub async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<u32>,
    ) -> ProviderOutcome<u64> {
        let key = (kind, title.to_string(), year);
        if let Some(cached) = self.cache.tmdb_search.get(&key) {
            debug!(title = %title, kind = %kind, ?year, "TMDB search cache hit");
            return ProviderOutcome::from(cached).map(|hit| hit.id);
        }

        let result = self
            .gate
            .run(|| self.api.search(title, kind, year))
            .await;

        let outcome: ProviderOutcome<u64> = match result {
            Ok(hit) => {
                self.cache.tmdb_search.set(key, hit.clone());
                ProviderOutcome::from(hit).map(|hit| hit.id)
            }
            Err(e) => ProviderOutcome::Failed(e),
        };
        log_outcome("tmdb", "search", outcome)
    }

    /// Fetch a movie, or a series plus one episode; both halves must succeed
    pub async fn fetch_details(
        &self,
        id: u64,
        kind: MediaKind,
        episode: Option<(u32, u32)>,
    ) -> ProviderOutcome<ProviderRecord> {
        let outcome = match (kind, episode) {
            (MediaKind::Movie, _) => self.movie(id).await.map(ProviderRecord::TmdbMovie),
            (MediaKind::Series, Some((season, number))) => match self.series(id).await {
                ProviderOutcome::Found(series) => {
                    self.episode(id, season, number)
                        .await
                        .map(|episode| ProviderRecord::TmdbEpisode {
                            series,
                            episode,
                            season_number: season,
                            episode_number: number,
                        })
                }
                ProviderOutcome::Empty => ProviderOutcome::Empty,
                ProviderOutcome::Failed(e) => ProviderOutcome::Failed(e),
            },
            (MediaKind::Series, None) => ProviderOutcome::Empty,
        };
        log_outcome("tmdb", "details", outcome)
    }

    async fn movie(&self, id: u64) -> ProviderOutcome<Arc<TmdbMovieDetails>> {
        let key = TmdbDetailKey::Movie(id);
        if let Some(TmdbDetails::Movie(movie)) = self.cache.tmdb_details.get(&key) {
            debug!(tmdb_id = id, "TMDB movie cache hit");
            return ProviderOutcome::Found(movie);
        }

        let result = self.gate.run(|| self.api.movie_details(id)).await.map(Arc::new);
        if let Ok(movie) = &result {
            self.cache.tmdb_details.set(key, TmdbDetails::Movie(movie.clone()));
        }
        ProviderOutcome::from_result(result)
    }

    async fn series(&self, id: u64) -> ProviderOutcome<Arc<TmdbTvDetails>> {
        let key = TmdbDetailKey::Series(id);
        if let Some(TmdbDetails::Series(series)) = self.cache.tmdb_details.get(&key) {
            debug!(tmdb_id = id, "TMDB series cache hit");
            return ProviderOutcome::Found(series);
        }

        let result = self.gate.run(|| self.api.series_details(id)).await.map(Arc::new);
        if let Ok(series) = &result {
            self.cache.tmdb_details.set(key, TmdbDetails::Series(series.clone()));
        }
        ProviderOutcome::from_result(result)
    }

    async fn episode(&self, id: u64, season: u32, episode: u32) -> ProviderOutcome<Arc<TmdbEpisode>> {
        let key = TmdbDetailKey::Episode {
            series_id: id,
            season,
            episode,
        };
        if let Some(TmdbDetails::Episode(ep)) = self.cache.tmdb_details.get(&key) {
            debug!(tmdb_id = id, season, episode, "TMDB episode cache hit");
            return ProviderOutcome::Found(ep);
        }

        let result = self
            .gate
            .run(|| self.api.episode_details(id, season, episode))
            .await
            .map(Arc::new);
        if let Ok(ep) = &result {
            self.cache.tmdb_details.set(key, TmdbDetails::Episode(ep.clone()));
        }
        ProviderOutcome::from_result(result)
    }
}
