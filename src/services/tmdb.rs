//! TMDB (The Movie Database) API client, the secondary metadata provider
//!
//! Base URL: https://api.themoviedb.org/3
//!
//! Every request carries the configured `language` and `region`, so titles,
//! overviews and genre names come back localized where TMDB has them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::metadata::MediaKind;
use super::providers::{ProviderError, SecondaryApi};
use super::rate_limiter::RateLimitedClient;

/// Image CDN root; a size token and the file path are appended
pub const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// TMDB API client with rate limiting
pub struct TmdbClient {
    client: Arc<RateLimitedClient>,
    base_url: String,
    api_key: Option<String>,
    language: String,
    region: String,
}

/// Search response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbSearchHit>,
}

/// One search hit; movies carry `title`, series carry `name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbSearchHit {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
}

/// Movie details with `external_ids` and `credits` appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub external_ids: Option<TmdbExternalIds>,
    pub credits: Option<TmdbCredits>,
    /// Filled from the separate images endpoint
    #[serde(default)]
    pub images: Option<TmdbImages>,
}

/// Series details with `external_ids` and `credits` appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbTvDetails {
    pub id: u64,
    pub name: String,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub external_ids: Option<TmdbExternalIds>,
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub images: Option<TmdbImages>,
}

/// Episode details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbEpisode {
    pub id: u64,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub still_path: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbGenre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TmdbExternalIds {
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
    pub character: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TmdbImages {
    #[serde(default)]
    pub logos: Vec<TmdbImage>,
    #[serde(default)]
    pub posters: Vec<TmdbImage>,
    #[serde(default)]
    pub backdrops: Vec<TmdbImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbImage {
    pub file_path: Option<String>,
    pub iso_639_1: Option<String>,
}

impl TmdbClient {
    /// Create a new TMDB client
    pub fn new(
        client: Arc<RateLimitedClient>,
        api_key: Option<String>,
        language: &str,
        region: &str,
    ) -> Self {
        Self {
            client,
            base_url: "https://api.themoviedb.org/3".to_string(),
            api_key,
            language: language.to_string(),
            region: region.to_string(),
        }
    }

    /// Point the client at another API root (proxies, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Check if the client has a valid API key configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn base_query(&self) -> Result<Vec<(&'static str, String)>, ProviderError> {
        let key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::NotConfigured("TMDB API key"))?;

        Ok(vec![
            ("api_key", key),
            ("language", self.language.clone()),
            ("region", self.region.clone()),
        ])
    }

    /// Search for movies by name
    pub async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<TmdbSearchHit>, ProviderError> {
        info!(
            "Searching TMDB for movie '{}'{}",
            query,
            year.map(|y| format!(" ({})", y)).unwrap_or_default()
        );

        let mut params = self.base_query()?;
        params.push(("query", query.to_string()));
        params.push(("include_adult", "false".to_string()));
        if let Some(y) = year {
            params.push(("year", y.to_string()));
        }

        let url = format!("{}/search/movie", self.base_url);
        let response: TmdbSearchResponse = self.client.get_json(&url, &params).await?;

        debug!(count = response.results.len(), "TMDB movie search returned results");
        Ok(response.results)
    }

    /// Search for TV series by name
    pub async fn search_tv(&self, query: &str) -> Result<Vec<TmdbSearchHit>, ProviderError> {
        info!("Searching TMDB for series '{}'", query);

        let mut params = self.base_query()?;
        params.push(("query", query.to_string()));

        let url = format!("{}/search/tv", self.base_url);
        let response: TmdbSearchResponse = self.client.get_json(&url, &params).await?;

        debug!(count = response.results.len(), "TMDB tv search returned results");
        Ok(response.results)
    }

    /// Get movie details by TMDB ID
    pub async fn get_movie(&self, tmdb_id: u64) -> Result<TmdbMovieDetails, ProviderError> {
        debug!("Fetching movie details from TMDB (ID: {})", tmdb_id);

        let mut params = self.base_query()?;
        params.push(("append_to_response", "external_ids,credits".to_string()));

        let url = format!("{}/movie/{}", self.base_url, tmdb_id);
        self.client.get_json(&url, &params).await
    }

    /// Get series details by TMDB ID
    pub async fn get_tv(&self, tmdb_id: u64) -> Result<TmdbTvDetails, ProviderError> {
        debug!("Fetching series details from TMDB (ID: {})", tmdb_id);

        let mut params = self.base_query()?;
        params.push(("append_to_response", "external_ids,credits".to_string()));

        let url = format!("{}/tv/{}", self.base_url, tmdb_id);
        self.client.get_json(&url, &params).await
    }

    /// Get artwork for a movie or series
    pub async fn get_images(&self, kind: MediaKind, tmdb_id: u64) -> Result<TmdbImages, ProviderError> {
        let mut params = self.base_query()?;
        // Localized requests only return artwork in that language; also ask for English and untagged
        params.push(("include_image_language", "en,null".to_string()));

        let url = format!("{}/{}/{}/images", self.base_url, kind.tmdb_path(), tmdb_id);
        self.client.get_json(&url, &params).await
    }

    /// Get a single episode of a series
    pub async fn get_episode(
        &self,
        tmdb_id: u64,
        season: u32,
        episode: u32,
    ) -> Result<TmdbEpisode, ProviderError> {
        debug!(
            "Fetching episode details from TMDB (ID: {}, S{:02}E{:02})",
            tmdb_id, season, episode
        );

        let params = self.base_query()?;
        let url = format!(
            "{}/tv/{}/season/{}/episode/{}",
            self.base_url, tmdb_id, season, episode
        );
        self.client.get_json(&url, &params).await
    }
}

#[async_trait]
impl SecondaryApi for TmdbClient {
    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<u32>,
    ) -> Result<Option<TmdbSearchHit>, ProviderError> {
        let results = match kind {
            MediaKind::Movie => self.search_movies(title, year).await?,
            MediaKind::Series => self.search_tv(title).await?,
        };
        Ok(results.into_iter().next())
    }

    async fn movie_details(&self, id: u64) -> Result<TmdbMovieDetails, ProviderError> {
        let mut movie = self.get_movie(id).await?;
        movie.images = Some(self.get_images(MediaKind::Movie, id).await?);
        Ok(movie)
    }

    async fn series_details(&self, id: u64) -> Result<TmdbTvDetails, ProviderError> {
        let mut tv = self.get_tv(id).await?;
        tv.images = Some(self.get_images(MediaKind::Series, id).await?);
        Ok(tv)
    }

    async fn episode_details(
        &self,
        id: u64,
        season: u32,
        episode: u32,
    ) -> Result<TmdbEpisode, ProviderError> {
        self.get_episode(id, season, episode).await
    }
}

/// Build a CDN URL for an image path at the given size
pub fn image_url(path: Option<&str>, size: &str) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{}/{}{}", TMDB_IMAGE_BASE_URL, size, p),
        _ => String::new(),
    }
}

/// Pick a logo: English first, then any logo with a path
pub fn logo_url(images: Option<&TmdbImages>) -> String {
    let Some(images) = images else {
        return String::new();
    };

    let has_path = |l: &&TmdbImage| l.file_path.as_deref().is_some_and(|p| !p.is_empty());
    let english = images
        .logos
        .iter()
        .filter(has_path)
        .find(|l| l.iso_639_1.as_deref() == Some("en"));
    let any = || images.logos.iter().find(has_path);

    english
        .or_else(any)
        .map(|l| image_url(l.file_path.as_deref(), "w300"))
        .unwrap_or_default()
}

impl TmdbMovieDetails {
    /// IMDb id from the appended external ids, falling back to the top-level field
    pub fn imdb_id(&self) -> Option<String> {
        self.external_ids
            .as_ref()
            .and_then(|e| e.imdb_id.clone())
            .or_else(|| self.imdb_id.clone())
            .filter(|id| !id.is_empty())
    }
}

impl TmdbTvDetails {
    pub fn imdb_id(&self) -> Option<String> {
        self.external_ids
            .as_ref()
            .and_then(|e| e.imdb_id.clone())
            .filter(|id| !id.is_empty())
    }
}

impl TmdbCredits {
    /// Cast names in billing order
    pub fn cast_names(&self) -> Vec<String> {
        let mut cast = self.cast.clone();
        cast.sort_by_key(|c| c.order.unwrap_or(i32::MAX));
        cast.into_iter().map(|c| c.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(path: &str, lang: Option<&str>) -> TmdbImage {
        TmdbImage {
            file_path: Some(path.to_string()),
            iso_639_1: lang.map(String::from),
        }
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url(Some("/abc123.jpg"), "w500"),
            "https://image.tmdb.org/t/p/w500/abc123.jpg"
        );
        assert_eq!(image_url(None, "w500"), "");
        assert_eq!(image_url(Some(""), "original"), "");
    }

    #[test]
    fn test_logo_prefers_english() {
        let images = TmdbImages {
            logos: vec![logo("/tr.png", Some("tr")), logo("/en.png", Some("en"))],
            ..Default::default()
        };
        assert_eq!(
            logo_url(Some(&images)),
            "https://image.tmdb.org/t/p/w300/en.png"
        );
    }

    #[test]
    fn test_logo_falls_back_to_first() {
        let images = TmdbImages {
            logos: vec![
                TmdbImage {
                    file_path: None,
                    iso_639_1: Some("en".to_string()),
                },
                logo("/null.png", None),
            ],
            ..Default::default()
        };
        assert_eq!(
            logo_url(Some(&images)),
            "https://image.tmdb.org/t/p/w300/null.png"
        );
        assert_eq!(logo_url(None), "");
    }

    #[test]
    fn test_logo_skips_empty_paths() {
        let images = TmdbImages {
            logos: vec![logo("", Some("en")), logo("/x.png", Some("tr"))],
            ..Default::default()
        };
        assert_eq!(
            logo_url(Some(&images)),
            "https://image.tmdb.org/t/p/w300/x.png"
        );

        let images = TmdbImages {
            logos: vec![logo("", Some("en"))],
            ..Default::default()
        };
        assert_eq!(logo_url(Some(&images)), "");
    }

    #[test]
    fn test_cast_names_in_billing_order() {
        let credits = TmdbCredits {
            cast: vec![
                TmdbCastMember {
                    name: "Second".to_string(),
                    character: None,
                    order: Some(1),
                },
                TmdbCastMember {
                    name: "First".to_string(),
                    character: None,
                    order: Some(0),
                },
            ],
        };
        assert_eq!(credits.cast_names(), vec!["First", "Second"]);
    }

    #[test]
    fn test_movie_details_decode() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "overview": "A thief...",
            "release_date": "2010-07-15",
            "runtime": 148,
            "poster_path": "/p.jpg",
            "backdrop_path": "/b.jpg",
            "vote_average": 8.4,
            "genres": [{"id": 28, "name": "Action"}],
            "external_ids": {"imdb_id": "tt1375666"},
            "credits": {"cast": [{"name": "Leonardo DiCaprio", "order": 0}]}
        }"#;
        let movie: TmdbMovieDetails = serde_json::from_str(json).unwrap();
        assert_eq!(movie.imdb_id().as_deref(), Some("tt1375666"));
        assert_eq!(movie.runtime, Some(148));
        assert!(movie.images.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        let http = Arc::new(RateLimitedClient::for_tmdb(std::time::Duration::from_secs(1)).unwrap());
        let client = TmdbClient::new(http, None, "tr-TR", "TR");
        assert!(!client.has_api_key());
        assert!(matches!(
            client.base_query(),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_base_url_override() {
        let http = Arc::new(RateLimitedClient::for_tmdb(std::time::Duration::from_secs(1)).unwrap());
        let client = TmdbClient::new(http, Some("key".to_string()), "tr-TR", "TR")
            .with_base_url("http://localhost:8080/3/");
        assert_eq!(client.base_url, "http://localhost:8080/3");
    }
}
