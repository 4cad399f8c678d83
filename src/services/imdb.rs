//! IMDb-style title API client, the primary metadata provider
//!
//! Endpoints:
//! - `GET {base}/search?query=<title>`
//! - `GET {base}/title/<tt id>`
//! - `GET {base}/title/<tt id>/season/<n>`
//!
//! Records are keyed by the well-known "tt" identifiers, so artwork can be
//! synthesized from the id alone.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use super::metadata::MediaKind;
use super::providers::{PrimaryApi, ProviderError};
use super::rate_limiter::RateLimitedClient;

/// IMDb-style API client
pub struct ImdbClient {
    client: Arc<RateLimitedClient>,
    base_url: String,
}

/// Search response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImdbSearchResponse {
    #[serde(default)]
    pub results: Vec<ImdbSearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImdbSearchHit {
    pub id: String,
    pub title: Option<String>,
    /// "movie", "tvSeries", "tvMiniSeries", ...
    #[serde(rename = "type")]
    pub title_type: Option<String>,
    pub year: Option<u32>,
}

/// Title details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImdbTitle {
    pub title: Option<String>,
    pub plot: Option<String>,
    pub rating: Option<ImdbRating>,
    #[serde(rename = "releaseDetailed")]
    pub release_detailed: Option<ImdbReleaseDetailed>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default, alias = "actors")]
    pub cast: Vec<String>,
    /// Free text ("2h 28m") or a bare number depending on the title
    pub runtime: Option<JsonValue>,
    /// Cross reference to TMDB when the API knows it
    pub moviedb_id: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImdbRating {
    pub star: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImdbReleaseDetailed {
    pub year: Option<u32>,
    pub date: Option<String>,
}

/// Season listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImdbSeason {
    #[serde(default)]
    pub episodes: Vec<ImdbEpisode>,
}

/// One episode from a season listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImdbEpisode {
    /// Episode number within the season (number or numeric string)
    pub no: Option<JsonValue>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub plot: Option<String>,
    /// ISO date text or epoch milliseconds
    #[serde(alias = "publishedDate")]
    pub released: Option<JsonValue>,
}

impl ImdbClient {
    pub fn new(client: Arc<RateLimitedClient>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search titles and keep the first hit of the requested kind
    pub async fn find_title(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> Result<Option<ImdbSearchHit>, ProviderError> {
        info!(query = %title, kind = %kind, "Searching IMDb for title");

        let url = format!("{}/search", self.base_url);
        let response: ImdbSearchResponse = self.client.get_json(&url, &[("query", title)]).await?;

        debug!(count = response.results.len(), "IMDb search returned results");
        Ok(pick_search_hit(response.results, kind))
    }

    /// Get title details by IMDb id
    pub async fn get_title(&self, imdb_id: &str) -> Result<ImdbTitle, ProviderError> {
        debug!(imdb_id = %imdb_id, "Fetching title from IMDb");

        let url = format!("{}/title/{}", self.base_url, imdb_id);
        let empty: [(&str, &str); 0] = [];
        self.client.get_json(&url, &empty).await
    }

    /// Get one episode out of a season listing
    pub async fn get_season_episode(
        &self,
        imdb_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<ImdbEpisode, ProviderError> {
        debug!(imdb_id = %imdb_id, season, episode, "Fetching season from IMDb");

        let url = format!("{}/title/{}/season/{}", self.base_url, imdb_id, season);
        let empty: [(&str, &str); 0] = [];
        let listing: ImdbSeason = self.client.get_json(&url, &empty).await?;

        listing
            .episodes
            .into_iter()
            .find(|e| e.number() == Some(episode))
            .ok_or(ProviderError::NotFound)
    }
}

#[async_trait]
impl PrimaryApi for ImdbClient {
    async fn search_title(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.find_title(title, kind).await?.map(|hit| hit.id))
    }

    async fn get_detail(&self, imdb_id: &str, _kind: MediaKind) -> Result<ImdbTitle, ProviderError> {
        self.get_title(imdb_id).await
    }

    async fn get_episode(
        &self,
        imdb_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<ImdbEpisode, ProviderError> {
        self.get_season_episode(imdb_id, season, episode).await
    }
}

/// First hit whose type fits the kind; untyped hits are accepted
fn pick_search_hit(results: Vec<ImdbSearchHit>, kind: MediaKind) -> Option<ImdbSearchHit> {
    results.into_iter().find(|hit| match hit.title_type.as_deref() {
        None => true,
        Some(t) => {
            let t = t.to_lowercase();
            match kind {
                MediaKind::Movie => t == "movie" || t == "tvmovie",
                MediaKind::Series => t.starts_with("tvseries") || t == "tvminiseries",
            }
        }
    })
}

/// Read a number that may arrive as a JSON number or a numeric string
fn json_number(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl ImdbTitle {
    pub fn year(&self) -> Option<u32> {
        self.release_detailed.as_ref().and_then(|r| r.year)
    }

    pub fn release_date(&self) -> Option<&str> {
        self.release_detailed.as_ref().and_then(|r| r.date.as_deref())
    }

    pub fn star_rating(&self) -> Option<f64> {
        self.rating.as_ref().and_then(|r| r.star)
    }

    pub fn tmdb_id(&self) -> Option<u64> {
        self.moviedb_id.as_ref().and_then(json_number)
    }

    /// Runtime as the API reported it
    pub fn runtime_text(&self) -> String {
        match &self.runtime {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

impl ImdbEpisode {
    pub fn number(&self) -> Option<u32> {
        self.no
            .as_ref()
            .and_then(json_number)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Release date as text; epoch milliseconds are converted to RFC 3339
    pub fn released_text(&self) -> Option<String> {
        match self.released.as_ref()? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.to_rfc3339()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(id: &str, title_type: Option<&str>) -> ImdbSearchHit {
        ImdbSearchHit {
            id: id.to_string(),
            title: None,
            title_type: title_type.map(String::from),
            year: None,
        }
    }

    #[test]
    fn test_pick_search_hit_by_kind() {
        let results = vec![hit("tt1", Some("tvSeries")), hit("tt2", Some("movie"))];
        assert_eq!(
            pick_search_hit(results.clone(), MediaKind::Movie).map(|h| h.id),
            Some("tt2".to_string())
        );
        assert_eq!(
            pick_search_hit(results, MediaKind::Series).map(|h| h.id),
            Some("tt1".to_string())
        );
    }

    #[test]
    fn test_pick_search_hit_untyped() {
        let results = vec![hit("tt9", None)];
        assert_eq!(
            pick_search_hit(results, MediaKind::Series).map(|h| h.id),
            Some("tt9".to_string())
        );
        assert!(pick_search_hit(vec![hit("tt1", Some("videoGame"))], MediaKind::Movie).is_none());
    }

    #[test]
    fn test_title_decode() {
        let value = json!({
            "title": "Inception",
            "plot": "A thief who steals corporate secrets...",
            "rating": {"star": 8.8, "count": 2500000},
            "releaseDetailed": {"year": 2010, "date": "2010-07-16T00:00:00.000Z"},
            "genre": ["Action", "Sci-Fi"],
            "actors": ["Leonardo DiCaprio", "Joseph Gordon-Levitt"],
            "runtime": "2h 28m",
            "moviedb_id": "27205"
        });
        let title: ImdbTitle = serde_json::from_value(value).unwrap();
        assert_eq!(title.year(), Some(2010));
        assert_eq!(title.star_rating(), Some(8.8));
        assert_eq!(title.cast.len(), 2);
        assert_eq!(title.runtime_text(), "2h 28m");
        assert_eq!(title.tmdb_id(), Some(27205));
    }

    #[test]
    fn test_episode_fields() {
        let episode: ImdbEpisode = serde_json::from_value(json!({
            "no": "3",
            "title": "Pilot",
            "publishedDate": 1262304000000i64
        }))
        .unwrap();
        assert_eq!(episode.number(), Some(3));
        assert_eq!(
            episode.released_text().as_deref(),
            Some("2010-01-01T00:00:00+00:00")
        );
    }
}
