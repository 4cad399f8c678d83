//! Canonical media record shared by every provider path
//!
//! A record is either a complete movie or a complete series episode. The
//! episodic fields live inside [`MediaDetails::Series`], so they can only be
//! set together.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Movie or episodic content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    /// Name used by the document store
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
        }
    }

    /// Path segment used by TMDB endpoints
    pub fn tmdb_path(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata provider enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataProvider {
    Imdb,
    Tmdb,
}

/// Episode fields, present only on series records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetails {
    pub season_number: u32,
    pub episode_number: u32,
    pub episode_title: String,
    pub episode_backdrop: String,
    pub episode_overview: String,
    pub episode_released: String,
}

/// Shape-specific part of a record, tagged as `media_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media_type")]
pub enum MediaDetails {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series(EpisodeDetails),
}

/// Normalized output of a resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    #[serde(rename = "imdb_id")]
    pub primary_id: Option<String>,
    #[serde(rename = "tmdb_id")]
    pub secondary_id: Option<u64>,
    pub title: String,
    /// 0 when unknown
    pub year: u32,
    /// ISO-8601 or empty
    #[serde(rename = "released")]
    pub release_date: String,
    #[serde(rename = "rate")]
    pub rating: f64,
    pub description: String,
    pub poster: String,
    pub backdrop: String,
    pub logo: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub runtime: String,
    pub quality: String,
    /// Opaque reference to the source message
    #[serde(rename = "encoded_string")]
    pub locator: String,
    /// Provider that produced the record; `None` for placeholders
    #[serde(default)]
    pub provider: Option<MetadataProvider>,
    #[serde(flatten)]
    pub details: MediaDetails,
}

impl MediaRecord {
    pub fn kind(&self) -> MediaKind {
        match self.details {
            MediaDetails::Movie => MediaKind::Movie,
            MediaDetails::Series(_) => MediaKind::Series,
        }
    }

    pub fn episode(&self) -> Option<&EpisodeDetails> {
        match &self.details {
            MediaDetails::Series(ep) => Some(ep),
            MediaDetails::Movie => None,
        }
    }

    /// Best-effort record for a filename no provider could resolve
    pub fn placeholder(filename: &str, locator: String) -> Self {
        Self {
            primary_id: None,
            secondary_id: None,
            title: filename.to_string(),
            year: 0,
            release_date: String::new(),
            rating: 0.0,
            description: String::new(),
            poster: String::new(),
            backdrop: String::new(),
            logo: String::new(),
            genres: Vec::new(),
            cast: Vec::new(),
            runtime: String::new(),
            quality: "Unknown".to_string(),
            locator,
            provider: None,
            details: MediaDetails::Movie,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.provider.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_record() -> MediaRecord {
        MediaRecord {
            details: MediaDetails::Series(EpisodeDetails {
                season_number: 1,
                episode_number: 2,
                episode_title: "Pilot".to_string(),
                episode_backdrop: String::new(),
                episode_overview: String::new(),
                episode_released: String::new(),
            }),
            provider: Some(MetadataProvider::Tmdb),
            ..MediaRecord::placeholder("Show", "abc".to_string())
        }
    }

    #[test]
    fn test_kind_follows_details() {
        let movie = MediaRecord::placeholder("file.mkv", String::new());
        assert_eq!(movie.kind(), MediaKind::Movie);
        assert!(movie.episode().is_none());
        assert!(movie.is_placeholder());

        let series = series_record();
        assert_eq!(series.kind(), MediaKind::Series);
        assert_eq!(series.episode().map(|e| e.episode_number), Some(2));
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(series_record()).unwrap();
        assert_eq!(value["media_type"], "tv");
        assert_eq!(value["season_number"], 1);
        assert_eq!(value["encoded_string"], "abc");
        assert!(value.get("rate").is_some());
        assert!(value.get("tmdb_id").is_some());

        let movie = serde_json::to_value(MediaRecord::placeholder("x", String::new())).unwrap();
        assert_eq!(movie["media_type"], "movie");
        assert!(movie.get("season_number").is_none());
    }

    #[test]
    fn test_round_trip_keeps_shape() {
        let record = series_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: MediaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MediaKind::Series.to_string(), "tv");
        assert_eq!(MediaKind::Movie.tmdb_path(), "movie");
    }
}
