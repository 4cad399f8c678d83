//! Explicit provider identifiers embedded in free text
//!
//! Users paste IMDb ids ("tt0111161") or TMDB links
//! ("https://www.themoviedb.org/tv/1399-game-of-thrones") next to a file so
//! resolution can skip title search entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static IMDB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(tt\d+)").expect("valid regex"));

static TMDB_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(movie|tv)/(\d+)").expect("valid regex"));

/// An identifier that names a record on one provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalIdentifier {
    /// IMDb-style id, e.g. "tt1375666"
    Imdb(String),
    /// TMDB numeric id
    Tmdb(u64),
}

impl ExternalIdentifier {
    pub fn imdb_id(&self) -> Option<&str> {
        match self {
            Self::Imdb(id) => Some(id),
            Self::Tmdb(_) => None,
        }
    }

    pub fn tmdb_id(&self) -> Option<u64> {
        match self {
            Self::Tmdb(id) => Some(*id),
            Self::Imdb(_) => None,
        }
    }
}

/// Extract the first identifier found in `text`.
///
/// The IMDb pattern is tried before the TMDB path pattern; only one is returned.
pub fn extract_identifier(text: &str) -> Option<ExternalIdentifier> {
    if let Some(caps) = IMDB_ID_RE.captures(text) {
        return caps.get(1).map(|m| ExternalIdentifier::Imdb(m.as_str().to_string()));
    }

    TMDB_PATH_RE
        .captures(text)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
        .map(ExternalIdentifier::Tmdb)
}

/// Auxiliary text wins over the filename
pub fn extract_from_sources(auxiliary: Option<&str>, filename: &str) -> Option<ExternalIdentifier> {
    auxiliary
        .and_then(extract_identifier)
        .or_else(|| extract_identifier(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imdb_id() {
        assert_eq!(
            extract_identifier("https://www.imdb.com/title/tt1375666/"),
            Some(ExternalIdentifier::Imdb("tt1375666".to_string()))
        );
    }

    #[test]
    fn test_tmdb_urls() {
        assert_eq!(
            extract_identifier("https://www.themoviedb.org/movie/27205-inception"),
            Some(ExternalIdentifier::Tmdb(27205))
        );
        assert_eq!(
            extract_identifier("https://www.themoviedb.org/tv/1399"),
            Some(ExternalIdentifier::Tmdb(1399))
        );
    }

    #[test]
    fn test_imdb_wins_over_tmdb() {
        let text = "https://www.themoviedb.org/movie/27205 tt1375666";
        assert_eq!(
            extract_identifier(text),
            Some(ExternalIdentifier::Imdb("tt1375666".to_string()))
        );
    }

    #[test]
    fn test_no_identifier() {
        assert_eq!(extract_identifier("Movie.Title.2021.1080p"), None);
        assert_eq!(extract_identifier(""), None);
    }

    #[test]
    fn test_auxiliary_text_first() {
        let found = extract_from_sources(Some("/tv/1399"), "Movie.tt0000001.1080p");
        assert_eq!(found, Some(ExternalIdentifier::Tmdb(1399)));

        let found = extract_from_sources(Some("no ids here"), "Movie.tt0000001.1080p");
        assert_eq!(found, Some(ExternalIdentifier::Imdb("tt0000001".to_string())));
    }
}
