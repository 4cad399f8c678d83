//! Filename parser for scene-style release names
//!
//! Parses filenames like:
//! - "Movie.Title.2021.1080p.x264-GROUP"
//! - "Show.Name.S01E02.720p"
//! - "Corner Gas S06E12 Super Sensitive 1080p AMZN WEB-DL DDP2 0 H 264-QOQ"
//!
//! The title is everything in front of the first release token (year,
//! episode marker, resolution, source, codec). Words that are also common in
//! titles ("Web", "Dual", "Proper") never end the title. Resolution doubles
//! as the quality tag and is mandatory.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::metadata::MediaKind;

/// Structured hints extracted from a filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFilename {
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub year: Option<u32>,
    /// Resolution tag, e.g. "1080p"
    pub quality: String,
}

impl ParsedFilename {
    /// Episodic when a season (and therefore an episode) was found
    pub fn media_kind(&self) -> MediaKind {
        if self.season.is_some() {
            MediaKind::Series
        } else {
            MediaKind::Movie
        }
    }

    /// Season and episode as a pair, only for episodic names
    pub fn episode_numbers(&self) -> Option<(u32, u32)> {
        self.season.zip(self.episode)
    }
}

/// Why a filename cannot be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("no title found in filename")]
    MissingTitle,
    #[error("no quality tag found in filename")]
    MissingQuality,
    #[error("season {0} has no episode number")]
    SeasonWithoutEpisode(u32),
}

static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mkv|mp4|avi|m4v|ts|webm|mov|wmv|mpg|mpeg|flv)$").expect("valid regex")
});

static LEADING_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[\[\(][^\]\)]*[\]\)]\s*").expect("valid regex"));

static SXXEXX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2})\s?E(\d{1,3})\b").expect("valid regex")
});

static NXNN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").expect("valid regex"));

static VERBOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bSeason\s*(\d{1,2})\s*Episode\s*(\d{1,3})\b").expect("valid regex")
});

static SEASON_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})\b").expect("valid regex"));

static SEASON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSeason\s*(\d{1,2})\b").expect("valid regex"));

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("valid regex"));

static RESOLUTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(2160p|1440p|1080p|1080i|720p|576p|480p|360p|4K|UHD)\b")
        .expect("valid regex")
});

static RELEASE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(BluRay|Blu-Ray|BDRip|BRRip|WEB-?DL|WEBRip|HDTV|DVDRip|HDRip|REMUX|x264|x265|h\s?264|h\s?265|HEVC|AV1|XviD)\b",
    )
    .expect("valid regex")
});

/// Parse a filename into resolution hints
pub fn parse_filename(filename: &str) -> Result<ParsedFilename, ParseFailure> {
    let stem = EXTENSION_RE.replace(filename.trim(), "");
    let cleaned = stem.replace(['.', '_'], " ");
    let cleaned = LEADING_GROUP_RE.replace(&cleaned, "").to_string();

    // Earliest token position marks the end of the title
    let mut title_end = cleaned.len();

    let (season, episode, episode_start) = find_episode(&cleaned);
    if let Some(start) = episode_start {
        title_end = title_end.min(start);
    }

    let resolution = RESOLUTION_RE.find(&cleaned);
    if let Some(m) = resolution {
        title_end = title_end.min(m.start());
    }

    if let Some(m) = RELEASE_TOKEN_RE.find(&cleaned) {
        title_end = title_end.min(m.start());
    }

    let year_match = find_year(&cleaned, title_end);
    if let Some((start, _)) = year_match {
        title_end = title_end.min(start);
    }

    let title = clean_title(&cleaned[..title_end]);
    let quality = resolution.map(|m| normalize_resolution(m.as_str()));

    debug!(
        filename = filename,
        title = %title,
        season = ?season,
        episode = ?episode,
        year = ?year_match.map(|(_, y)| y),
        quality = ?quality,
        "Parsed filename"
    );

    if title.is_empty() {
        return Err(ParseFailure::MissingTitle);
    }
    let Some(quality) = quality else {
        return Err(ParseFailure::MissingQuality);
    };
    if let (Some(season), None) = (season, episode) {
        return Err(ParseFailure::SeasonWithoutEpisode(season));
    }

    Ok(ParsedFilename {
        title,
        season,
        episode,
        year: year_match.map(|(_, y)| y),
        quality,
    })
}

/// Find season/episode markers, returning the start of the first one
fn find_episode(cleaned: &str) -> (Option<u32>, Option<u32>, Option<usize>) {
    for re in [&*SXXEXX_RE, &*VERBOSE_RE, &*NXNN_RE] {
        if let Some(caps) = re.captures(cleaned) {
            let start = caps.get(0).map(|m| m.start());
            let season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            return (season, episode, start);
        }
    }

    // Season pack without an episode number. "Season N" only counts when
    // release tokens follow it; "Open Season 2 2008" is a title.
    let season_pack = SEASON_CODE_RE.captures(cleaned).or_else(|| {
        SEASON_WORD_RE
            .captures(cleaned)
            .filter(|caps| caps.get(0).is_some_and(|m| is_release_tail(&cleaned[m.end()..])))
    });
    if let Some(caps) = season_pack {
        let start = caps.get(0).map(|m| m.start());
        let season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        return (season, None, start);
    }

    (None, None, None)
}

/// Whether `rest` is empty or opens with a resolution or release token
fn is_release_tail(rest: &str) -> bool {
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '-');
    rest.is_empty()
        || RESOLUTION_RE.find(rest).is_some_and(|m| m.start() == 0)
        || RELEASE_TOKEN_RE.find(rest).is_some_and(|m| m.start() == 0)
}

/// Pick the release year: the last year in front of the other tokens.
///
/// A year at the very start belongs to the title ("2012.2009.1080p").
fn find_year(cleaned: &str, limit: usize) -> Option<(usize, u32)> {
    let candidates: Vec<(usize, u32)> = YEAR_RE
        .captures_iter(cleaned)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            let year = m.as_str().parse().ok()?;
            Some((m.start(), year))
        })
        .filter(|(start, _)| !cleaned[..*start].trim().is_empty())
        .collect();

    candidates
        .iter()
        .rev()
        .find(|(start, _)| *start <= limit)
        .or_else(|| candidates.first())
        .copied()
}

fn normalize_resolution(raw: &str) -> String {
    match raw.to_uppercase().as_str() {
        "4K" | "UHD" => "2160p".to_string(),
        other => other.to_lowercase(),
    }
}

/// Clean up the title part of the name
fn clean_title(raw: &str) -> String {
    static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

    let collapsed = SPACE_RE.replace_all(raw, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '(' | '[' | '{' | '+'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_movie() {
        let parsed = parse_filename("Movie.Title.2021.1080p.x264-GROUP").unwrap();
        assert_eq!(parsed.title, "Movie Title");
        assert_eq!(parsed.year, Some(2021));
        assert_eq!(parsed.quality, "1080p");
        assert_eq!(parsed.season, None);
        assert_eq!(parsed.media_kind(), MediaKind::Movie);
    }

    #[test]
    fn test_parse_sxxexx() {
        let parsed = parse_filename("Show.Name.S01E02.720p").unwrap();
        assert_eq!(parsed.title, "Show Name");
        assert_eq!(parsed.episode_numbers(), Some((1, 2)));
        assert_eq!(parsed.quality, "720p");
        assert_eq!(parsed.media_kind(), MediaKind::Series);
    }

    #[test]
    fn test_parse_spaced_release() {
        let parsed =
            parse_filename("Corner Gas S06E12 Super Sensitive 1080p AMZN WEB-DL DDP2 0 H 264-QOQ")
                .unwrap();
        assert_eq!(parsed.title, "Corner Gas");
        assert_eq!(parsed.episode_numbers(), Some((6, 12)));
        assert_eq!(parsed.quality, "1080p");
    }

    #[test]
    fn test_title_year_and_release_year() {
        let parsed = parse_filename("Blade.Runner.2049.2017.2160p.UHD.BluRay.x265.mkv").unwrap();
        assert_eq!(parsed.title, "Blade Runner 2049");
        assert_eq!(parsed.year, Some(2017));
        assert_eq!(parsed.quality, "2160p");
    }

    #[test]
    fn test_leading_year_is_title() {
        let parsed = parse_filename("2012.2009.720p.BluRay.x264").unwrap();
        assert_eq!(parsed.title, "2012");
        assert_eq!(parsed.year, Some(2009));
    }

    #[test]
    fn test_alternate_episode_formats() {
        let parsed = parse_filename("Some Show 2x05 480p").unwrap();
        assert_eq!(parsed.episode_numbers(), Some((2, 5)));

        let parsed = parse_filename("Some Show Season 3 Episode 7 1080p WEB").unwrap();
        assert_eq!(parsed.title, "Some Show");
        assert_eq!(parsed.episode_numbers(), Some((3, 7)));
    }

    #[test]
    fn test_4k_maps_to_2160p() {
        let parsed = parse_filename("Movie (2020) 4K HDR").unwrap();
        assert_eq!(parsed.title, "Movie");
        assert_eq!(parsed.quality, "2160p");
    }

    #[test]
    fn test_missing_quality() {
        assert_matches!(parse_filename("Random.File.mkv"), Err(ParseFailure::MissingQuality));
    }

    #[test]
    fn test_missing_title() {
        assert_matches!(parse_filename("1080p.x264.mkv"), Err(ParseFailure::MissingTitle));
    }

    #[test]
    fn test_season_without_episode() {
        assert_matches!(
            parse_filename("Show.Name.S02.1080p.WEB-DL"),
            Err(ParseFailure::SeasonWithoutEpisode(2))
        );
        assert_matches!(
            parse_filename("Show Name Season 2 1080p WEB-DL"),
            Err(ParseFailure::SeasonWithoutEpisode(2))
        );
    }

    #[test]
    fn test_title_words_that_look_like_release_tags() {
        let cases = [
            ("Dual.2022.1080p.WEB-DL.x264", "Dual", Some(2022)),
            ("Charlottes.Web.2006.1080p.BluRay.x264-GROUP", "Charlottes Web", Some(2006)),
            ("The.Proper.Way.2016.720p.WEB", "The Proper Way", Some(2016)),
            ("NF.Unrated.Extended.1080p", "NF Unrated Extended", None),
        ];
        for (name, title, year) in cases {
            let parsed = parse_filename(name).unwrap();
            assert_eq!(parsed.title, title, "{}", name);
            assert_eq!(parsed.year, year, "{}", name);
            assert_eq!(parsed.media_kind(), MediaKind::Movie, "{}", name);
        }
    }

    #[test]
    fn test_season_word_inside_movie_title() {
        let parsed = parse_filename("Open.Season.2.2008.1080p.BluRay.x264").unwrap();
        assert_eq!(parsed.title, "Open Season 2");
        assert_eq!(parsed.year, Some(2008));
        assert_eq!(parsed.season, None);
        assert_eq!(parsed.media_kind(), MediaKind::Movie);
    }
}
