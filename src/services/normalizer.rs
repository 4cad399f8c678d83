//! Normalization of provider payloads into [`MediaRecord`]s
//!
//! Artwork URLs, dates, genres and free text are all canonicalized here, so
//! the rest of the pipeline never looks at a provider schema.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;

use super::filename_parser::ParsedFilename;
use super::imdb::{ImdbEpisode, ImdbTitle};
use super::metadata::{EpisodeDetails, MediaDetails, MediaRecord};
use super::providers::ProviderRecord;
use super::tmdb::{self, TmdbEpisode, TmdbMovieDetails, TmdbTvDetails};
use super::translation::TranslationService;

const METAHUB_BASE_URL: &str = "https://images.metahub.space";

/// Genre labels in the target language
static GENRE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("action", "Aksiyon"),
        ("film-noir", "Kara Film"),
        ("game-show", "Oyun Gösterisi"),
        ("short", "Kısa"),
        ("sci-fi", "Bilim Kurgu"),
        ("sport", "Spor"),
        ("adventure", "Macera"),
        ("animation", "Animasyon"),
        ("biography", "Biyografi"),
        ("comedy", "Komedi"),
        ("crime", "Suç"),
        ("documentary", "Belgesel"),
        ("drama", "Dram"),
        ("family", "Aile"),
        ("news", "Haberler"),
        ("fantasy", "Fantastik"),
        ("history", "Tarih"),
        ("horror", "Korku"),
        ("music", "Müzik"),
        ("musical", "Müzikal"),
        ("mystery", "Gizem"),
        ("romance", "Romantik"),
        ("science fiction", "Bilim Kurgu"),
        ("tv movie", "TV Filmi"),
        ("thriller", "Gerilim"),
        ("war", "Savaş"),
        ("western", "Vahşi Batı"),
        ("action & adventure", "Aksiyon ve Macera"),
        ("kids", "Çocuklar"),
        ("reality", "Gerçeklik"),
        ("reality-tv", "Gerçeklik"),
        ("sci-fi & fantasy", "Bilim Kurgu ve Fantazi"),
        ("soap", "Pembe Dizi"),
        ("war & politics", "Savaş ve Politika"),
        ("bilim-kurgu", "Bilim Kurgu"),
        ("aksiyon & macera", "Aksiyon ve Macera"),
        ("savaş & politik", "Savaş ve Politika"),
        ("bilim kurgu & fantazi", "Bilim Kurgu ve Fantazi"),
        ("talk", "Talk-Show"),
    ])
});

/// Map one genre label through the alias table; unknown labels pass through
pub fn localize_genre(label: &str) -> String {
    let normalized = label.to_lowercase().replace(['-', '_'], " ");
    let raw = label.trim().to_lowercase();

    GENRE_ALIASES
        .get(normalized.trim())
        .or_else(|| GENRE_ALIASES.get(raw.as_str()))
        .map(|g| g.to_string())
        .unwrap_or_else(|| label.to_string())
}

pub fn localize_genres<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels.iter().map(|g| localize_genre(g.as_ref())).collect()
}

/// Artwork URLs derived from an IMDb id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImdbImages {
    pub poster: String,
    pub backdrop: String,
    pub logo: String,
}

pub fn imdb_images(imdb_id: &str) -> ImdbImages {
    if imdb_id.is_empty() {
        return ImdbImages::default();
    }
    ImdbImages {
        poster: format!("{}/poster/small/{}/img", METAHUB_BASE_URL, imdb_id),
        backdrop: format!("{}/background/medium/{}/img", METAHUB_BASE_URL, imdb_id),
        logo: format!("{}/logo/medium/{}/img", METAHUB_BASE_URL, imdb_id),
    }
}

/// Calendar date of an ISO-ish date or datetime; the offset is ignored
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Canonical `YYYY-MM-DDT11:00:00Z`; unparseable input gives an empty string
pub fn to_iso_datetime(value: Option<&str>) -> String {
    value
        .and_then(parse_date)
        .map(|d| format!("{}T11:00:00Z", d.format("%Y-%m-%d")))
        .unwrap_or_default()
}

fn year_of(value: Option<&str>) -> u32 {
    value
        .and_then(parse_date)
        .and_then(|d| u32::try_from(d.year()).ok())
        .unwrap_or(0)
}

/// Builds canonical records; translation is the only I/O
#[derive(Clone)]
pub struct Normalizer {
    translator: TranslationService,
}

impl Normalizer {
    pub fn new(translator: TranslationService) -> Self {
        Self { translator }
    }

    pub async fn normalize(
        &self,
        record: &ProviderRecord,
        hints: &ParsedFilename,
        locator: String,
    ) -> MediaRecord {
        let provider = Some(record.provider());
        let mut normalized = match record {
            ProviderRecord::ImdbMovie { imdb_id, title } => {
                self.imdb_common(imdb_id, title, hints, MediaDetails::Movie).await
            }
            ProviderRecord::ImdbEpisode {
                imdb_id,
                series,
                episode,
                season_number,
                episode_number,
            } => {
                let details = self
                    .imdb_episode(episode, *season_number, *episode_number)
                    .await;
                self.imdb_common(imdb_id, series, hints, details).await
            }
            ProviderRecord::TmdbMovie(movie) => self.tmdb_movie(movie, hints).await,
            ProviderRecord::TmdbEpisode {
                series,
                episode,
                season_number,
                episode_number,
            } => {
                let details = self
                    .tmdb_episode(episode, *season_number, *episode_number)
                    .await;
                self.tmdb_series(series, hints, details).await
            }
        };
        normalized.locator = locator;
        normalized.provider = provider;
        normalized
    }

    async fn imdb_common(
        &self,
        imdb_id: &str,
        title: &ImdbTitle,
        hints: &ParsedFilename,
        details: MediaDetails,
    ) -> MediaRecord {
        let images = imdb_images(imdb_id);
        MediaRecord {
            primary_id: Some(imdb_id.to_string()),
            secondary_id: title.tmdb_id(),
            title: title
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| hints.title.clone()),
            year: title.year().unwrap_or(0),
            release_date: to_iso_datetime(title.release_date()),
            rating: title.star_rating().unwrap_or(0.0),
            description: self.translator.translate_opt(title.plot.as_deref()).await,
            poster: images.poster,
            backdrop: images.backdrop,
            logo: images.logo,
            genres: localize_genres(&title.genre),
            cast: title.cast.clone(),
            runtime: title.runtime_text(),
            quality: hints.quality.clone(),
            locator: String::new(),
            provider: None,
            details,
        }
    }

    async fn imdb_episode(&self, episode: &ImdbEpisode, season: u32, number: u32) -> MediaDetails {
        MediaDetails::Series(EpisodeDetails {
            season_number: season,
            episode_number: number,
            episode_title: self.translator.translate_opt(episode.title.as_deref()).await,
            episode_backdrop: episode.image.clone().unwrap_or_default(),
            episode_overview: self.translator.translate_opt(episode.plot.as_deref()).await,
            episode_released: to_iso_datetime(episode.released_text().as_deref()),
        })
    }

    async fn tmdb_movie(&self, movie: &TmdbMovieDetails, hints: &ParsedFilename) -> MediaRecord {
        MediaRecord {
            primary_id: movie.imdb_id(),
            secondary_id: Some(movie.id),
            title: movie.title.clone(),
            year: year_of(movie.release_date.as_deref()),
            release_date: to_iso_datetime(movie.release_date.as_deref()),
            rating: movie.vote_average.unwrap_or(0.0),
            description: self.translator.translate_opt(movie.overview.as_deref()).await,
            poster: tmdb::image_url(movie.poster_path.as_deref(), "w500"),
            backdrop: tmdb::image_url(movie.backdrop_path.as_deref(), "original"),
            logo: tmdb::logo_url(movie.images.as_ref()),
            genres: localize_genres(&movie.genres.iter().map(|g| g.name.as_str()).collect::<Vec<_>>()),
            cast: movie
                .credits
                .as_ref()
                .map(|c| c.cast_names())
                .unwrap_or_default(),
            runtime: match movie.runtime {
                Some(minutes) if minutes > 0 => format!("{} min", minutes),
                _ => String::new(),
            },
            quality: hints.quality.clone(),
            locator: String::new(),
            provider: None,
            details: MediaDetails::Movie,
        }
    }

    async fn tmdb_series(
        &self,
        series: &TmdbTvDetails,
        hints: &ParsedFilename,
        details: MediaDetails,
    ) -> MediaRecord {
        MediaRecord {
            primary_id: series.imdb_id(),
            secondary_id: Some(series.id),
            title: series.name.clone(),
            year: year_of(series.first_air_date.as_deref()),
            release_date: to_iso_datetime(series.first_air_date.as_deref()),
            rating: series.vote_average.unwrap_or(0.0),
            description: self.translator.translate_opt(series.overview.as_deref()).await,
            poster: tmdb::image_url(series.poster_path.as_deref(), "w500"),
            backdrop: tmdb::image_url(series.backdrop_path.as_deref(), "original"),
            logo: tmdb::logo_url(series.images.as_ref()),
            genres: localize_genres(&series.genres.iter().map(|g| g.name.as_str()).collect::<Vec<_>>()),
            cast: series
                .credits
                .as_ref()
                .map(|c| c.cast_names())
                .unwrap_or_default(),
            runtime: String::new(),
            quality: hints.quality.clone(),
            locator: String::new(),
            provider: None,
            details,
        }
    }

    async fn tmdb_episode(&self, episode: &TmdbEpisode, season: u32, number: u32) -> MediaDetails {
        MediaDetails::Series(EpisodeDetails {
            season_number: season,
            episode_number: number,
            episode_title: self.translator.translate_opt(episode.name.as_deref()).await,
            episode_backdrop: tmdb::image_url(episode.still_path.as_deref(), "original"),
            episode_overview: self.translator.translate_opt(episode.overview.as_deref()).await,
            episode_released: to_iso_datetime(episode.air_date.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::ResolverCache;
    use crate::services::metadata::{MediaKind, MetadataProvider};
    use crate::services::tmdb::{TmdbGenre, TmdbImage, TmdbImages};
    use crate::services::translation::IdentityTranslator;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn normalizer() -> Normalizer {
        Normalizer::new(TranslationService::new(
            Arc::new(IdentityTranslator),
            &ResolverCache::new(),
        ))
    }

    fn hints(season: Option<u32>, episode: Option<u32>) -> ParsedFilename {
        ParsedFilename {
            title: "Parsed Title".to_string(),
            season,
            episode,
            year: None,
            quality: "1080p".to_string(),
        }
    }

    #[test]
    fn test_genre_aliases() {
        assert_eq!(localize_genre("Action"), "Aksiyon");
        assert_eq!(localize_genre("Sci-Fi"), "Bilim Kurgu");
        assert_eq!(localize_genre("Science Fiction"), "Bilim Kurgu");
        assert_eq!(localize_genre("Reality-TV"), "Gerçeklik");
        assert_eq!(localize_genre("Sci-Fi & Fantasy"), "Bilim Kurgu ve Fantazi");
        assert_eq!(localize_genre("Anime"), "Anime");
    }

    #[test]
    fn test_iso_datetime() {
        assert_eq!(to_iso_datetime(Some("2010-07-16")), "2010-07-16T11:00:00Z");
        assert_eq!(
            to_iso_datetime(Some("2010-07-16T00:00:00.000Z")),
            "2010-07-16T11:00:00Z"
        );
        assert_eq!(
            to_iso_datetime(Some("2010-07-16T23:30:00+03:00")),
            "2010-07-16T11:00:00Z"
        );
        assert_eq!(to_iso_datetime(Some("2010-07-16 08:00:00")), "2010-07-16T11:00:00Z");
        assert_eq!(to_iso_datetime(Some("July 2010")), "");
        assert_eq!(to_iso_datetime(None), "");

        let once = to_iso_datetime(Some("2001-02-03"));
        assert_eq!(to_iso_datetime(Some(&once)), once);
    }

    #[test]
    fn test_imdb_images() {
        let images = imdb_images("tt1375666");
        assert_eq!(
            images.poster,
            "https://images.metahub.space/poster/small/tt1375666/img"
        );
        assert_eq!(
            images.backdrop,
            "https://images.metahub.space/background/medium/tt1375666/img"
        );
        assert_eq!(imdb_images(""), ImdbImages::default());
    }

    #[tokio::test]
    async fn test_tmdb_movie_record() {
        let movie = TmdbMovieDetails {
            id: 27205,
            title: "Inception".to_string(),
            overview: Some("A thief".to_string()),
            release_date: Some("2010-07-15".to_string()),
            runtime: Some(148),
            poster_path: Some("/p.jpg".to_string()),
            backdrop_path: Some("/b.jpg".to_string()),
            vote_average: None,
            imdb_id: Some("tt1375666".to_string()),
            genres: vec![TmdbGenre {
                id: 28,
                name: "Action".to_string(),
            }],
            external_ids: None,
            credits: None,
            images: Some(TmdbImages {
                logos: vec![TmdbImage {
                    file_path: Some("/l.png".to_string()),
                    iso_639_1: Some("en".to_string()),
                }],
                ..Default::default()
            }),
        };
        let record = normalizer()
            .normalize(
                &ProviderRecord::TmdbMovie(Arc::new(movie)),
                &hints(None, None),
                "loc".to_string(),
            )
            .await;

        assert_eq!(record.kind(), MediaKind::Movie);
        assert_eq!(record.provider, Some(MetadataProvider::Tmdb));
        assert_eq!(record.year, 2010);
        assert_eq!(record.release_date, "2010-07-15T11:00:00Z");
        assert_eq!(record.rating, 0.0);
        assert_eq!(record.runtime, "148 min");
        assert_eq!(record.poster, "https://image.tmdb.org/t/p/w500/p.jpg");
        assert_eq!(record.backdrop, "https://image.tmdb.org/t/p/original/b.jpg");
        assert_eq!(record.logo, "https://image.tmdb.org/t/p/w300/l.png");
        assert_eq!(record.genres, vec!["Aksiyon"]);
        assert_eq!(record.primary_id.as_deref(), Some("tt1375666"));
        assert_eq!(record.locator, "loc");
    }

    #[tokio::test]
    async fn test_imdb_episode_record_falls_back_to_parsed_title() {
        let record = ProviderRecord::ImdbEpisode {
            imdb_id: "tt0903747".to_string(),
            series: ImdbTitle {
                runtime: Some(serde_json::json!("47m")),
                ..Default::default()
            },
            episode: ImdbEpisode {
                title: Some("Pilot".to_string()),
                image: Some("https://img/ep.jpg".to_string()),
                ..Default::default()
            },
            season_number: 1,
            episode_number: 1,
        };
        let normalized = normalizer()
            .normalize(&record, &hints(Some(1), Some(1)), String::new())
            .await;

        assert_eq!(normalized.title, "Parsed Title");
        assert_eq!(normalized.runtime, "47m");
        assert_eq!(normalized.year, 0);
        let episode = normalized.episode().unwrap();
        assert_eq!(episode.episode_title, "Pilot");
        assert_eq!(episode.episode_backdrop, "https://img/ep.jpg");
        assert_eq!(episode.episode_released, "");
    }
}
