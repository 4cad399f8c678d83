//! Bulk ingest of many filenames into a record sink
//!
//! Items are resolved concurrently. Unresolved filenames are still stored,
//! with placeholder metadata, so nothing posted is lost. A failure on one
//! item never aborts the batch.

use anyhow::{Result, ensure};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use super::metadata::{MediaDetails, MediaKind, MediaRecord};
use super::resolver::{MetadataResolver, ResolveContext};

/// One filename to ingest
#[derive(Debug, Clone)]
pub struct IngestItem {
    pub filename: String,
    pub context: ResolveContext,
}

impl IngestItem {
    pub fn new(filename: impl Into<String>, context: ResolveContext) -> Self {
        Self {
            filename: filename.into(),
            context,
        }
    }
}

/// Outcome of a batch, each list in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Resolved movie titles
    pub movies: Vec<String>,
    /// Resolved episodes as "Title S01E02"
    pub series: Vec<String>,
    /// Filenames stored with placeholder metadata
    pub placeholders: Vec<String>,
    /// Filenames the sink rejected
    pub failed: Vec<String>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.movies.len() + self.series.len() + self.placeholders.len() + self.failed.len()
    }

    pub fn resolved(&self) -> usize {
        self.movies.len() + self.series.len()
    }
}

/// Destination for canonical records (the document store)
#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn store(&self, record: MediaRecord) -> Result<()>;
}

enum ItemOutcome {
    Movie(String),
    Episode(String),
    Placeholder(String),
    Failed(String),
}

/// Resolve and store every item, at most `concurrency` at a time
pub async fn ingest_batch(
    resolver: &MetadataResolver,
    sink: &dyn MediaSink,
    items: Vec<IngestItem>,
    concurrency: usize,
) -> IngestReport {
    let total = items.len();
    info!(total, concurrency, "Starting bulk ingest");

    let outcomes: Vec<ItemOutcome> = stream::iter(items)
        .map(|item| ingest_one(resolver, sink, item))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut report = IngestReport::default();
    for outcome in outcomes {
        match outcome {
            ItemOutcome::Movie(label) => report.movies.push(label),
            ItemOutcome::Episode(label) => report.series.push(label),
            ItemOutcome::Placeholder(name) => report.placeholders.push(name),
            ItemOutcome::Failed(name) => report.failed.push(name),
        }
    }

    info!(
        total,
        movies = report.movies.len(),
        series = report.series.len(),
        placeholders = report.placeholders.len(),
        failed = report.failed.len(),
        "Bulk ingest finished"
    );
    report
}

async fn ingest_one(resolver: &MetadataResolver, sink: &dyn MediaSink, item: IngestItem) -> ItemOutcome {
    let record = match resolver.resolve(&item.filename, &item.context).await {
        Some(record) => record,
        None => MediaRecord::placeholder(
            &item.filename,
            resolver.encode_locator(&item.context.source),
        ),
    };

    let outcome = if record.is_placeholder() {
        ItemOutcome::Placeholder(item.filename.clone())
    } else {
        match &record.details {
            MediaDetails::Movie => ItemOutcome::Movie(record.title.clone()),
            MediaDetails::Series(ep) => ItemOutcome::Episode(format!(
                "{} S{:02}E{:02}",
                record.title, ep.season_number, ep.episode_number
            )),
        }
    };

    match sink.store(record).await {
        Ok(()) => outcome,
        Err(e) => {
            warn!(filename = %item.filename, error = %e, "Failed to store record");
            ItemOutcome::Failed(item.filename)
        }
    }
}

/// One stored copy of a title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub quality: String,
    pub locator: String,
}

impl FileEntry {
    fn from_record(record: &MediaRecord) -> Self {
        Self {
            quality: record.quality.clone(),
            locator: record.locator.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogMovie {
    pub record: MediaRecord,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEpisode {
    pub episode_number: u32,
    pub title: String,
    pub overview: String,
    pub backdrop: String,
    pub released: String,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSeason {
    pub season_number: u32,
    pub episodes: Vec<CatalogEpisode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSeries {
    pub primary_id: Option<String>,
    pub secondary_id: Option<u64>,
    pub title: String,
    pub year: u32,
    pub poster: String,
    pub seasons: Vec<CatalogSeason>,
}

/// Whether two records describe the same title
fn same_title(
    (secondary, primary, title): (Option<u64>, Option<&str>, &str),
    record: &MediaRecord,
) -> bool {
    if let (Some(a), Some(b)) = (secondary, record.secondary_id) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (primary, record.primary_id.as_deref()) {
        return a == b;
    }
    title == record.title
}

fn push_file(files: &mut Vec<FileEntry>, entry: FileEntry) {
    if !files.iter().any(|f| f.locator == entry.locator) {
        files.push(entry);
    }
}

/// In-process document store with upsert/append semantics
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    movies: RwLock<Vec<CatalogMovie>>,
    series: RwLock<Vec<CatalogSeries>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movies(&self) -> Vec<CatalogMovie> {
        self.movies.read().clone()
    }

    pub fn series(&self) -> Vec<CatalogSeries> {
        self.series.read().clone()
    }

    fn upsert_movie(&self, record: MediaRecord) {
        let file = FileEntry::from_record(&record);
        let mut movies = self.movies.write();
        let existing = movies.iter_mut().find(|m| {
            same_title(
                (m.record.secondary_id, m.record.primary_id.as_deref(), &m.record.title),
                &record,
            )
        });

        match existing {
            Some(movie) => push_file(&mut movie.files, file),
            None => movies.push(CatalogMovie {
                record,
                files: vec![file],
            }),
        }
    }

    fn upsert_episode(&self, record: MediaRecord) {
        let MediaDetails::Series(ep) = &record.details else {
            return;
        };
        let file = FileEntry::from_record(&record);
        let mut all_series = self.series.write();

        let index = match all_series.iter().position(|s| {
            same_title((s.secondary_id, s.primary_id.as_deref(), &s.title), &record)
        }) {
            Some(index) => index,
            None => {
                all_series.push(CatalogSeries {
                    primary_id: record.primary_id.clone(),
                    secondary_id: record.secondary_id,
                    title: record.title.clone(),
                    year: record.year,
                    poster: record.poster.clone(),
                    seasons: Vec::new(),
                });
                all_series.len() - 1
            }
        };
        let series = &mut all_series[index];

        let season = match series
            .seasons
            .iter()
            .position(|s| s.season_number == ep.season_number)
        {
            Some(i) => &mut series.seasons[i],
            None => {
                series.seasons.push(CatalogSeason {
                    season_number: ep.season_number,
                    episodes: Vec::new(),
                });
                series.seasons.sort_by_key(|s| s.season_number);
                let i = series
                    .seasons
                    .iter()
                    .position(|s| s.season_number == ep.season_number)
                    .unwrap_or(0);
                &mut series.seasons[i]
            }
        };

        match season
            .episodes
            .iter_mut()
            .find(|e| e.episode_number == ep.episode_number)
        {
            Some(episode) => push_file(&mut episode.files, file),
            None => {
                season.episodes.push(CatalogEpisode {
                    episode_number: ep.episode_number,
                    title: ep.episode_title.clone(),
                    overview: ep.episode_overview.clone(),
                    backdrop: ep.episode_backdrop.clone(),
                    released: ep.episode_released.clone(),
                    files: vec![file],
                });
                season.episodes.sort_by_key(|e| e.episode_number);
            }
        }
    }
}

#[async_trait]
impl MediaSink for MemoryCatalog {
    async fn store(&self, record: MediaRecord) -> Result<()> {
        ensure!(!record.title.trim().is_empty(), "record has no title");

        match record.kind() {
            MediaKind::Movie => self.upsert_movie(record),
            MediaKind::Series => self.upsert_episode(record),
        }
        Ok(())
    }
}
