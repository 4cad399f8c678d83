//! Process-lifetime lookup caches
//!
//! Four independent read-through maps: IMDb title search, TMDB title search,
//! TMDB detail fetches and translated strings. Entries never expire. Concurrent
//! misses on one key may both hit the network; the later write simply
//! overwrites an equivalent value.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use super::metadata::MediaKind;
use super::tmdb::{TmdbEpisode, TmdbMovieDetails, TmdbSearchHit, TmdbTvDetails};

/// Simple memoization map without expiry
pub struct MemoCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> MemoCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a cached value
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    /// Store a value, replacing any previous one
    pub fn set(&self, key: K, value: V) {
        self.entries.write().insert(key, value);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<K: Eq + Hash, V: Clone> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Key for IMDb title searches
pub type ImdbSearchKey = (MediaKind, String);

/// Key for TMDB title searches (year only narrows movie searches)
pub type TmdbSearchKey = (MediaKind, String, Option<u32>);

/// Key for TMDB detail fetches, separated by kind so ids never alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TmdbDetailKey {
    Movie(u64),
    Series(u64),
    Episode { series_id: u64, season: u32, episode: u32 },
}

/// A cached TMDB detail payload
#[derive(Debug, Clone)]
pub enum TmdbDetails {
    Movie(Arc<TmdbMovieDetails>),
    Series(Arc<TmdbTvDetails>),
    Episode(Arc<TmdbEpisode>),
}

/// All caches used by one resolver; cloned handles share the same maps
#[derive(Clone, Default)]
pub struct ResolverCache {
    /// `None` records a search that succeeded without a match
    pub imdb_search: Arc<MemoCache<ImdbSearchKey, Option<String>>>,
    pub tmdb_search: Arc<MemoCache<TmdbSearchKey, Option<TmdbSearchHit>>>,
    pub tmdb_details: Arc<MemoCache<TmdbDetailKey, TmdbDetails>>,
    pub translations: Arc<MemoCache<String, String>>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry. Only meant for explicit resets; nothing expires on its own.
    pub fn clear(&self) {
        self.imdb_search.clear();
        self.tmdb_search.clear();
        self.tmdb_details.clear();
        self.translations.clear();
    }
}
