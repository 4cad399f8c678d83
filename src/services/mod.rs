//! Metadata resolution services

pub mod cache;
pub mod filename_parser;
pub mod gate;
pub mod identifier;
pub mod imdb;
pub mod ingest;
pub mod locator;
pub mod logging;
pub mod metadata;
pub mod normalizer;
pub mod providers;
pub mod rate_limiter;
pub mod resolver;
pub mod tmdb;
pub mod translation;

pub use cache::ResolverCache;
pub use filename_parser::{ParseFailure, ParsedFilename, parse_filename};
pub use gate::ConcurrencyGate;
pub use identifier::{ExternalIdentifier, extract_identifier};
pub use imdb::ImdbClient;
pub use ingest::{IngestItem, IngestReport, MediaSink, MemoryCatalog, ingest_batch};
pub use locator::{Base64LocatorEncoder, LocatorEncoder, SourceRef};
pub use logging::init_tracing;
pub use metadata::{EpisodeDetails, MediaDetails, MediaKind, MediaRecord, MetadataProvider};
pub use normalizer::Normalizer;
pub use providers::{
    PrimaryAdapter, PrimaryApi, ProviderError, ProviderOutcome, ProviderRecord, SecondaryAdapter,
    SecondaryApi,
};
pub use rate_limiter::RateLimitedClient;
pub use resolver::{MetadataResolver, ResolveContext};
pub use tmdb::TmdbClient;
pub use translation::{
    GoogleTranslator, IdentityTranslator, TranslationError, TranslationService, Translator,
};
