//! Media Resolver - turns release-style filenames into canonical media records
//!
//! The pipeline parses a filename into hints, looks for an explicit provider
//! identifier, queries the primary (IMDb-style) provider and falls back to the
//! secondary (TMDB) provider, then normalizes whichever answered into a single
//! [`MediaRecord`](services::MediaRecord) shape.
//!
//! Entry point: [`MetadataResolver::resolve`](services::MetadataResolver::resolve).

pub mod config;
pub mod services;

pub use config::ResolverConfig;
pub use services::{
    IngestItem, IngestReport, MediaDetails, MediaKind, MediaRecord, MetadataResolver,
    ResolveContext, SourceRef,
};
