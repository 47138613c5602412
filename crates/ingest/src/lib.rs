//! Snapshot ingestion for the usage statistics engine.
//!
//! - Interner (dimension string -> surrogate id, cached per run)
//! - Engine (per instance/month upsert and dedup)
//! - Normalizer (gzip NDJSON daily files -> snapshots)
//! - Importer (directory walk, one transaction per file, registry)

pub mod engine;
pub mod importer;
pub mod interner;
pub mod normalizer;

pub use engine::{IngestOutcome, IngestionEngine};
pub use importer::{FileOutcome, FileSummary, ImportSummary, Importer};
pub use interner::Interner;
pub use normalizer::{decode_daily_file, decode_snapshots, DecodedFile};
