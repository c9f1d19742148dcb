//! Streaming history loading.
//!
//! - Normalizer: one decoded file to streaming events (basic or extended schema)
//! - Merger: per-file outcomes to one dataset plus a load report
//! - Pipeline: directory listing and concurrent per-file loading

pub mod merger;
pub mod normalizer;
pub mod pipeline;

pub use merger::{merge, FileOutcome, LoadedFile, MergeReport, SkippedFile};
pub use normalizer::{normalize_records, NormalizedBatch, SchemaVariant, SkippedRecord};
pub use pipeline::*;
