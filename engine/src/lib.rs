//! # Playlog - streaming history analytics
//!
//! Playlog loads the JSON files of a music streaming account data export
//! (streaming history, playlists, liked tracks) and answers ranking and
//! time-distribution questions over them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ History dir │────▶│   Parser    │────▶│  Normalize  │────▶│   Merge     │
//! │ (*.json)    │     │ (auto-enc)  │     │ basic/ext.  │     │ (file order)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    ▼
//!        ┌─────────────┐     ┌─────────────┐                  ┌─────────────┐
//!        │  Playlists  │     │   Library   │─── correlate ───▶│ Aggregation │
//!        │ resolve/CSV │     │ stats/browse│                  │   Engine    │
//!        └─────────────┘     └─────────────┘                  └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use playlog::{load_history, AggregationEngine, AggregationKey, AnalysisConfig, Metric};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::from_env()?;
//!     let report = load_history(&config).await?;
//!     let engine = AggregationEngine::from_config(&config)?;
//!     let top =
//!         engine.group_and_rank(&report.dataset, AggregationKey::Artist, Metric::PlayCount, 10);
//!     for group in top {
//!         println!("{:>6}  {}", group.total, group.key);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (StreamingEvent, Playlist, LibraryEntry)
//! - [`config`] - Session configuration from `.env` and `PLAYLOG_*`
//! - [`logs`] - Progress logging with subscribers
//! - [`parser`] - JSON decoding with encoding auto-detection
//! - [`transform`] - Normalization, merging and the load pipeline
//! - [`aggregate`] - Grouping, ranking, distributions and summaries
//! - [`playlists`] - Playlist loading, resolution and CSV export
//! - [`library`] - Liked tracks and history correlation
//! - [`validation`] - JSON Schema validation of exports

// Core modules
pub mod error;
pub mod models;

// Ambient
pub mod config;
pub mod logs;

// Parsing
pub mod parser;

// Loading
pub mod transform;

// Queries
pub mod aggregate;

// Account data
pub mod library;
pub mod playlists;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, DecodeError, ExportError, LoadError, NormalizeError, PipelineError, QueryError,
    ResolveError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AggregationKey, CorrelationResult, DayType, GroupKey, LibraryCollection, LibraryEntry,
    MediaItem, Metric, NormalizedDataset, Playlist, PlaylistItem, RankedGroup, StreamingEvent,
};

// =============================================================================
// Re-exports - Configuration & Logging
// =============================================================================

pub use config::AnalysisConfig;
pub use logs::{
    log_error, log_info, log_success, log_warning, LogEntry, LogLevel, LOG_BROADCASTER,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, parse_bytes_auto, parse_file_auto, ParsedDocument,
};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use transform::{
    load_history, load_history_dir, load_history_files, merge, normalize_records, MergeReport,
    SchemaVariant,
};

// =============================================================================
// Re-exports - Aggregation
// =============================================================================

pub use aggregate::{
    AggregationEngine, ArtistDepth, CumulativePoint, DailyTotals, Heatmap, ListeningSummary,
    SkipSummary, UniqueRatio, WeekSplit,
};

// =============================================================================
// Re-exports - Playlists & Library
// =============================================================================

pub use playlists::{
    export_playlist, list_playlists, load_playlists, playlist_stats, resolve, write_playlist_csv,
    PlaylistRow, PlaylistStats, PlaylistSummary,
};

pub use library::{browse, correlate, library_stats, load_library, CorrelationReport, LibraryStats};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{validate, validate_library_export, validate_playlist_export};
