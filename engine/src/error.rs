//! Error types for the playlog loader and query engine.
//!
//! One error enum per layer:
//!
//! - [`DecodeError`] - reading and decoding raw export bytes
//! - [`NormalizeError`] - streaming history schema detection
//! - [`LoadError`] - loading a whole export file (history, playlists, library)
//! - [`QueryError`] - rejected aggregation requests
//! - [`ResolveError`] - playlist identifier resolution
//! - [`ExportError`] - CSV export of a playlist
//! - [`ConfigError`] - configuration values
//! - [`PipelineError`] - top-level session loading
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while turning raw file bytes into JSON.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be decoded with the detected encoding.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Content is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing but whitespace.
    #[error("File is empty")]
    Empty,
}

// =============================================================================
// Normalization Errors
// =============================================================================

/// Errors while classifying a streaming history file.
///
/// All of these are per-file: the file is skipped and loading continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NormalizeError {
    /// Neither the basic nor the extended variant's fields are present.
    #[error("Unrecognized schema in '{file}' (fields: {})", .fields.join(", "))]
    UnrecognizedSchema { file: String, fields: Vec<String> },

    /// Top-level JSON is not an array of objects.
    #[error("'{file}' is not an array of streaming records")]
    NotAnArray { file: String },

    /// The array holds no records.
    #[error("'{file}' contains no records")]
    EmptyFile { file: String },
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while loading an export file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Decoding error.
    #[error("{file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: DecodeError,
    },

    /// Streaming history classification error.
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Export does not match its JSON Schema.
    #[error("{file} failed schema validation: {}", .errors.join("; "))]
    Schema { file: String, errors: Vec<String> },

    /// JSON matched the schema but not the typed model.
    #[error("{file}: {source}")]
    Shape {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Directory listing failed.
    #[error("Cannot read directory '{dir}': {source}")]
    Directory {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    /// A background normalization task did not complete.
    #[error("Load task for '{file}' failed: {message}")]
    Task { file: String, message: String },
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors from the aggregation engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    /// Unknown key or a metric that is not a numeric field.
    #[error("Invalid aggregation request: {0}")]
    InvalidAggregationRequest(String),
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Errors from playlist identifier resolution.
///
/// Both are recoverable: the caller decides how to ask again.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    /// No playlist matched by index, exact name or substring.
    #[error("Playlist '{identifier}' not found")]
    NotFound { identifier: String },

    /// More than one playlist name contains the identifier.
    #[error("Multiple playlists match '{identifier}': {}", .candidates.join(", "))]
    Ambiguous {
        identifier: String,
        candidates: Vec<String>,
    },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing a playlist as CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Not an IANA timezone name.
    #[error("Invalid timezone '{name}': {message}")]
    InvalidTimezone { name: String, message: String },

    /// Numeric setting could not be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidNumber { key: String, value: String },

    /// History file pattern is not a valid regex.
    #[error("Invalid file pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors when loading a session from configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Load error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// A required input path was not configured.
    #[error("No {0} configured")]
    MissingInput(&'static str),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for normalization operations.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for aggregation requests.
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for identifier resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for CSV export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for session loading.
pub type PipelineResult<T> = Result<T, PipelineError>;
