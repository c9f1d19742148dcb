//! JSON Schema validation for account data exports.
//!
//! Playlist and library files are checked against JSON Schema Draft 7 before
//! being deserialized, so a wrong file produces a list of readable messages
//! instead of a single serde error.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `playlist-export.json` - `{ "playlists": [...] }`
//! - `library-export.json` - `{ "tracks": [...] }`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use playlog::validation::{validate_library_export, validate_playlist_export};
//!
//! let library = json!({ "tracks": [{ "artist": "A", "track": "T" }] });
//! assert!(validate_library_export(&library).is_ok());
//!
//! assert!(validate_playlist_export(&json!({ "tracks": [] })).is_err());
//! ```

use serde_json::Value;

use crate::error::{LoadError, LoadResult};

const PLAYLIST_SCHEMA: &str = include_str!("../../schemas/playlist-export.json");
const LIBRARY_SCHEMA: &str = include_str!("../../schemas/library-export.json");

/// Validate `data` against an already parsed `schema`.
///
/// Returns every validation error message, not just the first.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_embedded(source: &str, data: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(source)
        .map_err(|e| vec![format!("Invalid embedded schema: {}", e)])?;
    validate(&schema, data)
}

/// Validate a playlist export document.
pub fn validate_playlist_export(data: &Value) -> Result<(), Vec<String>> {
    validate_embedded(PLAYLIST_SCHEMA, data)
}

/// Validate a library export document.
pub fn validate_library_export(data: &Value) -> Result<(), Vec<String>> {
    validate_embedded(LIBRARY_SCHEMA, data)
}

/// Run `check` over a decoded export and turn failures into [`LoadError::Schema`].
pub(crate) fn check_export(
    file: &str,
    value: &Value,
    check: fn(&Value) -> Result<(), Vec<String>>,
) -> LoadResult<()> {
    check(value).map_err(|errors| LoadError::Schema {
        file: file.to_string(),
        errors,
    })
}
