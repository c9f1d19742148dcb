//! Export file decoding with encoding auto-detection.
//!
//! Turns raw bytes into a `serde_json::Value`. Knows nothing about streaming
//! history, playlists or libraries.

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{DecodeError, DecodeResult};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Result of decoding with metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Parsed JSON
    pub value: Value,
    /// Detected encoding
    pub encoding: String,
}

impl ParsedDocument {
    /// Number of records when the document is a top-level array.
    pub fn record_count(&self) -> Option<usize> {
        self.value.as_array().map(Vec::len)
    }

    /// Union of field names over every object in a top-level array, sorted.
    pub fn field_names(&self) -> BTreeSet<String> {
        field_names(&self.value)
    }
}

/// Union of field names over every object in a top-level array, sorted.
pub fn field_names(value: &Value) -> BTreeSet<String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|obj| obj.keys().cloned())
        .collect()
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    // Exports are normally UTF-8; chardet guesses poorly on short samples
    if bytes.starts_with(UTF8_BOM) || std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    match result.0.to_lowercase().as_str() {
        "" | "ascii" => "utf-8".to_string(),
        charset => charset.to_string(),
    }
}

/// Decode bytes with the charset named by `encoding` (any WHATWG label).
///
/// UTF-8 is strict. Other charsets go through `encoding_rs`, so
/// `iso-8859-1` decodes as windows-1252 like browsers do. Unknown labels
/// and malformed input are errors, never a lossy fallback.
pub fn decode_content(bytes: &[u8], encoding: &str) -> DecodeResult<String> {
    let label = encoding.trim().to_lowercase();
    if matches!(label.as_str(), "utf-8" | "utf8" | "ascii") {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        return std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| DecodeError::Encoding(format!("invalid UTF-8: {}", e)));
    }

    let charset = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| DecodeError::Encoding(format!("unsupported encoding '{}'", encoding)))?;
    let (decoded, had_errors) = charset.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(DecodeError::Encoding(format!(
            "malformed {} content",
            charset.name()
        )));
    }
    Ok(decoded.into_owned())
}

/// Decode and parse JSON bytes with encoding auto-detection.
pub fn parse_bytes_auto(bytes: &[u8]) -> DecodeResult<ParsedDocument> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    parse_str(&content, encoding)
}

/// Parse an already decoded string.
pub fn parse_str(content: &str, encoding: impl Into<String>) -> DecodeResult<ParsedDocument> {
    if content.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    let value: Value = serde_json::from_str(content)?;
    Ok(ParsedDocument {
        value,
        encoding: encoding.into(),
    })
}

/// Read and parse a JSON file with encoding auto-detection.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> DecodeResult<ParsedDocument> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// File name used in diagnostics.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
