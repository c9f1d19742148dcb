//! Streaming history schema detection and normalization.
//!
//! Two export formats exist:
//!
//! ```text
//! Extended history (endsong_*.json)          Basic history (StreamingHistory*.json)
//! ┌──────────────────────────────────────┐   ┌──────────────────────────────┐
//! │ ts                                ───┼─┐ │ endTime                   ───┼─┐
//! │ ms_played                         ───┼─┤ │ msPlayed                  ───┼─┤
//! │ master_metadata_track_name        ───┼─┤ │ trackName                 ───┼─┤
//! │ master_metadata_album_artist_name ───┼─┤ │ artistName                ───┼─┤
//! └──────────────────────────────────────┘ │ └──────────────────────────────┘ │
//!                                          └──────────► StreamingEvent ◄──────┘
//! ```
//!
//! A file is classified once, by field presence, and every record in it is
//! mapped by that variant's rule. Files matching neither variant are rejected.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{NormalizeError, NormalizeResult};
use crate::models::StreamingEvent;
use crate::parser::field_names;

/// Field whose presence marks the basic export.
pub const BASIC_MARKER_FIELD: &str = "endTime";

/// Fields the extended export must carry.
pub const EXTENDED_REQUIRED_FIELDS: [&str; 2] = ["ts", "ms_played"];

const BASIC_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

// =============================================================================
// Schema Variant
// =============================================================================

/// Streaming history export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// `ts`, `ms_played`, `master_metadata_*`
    Extended,
    /// `endTime`, `msPlayed`, `trackName`, `artistName`
    Basic,
}

impl SchemaVariant {
    /// Classify a file by the union of its records' field names.
    pub fn classify(fields: &BTreeSet<String>) -> Option<Self> {
        if fields.contains(BASIC_MARKER_FIELD) {
            Some(Self::Basic)
        } else if EXTENDED_REQUIRED_FIELDS.iter().all(|f| fields.contains(*f)) {
            Some(Self::Extended)
        } else {
            None
        }
    }

    /// Map one raw record onto the canonical shape.
    pub fn to_event(&self, record: &Value) -> Result<StreamingEvent, String> {
        match self {
            Self::Extended => ExtendedRecord::deserialize(record)
                .map_err(|e| e.to_string())?
                .into_event(),
            Self::Basic => BasicRecord::deserialize(record)
                .map_err(|e| e.to_string())?
                .into_event(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extended => "extended",
            Self::Basic => "basic",
        }
    }
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Source Records
// =============================================================================

/// Extended history record. Other fields (platform, shuffle, ...) are ignored.
#[derive(Debug, Deserialize)]
struct ExtendedRecord {
    ts: String,
    ms_played: i64,
    #[serde(default)]
    master_metadata_track_name: Option<String>,
    #[serde(default)]
    master_metadata_album_artist_name: Option<String>,
}

impl ExtendedRecord {
    fn into_event(self) -> Result<StreamingEvent, String> {
        let timestamp = DateTime::parse_from_rfc3339(self.ts.trim())
            .map_err(|e| format!("invalid ts '{}': {}", self.ts, e))?
            .with_timezone(&Utc);
        Ok(StreamingEvent::new(
            self.master_metadata_track_name.unwrap_or_default(),
            self.master_metadata_album_artist_name.unwrap_or_default(),
            timestamp,
            non_negative(self.ms_played)?,
        ))
    }
}

/// Basic history record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BasicRecord {
    end_time: String,
    ms_played: i64,
    #[serde(default)]
    track_name: Option<String>,
    #[serde(default)]
    artist_name: Option<String>,
}

impl BasicRecord {
    fn into_event(self) -> Result<StreamingEvent, String> {
        let raw = self.end_time.trim();
        let timestamp = BASIC_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| format!("invalid endTime '{}'", self.end_time))?
            .and_utc();
        Ok(StreamingEvent::new(
            self.track_name.unwrap_or_default(),
            self.artist_name.unwrap_or_default(),
            timestamp,
            non_negative(self.ms_played)?,
        ))
    }
}

fn non_negative(ms: i64) -> Result<u64, String> {
    u64::try_from(ms).map_err(|_| format!("negative duration {}", ms))
}

// =============================================================================
// Normalization
// =============================================================================

/// A record that could not be mapped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    /// Position in the file's array
    pub index: usize,
    pub reason: String,
}

/// Canonical events of one classified file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedBatch {
    pub file: String,
    pub variant: SchemaVariant,
    pub events: Vec<StreamingEvent>,
    pub skipped: Vec<SkippedRecord>,
}

/// Classify `records` and map every record to a [`StreamingEvent`].
///
/// `file` only labels diagnostics. Records that cannot be mapped are listed in
/// [`NormalizedBatch::skipped`]; the rest of the file still loads.
pub fn normalize_records(file: &str, records: &Value) -> NormalizeResult<NormalizedBatch> {
    let array = records.as_array().ok_or_else(|| NormalizeError::NotAnArray {
        file: file.to_string(),
    })?;

    if array.is_empty() {
        return Err(NormalizeError::EmptyFile { file: file.to_string() });
    }

    let fields = field_names(records);
    let variant = SchemaVariant::classify(&fields).ok_or_else(|| {
        NormalizeError::UnrecognizedSchema {
            file: file.to_string(),
            fields: fields.iter().cloned().collect(),
        }
    })?;

    let mut events = Vec::with_capacity(array.len());
    let mut skipped = Vec::new();

    for (index, record) in array.iter().enumerate() {
        match variant.to_event(record) {
            Ok(event) => events.push(event),
            Err(reason) => skipped.push(SkippedRecord { index, reason }),
        }
    }

    Ok(NormalizedBatch {
        file: file.to_string(),
        variant,
        events,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_classify_basic() {
        let fields: BTreeSet<String> = ["endTime", "msPlayed", "trackName", "artistName"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(SchemaVariant::classify(&fields), Some(SchemaVariant::Basic));
    }

    #[test]
    fn test_classify_extended() {
        let fields: BTreeSet<String> = ["ts", "ms_played", "master_metadata_track_name", "platform"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(SchemaVariant::classify(&fields), Some(SchemaVariant::Extended));
    }

    #[test]
    fn test_classify_unknown() {
        let fields: BTreeSet<String> = ["username", "ts"].iter().map(|s| s.to_string()).collect();
        assert_eq!(SchemaVariant::classify(&fields), None);
    }

    #[test]
    fn test_same_event_from_both_variants() {
        let basic = json!([{
            "endTime": "2023-06-01 13:45",
            "artistName": "Daft Punk",
            "trackName": "One More Time",
            "msPlayed": 320357
        }]);
        let extended = json!([{
            "ts": "2023-06-01T13:45:00Z",
            "ms_played": 320357,
            "master_metadata_track_name": "One More Time",
            "master_metadata_album_artist_name": "Daft Punk",
            "platform": "android",
            "shuffle": false
        }]);

        let a = normalize_records("StreamingHistory0.json", &basic).unwrap();
        let b = normalize_records("endsong_0.json", &extended).unwrap();

        assert_eq!(a.variant, SchemaVariant::Basic);
        assert_eq!(b.variant, SchemaVariant::Extended);
        assert_eq!(a.events, b.events);

        let event = &a.events[0];
        assert_eq!(event.track_name(), "One More Time");
        assert_eq!(event.artist_name(), "Daft Punk");
        assert_eq!(event.timestamp(), Utc.with_ymd_and_hms(2023, 6, 1, 13, 45, 0).unwrap());
        assert_eq!(event.duration_played_ms(), 320357);
        assert_eq!(event.play_count(), 1);
    }

    #[test]
    fn test_null_metadata_becomes_empty() {
        let records = json!([{
            "ts": "2023-06-01T08:00:00Z",
            "ms_played": 1500000,
            "master_metadata_track_name": null,
            "master_metadata_album_artist_name": null,
            "episode_name": "Morning News"
        }]);
        let batch = normalize_records("endsong_1.json", &records).unwrap();
        assert_eq!(batch.events[0].track_name(), "");
        assert_eq!(batch.events[0].artist_name(), "");
    }

    #[test]
    fn test_basic_with_seconds() {
        let records = json!([{ "endTime": "2021-12-31 23:59:58", "msPlayed": 5 }]);
        let batch = normalize_records("StreamingHistory1.json", &records).unwrap();
        assert_eq!(
            batch.events[0].timestamp(),
            Utc.with_ymd_and_hms(2021, 12, 31, 23, 59, 58).unwrap()
        );
    }

    #[test]
    fn test_bad_records_are_skipped_not_defaulted() {
        let records = json!([
            {
                "endTime": "2023-01-01 10:00",
                "msPlayed": 1000,
                "trackName": "A",
                "artistName": "X"
            },
            { "endTime": "yesterday", "msPlayed": 1000, "trackName": "B", "artistName": "X" },
            { "endTime": "2023-01-01 11:00", "msPlayed": -5, "trackName": "C", "artistName": "X" },
            { "endTime": "2023-01-01 12:00", "trackName": "D", "artistName": "X" }
        ]);
        let batch = normalize_records("StreamingHistory0.json", &records).unwrap();

        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].track_name(), "A");
        let indexes: Vec<usize> = batch.skipped.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert!(batch.skipped[0].reason.contains("yesterday"));
        assert!(batch.skipped[1].reason.contains("negative"));
        assert!(batch.skipped[2].reason.contains("msPlayed"));
    }

    #[test]
    fn test_unrecognized_schema_rejected() {
        let records = json!([{ "searchTime": "2023-01-01", "searchQuery": "jazz" }]);
        let err = normalize_records("SearchQueries.json", &records).unwrap_err();
        match err {
            NormalizeError::UnrecognizedSchema { file, fields } => {
                assert_eq!(file, "SearchQueries.json");
                assert_eq!(fields, vec!["searchQuery", "searchTime"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_not_an_array_rejected() {
        let err = normalize_records("Userdata.json", &json!({ "username": "me" })).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnArray { .. }));
    }

    #[test]
    fn test_empty_array_rejected() {
        let err = normalize_records("StreamingHistory9.json", &json!([])).unwrap_err();
        assert!(matches!(err, NormalizeError::EmptyFile { .. }));
    }
}
