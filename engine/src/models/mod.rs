//! Domain models shared by the loader and the query engine.
//!
//! - [`StreamingEvent`] / [`NormalizedDataset`] - canonical play history
//! - [`AggregationKey`] / [`Metric`] / [`GroupKey`] / [`RankedGroup`] - query vocabulary
//! - [`Playlist`] / [`PlaylistItem`] / [`MediaItem`] - playlist export
//! - [`LibraryEntry`] / [`LibraryCollection`] / [`CorrelationResult`] - liked items

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

// =============================================================================
// Streaming Event
// =============================================================================

/// One playback record in canonical form.
///
/// Fields are read through accessors; an event never changes after
/// normalization built it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingEvent {
    track_name: String,
    artist_name: String,
    timestamp: DateTime<Utc>,
    duration_played_ms: u64,
    play_count: u64,
}

impl StreamingEvent {
    /// Create an event. `play_count` is always 1.
    pub fn new(
        track_name: impl Into<String>,
        artist_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        duration_played_ms: u64,
    ) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            timestamp,
            duration_played_ms,
            play_count: 1,
        }
    }

    /// Track title, empty for non-track content.
    pub fn track_name(&self) -> &str {
        &self.track_name
    }

    /// Artist name, empty for non-track content.
    pub fn artist_name(&self) -> &str {
        &self.artist_name
    }

    /// Instant the playback ended, in UTC.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn duration_played_ms(&self) -> u64 {
        self.duration_played_ms
    }

    pub fn play_count(&self) -> u64 {
        self.play_count
    }

    /// The timestamp seen from the presentation zone.
    pub fn local_time(&self, zone: &Tz) -> DateTime<Tz> {
        self.timestamp.with_timezone(zone)
    }
}

// =============================================================================
// Normalized Dataset
// =============================================================================

/// All streaming events of a session, in file-concatenation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedDataset {
    events: Vec<StreamingEvent>,
}

impl NormalizedDataset {
    pub fn new(events: Vec<StreamingEvent>) -> Self {
        Self { events }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StreamingEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StreamingEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of `metric` over every event.
    pub fn total(&self, metric: Metric) -> u64 {
        self.events.iter().map(|e| metric.value(e)).sum()
    }

    /// Events paired with their presentation-zone time.
    pub fn in_zone<'a>(
        &'a self,
        zone: &'a Tz,
    ) -> impl Iterator<Item = (&'a StreamingEvent, DateTime<Tz>)> + 'a {
        self.events.iter().map(move |e| (e, e.local_time(zone)))
    }
}

impl<'a> IntoIterator for &'a NormalizedDataset {
    type Item = &'a StreamingEvent;
    type IntoIter = std::slice::Iter<'a, StreamingEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// =============================================================================
// Metric
// =============================================================================

/// Numeric quantity summed by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PlayCount,
    DurationPlayedMs,
}

impl Metric {
    /// Value of this metric for one event.
    pub fn value(&self, event: &StreamingEvent) -> u64 {
        match self {
            Self::PlayCount => event.play_count(),
            Self::DurationPlayedMs => event.duration_played_ms(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayCount => "play_count",
            Self::DurationPlayedMs => "duration_played_ms",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "play_count" | "plays" | "count" => Ok(Self::PlayCount),
            "duration_played_ms" | "ms_played" | "ms" | "duration" | "time" => {
                Ok(Self::DurationPlayedMs)
            }
            field @ ("track" | "track_name" | "artist" | "artist_name" | "timestamp" | "ts") => {
                Err(QueryError::InvalidAggregationRequest(format!(
                    "'{}' is not a numeric field and cannot be summed",
                    field
                )))
            }
            other => Err(QueryError::InvalidAggregationRequest(format!(
                "unknown metric '{}' (expected play_count or duration_played_ms)",
                other
            ))),
        }
    }
}

// =============================================================================
// Aggregation Key
// =============================================================================

/// Grouping dimension of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKey {
    Track,
    Artist,
    HourOfDay,
    DayOfWeek,
    Month,
    Year,
    CalendarDate,
    DayType,
}

impl AggregationKey {
    /// Keys derived from the presentation-zone timestamp.
    pub fn is_time_bucket(&self) -> bool {
        !matches!(self, Self::Track | Self::Artist)
    }

    /// Group value of `event` under this key.
    pub fn group_of(&self, event: &StreamingEvent, zone: &Tz) -> GroupKey {
        self.bucket_of(&event.local_time(zone)).unwrap_or_else(|| {
            let name = match self {
                Self::Artist => event.artist_name(),
                _ => event.track_name(),
            };
            GroupKey::Text(name.to_string())
        })
    }

    /// Time bucket of an already converted local time, `None` for text keys.
    fn bucket_of(&self, local: &DateTime<Tz>) -> Option<GroupKey> {
        let bucket = match self {
            Self::HourOfDay => GroupKey::Hour(local.hour()),
            Self::DayOfWeek => GroupKey::Weekday(local.weekday()),
            Self::Month => GroupKey::Month(local.month()),
            Self::Year => GroupKey::Year(local.year()),
            Self::CalendarDate => GroupKey::Date(local.date_naive()),
            Self::DayType => GroupKey::DayType(DayType::of(local.weekday())),
            Self::Track | Self::Artist => return None,
        };
        Some(bucket)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
            Self::HourOfDay => "hour",
            Self::DayOfWeek => "day_of_week",
            Self::Month => "month",
            Self::Year => "year",
            Self::CalendarDate => "date",
            Self::DayType => "day_type",
        }
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationKey {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "track" | "song" | "track_name" => Ok(Self::Track),
            "artist" | "artist_name" => Ok(Self::Artist),
            "hour" | "hour_of_day" => Ok(Self::HourOfDay),
            "day_of_week" | "weekday" | "dow" => Ok(Self::DayOfWeek),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "date" | "calendar_date" | "day" => Ok(Self::CalendarDate),
            "day_type" | "weekday_vs_weekend" => Ok(Self::DayType),
            other => Err(QueryError::InvalidAggregationRequest(format!(
                "unknown aggregation key '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// Group Values
// =============================================================================

/// Weekday or weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn of(day: Weekday) -> Self {
        match day {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }
}

/// Value of an [`AggregationKey`] for one group.
///
/// The `Display` form is the string used for tie-breaking: hours and months
/// are zero-padded, years have four digits, dates are ISO formatted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Text(String),
    Hour(u32),
    Weekday(Weekday),
    Month(u32),
    Year(i32),
    Date(NaiveDate),
    DayType(DayType),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Hour(h) => write!(f, "{:02}", h),
            Self::Weekday(d) => f.write_str(weekday_name(*d)),
            Self::Month(m) => write!(f, "{:02}", m),
            Self::Year(y) => write!(f, "{:04}", y),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DayType(DayType::Weekday) => f.write_str("weekday"),
            Self::DayType(DayType::Weekend) => f.write_str("weekend"),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// English weekday name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// One row of a ranked or distributed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedGroup {
    pub key: GroupKey,
    pub total: u64,
}

impl RankedGroup {
    pub fn new(key: GroupKey, total: u64) -> Self {
        Self { key, total }
    }

    /// String form of the key.
    pub fn label(&self) -> String {
        self.key.to_string()
    }
}

// =============================================================================
// Playlists
// =============================================================================

/// What a playlist slot points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaItem {
    Track {
        name: String,
        artist: String,
        album: String,
        uri: String,
    },
    Episode {
        name: String,
        show: String,
        uri: String,
    },
    #[serde(rename = "local")]
    LocalOrUnknown,
}

/// One playlist slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub media: MediaItem,
    /// Export date string, kept verbatim.
    pub added_date: String,
}

/// A playlist from the account data export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub name: String,
    pub last_modified_date: String,
    pub description: String,
    pub number_of_followers: u64,
    pub items: Vec<PlaylistItem>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Library
// =============================================================================

/// A liked track.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryEntry {
    pub artist: String,
    pub album: String,
    pub track: String,
    pub uri: String,
}

/// All liked tracks, in export order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryCollection {
    entries: Vec<LibraryEntry>,
}

impl LibraryCollection {
    pub fn new(entries: Vec<LibraryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A liked track joined against play history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationResult {
    pub entry: LibraryEntry,
    pub matched_play_count: u64,
    pub ever_streamed: bool,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_play_count_is_one() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let event = StreamingEvent::new("Song", "Artist", ts, 1234);
        assert_eq!(event.play_count(), 1);
        assert_eq!(event.duration_played_ms(), 1234);
    }

    #[test]
    fn test_local_time_uses_zone() {
        // 03:30 UTC is the previous evening in Chicago (CST, UTC-6)
        let ts = Utc.with_ymd_and_hms(2024, 1, 6, 3, 30, 0).unwrap();
        let event = StreamingEvent::new("Song", "Artist", ts, 1);
        let local = event.local_time(&chrono_tz::America::Chicago);
        assert_eq!(local.hour(), 21);
        assert_eq!(local.weekday(), Weekday::Fri);
    }

    #[test]
    fn test_group_of_text_and_time_keys() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 6, 3, 30, 0).unwrap();
        let event = StreamingEvent::new("Song", "Artist", ts, 1);
        let zone = chrono_tz::America::Chicago;

        assert_eq!(AggregationKey::Track.group_of(&event, &zone), GroupKey::Text("Song".into()));
        assert_eq!(AggregationKey::Artist.group_of(&event, &zone), GroupKey::Text("Artist".into()));
        assert_eq!(AggregationKey::HourOfDay.group_of(&event, &zone), GroupKey::Hour(21));
        assert_eq!(
            AggregationKey::DayType.group_of(&event, &zone),
            GroupKey::DayType(DayType::Weekday)
        );

        let local = event.local_time(&zone);
        assert_eq!(AggregationKey::Track.bucket_of(&local), None);
        assert_eq!(AggregationKey::Artist.bucket_of(&local), None);
        assert_eq!(AggregationKey::Year.bucket_of(&local), Some(GroupKey::Year(2024)));
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("plays".parse::<Metric>(), Ok(Metric::PlayCount));
        assert_eq!("ms_played".parse::<Metric>(), Ok(Metric::DurationPlayedMs));
        assert!(matches!(
            "track_name".parse::<Metric>(),
            Err(QueryError::InvalidAggregationRequest(msg)) if msg.contains("not a numeric field")
        ));
        assert!("bogus".parse::<Metric>().is_err());
    }

    #[test]
    fn test_aggregation_key_from_str() {
        assert_eq!("song".parse::<AggregationKey>(), Ok(AggregationKey::Track));
        assert_eq!("day-of-week".parse::<AggregationKey>(), Ok(AggregationKey::DayOfWeek));
        assert_eq!("weekday_vs_weekend".parse::<AggregationKey>(), Ok(AggregationKey::DayType));
        assert!("genre".parse::<AggregationKey>().is_err());
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::Hour(7).to_string(), "07");
        assert_eq!(GroupKey::Month(11).to_string(), "11");
        assert_eq!(GroupKey::Weekday(Weekday::Sat).to_string(), "Saturday");
        assert_eq!(
            GroupKey::Date(NaiveDate::from_ymd_opt(2023, 2, 9).unwrap()).to_string(),
            "2023-02-09"
        );
        assert_eq!(GroupKey::DayType(DayType::Weekend).to_string(), "weekend");
    }

    #[test]
    fn test_group_key_serializes_as_label() {
        let group = RankedGroup::new(GroupKey::Hour(5), 3);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["key"], "05");
        assert_eq!(json["total"], 3);
    }

    #[test]
    fn test_media_item_serialization_tag() {
        let json = serde_json::to_value(MediaItem::LocalOrUnknown).unwrap();
        assert_eq!(json["type"], "local");
    }
}
