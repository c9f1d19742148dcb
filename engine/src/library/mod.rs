//! Liked tracks from the account data export.
//!
//! - [`load_library`] / [`parse_library`] - validate and parse `YourLibrary.json`
//! - [`library_stats`] - counts and most-liked artists
//! - [`browse`] - filter by artist
//! - [`correlator`] - join liked tracks against streaming history

pub mod correlator;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::aggregate::rank_totals;
use crate::error::{LoadError, LoadResult};
use crate::logs::log_success;
use crate::models::{GroupKey, LibraryCollection, LibraryEntry, RankedGroup};
use crate::parser::{display_name, parse_file_auto};
use crate::validation::{check_export, validate_library_export};

pub use correlator::{correlate, CorrelationReport, CorrelationSummary};

/// Artists reported by [`library_stats`].
pub const TOP_LIBRARY_ARTISTS: usize = 10;

#[derive(Debug, Deserialize)]
struct RawLibrary {
    #[serde(default)]
    tracks: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    artist: Option<String>,
    album: Option<String>,
    track: Option<String>,
    uri: Option<String>,
}

impl From<RawEntry> for LibraryEntry {
    fn from(raw: RawEntry) -> Self {
        Self {
            artist: raw.artist.unwrap_or_default(),
            album: raw.album.unwrap_or_default(),
            track: raw.track.unwrap_or_default(),
            uri: raw.uri.unwrap_or_default(),
        }
    }
}

/// Library counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub total: usize,
    pub distinct_artists: usize,
    pub distinct_albums: usize,
    /// Artists by liked track count, ties by name
    pub top_artists: Vec<RankedGroup>,
}

/// Validate and convert a decoded library export. Entries keep file order.
pub fn parse_library(file: &str, value: &Value) -> LoadResult<LibraryCollection> {
    check_export(file, value, validate_library_export)?;

    let raw = RawLibrary::deserialize(value).map_err(|source| LoadError::Shape {
        file: file.to_string(),
        source,
    })?;

    Ok(LibraryCollection::new(
        raw.tracks.into_iter().map(LibraryEntry::from).collect(),
    ))
}

/// Read, decode and parse a library export file.
pub fn load_library<P: AsRef<Path>>(path: P) -> LoadResult<LibraryCollection> {
    let path = path.as_ref();
    let file = display_name(path);
    let doc = parse_file_auto(path).map_err(|source| LoadError::Decode {
        file: file.clone(),
        source,
    })?;

    let library = parse_library(&file, &doc.value)?;
    log_success(format!("Loaded {} liked tracks from {}", library.len(), file));
    Ok(library)
}

/// Totals and the [`TOP_LIBRARY_ARTISTS`] most-liked artists.
///
/// Empty artist and album names are not counted.
pub fn library_stats(library: &LibraryCollection) -> LibraryStats {
    let mut liked_per_artist: HashMap<GroupKey, u64> = HashMap::new();
    for entry in library.entries().iter().filter(|e| !e.artist.is_empty()) {
        *liked_per_artist
            .entry(GroupKey::Text(entry.artist.clone()))
            .or_insert(0) += 1;
    }

    LibraryStats {
        total: library.len(),
        distinct_artists: distinct(library.entries().iter().map(|e| e.artist.as_str())),
        distinct_albums: distinct(library.entries().iter().map(|e| e.album.as_str())),
        top_artists: rank_totals(liked_per_artist, TOP_LIBRARY_ARTISTS),
    }
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.filter(|s| !s.is_empty()).collect::<HashSet<_>>().len()
}

/// Entries whose artist contains `artist_filter`, case-insensitive.
///
/// `None` or an empty filter returns every entry.
pub fn browse<'a>(
    library: &'a LibraryCollection,
    artist_filter: Option<&str>,
) -> Vec<&'a LibraryEntry> {
    match artist_filter.map(str::to_lowercase) {
        Some(needle) if !needle.is_empty() => library
            .entries()
            .iter()
            .filter(|e| e.artist.to_lowercase().contains(&needle))
            .collect(),
        _ => library.entries().iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LOG_BROADCASTER;
    use serde_json::json;

    fn entry(artist: &str, album: &str, track: &str) -> LibraryEntry {
        LibraryEntry {
            artist: artist.into(),
            album: album.into(),
            track: track.into(),
            uri: String::new(),
        }
    }

    fn library() -> LibraryCollection {
        LibraryCollection::new(vec![
            entry("Björk", "Post", "Army of Me"),
            entry("Björk", "Homogenic", "Joga"),
            entry("Air", "Moon Safari", "La Femme d'Argent"),
            entry("Bonobo", "Migration", "Kerala"),
            entry("", "", "Unknown"),
        ])
    }

    #[test]
    fn test_parse_with_nulls() {
        let doc = json!({ "tracks": [
            { "artist": "A", "album": null, "track": "T", "uri": "spotify:track:1" },
            { "artist": "B" }
        ]});
        let library = parse_library("YourLibrary.json", &doc).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.entries()[0].album, "");
        assert_eq!(library.entries()[1].track, "");
    }

    #[test]
    fn test_parse_rejects_wrong_document() {
        let err = parse_library("Playlist1.json", &json!({ "playlists": [] })).unwrap_err();
        assert!(matches!(err, LoadError::Schema { .. }));
    }

    #[test]
    fn test_load_from_file() {
        LOG_BROADCASTER.set_quiet(true);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("YourLibrary.json");
        std::fs::write(
            &path,
            r#"{"tracks": [{"artist": "A", "album": "B", "track": "C", "uri": "u"}]}"#,
        )
        .unwrap();
        let library = load_library(&path).unwrap();
        let expected = LibraryEntry { uri: "u".into(), ..entry("A", "B", "C") };
        assert_eq!(library.entries()[0], expected);
    }

    #[test]
    fn test_library_stats() {
        let stats = library_stats(&library());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.distinct_artists, 3);
        assert_eq!(stats.distinct_albums, 4);

        let top: Vec<(String, u64)> =
            stats.top_artists.iter().map(|g| (g.label(), g.total)).collect();
        assert_eq!(
            top,
            vec![("Björk".into(), 2), ("Air".into(), 1), ("Bonobo".into(), 1)]
        );
    }

    #[test]
    fn test_browse_filter() {
        let library = library();
        assert_eq!(browse(&library, None).len(), 5);
        assert_eq!(browse(&library, Some("")).len(), 5);

        let bjork: Vec<&str> =
            browse(&library, Some("BJÖ")).iter().map(|e| e.track.as_str()).collect();
        assert_eq!(bjork, vec!["Army of Me", "Joga"]);

        // substring, not prefix
        assert_eq!(browse(&library, Some("on")).len(), 1);
        assert!(browse(&library, Some("zz")).is_empty());
    }
}
