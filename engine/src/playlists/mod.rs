//! Playlists from the account data export.
//!
//! - [`loader`] - validate and parse `Playlist1.json`
//! - [`resolver`] - identifier to playlist (index, name, substring)
//! - [`export`] - CSV projection

pub mod export;
pub mod loader;
pub mod resolver;

use serde::Serialize;
use std::cmp::Reverse;

use crate::models::Playlist;

pub use export::{export_playlist, playlist_rows, write_playlist_csv, PlaylistRow};
pub use loader::{load_playlists, parse_playlists};
pub use resolver::{resolve, resolve_position};

/// Longest playlists reported by [`playlist_stats`].
pub const LONGEST_PLAYLISTS: usize = 5;

/// One line of the playlist listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistSummary {
    /// 1-based, usable as a resolver identifier
    pub index: usize,
    pub name: String,
    pub items: usize,
    pub last_modified_date: String,
}

/// Totals over every playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistStats {
    pub playlist_count: usize,
    pub total_items: usize,
    pub longest: Vec<PlaylistSummary>,
}

/// Numbered listing in load order.
pub fn list_playlists(playlists: &[Playlist]) -> Vec<PlaylistSummary> {
    playlists
        .iter()
        .enumerate()
        .map(|(i, p)| PlaylistSummary {
            index: i + 1,
            name: p.name.clone(),
            items: p.len(),
            last_modified_date: p.last_modified_date.clone(),
        })
        .collect()
}

/// Counts plus the longest playlists; equal lengths keep load order.
pub fn playlist_stats(playlists: &[Playlist]) -> PlaylistStats {
    let mut longest = list_playlists(playlists);
    longest.sort_by_key(|s| Reverse(s.items));
    longest.truncate(LONGEST_PLAYLISTS);

    PlaylistStats {
        playlist_count: playlists.len(),
        total_items: playlists.iter().map(Playlist::len).sum(),
        longest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, PlaylistItem};

    fn sized(name: &str, len: usize) -> Playlist {
        Playlist {
            name: name.to_string(),
            last_modified_date: "2024-01-01".into(),
            description: String::new(),
            number_of_followers: 0,
            items: (0..len)
                .map(|_| PlaylistItem {
                    media: MediaItem::LocalOrUnknown,
                    added_date: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_list_is_one_based() {
        let listing = list_playlists(&[sized("A", 2), sized("B", 0)]);
        assert_eq!(listing[0].index, 1);
        assert_eq!(listing[1].name, "B");
        assert_eq!(listing[1].items, 0);
    }

    #[test]
    fn test_stats_longest_with_ties_in_load_order() {
        let playlists = vec![
            sized("a", 1),
            sized("b", 4),
            sized("c", 2),
            sized("d", 4),
            sized("e", 3),
            sized("f", 2),
            sized("g", 0),
        ];
        let stats = playlist_stats(&playlists);
        assert_eq!(stats.playlist_count, 7);
        assert_eq!(stats.total_items, 16);

        let names: Vec<&str> = stats.longest.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "e", "c", "f"]);
    }

    #[test]
    fn test_stats_empty() {
        let stats = playlist_stats(&[]);
        assert_eq!(stats.playlist_count, 0);
        assert!(stats.longest.is_empty());
    }
}
