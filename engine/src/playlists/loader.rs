//! Playlist export loading.
//!
//! The export is validated against `schemas/playlist-export.json`, then
//! deserialized into private raw structs mirroring the file and converted to
//! [`Playlist`] values. Each item becomes a track when `track` is present,
//! otherwise an episode when `episode` is present, otherwise
//! [`MediaItem::LocalOrUnknown`].

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::logs::log_success;
use crate::models::{MediaItem, Playlist, PlaylistItem};
use crate::parser::{display_name, parse_file_auto};
use crate::validation::{check_export, validate_playlist_export};

#[derive(Debug, Deserialize)]
struct RawExport {
    #[serde(default)]
    playlists: Vec<RawPlaylist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlaylist {
    name: String,
    last_modified_date: Option<String>,
    description: Option<String>,
    number_of_followers: Option<u64>,
    items: Option<Vec<RawItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    track: Option<RawTrack>,
    episode: Option<RawEpisode>,
    added_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    track_name: Option<String>,
    artist_name: Option<String>,
    album_name: Option<String>,
    track_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEpisode {
    episode_name: Option<String>,
    show_name: Option<String>,
    episode_uri: Option<String>,
}

impl RawItem {
    fn into_item(self) -> PlaylistItem {
        let media = match (self.track, self.episode) {
            (Some(t), _) => MediaItem::Track {
                name: t.track_name.unwrap_or_default(),
                artist: t.artist_name.unwrap_or_default(),
                album: t.album_name.unwrap_or_default(),
                uri: t.track_uri.unwrap_or_default(),
            },
            (None, Some(e)) => MediaItem::Episode {
                name: e.episode_name.unwrap_or_default(),
                show: e.show_name.unwrap_or_default(),
                uri: e.episode_uri.unwrap_or_default(),
            },
            (None, None) => MediaItem::LocalOrUnknown,
        };
        PlaylistItem {
            media,
            added_date: self.added_date.unwrap_or_default(),
        }
    }
}

impl RawPlaylist {
    fn into_playlist(self) -> Playlist {
        Playlist {
            name: self.name,
            last_modified_date: self.last_modified_date.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            number_of_followers: self.number_of_followers.unwrap_or(0),
            items: self
                .items
                .unwrap_or_default()
                .into_iter()
                .map(RawItem::into_item)
                .collect(),
        }
    }
}

/// Validate and convert a decoded playlist export. Playlists keep file order.
pub fn parse_playlists(file: &str, value: &Value) -> LoadResult<Vec<Playlist>> {
    check_export(file, value, validate_playlist_export)?;

    let raw = RawExport::deserialize(value).map_err(|source| LoadError::Shape {
        file: file.to_string(),
        source,
    })?;

    Ok(raw.playlists.into_iter().map(RawPlaylist::into_playlist).collect())
}

/// Read, decode and parse a playlist export file.
pub fn load_playlists<P: AsRef<Path>>(path: P) -> LoadResult<Vec<Playlist>> {
    let path = path.as_ref();
    let file = display_name(path);
    let doc = parse_file_auto(path).map_err(|source| LoadError::Decode {
        file: file.clone(),
        source,
    })?;

    let playlists = parse_playlists(&file, &doc.value)?;
    log_success(format!("Loaded {} playlists from {}", playlists.len(), file));
    Ok(playlists)
}
