//! CSV projection of a playlist.
//!
//! Columns: `type, name, artist, album, uri, added_date`. Episodes carry the
//! show name in `artist` and an empty `album`; local or unknown items are
//! written with `type = local` and empty fields.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExportResult;
use crate::logs::log_success;
use crate::models::{MediaItem, Playlist, PlaylistItem};

pub const CSV_COLUMNS: [&str; 6] = ["type", "name", "artist", "album", "uri", "added_date"];

/// One CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistRow {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub uri: String,
    pub added_date: String,
}

impl From<&PlaylistItem> for PlaylistRow {
    fn from(item: &PlaylistItem) -> Self {
        let (kind, name, artist, album, uri) = match &item.media {
            MediaItem::Track { name, artist, album, uri } => {
                ("track", name.clone(), artist.clone(), album.clone(), uri.clone())
            }
            MediaItem::Episode { name, show, uri } => {
                ("episode", name.clone(), show.clone(), String::new(), uri.clone())
            }
            MediaItem::LocalOrUnknown => {
                ("local", String::new(), String::new(), String::new(), String::new())
            }
        };
        Self {
            kind,
            name,
            artist,
            album,
            uri,
            added_date: item.added_date.clone(),
        }
    }
}

/// Rows in playlist order.
pub fn playlist_rows(playlist: &Playlist) -> Vec<PlaylistRow> {
    playlist.items.iter().map(PlaylistRow::from).collect()
}

/// Write `playlist` as CSV to `writer`, header included even when empty.
///
/// Returns the number of data rows written.
pub fn write_playlist_csv<W: Write>(playlist: &Playlist, writer: W) -> ExportResult<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(CSV_COLUMNS)?;
    let rows = playlist_rows(playlist);
    for row in &rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(rows.len())
}

/// Write `playlist` as a CSV file at `path`.
pub fn export_playlist<P: AsRef<Path>>(playlist: &Playlist, path: P) -> ExportResult<usize> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let count = write_playlist_csv(playlist, BufWriter::new(file))?;
    log_success(format!(
        "Exported {} items from '{}' to {}",
        count,
        playlist.name,
        path.display()
    ));
    Ok(count)
}
