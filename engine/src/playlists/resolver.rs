//! Resolve a user-supplied identifier to a playlist.
//!
//! ```text
//! "2"      ──► index 2 (1-based), if in range
//! "chill"  ──► exact name, case-insensitive
//! "road"   ──► unique case-insensitive substring
//!          ──► otherwise NotFound / Ambiguous
//! ```

use crate::error::{ResolveError, ResolveResult};
use crate::models::Playlist;

/// Position (0-based) of the playlist `identifier` refers to.
pub fn resolve_position(playlists: &[Playlist], identifier: &str) -> ResolveResult<usize> {
    if let Ok(number) = identifier.trim().parse::<usize>() {
        if (1..=playlists.len()).contains(&number) {
            return Ok(number - 1);
        }
    }

    let needle = identifier.to_lowercase();
    if let Some(pos) = playlists.iter().position(|p| p.name.to_lowercase() == needle) {
        return Ok(pos);
    }

    let matches: Vec<usize> = playlists
        .iter()
        .enumerate()
        .filter(|(_, p)| p.name.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(ResolveError::NotFound {
            identifier: identifier.to_string(),
        }),
        _ => Err(ResolveError::Ambiguous {
            identifier: identifier.to_string(),
            candidates: matches.iter().map(|&i| playlists[i].name.clone()).collect(),
        }),
    }
}

/// The playlist `identifier` refers to.
pub fn resolve<'a>(playlists: &'a [Playlist], identifier: &str) -> ResolveResult<&'a Playlist> {
    resolve_position(playlists, identifier).map(|i| &playlists[i])
}
