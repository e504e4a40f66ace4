//! The playlist generation algorithms.
//!
//! Each algorithm is a pure function from snapshots (song pools, per-user
//! play statistics) to an ordered song-id sequence, so they are testable
//! without any store.

use crate::error::{PlaylistError, Result};
use core_catalog::{Song, SongId};
use core_history::PlayStats;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Draw `size` distinct songs uniformly at random from the pool.
pub fn pick_random<R: Rng + ?Sized>(
    pool: &[SongId],
    size: usize,
    rng: &mut R,
) -> Result<Vec<SongId>> {
    if size > pool.len() {
        return Err(PlaylistError::InsufficientCatalog {
            requested: size,
            available: pool.len(),
        });
    }
    Ok(pool.choose_multiple(rng, size).copied().collect())
}

/// Order candidates by play statistics: count descending, most recent play
/// descending, song id ascending. Songs without statistics sort last (by
/// id), so genre playlists still include unplayed material.
pub fn order_by_plays(
    mut candidates: Vec<Song>,
    stats: &HashMap<SongId, PlayStats>,
) -> Vec<SongId> {
    candidates.sort_by_key(|song| {
        let s = stats.get(&song.id);
        (
            Reverse(s.map(|s| s.count).unwrap_or(0)),
            Reverse(s.map(|s| s.last_played)),
            song.id,
        )
    });
    candidates.into_iter().map(|song| song.id).collect()
}
