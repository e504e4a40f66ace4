//! The catalog store.
//!
//! Holds every known song and album behind a read/write lock: reads may run
//! concurrently, mutations to the store are serialized. Songs are never
//! physically deleted; `remove` clears the active flag so that historical
//! play events and playlists keep resolvable ids.

use crate::error::{CatalogError, Result};
use crate::models::{Album, AlbumId, Song, SongId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// A catalog entry: the song plus its active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongEntry {
    pub song: Song,
    pub active: bool,
}

/// Predicate over song fields used by [`Catalog::search`].
///
/// All set fields must match: `title_contains` is a case-insensitive
/// substring test, `artist` and `genre` are case-insensitive equality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongFilter {
    pub title_contains: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
}

impl SongFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_contains(mut self, fragment: impl Into<String>) -> Self {
        self.title_contains = Some(fragment.into());
        self
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Whether the song satisfies every set field.
    pub fn matches(&self, song: &Song) -> bool {
        if let Some(fragment) = &self.title_contains {
            if !Song::normalize(&song.title).contains(&Song::normalize(fragment)) {
                return false;
            }
        }
        if let Some(artist) = &self.artist {
            if Song::normalize(&song.artist) != Song::normalize(artist) {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if Song::normalize(&song.genre) != Song::normalize(genre) {
                return false;
            }
        }
        true
    }
}

/// Serializable snapshot of the whole catalog, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    pub songs: Vec<SongEntry>,
    pub albums: Vec<Album>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    songs: HashMap<SongId, SongEntry>,
    /// Insertion order of song ids; search results follow it.
    order: Vec<SongId>,
    /// Normalized (title, artist) pairs, inactive entries included.
    song_keys: HashSet<(String, String)>,
    albums: HashMap<AlbumId, Album>,
    album_order: Vec<AlbumId>,
    album_keys: HashSet<(String, String)>,
}

/// The song/album universe. Leaf component with no dependencies.
#[derive(Debug, Default)]
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a song, assigning it a place in the insertion order.
    ///
    /// Fails with [`CatalogError::Duplicate`] when a song with the same
    /// normalized (title, artist) pair was ever added, active or not.
    pub async fn add_song(&self, song: Song) -> Result<SongId> {
        song.validate().map_err(|e| CatalogError::InvalidInput {
            field: "Song".to_string(),
            message: e,
        })?;

        let mut inner = self.inner.write().await;
        let key = song.dedup_key();
        if inner.song_keys.contains(&key) {
            return Err(CatalogError::Duplicate {
                entity: "Song".to_string(),
                key: format!("{} / {}", song.title, song.artist),
            });
        }

        let id = song.id;
        debug!(song_id = %id, title = %song.title, artist = %song.artist, "Added song");
        inner.song_keys.insert(key);
        inner.order.push(id);
        inner.songs.insert(id, SongEntry { song, active: true });
        Ok(id)
    }

    /// Fetch an active song by id.
    pub async fn get(&self, id: &SongId) -> Result<Song> {
        let inner = self.inner.read().await;
        match inner.songs.get(id) {
            Some(entry) if entry.active => Ok(entry.song.clone()),
            _ => Err(CatalogError::song_not_found(id)),
        }
    }

    /// Fetch a song regardless of its active flag.
    ///
    /// History reporting uses this so that retired songs stay nameable.
    pub async fn get_any(&self, id: &SongId) -> Option<Song> {
        let inner = self.inner.read().await;
        inner.songs.get(id).map(|entry| entry.song.clone())
    }

    /// Whether the id refers to an active song.
    pub async fn is_active(&self, id: &SongId) -> bool {
        let inner = self.inner.read().await;
        inner.songs.get(id).map(|e| e.active).unwrap_or(false)
    }

    /// Soft-delete a song. The id keeps resolving through [`Catalog::get_any`].
    pub async fn remove(&self, id: &SongId) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.songs.get_mut(id) {
            Some(entry) if entry.active => {
                entry.active = false;
                debug!(song_id = %id, "Removed song (soft delete)");
                Ok(())
            }
            _ => Err(CatalogError::song_not_found(id)),
        }
    }

    /// Active songs matching the filter, in insertion order.
    pub async fn search(&self, filter: &SongFilter) -> Vec<Song> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.songs.get(id))
            .filter(|entry| entry.active && filter.matches(&entry.song))
            .map(|entry| entry.song.clone())
            .collect()
    }

    /// Every active song, in insertion order.
    pub async fn active_songs(&self) -> Vec<Song> {
        self.search(&SongFilter::default()).await
    }

    /// Number of active songs.
    pub async fn active_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.songs.values().filter(|e| e.active).count()
    }

    /// Add an album. Every referenced song must be active at insertion time.
    pub async fn add_album(&self, album: Album) -> Result<AlbumId> {
        album.validate().map_err(|e| CatalogError::InvalidInput {
            field: "Album".to_string(),
            message: e,
        })?;

        let mut inner = self.inner.write().await;
        let key = album.dedup_key();
        if inner.album_keys.contains(&key) {
            return Err(CatalogError::Duplicate {
                entity: "Album".to_string(),
                key: format!("{} / {}", album.title, album.artist),
            });
        }
        for song_id in &album.song_ids {
            match inner.songs.get(song_id) {
                Some(entry) if entry.active => {}
                _ => return Err(CatalogError::song_not_found(song_id)),
            }
        }

        let id = album.id;
        debug!(album_id = %id, title = %album.title, tracks = album.song_ids.len(), "Added album");
        inner.album_keys.insert(key);
        inner.album_order.push(id);
        inner.albums.insert(id, album);
        Ok(id)
    }

    pub async fn get_album(&self, id: &AlbumId) -> Result<Album> {
        let inner = self.inner.read().await;
        inner
            .albums
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::album_not_found(id))
    }

    /// Every album, in insertion order.
    pub async fn albums(&self) -> Vec<Album> {
        let inner = self.inner.read().await;
        inner
            .album_order
            .iter()
            .filter_map(|id| inner.albums.get(id))
            .cloned()
            .collect()
    }

    /// Export the full catalog, insertion order preserved.
    pub async fn state(&self) -> CatalogState {
        let inner = self.inner.read().await;
        CatalogState {
            songs: inner
                .order
                .iter()
                .filter_map(|id| inner.songs.get(id))
                .cloned()
                .collect(),
            albums: inner
                .album_order
                .iter()
                .filter_map(|id| inner.albums.get(id))
                .cloned()
                .collect(),
        }
    }

    /// Rebuild a catalog from exported state.
    pub fn from_state(state: CatalogState) -> Result<Self> {
        let mut inner = CatalogInner::default();
        for entry in state.songs {
            entry.song.validate().map_err(|e| CatalogError::InvalidInput {
                field: "Song".to_string(),
                message: e,
            })?;
            let id = entry.song.id;
            if inner.songs.contains_key(&id) {
                return Err(CatalogError::Duplicate {
                    entity: "Song".to_string(),
                    key: id.to_string(),
                });
            }
            inner.song_keys.insert(entry.song.dedup_key());
            inner.order.push(id);
            inner.songs.insert(id, entry);
        }
        for album in state.albums {
            album.validate().map_err(|e| CatalogError::InvalidInput {
                field: "Album".to_string(),
                message: e,
            })?;
            let id = album.id;
            if inner.albums.contains_key(&id) {
                return Err(CatalogError::Duplicate {
                    entity: "Album".to_string(),
                    key: id.to_string(),
                });
            }
            for song_id in &album.song_ids {
                if !inner.songs.contains_key(song_id) {
                    return Err(CatalogError::song_not_found(song_id));
                }
            }
            inner.album_keys.insert(album.dedup_key());
            inner.album_order.push(id);
            inner.albums.insert(id, album);
        }
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }
}
