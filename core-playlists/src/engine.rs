//! The playlist store and its mutation rules.
//!
//! Every playlist lives here behind one read/write lock. The engine
//! validates references against the catalog and account store, enforces
//! ownership and plan quotas, and routes generated playlists through the
//! pure algorithms in [`crate::generate`].

use crate::error::{PlaylistError, Result};
use crate::generate::{order_by_plays, pick_random};
use crate::models::{GenerationSpec, Playlist, PlaylistId, PlaylistState};
use core_accounts::{max_playlists, AccountStore, UserId};
use core_catalog::{Catalog, Song, SongFilter, SongId};
use core_history::{qualifying_stats, PlayLog};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Serializable snapshot of every playlist, tombstones included, in
/// creation order. Tombstones are kept so that reimported stores keep
/// rejecting burnt ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistStoreState {
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Default)]
struct EngineInner {
    playlists: HashMap<PlaylistId, Playlist>,
    /// Creation order of playlist ids, tombstones included.
    order: Vec<PlaylistId>,
    /// Live playlists per owner; drives quota checks.
    by_owner: HashMap<UserId, BTreeSet<PlaylistId>>,
}

/// Owns every playlist and enforces the mutation rules.
#[derive(Debug)]
pub struct PlaylistEngine {
    catalog: Arc<Catalog>,
    accounts: Arc<AccountStore>,
    log: Arc<PlayLog>,
    inner: RwLock<EngineInner>,
}

impl PlaylistEngine {
    pub fn new(catalog: Arc<Catalog>, accounts: Arc<AccountStore>, log: Arc<PlayLog>) -> Self {
        Self {
            catalog,
            accounts,
            log,
            inner: RwLock::new(EngineInner::default()),
        }
    }

    /// Create a playlist for `owner` from the generation spec.
    ///
    /// Manual playlists start in `Draft`; generated ones are born `Active`.
    /// Fails when the owner is unknown or deactivated, when the owner's plan
    /// quota is already full, or when the spec cannot be satisfied.
    pub async fn create(
        &self,
        owner: &UserId,
        name: &str,
        spec: GenerationSpec,
    ) -> Result<PlaylistId> {
        let user = self.accounts.get(owner).await?;
        if !user.active {
            return Err(PlaylistError::NotFound {
                entity: "User".to_string(),
                id: owner.to_string(),
            });
        }

        let mut inner = self.inner.write().await;
        if let Some(max) = max_playlists(user.plan) {
            let live = inner.by_owner.get(owner).map(|s| s.len()).unwrap_or(0);
            if live >= max {
                return Err(PlaylistError::QuotaExceeded {
                    plan: user.plan.as_str().to_string(),
                    max,
                });
            }
        }

        let mode = spec.mode();
        let (song_ids, state) = match spec {
            GenerationSpec::Manual { songs } => {
                for id in &songs {
                    self.catalog.get(id).await?;
                }
                (songs, PlaylistState::Draft)
            }
            GenerationSpec::Random { size, genre, seed } => {
                let songs = self.pick_random_songs(size, genre.as_deref(), seed).await?;
                (songs, PlaylistState::Active)
            }
            GenerationSpec::Favorites { size } => {
                let events = self.log.events_for_user(owner).await;
                let stats = qualifying_stats(&events);
                let mut candidates = self.catalog.active_songs().await;
                candidates.retain(|song| stats.contains_key(&song.id));
                let mut songs = order_by_plays(candidates, &stats);
                songs.truncate(size);
                (songs, PlaylistState::Active)
            }
            GenerationSpec::GenreBased { genre, size } => {
                if genre.trim().is_empty() {
                    return Err(PlaylistError::InvalidInput {
                        field: "genre".to_string(),
                        message: "Genre cannot be empty".to_string(),
                    });
                }
                let events = self.log.events_for_user(owner).await;
                let stats = qualifying_stats(&events);
                let candidates = self
                    .catalog
                    .search(&SongFilter::new().genre(genre.clone()))
                    .await;
                let mut songs = order_by_plays(candidates, &stats);
                songs.truncate(size);
                (songs, PlaylistState::Active)
            }
        };

        let playlist = Playlist::new(Some(*owner), name, mode, state, song_ids);
        playlist.validate().map_err(|e| PlaylistError::InvalidInput {
            field: "Playlist".to_string(),
            message: e,
        })?;

        let id = playlist.id;
        debug!(playlist_id = %id, owner = %owner, mode = %mode, "Created playlist");
        inner.by_owner.entry(*owner).or_default().insert(id);
        inner.order.push(id);
        inner.playlists.insert(id, playlist);
        Ok(id)
    }

    /// Create an ownerless system playlist. Only `Manual` and `Random` specs
    /// are accepted; per-user modes have no history to draw from. System
    /// playlists are born `Active`, never count against any quota, and no
    /// caller can mutate them.
    pub async fn create_system(&self, name: &str, spec: GenerationSpec) -> Result<PlaylistId> {
        let mode = spec.mode();
        let song_ids = match spec {
            GenerationSpec::Manual { songs } => {
                for id in &songs {
                    self.catalog.get(id).await?;
                }
                songs
            }
            GenerationSpec::Random { size, genre, seed } => {
                self.pick_random_songs(size, genre.as_deref(), seed).await?
            }
            GenerationSpec::Favorites { .. } | GenerationSpec::GenreBased { .. } => {
                return Err(PlaylistError::InvalidInput {
                    field: "spec".to_string(),
                    message: "System playlists cannot use per-user generation".to_string(),
                });
            }
        };

        let playlist = Playlist::new(None, name, mode, PlaylistState::Active, song_ids);
        playlist.validate().map_err(|e| PlaylistError::InvalidInput {
            field: "Playlist".to_string(),
            message: e,
        })?;

        let id = playlist.id;
        debug!(playlist_id = %id, mode = %mode, "Created system playlist");
        let mut inner = self.inner.write().await;
        inner.order.push(id);
        inner.playlists.insert(id, playlist);
        Ok(id)
    }

    async fn pick_random_songs(
        &self,
        size: usize,
        genre: Option<&str>,
        seed: Option<u64>,
    ) -> Result<Vec<SongId>> {
        let pool: Vec<SongId> = match genre {
            Some(genre) => self
                .catalog
                .search(&SongFilter::new().genre(genre))
                .await
                .into_iter()
                .map(|s| s.id)
                .collect(),
            None => self
                .catalog
                .active_songs()
                .await
                .into_iter()
                .map(|s| s.id)
                .collect(),
        };
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        pick_random(&pool, size, &mut rng)
    }

    /// Fetch a live playlist. Tombstoned ids answer not-found.
    pub async fn get(&self, id: &PlaylistId) -> Result<Playlist> {
        let inner = self.inner.read().await;
        Self::live(&inner, id).cloned()
    }

    /// Promote a draft to active. Already-active playlists are left as is.
    pub async fn save(&self, id: &PlaylistId, caller: &UserId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let playlist = Self::live_mut(&mut inner, id)?;
        Self::authorize(playlist, caller)?;
        if playlist.state == PlaylistState::Draft {
            playlist.state = PlaylistState::Active;
            playlist.updated_at = chrono::Utc::now().timestamp();
            debug!(playlist_id = %id, "Saved playlist");
        }
        Ok(())
    }

    /// Append a song. The song must be active in the catalog; unique
    /// playlists reject ids they already contain.
    pub async fn add_song(
        &self,
        id: &PlaylistId,
        caller: &UserId,
        song_id: &SongId,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        {
            let playlist = Self::live(&inner, id)?;
            Self::authorize(playlist, caller)?;
        }
        self.catalog.get(song_id).await?;

        let playlist = Self::live_mut(&mut inner, id)?;
        if playlist.unique && playlist.song_ids.contains(song_id) {
            return Err(PlaylistError::DuplicateSong {
                song: song_id.to_string(),
                playlist: id.to_string(),
            });
        }
        playlist.song_ids.push(*song_id);
        playlist.updated_at = chrono::Utc::now().timestamp();
        debug!(playlist_id = %id, song_id = %song_id, "Added song to playlist");
        Ok(())
    }

    /// Remove the first occurrence of the song.
    pub async fn remove_song(
        &self,
        id: &PlaylistId,
        caller: &UserId,
        song_id: &SongId,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let playlist = Self::live_mut(&mut inner, id)?;
        Self::authorize(playlist, caller)?;

        let position = playlist
            .song_ids
            .iter()
            .position(|s| s == song_id)
            .ok_or_else(|| PlaylistError::NotFound {
                entity: "Song".to_string(),
                id: song_id.to_string(),
            })?;
        playlist.song_ids.remove(position);
        playlist.updated_at = chrono::Utc::now().timestamp();
        debug!(playlist_id = %id, song_id = %song_id, "Removed song from playlist");
        Ok(())
    }

    /// Replace the song order. The new sequence must be a permutation of the
    /// current one, multiplicities included.
    pub async fn reorder(
        &self,
        id: &PlaylistId,
        caller: &UserId,
        new_order: Vec<SongId>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let playlist = Self::live_mut(&mut inner, id)?;
        Self::authorize(playlist, caller)?;

        let mut current = playlist.song_ids.clone();
        let mut proposed = new_order.clone();
        current.sort();
        proposed.sort();
        if current != proposed {
            return Err(PlaylistError::InvalidInput {
                field: "order".to_string(),
                message: "New order must be a permutation of the current songs".to_string(),
            });
        }
        playlist.song_ids = new_order;
        playlist.updated_at = chrono::Utc::now().timestamp();
        Ok(())
    }

    /// Toggle the uniqueness constraint. Enabling it on a playlist that
    /// already holds duplicates is rejected.
    pub async fn set_unique(&self, id: &PlaylistId, caller: &UserId, unique: bool) -> Result<()> {
        let mut inner = self.inner.write().await;
        let playlist = Self::live_mut(&mut inner, id)?;
        Self::authorize(playlist, caller)?;

        if unique {
            let mut seen = HashSet::new();
            if let Some(dup) = playlist.song_ids.iter().find(|s| !seen.insert(**s)) {
                return Err(PlaylistError::InvalidInput {
                    field: "unique".to_string(),
                    message: format!("Playlist already contains song {} more than once", dup),
                });
            }
        }
        playlist.unique = unique;
        playlist.updated_at = chrono::Utc::now().timestamp();
        Ok(())
    }

    /// Tombstone the playlist. The id is burnt: it never resolves again and
    /// is never reissued, but the record survives in exported state.
    pub async fn delete(&self, id: &PlaylistId, caller: &UserId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let playlist = Self::live_mut(&mut inner, id)?;
        Self::authorize(playlist, caller)?;

        playlist.state = PlaylistState::Tombstoned;
        playlist.updated_at = chrono::Utc::now().timestamp();
        let owner = playlist.owner;
        if let Some(owner) = owner {
            if let Some(set) = inner.by_owner.get_mut(&owner) {
                set.remove(id);
            }
        }
        debug!(playlist_id = %id, "Deleted playlist");
        Ok(())
    }

    /// Resolve the playlist's songs against the catalog. Songs retired from
    /// the catalog since they were added are silently skipped.
    pub async fn songs(&self, id: &PlaylistId) -> Result<Vec<Song>> {
        let playlist = self.get(id).await?;
        let mut songs = Vec::with_capacity(playlist.song_ids.len());
        for song_id in &playlist.song_ids {
            if let Ok(song) = self.catalog.get(song_id).await {
                songs.push(song);
            }
        }
        Ok(songs)
    }

    /// Live playlists owned by the user, in creation order.
    pub async fn playlists_of(&self, owner: &UserId) -> Vec<Playlist> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.playlists.get(id))
            .filter(|p| p.state.is_live() && p.owner == Some(*owner))
            .cloned()
            .collect()
    }

    /// Number of live playlists owned by the user.
    pub async fn live_count(&self, owner: &UserId) -> usize {
        let inner = self.inner.read().await;
        inner.by_owner.get(owner).map(|s| s.len()).unwrap_or(0)
    }

    /// Export every playlist, tombstones included, in creation order.
    pub async fn state(&self) -> PlaylistStoreState {
        let inner = self.inner.read().await;
        PlaylistStoreState {
            playlists: inner
                .order
                .iter()
                .filter_map(|id| inner.playlists.get(id))
                .cloned()
                .collect(),
        }
    }

    /// Rebuild an engine from exported state.
    pub fn from_state(
        catalog: Arc<Catalog>,
        accounts: Arc<AccountStore>,
        log: Arc<PlayLog>,
        state: PlaylistStoreState,
    ) -> Self {
        let mut inner = EngineInner::default();
        for playlist in state.playlists {
            if playlist.state.is_live() {
                if let Some(owner) = playlist.owner {
                    inner.by_owner.entry(owner).or_default().insert(playlist.id);
                }
            }
            inner.order.push(playlist.id);
            inner.playlists.insert(playlist.id, playlist);
        }
        Self {
            catalog,
            accounts,
            log,
            inner: RwLock::new(inner),
        }
    }

    fn live<'a>(inner: &'a EngineInner, id: &PlaylistId) -> Result<&'a Playlist> {
        match inner.playlists.get(id) {
            Some(p) if p.state.is_live() => Ok(p),
            _ => Err(PlaylistError::NotFound {
                entity: "Playlist".to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn live_mut<'a>(inner: &'a mut EngineInner, id: &PlaylistId) -> Result<&'a mut Playlist> {
        match inner.playlists.get_mut(id) {
            Some(p) if p.state.is_live() => Ok(p),
            _ => Err(PlaylistError::NotFound {
                entity: "Playlist".to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn authorize(playlist: &Playlist, caller: &UserId) -> Result<()> {
        if playlist.is_owned_by(caller) {
            Ok(())
        } else {
            Err(PlaylistError::Permission {
                user: caller.to_string(),
                playlist: playlist.id.to_string(),
            })
        }
    }
}
