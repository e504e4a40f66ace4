//! Playlist domain models.

use core_accounts::UserId;
use core_catalog::SongId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaylistId(pub Uuid);

impl PlaylistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaylistId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PlaylistId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// How a playlist was populated. A closed set: each variant maps to one
/// generation algorithm (or to none, for `Manual`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Assembled song by song by the owner.
    Manual,
    /// Uniform random draw from the (optionally genre-filtered) catalog.
    Random,
    /// The owner's most played songs.
    Favorites,
    /// One genre, ordered by the owner's play statistics.
    GenreBased,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Manual => "manual",
            GenerationMode::Random => "random",
            GenerationMode::Favorites => "favorites",
            GenerationMode::GenreBased => "genre_based",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manual" => Some(GenerationMode::Manual),
            "random" => Some(GenerationMode::Random),
            "favorites" => Some(GenerationMode::Favorites),
            "genre_based" | "genrebased" => Some(GenerationMode::GenreBased),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Playlist lifecycle.
///
/// # State transitions
///
/// ```text
/// Draft -> Active -> Tombstoned
///   |                    ^
///   +--------------------+
/// ```
///
/// Manual playlists start in `Draft` and become `Active` on save; generated
/// playlists are born `Active`. A deleted playlist is tombstoned: the id is
/// burnt and every later read or mutation answers not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistState {
    /// Being assembled; not saved yet.
    Draft,
    /// Saved and visible.
    Active,
    /// Deleted; the id rejects all further use.
    Tombstoned,
}

impl PlaylistState {
    /// Whether reads and mutations may still touch the playlist.
    pub fn is_live(&self) -> bool {
        !matches!(self, PlaylistState::Tombstoned)
    }
}

/// Seed parameters for [`crate::PlaylistEngine::create`], one variant per
/// generation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationSpec {
    /// Explicit song sequence.
    Manual { songs: Vec<SongId> },
    /// `size` distinct songs drawn uniformly, optionally from one genre.
    /// The optional seed makes the draw reproducible.
    Random {
        size: usize,
        genre: Option<String>,
        seed: Option<u64>,
    },
    /// The owner's top `size` songs by qualifying play count.
    Favorites { size: usize },
    /// Up to `size` songs of `genre`, ordered by the owner's play counts.
    GenreBased { genre: String, size: usize },
}

impl GenerationSpec {
    /// The mode tag this spec produces.
    pub fn mode(&self) -> GenerationMode {
        match self {
            GenerationSpec::Manual { .. } => GenerationMode::Manual,
            GenerationSpec::Random { .. } => GenerationMode::Random,
            GenerationSpec::Favorites { .. } => GenerationMode::Favorites,
            GenerationSpec::GenreBased { .. } => GenerationMode::GenreBased,
        }
    }
}

/// A playlist record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique identifier.
    pub id: PlaylistId,
    /// Owning user; `None` for system-generated playlists, which nobody may
    /// mutate.
    pub owner: Option<UserId>,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// How the playlist was populated.
    pub mode: GenerationMode,
    /// Lifecycle state.
    pub state: PlaylistState,
    /// When set, the song sequence rejects duplicate ids.
    pub unique: bool,
    /// Ordered song references. Duplicates allowed unless `unique`.
    pub song_ids: Vec<SongId>,
    /// Creation time (unix seconds).
    pub created_at: i64,
    /// Last mutation time (unix seconds).
    pub updated_at: i64,
}

impl Playlist {
    pub fn new(
        owner: Option<UserId>,
        name: impl Into<String>,
        mode: GenerationMode,
        state: PlaylistState,
        song_ids: Vec<SongId>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: PlaylistId::new(),
            owner,
            name: name.into(),
            description: None,
            mode,
            state,
            unique: false,
            song_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate playlist data.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Playlist name cannot be empty".to_string());
        }
        if self.unique {
            let mut seen = std::collections::HashSet::new();
            for id in &self.song_ids {
                if !seen.insert(id) {
                    return Err("Unique playlist contains duplicate songs".to_string());
                }
            }
        }
        Ok(())
    }

    /// Whether the caller owns this playlist.
    pub fn is_owned_by(&self, caller: &UserId) -> bool {
        self.owner == Some(*caller)
    }
}
