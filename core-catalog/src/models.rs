//! Domain models for the catalog.
//!
//! Songs and albums are immutable once added: the catalog never edits them in
//! place, it only flips the active flag on removal.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a song.
///
/// Ids are opaque and assigned at catalog insertion. They are totally
/// ordered, which the ranking tie-breaks rely on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SongId(pub Uuid);

impl SongId {
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

impl Default for SongId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SongId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique identifier for an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumId(pub Uuid);

impl AlbumId {
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

impl Default for AlbumId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AlbumId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A song in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Unique identifier, assigned at construction.
    pub id: SongId,
    /// Song title.
    pub title: String,
    /// Performing artist.
    pub artist: String,
    /// Music genre.
    pub genre: String,
    /// Duration in seconds. Always positive.
    pub duration_secs: u32,
    /// Publisher, when known.
    pub publisher: Option<String>,
    /// Whether the song carries explicit content.
    pub explicit: bool,
    /// When the song was added (unix seconds).
    pub created_at: i64,
}

impl Song {
    /// Create a new song with a fresh id.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        genre: impl Into<String>,
        duration_secs: u32,
    ) -> Self {
        Self {
            id: SongId::new(),
            title: title.into(),
            artist: artist.into(),
            genre: genre.into(),
            duration_secs,
            publisher: None,
            explicit: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Validate song data.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Song title cannot be empty".to_string());
        }

        if self.artist.trim().is_empty() {
            return Err("Song artist cannot be empty".to_string());
        }

        if self.duration_secs == 0 {
            return Err("Song duration must be positive".to_string());
        }

        Ok(())
    }

    /// Normalize a string for matching (lowercase, trimmed).
    pub fn normalize(s: &str) -> String {
        s.trim().to_lowercase()
    }

    /// Deduplication key: normalized (title, artist).
    pub fn dedup_key(&self) -> (String, String) {
        (Self::normalize(&self.title), Self::normalize(&self.artist))
    }
}

/// An ordered grouping of songs.
///
/// Every referenced song id must exist in the catalog when the album is
/// added; later song removals do not unwind albums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Unique identifier.
    pub id: AlbumId,
    /// Album title.
    pub title: String,
    /// Album artist.
    pub artist: String,
    /// Release year, when known.
    pub year: Option<i32>,
    /// Track ids in album order.
    pub song_ids: Vec<SongId>,
    /// When the album was added (unix seconds).
    pub created_at: i64,
}

impl Album {
    /// Create a new album with a fresh id.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        song_ids: Vec<SongId>,
    ) -> Self {
        Self {
            id: AlbumId::new(),
            title: title.into(),
            artist: artist.into(),
            year: None,
            song_ids,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Validate album data.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Album title cannot be empty".to_string());
        }

        if self.artist.trim().is_empty() {
            return Err("Album artist cannot be empty".to_string());
        }

        if let Some(year) = self.year {
            if !(1900..=2100).contains(&year) {
                return Err(format!("Album year {} is out of valid range", year));
            }
        }

        Ok(())
    }

    /// Deduplication key: normalized (title, artist).
    pub fn dedup_key(&self) -> (String, String) {
        (Song::normalize(&self.title), Song::normalize(&self.artist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_new() {
        let song = Song::new("Halo", "Beyonce", "pop", 261);
        assert_eq!(song.title, "Halo");
        assert_eq!(song.artist, "Beyonce");
        assert_eq!(song.genre, "pop");
        assert_eq!(song.duration_secs, 261);
        assert!(!song.explicit);
        assert!(song.created_at > 0);
    }

    #[test]
    fn test_song_validation() {
        let mut song = Song::new("Valid", "Artist", "rock", 180);
        assert!(song.validate().is_ok());

        song.title = "   ".to_string();
        assert!(song.validate().is_err());

        song.title = "Valid".to_string();
        song.artist = "".to_string();
        assert!(song.validate().is_err());

        song.artist = "Artist".to_string();
        song.duration_secs = 0;
        assert!(song.validate().is_err());
    }

    #[test]
    fn test_song_dedup_key_is_case_insensitive() {
        let a = Song::new("  Hey Jude ", "The Beatles", "rock", 431);
        let b = Song::new("hey jude", "the beatles", "pop", 300);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_album_validation() {
        let mut album = Album::new("Abbey Road", "The Beatles", vec![]);
        assert!(album.validate().is_ok());

        album.year = Some(1969);
        assert!(album.validate().is_ok());

        album.year = Some(1500);
        assert!(album.validate().is_err());

        album.year = None;
        album.title = "".to_string();
        assert!(album.validate().is_err());
    }

    #[test]
    fn test_song_id_display_and_parse() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = SongId::from_string(uuid_str).unwrap();
        assert_eq!(id.to_string(), uuid_str);
        assert!(SongId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_song_id_ordering_is_total() {
        let mut ids: Vec<SongId> = (0..8).map(|_| SongId::new()).collect();
        ids.sort();
        for pair in ids.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_song_serialization_roundtrip() {
        let song = Song::new("Clair de Lune", "Debussy", "classical", 290);
        let json = serde_json::to_string(&song).unwrap();
        let back: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(song, back);
    }
}
