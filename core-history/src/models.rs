//! Play event and ranking types.

use chrono::{DateTime, Utc};
use core_accounts::UserId;
use core_catalog::{Song, SongId};
use serde::{Deserialize, Serialize};

/// Fraction of a song's duration that must be listened for the play to count
/// toward statistics. Anything below is recorded as a skip.
pub const MIN_LISTEN_RATIO: f64 = 0.5;

/// One listening record. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    /// Who listened.
    pub user_id: UserId,
    /// What was played.
    pub song_id: SongId,
    /// When the play was recorded (UTC).
    pub recorded_at: DateTime<Utc>,
    /// Seconds actually listened.
    pub listened_secs: u32,
    /// Whether the play met [`MIN_LISTEN_RATIO`] against the song duration,
    /// evaluated at record time.
    pub qualifies: bool,
}

impl PlayEvent {
    /// Build an event, evaluating the skip policy against the song duration.
    pub fn new(
        user_id: UserId,
        song_id: SongId,
        duration_secs: u32,
        listened_secs: u32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        let qualifies = f64::from(listened_secs) >= f64::from(duration_secs) * MIN_LISTEN_RATIO;
        Self {
            user_id,
            song_id,
            recorded_at,
            listened_secs,
            qualifies,
        }
    }
}

/// Scope of a [`crate::StatsAggregator::top_songs`] ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RankScope {
    /// Across every user.
    Global,
    /// Restricted to one user's plays.
    PerUser(UserId),
    /// Restricted to one genre (matched case-insensitively).
    PerGenre(String),
}

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSong {
    /// The ranked song (possibly no longer active in the catalog; history
    /// keeps reporting it).
    pub song: Song,
    /// Qualifying plays inside the scope.
    pub play_count: u64,
    /// Most recent qualifying play inside the scope.
    pub last_played: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_policy_boundary() {
        let user = UserId::new();
        let song = SongId::new();
        let now = Utc::now();

        // Exactly half qualifies.
        assert!(PlayEvent::new(user, song, 200, 100, now).qualifies);
        assert!(!PlayEvent::new(user, song, 200, 99, now).qualifies);
        // Odd duration: 101 of 201 seconds is above half, 100 is below.
        assert!(PlayEvent::new(user, song, 201, 101, now).qualifies);
        assert!(!PlayEvent::new(user, song, 201, 100, now).qualifies);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = PlayEvent::new(UserId::new(), SongId::new(), 180, 180, Utc::now());
        let json = serde_json::to_string(&event).unwrap();
        let back: PlayEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
