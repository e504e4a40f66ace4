//! On-demand aggregation over the play log.
//!
//! Rankings use one deterministic total order everywhere: qualifying play
//! count descending, then most-recent qualifying play descending, then song
//! id ascending. Repeated runs over the same log produce identical output.

use crate::error::{HistoryError, Result};
use crate::log::PlayLog;
use crate::models::{PlayEvent, RankScope, RankedSong};
use chrono::{DateTime, Utc};
use core_accounts::{AccountStore, User, UserId};
use core_catalog::{Catalog, Song, SongId};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Per-song aggregate derived from qualifying events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayStats {
    /// Number of qualifying plays.
    pub count: u64,
    /// Most recent qualifying play.
    pub last_played: DateTime<Utc>,
}

/// Fold a slice of events into per-song stats, skips excluded.
///
/// Pure; the playlist generation algorithms reuse it on per-user event
/// slices.
pub fn qualifying_stats(events: &[PlayEvent]) -> HashMap<SongId, PlayStats> {
    let mut stats: HashMap<SongId, PlayStats> = HashMap::new();
    for event in events.iter().filter(|e| e.qualifies) {
        stats
            .entry(event.song_id)
            .and_modify(|s| {
                s.count += 1;
                if event.recorded_at > s.last_played {
                    s.last_played = event.recorded_at;
                }
            })
            .or_insert(PlayStats {
                count: 1,
                last_played: event.recorded_at,
            });
    }
    stats
}

/// Records plays and answers statistics queries.
///
/// Holds shared handles to the catalog and account store for reference
/// validation; every aggregate is recomputed from the log when asked.
#[derive(Debug)]
pub struct StatsAggregator {
    catalog: Arc<Catalog>,
    accounts: Arc<AccountStore>,
    log: Arc<PlayLog>,
}

impl StatsAggregator {
    pub fn new(catalog: Arc<Catalog>, accounts: Arc<AccountStore>, log: Arc<PlayLog>) -> Self {
        Self {
            catalog,
            accounts,
            log,
        }
    }

    /// Record a play at the current time.
    pub async fn record_play(
        &self,
        user_id: &UserId,
        song_id: &SongId,
        listened_secs: u32,
    ) -> Result<PlayEvent> {
        self.record_play_at(user_id, song_id, listened_secs, Utc::now())
            .await
    }

    /// Record a play with an explicit timestamp (import/replay paths).
    ///
    /// Fails with a not-found error when the user is unknown or deactivated,
    /// or when the song is unknown or inactive. The skip policy is evaluated
    /// here and frozen into the event.
    pub async fn record_play_at(
        &self,
        user_id: &UserId,
        song_id: &SongId,
        listened_secs: u32,
        at: DateTime<Utc>,
    ) -> Result<PlayEvent> {
        let user = self.accounts.get(user_id).await?;
        if !user.active {
            return Err(HistoryError::NotFound {
                entity: "User".to_string(),
                id: user_id.to_string(),
            });
        }
        let song = self.catalog.get(song_id).await?;

        let event = PlayEvent::new(*user_id, *song_id, song.duration_secs, listened_secs, at);
        debug!(
            user_id = %user_id,
            song_id = %song_id,
            listened_secs,
            qualifies = event.qualifies,
            "Recorded play"
        );
        self.log.append(event.clone()).await;
        Ok(event)
    }

    /// Ranked songs inside the scope, at most `limit` rows.
    ///
    /// Songs removed from the catalog stay reportable here.
    pub async fn top_songs(&self, scope: RankScope, limit: usize) -> Vec<RankedSong> {
        let mut events: Vec<PlayEvent> = self
            .log
            .events()
            .await
            .into_iter()
            .filter(|e| e.qualifies)
            .collect();

        match &scope {
            RankScope::Global => {}
            RankScope::PerUser(user_id) => events.retain(|e| e.user_id == *user_id),
            RankScope::PerGenre(genre) => {
                let wanted = Song::normalize(genre);
                let mut genre_of: HashMap<SongId, String> = HashMap::new();
                for event in &events {
                    if !genre_of.contains_key(&event.song_id) {
                        if let Some(song) = self.catalog.get_any(&event.song_id).await {
                            genre_of.insert(event.song_id, Song::normalize(&song.genre));
                        }
                    }
                }
                events.retain(|e| genre_of.get(&e.song_id) == Some(&wanted));
            }
        }

        let stats = qualifying_stats(&events);
        let mut ranked = Vec::with_capacity(stats.len());
        for (song_id, s) in stats {
            if let Some(song) = self.catalog.get_any(&song_id).await {
                ranked.push(RankedSong {
                    song,
                    play_count: s.count,
                    last_played: s.last_played,
                });
            }
        }
        ranked.sort_by(|a, b| {
            b.play_count
                .cmp(&a.play_count)
                .then_with(|| b.last_played.cmp(&a.last_played))
                .then_with(|| a.song.id.cmp(&b.song.id))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Recommend up to `limit` active songs the user has never played.
    ///
    /// Favorite genres (by the user's qualifying play counts) come first;
    /// when they cannot fill the limit the remaining genres follow. Within a
    /// tier candidates are ordered by global play count, then recency, then
    /// id. A known user without qualifying history gets an empty list, not
    /// an error; an unknown user is a not-found failure.
    pub async fn recommend(&self, user_id: &UserId, limit: usize) -> Result<Vec<Song>> {
        self.accounts.get(user_id).await?;

        let user_events = self.log.events_for_user(user_id).await;
        let user_stats = qualifying_stats(&user_events);
        if user_stats.is_empty() {
            return Ok(Vec::new());
        }

        // Any recorded event marks a song as heard, skips included.
        let played: HashSet<SongId> = user_events.iter().map(|e| e.song_id).collect();

        let mut genre_counts: HashMap<String, u64> = HashMap::new();
        for (song_id, stats) in &user_stats {
            if let Some(song) = self.catalog.get_any(song_id).await {
                *genre_counts
                    .entry(Song::normalize(&song.genre))
                    .or_default() += stats.count;
            }
        }
        let mut genres: Vec<(String, u64)> = genre_counts.into_iter().collect();
        genres.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let genre_rank: HashMap<String, usize> = genres
            .into_iter()
            .enumerate()
            .map(|(rank, (genre, _))| (genre, rank))
            .collect();

        let global = qualifying_stats(&self.log.events().await);

        let mut candidates: Vec<Song> = self
            .catalog
            .active_songs()
            .await
            .into_iter()
            .filter(|song| !played.contains(&song.id))
            .collect();
        candidates.sort_by_key(|song| {
            let tier = genre_rank
                .get(&Song::normalize(&song.genre))
                .copied()
                .unwrap_or(usize::MAX);
            let stats = global.get(&song.id);
            (
                tier,
                Reverse(stats.map(|s| s.count).unwrap_or(0)),
                Reverse(stats.map(|s| s.last_played)),
                song.id,
            )
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    /// Artists ranked by qualifying plays: count descending, name ascending.
    pub async fn top_artists(&self, limit: usize) -> Vec<(String, u64)> {
        let events = self.log.events().await;
        let mut counts: HashMap<String, (String, u64)> = HashMap::new();
        for event in events.iter().filter(|e| e.qualifies) {
            if let Some(song) = self.catalog.get_any(&event.song_id).await {
                let entry = counts
                    .entry(Song::normalize(&song.artist))
                    .or_insert((song.artist.clone(), 0));
                entry.1 += 1;
            }
        }
        let mut ranked: Vec<(String, u64)> = counts.into_values().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// The user with the most qualifying plays, with the count. Ties break
    /// on user id so the answer is stable.
    pub async fn top_listener(&self) -> Option<(User, u64)> {
        let events = self.log.events().await;
        let mut counts: HashMap<UserId, u64> = HashMap::new();
        for event in events.iter().filter(|e| e.qualifies) {
            *counts.entry(event.user_id).or_default() += 1;
        }

        let mut ranked: Vec<(UserId, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (user_id, count) in ranked {
            if let Ok(user) = self.accounts.get(&user_id).await {
                return Some((user, count));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_accounts::SubscriptionPlan;

    struct Fixture {
        catalog: Arc<Catalog>,
        accounts: Arc<AccountStore>,
        log: Arc<PlayLog>,
        stats: StatsAggregator,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(Catalog::new());
        let accounts = Arc::new(AccountStore::new());
        let log = Arc::new(PlayLog::new());
        let stats = StatsAggregator::new(catalog.clone(), accounts.clone(), log.clone());
        Fixture {
            catalog,
            accounts,
            log,
            stats,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    async fn add_song(fx: &Fixture, title: &str, genre: &str) -> SongId {
        fx.catalog
            .add_song(Song::new(title, "Artist", genre, 100))
            .await
            .unwrap()
    }

    async fn play(fx: &Fixture, user: &UserId, song: &SongId, n: usize, base_secs: i64) {
        for i in 0..n {
            fx.stats
                .record_play_at(user, song, 100, at(base_secs + i as i64))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_record_play_validates_references() {
        let fx = fixture();
        let user = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let song = add_song(&fx, "Track", "rock").await;

        assert!(fx.stats.record_play(&user, &song, 80).await.is_ok());

        // Unknown song, inactive song, unknown user, deactivated user.
        assert!(fx
            .stats
            .record_play(&user, &SongId::new(), 80)
            .await
            .is_err());
        fx.catalog.remove(&song).await.unwrap();
        assert!(fx.stats.record_play(&user, &song, 80).await.is_err());
        assert!(fx
            .stats
            .record_play(&UserId::new(), &song, 80)
            .await
            .is_err());
        fx.accounts.deactivate(&user).await.unwrap();
        assert!(fx.stats.record_play(&user, &song, 80).await.is_err());
    }

    #[tokio::test]
    async fn test_skips_are_logged_but_not_counted() {
        let fx = fixture();
        let user = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let song = add_song(&fx, "Track", "rock").await;

        fx.stats
            .record_play_at(&user, &song, 10, at(0))
            .await
            .unwrap();

        assert_eq!(fx.log.len().await, 1);
        assert!(fx.stats.top_songs(RankScope::Global, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_top_songs_ranks_by_qualifying_count() {
        // A(count=3, rock), B(count=5, rock), C(count=1, jazz)
        // => topSongs(Global, 2) == [B, A]
        let fx = fixture();
        let user = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let a = add_song(&fx, "A", "rock").await;
        let b = add_song(&fx, "B", "rock").await;
        let c = add_song(&fx, "C", "jazz").await;

        play(&fx, &user, &a, 3, 0).await;
        play(&fx, &user, &b, 5, 100).await;
        play(&fx, &user, &c, 1, 200).await;

        let top = fx.stats.top_songs(RankScope::Global, 2).await;
        assert_eq!(
            top.iter().map(|r| r.song.id).collect::<Vec<_>>(),
            vec![b, a]
        );
        assert_eq!(top[0].play_count, 5);
        assert_eq!(top[1].play_count, 3);
    }

    #[tokio::test]
    async fn test_top_songs_tie_breaks_are_deterministic() {
        let fx = fixture();
        let user = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let x = add_song(&fx, "X", "rock").await;
        let y = add_song(&fx, "Y", "rock").await;
        let z = add_song(&fx, "Z", "rock").await;

        // Equal counts; y played more recently than x.
        play(&fx, &user, &x, 2, 0).await;
        play(&fx, &user, &y, 2, 50).await;
        // z ties with nothing: one play only.
        play(&fx, &user, &z, 1, 10).await;

        let top = fx.stats.top_songs(RankScope::Global, 10).await;
        assert_eq!(
            top.iter().map(|r| r.song.id).collect::<Vec<_>>(),
            vec![y, x, z]
        );

        // Equal count and equal timestamp: lower id wins.
        let p = add_song(&fx, "P", "jazz").await;
        let q = add_song(&fx, "Q", "jazz").await;
        fx.stats
            .record_play_at(&user, &p, 100, at(500))
            .await
            .unwrap();
        fx.stats
            .record_play_at(&user, &q, 100, at(500))
            .await
            .unwrap();

        let jazz = fx
            .stats
            .top_songs(RankScope::PerGenre("jazz".to_string()), 10)
            .await;
        let expected_first = if p < q { p } else { q };
        assert_eq!(jazz[0].song.id, expected_first);
        assert_eq!(jazz.len(), 2);
    }

    #[tokio::test]
    async fn test_top_songs_scopes() {
        let fx = fixture();
        let ana = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let rui = fx
            .accounts
            .register("rui", SubscriptionPlan::Free)
            .await
            .unwrap();
        let rock = add_song(&fx, "R", "rock").await;
        let jazz = add_song(&fx, "J", "jazz").await;

        play(&fx, &ana, &rock, 2, 0).await;
        play(&fx, &rui, &jazz, 3, 100).await;

        let per_user = fx.stats.top_songs(RankScope::PerUser(ana), 10).await;
        assert_eq!(per_user.len(), 1);
        assert_eq!(per_user[0].song.id, rock);

        let per_genre = fx
            .stats
            .top_songs(RankScope::PerGenre("JAZZ".to_string()), 10)
            .await;
        assert_eq!(per_genre.len(), 1);
        assert_eq!(per_genre[0].song.id, jazz);
    }

    #[tokio::test]
    async fn test_removed_songs_stay_reportable() {
        let fx = fixture();
        let user = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let song = add_song(&fx, "Retired", "rock").await;
        play(&fx, &user, &song, 2, 0).await;

        fx.catalog.remove(&song).await.unwrap();

        let top = fx.stats.top_songs(RankScope::Global, 10).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].song.title, "Retired");
    }

    #[tokio::test]
    async fn test_recommend_falls_back_to_other_genres() {
        // User has only jazz history; the unplayed songs are rock, and they
        // are recommended ranked by global play count.
        let fx = fixture();
        let ana = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let rui = fx
            .accounts
            .register("rui", SubscriptionPlan::Free)
            .await
            .unwrap();
        let a = add_song(&fx, "A", "rock").await;
        let b = add_song(&fx, "B", "rock").await;
        let c = add_song(&fx, "C", "jazz").await;

        play(&fx, &rui, &a, 3, 0).await;
        play(&fx, &rui, &b, 5, 100).await;
        play(&fx, &ana, &c, 1, 200).await;

        let recs = fx.stats.recommend(&ana, 2).await.unwrap();
        assert_eq!(recs.iter().map(|s| s.id).collect::<Vec<_>>(), vec![b, a]);
    }

    #[tokio::test]
    async fn test_recommend_prefers_favorite_genres() {
        let fx = fixture();
        let ana = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let played_rock = add_song(&fx, "Played Rock", "rock").await;
        let fresh_rock = add_song(&fx, "Fresh Rock", "rock").await;
        let fresh_jazz = add_song(&fx, "Fresh Jazz", "jazz").await;

        play(&fx, &ana, &played_rock, 3, 0).await;

        let recs = fx.stats.recommend(&ana, 10).await.unwrap();
        // Rock first (favorite genre), jazz as fallback, played song excluded.
        assert_eq!(
            recs.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![fresh_rock, fresh_jazz]
        );
    }

    #[tokio::test]
    async fn test_recommend_no_history_is_empty_not_error() {
        let fx = fixture();
        let ana = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        add_song(&fx, "Anything", "rock").await;

        assert!(fx.stats.recommend(&ana, 5).await.unwrap().is_empty());

        // Unknown user is a failure, not an empty list.
        assert!(fx.stats.recommend(&UserId::new(), 5).await.is_err());
    }

    #[tokio::test]
    async fn test_top_artists_and_top_listener() {
        let fx = fixture();
        let ana = fx
            .accounts
            .register("ana", SubscriptionPlan::Free)
            .await
            .unwrap();
        let rui = fx
            .accounts
            .register("rui", SubscriptionPlan::Free)
            .await
            .unwrap();
        let hendrix = fx
            .catalog
            .add_song(Song::new("Voodoo Child", "Jimi Hendrix", "rock", 100))
            .await
            .unwrap();
        let coltrane = fx
            .catalog
            .add_song(Song::new("Giant Steps", "John Coltrane", "jazz", 100))
            .await
            .unwrap();

        play(&fx, &ana, &hendrix, 3, 0).await;
        play(&fx, &rui, &coltrane, 1, 100).await;

        let artists = fx.stats.top_artists(10).await;
        assert_eq!(
            artists,
            vec![
                ("Jimi Hendrix".to_string(), 3),
                ("John Coltrane".to_string(), 1)
            ]
        );

        let (listener, count) = fx.stats.top_listener().await.unwrap();
        assert_eq!(listener.id, ana);
        assert_eq!(count, 3);
    }
}
