//! The assembled engine: one façade over the catalog, accounts, listening
//! history and playlists, plus whole-state snapshot import/export.
//!
//! Hosts construct one [`SpotifumCore`] and drive everything through it.
//! The façade owns the wiring (shared handles between components) and the
//! one cross-component rule the components cannot express alone: point
//! accrual on qualifying plays.

pub mod error;
pub mod logging;
pub mod snapshot;

pub use error::{CoreError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};

use chrono::{DateTime, Utc};
use core_accounts::{AccountStore, UserId};
use core_catalog::{Catalog, SongId};
use core_history::{PlayEvent, PlayLog, StatsAggregator};
use core_playlists::PlaylistEngine;
use std::sync::Arc;
use tracing::debug;

/// Primary façade exposed to host applications.
#[derive(Debug)]
pub struct SpotifumCore {
    catalog: Arc<Catalog>,
    accounts: Arc<AccountStore>,
    log: Arc<PlayLog>,
    playlists: PlaylistEngine,
    stats: StatsAggregator,
}

impl SpotifumCore {
    /// Create an empty engine.
    pub fn new() -> Self {
        let catalog = Arc::new(Catalog::new());
        let accounts = Arc::new(AccountStore::new());
        let log = Arc::new(PlayLog::new());
        let playlists = PlaylistEngine::new(catalog.clone(), accounts.clone(), log.clone());
        let stats = StatsAggregator::new(catalog.clone(), accounts.clone(), log.clone());
        Self {
            catalog,
            accounts,
            log,
            playlists,
            stats,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn log(&self) -> &PlayLog {
        &self.log
    }

    pub fn playlists(&self) -> &PlaylistEngine {
        &self.playlists
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    /// Record a play and apply point accrual when it qualifies.
    ///
    /// Skipped plays are logged but award nothing.
    pub async fn record_play(
        &self,
        user_id: &UserId,
        song_id: &SongId,
        listened_secs: u32,
    ) -> Result<PlayEvent> {
        self.record_play_at(user_id, song_id, listened_secs, Utc::now())
            .await
    }

    /// [`SpotifumCore::record_play`] with an explicit timestamp.
    pub async fn record_play_at(
        &self,
        user_id: &UserId,
        song_id: &SongId,
        listened_secs: u32,
        at: DateTime<Utc>,
    ) -> Result<PlayEvent> {
        let event = self
            .stats
            .record_play_at(user_id, song_id, listened_secs, at)
            .await?;
        if event.qualifies {
            let balance = self.accounts.award_points(user_id).await?;
            debug!(user_id = %user_id, balance, "Awarded play points");
        }
        Ok(event)
    }
}

impl Default for SpotifumCore {
    fn default() -> Self {
        Self::new()
    }
}
