//! Whole-state snapshots.
//!
//! A snapshot captures every store in one serializable document: catalog
//! entries (inactive included), accounts, playlists (tombstones included)
//! and the raw play event log. Aggregates are never persisted; an imported
//! engine recomputes them from the log.

use crate::error::{CoreError, Result};
use crate::SpotifumCore;
use core_accounts::{AccountState, AccountStore};
use core_catalog::{Catalog, CatalogState};
use core_history::{PlayEvent, PlayLog, PlayLogState, StatsAggregator};
use core_playlists::{PlaylistEngine, PlaylistStoreState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Current snapshot document version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One serializable document holding the full engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Document version; imports reject anything but [`SNAPSHOT_VERSION`].
    pub version: u32,
    pub catalog: CatalogState,
    pub accounts: AccountState,
    pub playlists: PlaylistStoreState,
    /// Raw play events, in append order.
    pub events: Vec<PlayEvent>,
}

impl SpotifumCore {
    /// Capture the full engine state.
    pub async fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            catalog: self.catalog().state().await,
            accounts: self.accounts().state().await,
            playlists: self.playlists().state().await,
            events: self.log().events().await,
        }
    }

    /// Rebuild an engine from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CoreError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let catalog = Arc::new(Catalog::from_state(snapshot.catalog)?);
        let accounts = Arc::new(AccountStore::from_state(snapshot.accounts)?);
        let log = Arc::new(PlayLog::from_state(PlayLogState {
            events: snapshot.events,
        }));
        let playlists = PlaylistEngine::from_state(
            catalog.clone(),
            accounts.clone(),
            log.clone(),
            snapshot.playlists,
        );
        let stats = StatsAggregator::new(catalog.clone(), accounts.clone(), log.clone());
        Ok(Self {
            catalog,
            accounts,
            log,
            playlists,
            stats,
        })
    }

    /// Serialize the engine state to pretty JSON.
    pub async fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_snapshot().await)?)
    }

    /// Rebuild an engine from JSON produced by [`SpotifumCore::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    /// Write the engine state to a JSON file.
    pub async fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json().await?;
        tokio::fs::write(path, json).await?;
        debug!(path = %path.display(), "Saved snapshot");
        Ok(())
    }

    /// Rebuild an engine from a JSON file.
    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), "Loaded snapshot");
        Self::from_json(&json)
    }
}
