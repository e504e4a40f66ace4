//! The append-only play event log.

use crate::models::PlayEvent;
use core_accounts::UserId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Serializable snapshot of the log, in append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayLogState {
    pub events: Vec<PlayEvent>,
}

/// Append-only log of [`PlayEvent`]s. Events are never mutated or removed;
/// every aggregate is derived by replaying the log.
#[derive(Debug, Default)]
pub struct PlayLog {
    inner: RwLock<Vec<PlayEvent>>,
}

impl PlayLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event.
    pub async fn append(&self, event: PlayEvent) {
        self.inner.write().await.push(event);
    }

    /// Every event, in append order.
    pub async fn events(&self) -> Vec<PlayEvent> {
        self.inner.read().await.clone()
    }

    /// Events recorded for one user, in append order.
    pub async fn events_for_user(&self, user_id: &UserId) -> Vec<PlayEvent> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == *user_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Export the log.
    pub async fn state(&self) -> PlayLogState {
        PlayLogState {
            events: self.events().await,
        }
    }

    /// Rebuild a log from exported state.
    pub fn from_state(state: PlayLogState) -> Self {
        Self {
            inner: RwLock::new(state.events),
        }
    }
}
