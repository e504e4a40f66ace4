//! Listening history and derived statistics.
//!
//! Play events land in an append-only log; rankings and recommendations are
//! recomputed from the log on demand rather than incrementally maintained,
//! which keeps the correctness argument a replay.

pub mod error;
pub mod log;
pub mod models;
pub mod stats;

pub use error::{HistoryError, Result};
pub use log::{PlayLog, PlayLogState};
pub use models::{PlayEvent, RankScope, RankedSong, MIN_LISTEN_RATIO};
pub use stats::{qualifying_stats, PlayStats, StatsAggregator};
