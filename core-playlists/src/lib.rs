//! Playlists: owned, ordered, mutable sequences of catalog references.
//!
//! Playlists are either assembled by hand (`Manual`) or populated by one of
//! the closed set of generation algorithms (`Random`, `Favorites`,
//! `GenreBased`). The algorithms themselves are pure functions in
//! [`generate`]; the [`engine::PlaylistEngine`] feeds them catalog and
//! history snapshots and owns the resulting playlists.

pub mod engine;
pub mod error;
pub mod generate;
pub mod models;

pub use engine::{PlaylistEngine, PlaylistStoreState};
pub use error::{PlaylistError, Result};
pub use models::{GenerationMode, GenerationSpec, Playlist, PlaylistId, PlaylistState};
