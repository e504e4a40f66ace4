//! In-memory music catalog: songs, optional album groupings, and lookups.
//!
//! The catalog owns the universe of songs. Removal is a soft delete so that
//! playlists and the play history can keep referring to retired ids; read
//! paths (`get`, `search`) only ever surface active entries, while
//! [`Catalog::get_any`] resolves retired ids for historical reporting.

pub mod catalog;
pub mod error;
pub mod models;

pub use catalog::{Catalog, CatalogState, SongEntry, SongFilter};
pub use error::{CatalogError, Result};
pub use models::{Album, AlbumId, Song, SongId};
