use core_accounts::AccountError;
use core_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Permission denied: user {user} does not own playlist {playlist}")]
    Permission { user: String, playlist: String },

    #[error("Playlist quota exceeded: plan {plan} allows at most {max}")]
    QuotaExceeded { plan: String, max: usize },

    #[error("Insufficient catalog: requested {requested} distinct songs, {available} available")]
    InsufficientCatalog { requested: usize, available: usize },

    #[error("Duplicate song {song} in unique playlist {playlist}")]
    DuplicateSong { song: String, playlist: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, PlaylistError>;
