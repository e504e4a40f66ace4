use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] core_catalog::CatalogError),

    #[error("Account error: {0}")]
    Account(#[from] core_accounts::AccountError),

    #[error("History error: {0}")]
    History(#[from] core_history::HistoryError),

    #[error("Playlist error: {0}")]
    Playlist(#[from] core_playlists::PlaylistError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Unsupported snapshot version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type Result<T> = std::result::Result<T, CoreError>;
