use core_accounts::AccountError;
use core_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

pub type Result<T> = std::result::Result<T, HistoryError>;
