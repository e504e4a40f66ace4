use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: String, key: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

impl CatalogError {
    pub fn song_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Song".to_string(),
            id: id.to_string(),
        }
    }

    pub fn album_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Album".to_string(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
