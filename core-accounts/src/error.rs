use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Entity not found: User with id {id}")]
    NotFound { id: String },

    #[error("Duplicate user name: {name}")]
    Duplicate { name: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, AccountError>;
