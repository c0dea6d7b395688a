use std::sync::PoisonError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("A storage for model {class} was not registered. There are storages for next models: {registered}")]
    StorageNotRegistered { class: String, registered: String },
    #[error("Model {0} is not managed by this storage")]
    ModelNotManaged(String),
    #[error("Error synchronizing storage - {0}")]
    Poisoned(String),
    #[error("Storage backend error - {0}")]
    Backend(String),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(e: PoisonError<T>) -> Self {
        StorageError::Poisoned(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Storage error - {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid url - {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Token parameter not set in request")]
    TokenParameterMissing,
    #[error("A token with hash `{0}` could not be found")]
    TokenNotFound(String),
    #[error("The current url {request} does not match target url {target} set in the token")]
    UrlMismatch { request: String, target: String },
}
