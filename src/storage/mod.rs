//! Storage contracts the token machinery coordinates, and in-memory adapters.
mod memory;
mod registry;

use std::sync::Arc;

pub use memory::MemoryModelStorage;
pub use memory::MemoryTokenStorage;
pub use registry::SimpleStorageRegistry;

use crate::domain::{Identity, Model, StorageError, Token};

/// Persistence for tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStorage {
    /// Instantiates a new token. Nothing is persisted until [`TokenStorage::update`].
    fn create(&self) -> Result<Token, StorageError>;
    fn update(&self, token: &Token) -> Result<(), StorageError>;
    fn find(&self, hash: &str) -> Result<Option<Token>, StorageError>;
    fn delete(&self, token: &Token) -> Result<(), StorageError>;
}

/// Persistence for the models tokens are bound to.
#[cfg_attr(test, mockall::automock)]
pub trait ModelStorage {
    fn identify(&self, model: &Arc<dyn Model>) -> Result<Identity, StorageError>;
    fn find(&self, identity: &Identity) -> Result<Option<Arc<dyn Model>>, StorageError>;
}

/// Selects the model storage responsible for a model.
#[cfg_attr(test, mockall::automock)]
pub trait StorageRegistry {
    fn get_storage(&self, model: &Arc<dyn Model>) -> Result<Arc<dyn ModelStorage>, StorageError>;
}
