//! Memory implementation of the storages.
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;

use super::{ModelStorage, TokenStorage};
use crate::domain::{Identity, Model, StorageError, Token};

/// Tokens indexed by their hash.
type TokenByHash = HashMap<String, Token>;

/// A thread-safe token storage keeping tokens in memory.
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct MemoryTokenStorage {
    tokens: Arc<RwLock<TokenByHash>>,
}

impl fmt::Debug for MemoryTokenStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTokenStorage").finish()
    }
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        MemoryTokenStorage {
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.tokens.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.tokens.read()?.is_empty())
    }
}

impl Default for MemoryTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn create(&self) -> Result<Token, StorageError> {
        Ok(Token::new())
    }

    /// Inserts the token, or replaces the stored one with the same hash.
    fn update(&self, token: &Token) -> Result<(), StorageError> {
        let mut tokens = self.tokens.write()?;
        tokens.insert(token.hash().to_string(), token.clone());
        debug!("Stored token {}", token.hash());
        Ok(())
    }

    fn find(&self, hash: &str) -> Result<Option<Token>, StorageError> {
        Ok(self.tokens.read()?.get(hash).cloned())
    }

    fn delete(&self, token: &Token) -> Result<(), StorageError> {
        self.tokens.write()?.remove(token.hash());
        debug!("Deleted token {}", token.hash());
        Ok(())
    }
}

/// Keeps the models of a single class in memory, assigning sequential ids.
///
/// Models are recognised by reference: `identify` only succeeds for the same
/// `Arc` (or a clone of it) that was inserted.
#[derive(Clone)]
pub struct MemoryModelStorage {
    class: String,
    models: Arc<RwLock<Vec<Arc<dyn Model>>>>,
}

impl fmt::Debug for MemoryModelStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryModelStorage")
            .field("class", &self.class)
            .finish()
    }
}

impl MemoryModelStorage {
    pub fn new(class: impl Into<String>) -> Self {
        MemoryModelStorage {
            class: class.into(),
            models: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Stores the model and returns its identity. Inserting a model twice
    /// returns the identity it already has.
    pub fn insert(&self, model: Arc<dyn Model>) -> Result<Identity, StorageError> {
        if model.model_class() != self.class {
            return Err(StorageError::ModelNotManaged(
                model.model_class().to_string(),
            ));
        }
        let mut models = self.models.write()?;
        let position = match models.iter().position(|m| Arc::ptr_eq(m, &model)) {
            Some(position) => position,
            None => {
                models.push(model);
                models.len() - 1
            }
        };
        Ok(self.identity_at(position))
    }

    fn identity_at(&self, position: usize) -> Identity {
        Identity::new((position + 1).to_string(), self.class.as_str())
    }
}

impl ModelStorage for MemoryModelStorage {
    fn identify(&self, model: &Arc<dyn Model>) -> Result<Identity, StorageError> {
        let models = self.models.read()?;
        models
            .iter()
            .position(|m| Arc::ptr_eq(m, model))
            .map(|position| self.identity_at(position))
            .ok_or_else(|| StorageError::ModelNotManaged(model.model_class().to_string()))
    }

    /// Selects one model by primary key.
    fn find(&self, identity: &Identity) -> Result<Option<Arc<dyn Model>>, StorageError> {
        if identity.class() != self.class {
            return Ok(None);
        }
        let position = match identity.id().parse::<usize>() {
            Ok(id) if id > 0 => id - 1,
            _ => return Ok(None),
        };
        Ok(self.models.read()?.get(position).cloned())
    }
}
