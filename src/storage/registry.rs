use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{ModelStorage, StorageRegistry};
use crate::domain::{Model, StorageError};

/// Registry selecting model storages by model class.
#[derive(Default)]
pub struct SimpleStorageRegistry {
    storages: HashMap<String, Arc<dyn ModelStorage>>,
}

impl fmt::Debug for SimpleStorageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleStorageRegistry")
            .field("classes", &self.registered_classes())
            .finish()
    }
}

impl SimpleStorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `storage` for models of `class`, replacing any previous one.
    pub fn register(&mut self, class: impl Into<String>, storage: Arc<dyn ModelStorage>) {
        self.storages.insert(class.into(), storage);
    }

    fn registered_classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.storages.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }
}

impl StorageRegistry for SimpleStorageRegistry {
    fn get_storage(&self, model: &Arc<dyn Model>) -> Result<Arc<dyn ModelStorage>, StorageError> {
        let class = model.model_class();
        match self.storages.get(class) {
            Some(storage) => Ok(Arc::clone(storage)),
            None => {
                warn!("No storage registered for model {}", class);
                Err(StorageError::StorageNotRegistered {
                    class: class.to_string(),
                    registered: self.registered_classes().join(", "),
                })
            }
        }
    }
}
