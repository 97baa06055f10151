use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Store, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.docs.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.docs.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn insert(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let mut docs = self.docs.write();
        if docs.contains_key(key) {
            return Ok(false);
        }
        docs.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn replace(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        match self.docs.write().get_mut(key) {
            Some(doc) => {
                *doc = value.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.docs.write().remove(key).is_some())
    }

    fn get_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .docs
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
