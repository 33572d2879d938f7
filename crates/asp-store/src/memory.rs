use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::traits::{merge_fields, validate_key, Document, DocumentStore};

type Collections = HashMap<String, HashMap<String, Document>>;

/// In-memory, HashMap-based document store.
///
/// All collections live behind one `RwLock`. Documents are cloned on read
/// and write. Data is lost when the store is dropped.
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.read()
            .map(|c| c.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    /// Returns `true` if `collection` holds no documents.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.collections.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.collections.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        validate_key(collection)?;
        validate_key(key)?;
        let map = self.read()?;
        Ok(map.get(collection).and_then(|c| c.get(key)).cloned())
    }

    fn insert(&self, collection: &str, key: &str, doc: &Document) -> StoreResult<()> {
        validate_key(collection)?;
        validate_key(key)?;
        let mut map = self.write()?;
        let docs = map.entry(collection.to_string()).or_default();
        if docs.contains_key(key) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        docs.insert(key.to_string(), doc.clone());
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, Value>,
    ) -> StoreResult<bool> {
        validate_key(collection)?;
        validate_key(key)?;
        let mut map = self.write()?;
        match map.get_mut(collection).and_then(|c| c.get_mut(key)) {
            Some(doc) => {
                merge_fields(collection, key, doc, fields)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, collection: &str, key: &str) -> StoreResult<bool> {
        validate_key(collection)?;
        validate_key(key)?;
        let mut map = self.write()?;
        Ok(map
            .get_mut(collection)
            .is_some_and(|c| c.remove(key).is_some()))
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        validate_key(collection)?;
        let map = self.read()?;
        Ok(map
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("InMemoryDocumentStore")
            .field("collection_count", &count)
            .finish()
    }
}
