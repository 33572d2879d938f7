use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{merge_fields, validate_key, Document, DocumentStore};

const EXTENSION: &str = "json";

/// File-backed document store.
///
/// On-disk layout:
/// ```text
/// <root>/<collection>/<key>.json
/// ```
///
/// Every write goes to a temporary file in the collection directory and is
/// then renamed over the target, so readers observe either the old or the
/// new document, never a torn one. Writers are serialized by a store-level
/// mutex, which makes each `insert`/`update`/`delete` atomic per document.
/// Nothing spans two calls: a caller's read followed by its update can
/// still interleave with another writer.
pub struct FileDocumentStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened file document store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> StoreResult<PathBuf> {
        validate_key(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self
            .collection_dir(collection)?
            .join(format!("{key}.{EXTENSION}")))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read_path(path: &Path) -> StoreResult<Option<Document>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_path(path: &Path, doc: &Document) -> StoreResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidKey(path.display().to_string()))?;
        fs::create_dir_all(dir)?;
        let bytes = serde_json::to_vec(doc)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl DocumentStore for FileDocumentStore {
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        Self::read_path(&self.document_path(collection, key)?)
    }

    fn insert(&self, collection: &str, key: &str, doc: &Document) -> StoreResult<()> {
        let path = self.document_path(collection, key)?;
        let _guard = self.lock()?;
        if path.exists() {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        Self::write_path(&path, doc)?;
        debug!(collection, key, "document inserted");
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, Value>,
    ) -> StoreResult<bool> {
        let path = self.document_path(collection, key)?;
        let _guard = self.lock()?;
        let Some(mut doc) = Self::read_path(&path)? else {
            return Ok(false);
        };
        merge_fields(collection, key, &mut doc, fields)?;
        Self::write_path(&path, &doc)?;
        debug!(collection, key, fields = fields.len(), "document updated");
        Ok(true)
    }

    fn delete(&self, collection: &str, key: &str) -> StoreResult<bool> {
        let path = self.document_path(collection, key)?;
        let _guard = self.lock()?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(collection, key, "document deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let dir = self.collection_dir(collection)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut docs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            // A document deleted between read_dir and read is simply skipped.
            match Self::read_path(&path)? {
                Some(doc) => docs.push(doc),
                None => warn!(path = %path.display(), "document vanished during listing"),
            }
        }
        Ok(docs)
    }
}

impl std::fmt::Debug for FileDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDocumentStore")
            .field("root", &self.root)
            .finish()
    }
}
