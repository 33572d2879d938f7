use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;

/// A stored JSON document.
pub type Document = Value;

/// Keyed JSON document storage organised in named collections.
///
/// All implementations must satisfy these invariants:
/// - `insert`, `update`, and `delete` are individually atomic per document.
/// - `update` merges the given top-level fields into the stored document
///   (`$set` semantics); fields not named in the patch are left untouched.
/// - There is no compare-and-swap across calls. Read-modify-write
///   sequences built on top of this trait are last-writer-wins.
/// - Collection names and keys are validated with [`validate_key`].
pub trait DocumentStore: Send + Sync {
    /// Read a document by key.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>>;

    /// Insert a new document. Fails with [`StoreError::DuplicateKey`] if the
    /// key is already present.
    fn insert(&self, collection: &str, key: &str, doc: &Document) -> StoreResult<()>;

    /// Merge `fields` into an existing document.
    ///
    /// Returns `Ok(false)` if no document exists under `key`.
    fn update(&self, collection: &str, key: &str, fields: &Map<String, Value>)
        -> StoreResult<bool>;

    /// Delete a document. Returns `true` if it existed.
    fn delete(&self, collection: &str, key: &str) -> StoreResult<bool>;

    /// All documents in a collection, in unspecified order.
    fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Documents matching `filter`, in unspecified order.
    ///
    /// Default implementation scans `list()`. Backends may override with an
    /// index.
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        Ok(self
            .list(collection)?
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .collect())
    }

    /// Returns `true` if a document exists under `key`.
    fn exists(&self, collection: &str, key: &str) -> StoreResult<bool> {
        Ok(self.get(collection, key)?.is_some())
    }
}

/// Reject empty names and anything outside `[A-Za-z0-9_-]`.
///
/// Keys double as file names in [`crate::FileDocumentStore`], so path
/// separators and dots are never accepted.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Merge `fields` into `doc`, which must be a JSON object.
pub(crate) fn merge_fields(
    collection: &str,
    key: &str,
    doc: &mut Document,
    fields: &Map<String, Value>,
) -> StoreResult<()> {
    let obj = doc.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
        collection: collection.to_string(),
        key: key.to_string(),
    })?;
    for (name, value) in fields {
        obj.insert(name.clone(), value.clone());
    }
    Ok(())
}
