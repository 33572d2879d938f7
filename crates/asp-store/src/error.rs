/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A document with this key already exists in the collection.
    #[error("duplicate key in {collection}: {key}")]
    DuplicateKey { collection: String, key: String },

    /// The collection or document key contains characters the store refuses.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// Update payloads must be JSON objects.
    #[error("document is not a JSON object: {collection}/{key}")]
    NotAnObject { collection: String, key: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
