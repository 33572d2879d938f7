use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde_json::json;

use asp_store::{validate_key, DocumentStore, StoreError};

use crate::error::{AuthError, AuthResult};

/// Set of live session ids. A token is honoured only while its session id
/// is present here.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session_id: &str) -> AuthResult<()>;

    fn contains(&self, session_id: &str) -> AuthResult<bool>;

    /// Returns `true` if the id was present.
    fn remove(&self, session_id: &str) -> AuthResult<bool>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    ids: RwLock<HashSet<String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session_id: &str) -> AuthResult<()> {
        self.ids
            .write()
            .map_err(|_| AuthError::from(StoreError::Poisoned))?
            .insert(session_id.to_string());
        Ok(())
    }

    fn contains(&self, session_id: &str) -> AuthResult<bool> {
        Ok(self
            .ids
            .read()
            .map_err(|_| AuthError::from(StoreError::Poisoned))?
            .contains(session_id))
    }

    fn remove(&self, session_id: &str) -> AuthResult<bool> {
        Ok(self
            .ids
            .write()
            .map_err(|_| AuthError::from(StoreError::Poisoned))?
            .remove(session_id))
    }
}

const COLLECTION: &str = "sessions";

/// Session ids as documents in a [`DocumentStore`] collection.
pub struct DocumentSessionStore<S: DocumentStore + ?Sized> {
    store: Arc<S>,
}

impl<S: DocumentStore + ?Sized> DocumentSessionStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: DocumentStore + ?Sized> SessionStore for DocumentSessionStore<S> {
    fn insert(&self, session_id: &str) -> AuthResult<()> {
        self.store
            .insert(COLLECTION, session_id, &json!({ "session_id": session_id }))?;
        Ok(())
    }

    fn contains(&self, session_id: &str) -> AuthResult<bool> {
        // A token can carry any string; only well-formed ids were ever stored.
        if validate_key(session_id).is_err() {
            return Ok(false);
        }
        Ok(self.store.exists(COLLECTION, session_id)?)
    }

    fn remove(&self, session_id: &str) -> AuthResult<bool> {
        if validate_key(session_id).is_err() {
            return Ok(false);
        }
        Ok(self.store.delete(COLLECTION, session_id)?)
    }
}

impl<S: DocumentStore + ?Sized> std::fmt::Debug for DocumentSessionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSessionStore")
            .field("collection", &COLLECTION)
            .finish()
    }
}
