use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use asp_store::{DocumentStore, StoreError};
use asp_types::{new_id, User};

use crate::error::{AuthError, AuthResult};
use crate::password::Passwords;

/// Persisted user record. Never serialized to clients.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub username: String,
    pub id: String,
    pub password_hash: String,
}

impl StoredUser {
    pub fn user(&self) -> User {
        User::new(self.username.clone(), self.id.clone())
    }
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("username", &self.username)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Registered users keyed by username.
pub trait UserRepository: Send + Sync {
    /// Check a username/password pair.
    fn authorize(&self, username: &str, password: &str) -> AuthResult<User>;

    /// Register a new user with a fresh id.
    fn sign_up(&self, username: &str, password: &str) -> AuthResult<User>;
}

/// Longest accepted username, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

fn check_username(username: &str) -> AuthResult<()> {
    let reason = if username.is_empty() {
        "is required"
    } else if username.len() > MAX_USERNAME_LEN {
        "is too long"
    } else {
        return Ok(());
    };
    Err(AuthError::InvalidUsername {
        username: username.to_string(),
        reason,
    })
}

/// Names that could never have been registered.
fn is_unregistrable(username: &str) -> bool {
    check_username(username).is_err()
}

fn check_password(passwords: &Passwords, record: &StoredUser, password: &str) -> AuthResult<User> {
    if passwords.verify(password, &record.password_hash)? {
        Ok(record.user())
    } else {
        Err(AuthError::InvalidPassword)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// `RwLock`-guarded map of users. The existence check and the insert in
/// [`sign_up`](UserRepository::sign_up) happen under one write lock.
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, StoredUser>>,
    passwords: Passwords,
}

impl InMemoryUserRepository {
    pub fn new(passwords: Passwords) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            passwords,
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new(Passwords::default())
    }
}

impl UserRepository for InMemoryUserRepository {
    fn authorize(&self, username: &str, password: &str) -> AuthResult<User> {
        if is_unregistrable(username) {
            return Err(AuthError::UserNotFound);
        }
        let record = {
            let users = self
                .users
                .read()
                .map_err(|_| AuthError::from(StoreError::Poisoned))?;
            users.get(username).cloned().ok_or(AuthError::UserNotFound)?
        };
        check_password(&self.passwords, &record, password)
    }

    fn sign_up(&self, username: &str, password: &str) -> AuthResult<User> {
        check_username(username)?;
        // Hash outside the lock.
        let password_hash = self.passwords.hash(password)?;
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::from(StoreError::Poisoned))?;
        if users.contains_key(username) {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }
        let record = StoredUser {
            username: username.to_string(),
            id: new_id(),
            password_hash,
        };
        let user = record.user();
        users.insert(username.to_string(), record);
        debug!(user = ?user, "user registered");
        Ok(user)
    }
}

impl std::fmt::Debug for InMemoryUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserRepository")
            .field("user_count", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Document store
// ---------------------------------------------------------------------------

const COLLECTION: &str = "users";

/// Users in a [`DocumentStore`] collection.
///
/// Documents are keyed by the hex-encoded username, so any accepted
/// username maps to a valid key of at most `2 * MAX_USERNAME_LEN` bytes and
/// the store's duplicate-key check enforces uniqueness.
pub struct DocumentUserRepository<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    passwords: Passwords,
}

impl<S: DocumentStore + ?Sized> DocumentUserRepository<S> {
    pub fn new(store: Arc<S>, passwords: Passwords) -> Self {
        Self { store, passwords }
    }

    fn key(username: &str) -> String {
        hex::encode(username.as_bytes())
    }
}

impl<S: DocumentStore + ?Sized> UserRepository for DocumentUserRepository<S> {
    fn authorize(&self, username: &str, password: &str) -> AuthResult<User> {
        if is_unregistrable(username) {
            return Err(AuthError::UserNotFound);
        }
        let doc = self
            .store
            .get(COLLECTION, &Self::key(username))?
            .ok_or(AuthError::UserNotFound)?;
        let record: StoredUser = serde_json::from_value(doc).map_err(StoreError::from)?;
        check_password(&self.passwords, &record, password)
    }

    fn sign_up(&self, username: &str, password: &str) -> AuthResult<User> {
        check_username(username)?;
        let key = Self::key(username);
        if self.store.exists(COLLECTION, &key)? {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }
        let record = StoredUser {
            username: username.to_string(),
            id: new_id(),
            password_hash: self.passwords.hash(password)?,
        };
        let doc = serde_json::to_value(&record).map_err(StoreError::from)?;
        match self.store.insert(COLLECTION, &key, &doc) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey { .. }) => {
                return Err(AuthError::UsernameTaken(username.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        let user = record.user();
        debug!(user = ?user, "user stored");
        Ok(user)
    }
}

impl<S: DocumentStore + ?Sized> std::fmt::Debug for DocumentUserRepository<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentUserRepository")
            .field("collection", &COLLECTION)
            .finish()
    }
}
