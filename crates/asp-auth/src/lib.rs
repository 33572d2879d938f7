//! Users and sessions for Asperitas.
//!
//! - [`UserRepository`] registers users and checks credentials. Passwords
//!   are stored as argon2id hashes ([`Passwords`]).
//! - [`SessionManager`] issues signed session tokens and resolves an
//!   `Authorization: Bearer <token>` header back to a [`asp_types::User`].
//!   Live session ids are kept in a [`SessionStore`] so sessions can be
//!   revoked before they expire.

pub mod error;
pub mod manager;
pub mod password;
pub mod sessions;
pub mod users;

pub use argon2::Params as HashParams;
pub use error::{AuthError, AuthResult};
pub use manager::{Claims, Session, SessionManager, DEFAULT_SESSION_TTL_SECS};
pub use password::Passwords;
pub use sessions::{DocumentSessionStore, InMemorySessionStore, SessionStore};
pub use users::{
    DocumentUserRepository, InMemoryUserRepository, StoredUser, UserRepository, MAX_USERNAME_LEN,
};
