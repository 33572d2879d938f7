//! HTTP server for Asperitas.
//!
//! Exposes posts, comments, votes, and sessions as a JSON REST API under
//! `/api`. Handlers are thin: they validate identifiers, authenticate, and
//! delegate to the repositories in [`AppState`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::AsperitasServer;
pub use state::AppState;
