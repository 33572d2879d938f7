use std::sync::Arc;

use tracing::{info, warn};

use asp_auth::{
    DocumentSessionStore, DocumentUserRepository, InMemorySessionStore, InMemoryUserRepository,
    Passwords, SessionManager, SessionStore, UserRepository,
};
use asp_post::{DocumentPostRepository, InMemoryPostRepository, PostRepository};
use asp_store::FileDocumentStore;

use crate::config::{ServerConfig, StorageConfig};
use crate::error::{ServerError, ServerResult};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            posts,
            users,
            sessions,
        }
    }

    /// Wire up repositories and the session manager for `config`.
    pub fn from_config(config: &ServerConfig, passwords: Passwords) -> ServerResult<Self> {
        config.validate()?;
        let posts: Arc<dyn PostRepository>;
        let users: Arc<dyn UserRepository>;
        let session_store: Arc<dyn SessionStore>;
        match &config.storage {
            StorageConfig::Memory => {
                info!("using in-memory storage");
                posts = Arc::new(InMemoryPostRepository::new());
                users = Arc::new(InMemoryUserRepository::new(passwords));
                session_store = Arc::new(InMemorySessionStore::new());
            }
            StorageConfig::File { data_dir } => {
                let store = FileDocumentStore::open(data_dir)
                    .map_err(|e| ServerError::Config(format!("{}: {e}", data_dir.display())))?;
                let store = Arc::new(store);
                info!(data_dir = %data_dir.display(), "using file storage");
                posts = Arc::new(DocumentPostRepository::new(Arc::clone(&store)));
                users = Arc::new(DocumentUserRepository::new(Arc::clone(&store), passwords));
                session_store = Arc::new(DocumentSessionStore::new(store));
            }
        }

        let secret = if config.session_secret.is_empty() {
            warn!("no session_secret configured; sessions will not survive a restart");
            format!("{}{}", asp_types::new_id(), asp_types::new_id())
        } else {
            config.session_secret.clone()
        };
        let sessions = SessionManager::new(secret.as_bytes(), session_store)
            .with_ttl_secs(config.session_ttl_secs as i64);

        Ok(Self::new(posts, users, Arc::new(sessions)))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
