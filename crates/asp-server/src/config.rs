use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use asp_auth::DEFAULT_SESSION_TTL_SECS;

use crate::error::{ServerError, ServerResult};

/// Where posts, users, and sessions are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process memory; everything is lost on exit.
    Memory,
    /// One JSON file per document under `data_dir`.
    File { data_dir: PathBuf },
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// HS256 key for session tokens. Empty means a random per-process key.
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            session_secret: String::new(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS as u64,
            storage: StorageConfig::Memory,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// TOML rendering with the session secret masked.
    pub fn to_toml_redacted(&self) -> ServerResult<String> {
        let mut shown = self.clone();
        if !shown.session_secret.is_empty() {
            shown.session_secret = "<redacted>".into();
        }
        toml::to_string(&shown).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.session_ttl_secs == 0 || self.session_ttl_secs > i64::MAX as u64 / 1000 {
            return Err(ServerError::Config(format!(
                "session_ttl_secs out of range: {}",
                self.session_ttl_secs
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("session_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("storage", &self.storage)
            .finish()
    }
}
