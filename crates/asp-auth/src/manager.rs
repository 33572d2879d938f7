//! Session issuance and verification.
//!
//! A session is a signed HS256 token carrying the user snapshot and a
//! random session id. The id is also recorded in a [`SessionStore`]; a
//! token is valid only while it is unexpired and its id is still stored.
//!
//! ```text
//! create ──► Valid ──(now >= exp)──► Expired
//!              │
//!              └──(revoke)──► Revoked
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use asp_types::{new_id, User};

use crate::error::{AuthError, AuthResult};
use crate::sessions::SessionStore;

/// Lifetime of a session unless configured otherwise: seven days.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Token payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user: User,
    pub session_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// What the client receives after login or registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(skip)]
    pub id: String,
}

pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(secret: &[u8], store: Arc<dyn SessionStore>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            store,
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_ttl_secs(self, secs: i64) -> Self {
        self.with_ttl(Duration::seconds(secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn create(&self, user: &User) -> AuthResult<Session> {
        self.create_at(user, Utc::now())
    }

    /// Issue a session for `user` as of `now`.
    pub fn create_at(&self, user: &User, now: DateTime<Utc>) -> AuthResult<Session> {
        if user.is_empty() {
            return Err(AuthError::MissingUser);
        }
        let claims = Claims {
            user: user.clone(),
            session_id: new_id(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        self.store.insert(&claims.session_id)?;
        info!(user = %user, session = %claims.session_id, "session created");
        Ok(Session {
            token,
            id: claims.session_id,
        })
    }

    /// Resolve an `Authorization` header value to the session's user.
    pub fn check(&self, authorization: &str) -> AuthResult<User> {
        self.check_at(authorization, Utc::now())
    }

    pub fn check_at(&self, authorization: &str, now: DateTime<Utc>) -> AuthResult<User> {
        let token = match authorization.split_whitespace().collect::<Vec<_>>()[..] {
            ["Bearer", token] => token,
            _ => {
                debug!("malformed authorization header");
                return Err(AuthError::Unauthorized);
            }
        };
        let claims = self.verify(token)?;
        if now.timestamp() >= claims.exp {
            debug!(session = %claims.session_id, "session expired");
            return Err(AuthError::Unauthorized);
        }
        if !self.store.contains(&claims.session_id)? {
            debug!(session = %claims.session_id, "session not found");
            return Err(AuthError::Unauthorized);
        }
        Ok(claims.user)
    }

    /// Invalidate a session id. Tokens carrying it stop verifying.
    pub fn revoke(&self, session_id: &str) -> AuthResult<bool> {
        let removed = self.store.remove(session_id)?;
        if removed {
            info!(session = %session_id, "session revoked");
        }
        Ok(removed)
    }

    fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `check_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::Unauthorized
            })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("keys", &"<redacted>")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}
