use std::fmt;

use serde::{Deserialize, Serialize};

/// Public identity of a registered user.
///
/// This is the snapshot embedded in posts, comments, and session tokens.
/// It never carries the password; the persisted credential record lives in
/// the auth crate.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub id: String,
}

impl User {
    pub fn new(username: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            id: id.into(),
        }
    }

    /// A user with no id or no username identifies nobody.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() || self.username.is_empty()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User({}#{})", self.username, self.id)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// Username/password pair submitted by the login and register endpoints.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_password_field() {
        let user = User::new("alice", "0123456789abcdef01234567");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"username": "alice", "id": "0123456789abcdef01234567"})
        );
    }

    #[test]
    fn empty_user_detection() {
        assert!(User::default().is_empty());
        assert!(User::new("alice", "").is_empty());
        assert!(!User::new("alice", "id").is_empty());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds: Credentials =
            serde_json::from_str(r#"{"username":"bob","password":"hunter22"}"#).unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("bob"));
        assert!(!debug.contains("hunter22"));
    }
}
