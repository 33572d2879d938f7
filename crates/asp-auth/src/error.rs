use asp_store::StoreError;
use asp_types::{ErrorKind, FieldError, ValidationErrors};

/// Errors from user and session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("username {0} already exists")]
    UsernameTaken(String),

    #[error("username {reason}")]
    InvalidUsername {
        username: String,
        reason: &'static str,
    },

    /// Missing, malformed, expired, or revoked session token.
    #[error("unauthorized")]
    Unauthorized,

    #[error("cannot issue a session without a user")]
    MissingUser,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound | Self::InvalidPassword | Self::Unauthorized => {
                ErrorKind::Unauthorized
            }
            Self::UsernameTaken(_) | Self::InvalidUsername { .. } => ErrorKind::ValidationFailed,
            Self::MissingUser | Self::Signing(_) | Self::Hash(_) | Self::Store(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Field-level detail for errors of kind [`ErrorKind::ValidationFailed`].
    pub fn validation_errors(&self) -> Option<ValidationErrors> {
        match self {
            Self::UsernameTaken(name) => Some(
                FieldError::body("username", "already exists")
                    .with_value(name.clone())
                    .into(),
            ),
            Self::InvalidUsername { username, reason } => Some(
                FieldError::body("username", *reason)
                    .with_value(username.clone())
                    .into(),
            ),
            _ => None,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(AuthError::UserNotFound.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::InvalidPassword.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            AuthError::UsernameTaken("bob".into()).kind(),
            ErrorKind::ValidationFailed
        );
        assert_eq!(AuthError::MissingUser.kind(), ErrorKind::Internal);
        assert_eq!(
            AuthError::Store(StoreError::Poisoned).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn username_taken_detail() {
        let errs = AuthError::UsernameTaken("bob".into())
            .validation_errors()
            .unwrap();
        let json = serde_json::to_value(&errs).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"errors": [{
                "location": "body",
                "param": "username",
                "value": "bob",
                "msg": "already exists",
            }]})
        );
        assert!(AuthError::Unauthorized.validation_errors().is_none());
    }

    #[test]
    fn invalid_username_detail() {
        let err = AuthError::InvalidUsername {
            username: String::new(),
            reason: "is required",
        };
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        let json = serde_json::to_value(err.validation_errors().unwrap()).unwrap();
        assert_eq!(json["errors"][0]["param"], "username");
        assert_eq!(json["errors"][0]["msg"], "is required");
    }

    #[test]
    fn login_messages() {
        assert_eq!(AuthError::UserNotFound.to_string(), "user not found");
        assert_eq!(AuthError::InvalidPassword.to_string(), "invalid password");
        assert_eq!(AuthError::Unauthorized.to_string(), "unauthorized");
    }
}
