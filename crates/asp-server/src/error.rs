use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, info};

use asp_auth::AuthError;
use asp_post::PostError;
use asp_types::{ErrorKind, MessageBody, ValidationErrors};

#[derive(Debug, Error)]
pub enum ServerError {
    /// A path identifier is not 24 hex characters. Carries the resource
    /// name, e.g. `"post"`.
    #[error("invalid {0} id")]
    InvalidId(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Post(#[from] PostError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId(_) | Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Validation(_) => ErrorKind::ValidationFailed,
            Self::Post(e) => e.kind(),
            Self::Auth(e) => e.kind(),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    fn validation_errors(&self) -> Option<ValidationErrors> {
        match self {
            Self::Validation(errs) => Some(errs.clone()),
            Self::Auth(e) => e.validation_errors(),
            _ => None,
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status =
            StatusCode::from_u16(kind.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if kind == ErrorKind::Internal {
            error!(error = %self, "request failed");
            return (status, Json(MessageBody::new("internal server error"))).into_response();
        }
        info!(status = status.as_u16(), error = %self, "request rejected");
        match self.validation_errors() {
            Some(errs) => (status, Json(errs)).into_response(),
            None => (status, Json(MessageBody::new(self.to_string()))).into_response(),
        }
    }
}
