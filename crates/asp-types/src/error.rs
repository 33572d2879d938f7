//! Error classification and the JSON error bodies returned to clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a domain error, one per HTTP status the API
/// can answer with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed identifier or payload (400).
    BadRequest,
    /// Missing, invalid, expired, or revoked credentials; or acting on
    /// someone else's resource (401).
    Unauthorized,
    /// The addressed post, comment, or user does not exist (404).
    NotFound,
    /// One or more field-level validation failures (422).
    ValidationFailed,
    /// Storage, codec, or programmer error (500).
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub fn status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::ValidationFailed => 422,
            Self::Internal => 500,
        }
    }
}

/// A single field-level validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub location: String,
    pub param: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub msg: String,
}

impl FieldError {
    /// A failure on a field of the request body.
    pub fn body(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            location: "body".into(),
            param: param.into(),
            value: None,
            msg: msg.into(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// The `{"errors": [...]}` body of a 422 response.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("validation failed: {}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self::single(error)
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.param, e.msg))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The `{"message": "..."}` body used for single-cause responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
