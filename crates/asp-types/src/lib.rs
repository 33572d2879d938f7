//! Foundation types for Asperitas.
//!
//! This crate provides the identity and error types shared by every other
//! Asperitas crate.
//!
//! # Key Types
//!
//! - [`User`]: public identity snapshot (username + opaque id)
//! - [`Credentials`]: username/password pair submitted on login and register
//! - [`new_id`] / [`is_valid_id`]: 24-hex-character opaque identifiers
//! - [`ErrorKind`]: classification of domain errors into HTTP-facing kinds
//! - [`FieldError`], [`ValidationErrors`], [`MessageBody`]: error wire bodies

pub mod error;
pub mod id;
pub mod user;

pub use error::{ErrorKind, FieldError, MessageBody, ValidationErrors};
pub use id::{is_valid_id, new_id, ID_LEN};
pub use user::{Credentials, User};
