//! JSON document storage for Asperitas.
//!
//! Posts, users, and session records are persisted as JSON documents in
//! named collections, keyed by an opaque string id. This crate defines the
//! storage contract and two backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests and the
//!   memory deployment mode
//! - [`FileDocumentStore`] -- one JSON file per document under a data
//!   directory
//!
//! # Design Rules
//!
//! 1. A single `insert`, `update`, or `delete` is atomic per document.
//! 2. There is no compare-and-swap: a caller that reads, mutates, and then
//!    updates a document can race with another caller doing the same on
//!    the same key. Last writer wins.
//! 3. The store never interprets documents beyond filter matching.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod filter;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileDocumentStore;
pub use filter::Filter;
pub use memory::InMemoryDocumentStore;
pub use traits::{validate_key, Document, DocumentStore};
