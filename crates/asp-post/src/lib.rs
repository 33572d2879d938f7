//! Post aggregate and post repositories for Asperitas.
//!
//! A [`Post`] is the aggregate root: it embeds a [`VoteList`] and a
//! [`CommentList`] and materializes its score from the ledger after every
//! vote. [`PostRepository`] is the storage seam, with an in-memory
//! implementation and one over any [`asp_store::DocumentStore`].

pub mod comment;
pub mod document;
pub mod error;
pub mod memory;
pub mod post;
pub mod traits;
pub mod vote;

#[cfg(test)]
mod conformance;

pub use comment::{Comment, CommentList};
pub use document::DocumentPostRepository;
pub use error::{PostError, PostResult};
pub use memory::InMemoryPostRepository;
pub use post::{by_newest, by_score, Category, NewPost, Post, PostType, UnknownCategory};
pub use traits::{Deleted, PostRepository};
pub use vote::{InvalidVote, Vote, VoteList, VoteValue};
