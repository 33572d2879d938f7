use serde::Serialize;

use asp_types::User;

use crate::comment::Comment;
use crate::error::PostResult;
use crate::post::{Category, Post};

/// Success signal of [`PostRepository::delete_post`].
///
/// Serializes as `{"message": "success"}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deleted;

impl Serialize for Deleted {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        asp_types::MessageBody::new("success").serialize(serializer)
    }
}

/// Storage of post aggregates.
///
/// Every mutating operation is a read-find-mutate-write sequence on one
/// post and returns the post as stored afterwards. Implementations differ
/// only in how concurrent sequences on the same post interleave:
/// - [`crate::InMemoryPostRepository`] serializes them; no update is lost.
/// - [`crate::DocumentPostRepository`] is last-writer-wins at field level;
///   a concurrent update may be lost but the stored post stays consistent.
pub trait PostRepository: Send + Sync {
    /// All posts, highest score first, older first among equal scores.
    fn get_all(&self) -> PostResult<Vec<Post>>;

    fn add_post(&self, post: Post) -> PostResult<Post>;

    /// Posts in `category`, in [`get_all`](Self::get_all) order.
    fn get_by_category(&self, category: Category) -> PostResult<Vec<Post>>;

    /// Fetch one post and count the view.
    fn get_by_id(&self, id: &str) -> PostResult<Post>;

    /// Delete a post on behalf of `requester`, who must be its author.
    fn delete_post(&self, id: &str, requester: &User) -> PostResult<Deleted>;

    fn add_comment(&self, post_id: &str, comment: Comment) -> PostResult<Post>;

    fn delete_comment(&self, post_id: &str, comment_id: &str, requester: &User)
        -> PostResult<Post>;

    fn upvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post>;

    fn downvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post>;

    fn unvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post>;

    /// Posts authored by `username`, newest first.
    fn get_by_user(&self, username: &str) -> PostResult<Vec<Post>>;
}
