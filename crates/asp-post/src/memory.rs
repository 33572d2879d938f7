use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use asp_store::StoreError;
use asp_types::User;

use crate::comment::Comment;
use crate::error::{PostError, PostResult};
use crate::post::{by_newest, by_score, Category, Post};
use crate::traits::{Deleted, PostRepository};

/// In-memory post repository.
///
/// One `RwLock` guards the whole collection. Each mutating operation holds
/// the write lock from lookup to write-back, so concurrent votes on the
/// same post are never lost. Reads return clones.
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> PostResult<RwLockReadGuard<'_, Vec<Post>>> {
        self.posts.read().map_err(|_| PostError::from(StoreError::Poisoned))
    }

    fn write(&self) -> PostResult<RwLockWriteGuard<'_, Vec<Post>>> {
        self.posts.write().map_err(|_| PostError::from(StoreError::Poisoned))
    }

    /// Apply `f` to the post with `id` under the write lock.
    fn modify<F>(&self, id: &str, f: F) -> PostResult<Post>
    where
        F: FnOnce(&mut Post) -> PostResult<()>,
    {
        let mut posts = self.write()?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PostError::PostNotFound)?;
        f(post)?;
        Ok(post.clone())
    }

    fn sorted(&self, keep: impl Fn(&Post) -> bool) -> PostResult<Vec<Post>> {
        let mut posts: Vec<Post> = self.read()?.iter().filter(|&p| keep(p)).cloned().collect();
        posts.sort_by(by_score);
        Ok(posts)
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PostRepository for InMemoryPostRepository {
    fn get_all(&self) -> PostResult<Vec<Post>> {
        self.sorted(|_| true)
    }

    fn add_post(&self, post: Post) -> PostResult<Post> {
        self.write()?.push(post.clone());
        debug!(id = %post.id, "post added");
        Ok(post)
    }

    fn get_by_category(&self, category: Category) -> PostResult<Vec<Post>> {
        self.sorted(|p| p.category == category)
    }

    fn get_by_id(&self, id: &str) -> PostResult<Post> {
        self.modify(id, |post| {
            post.views = post.views.saturating_add(1);
            Ok(())
        })
    }

    fn delete_post(&self, id: &str, requester: &User) -> PostResult<Deleted> {
        let mut posts = self.write()?;
        let i = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(PostError::PostNotFound)?;
        if posts[i].author.id != requester.id {
            return Err(PostError::Unauthorized);
        }
        posts.swap_remove(i);
        debug!(id, "post deleted");
        Ok(Deleted)
    }

    fn add_comment(&self, post_id: &str, comment: Comment) -> PostResult<Post> {
        self.modify(post_id, |post| post.add_comment(comment))
    }

    fn delete_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        requester: &User,
    ) -> PostResult<Post> {
        self.modify(post_id, |post| post.delete_comment(comment_id, &requester.id))
    }

    fn upvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post> {
        self.modify(post_id, |post| post.upvote(&requester.id))
    }

    fn downvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post> {
        self.modify(post_id, |post| post.downvote(&requester.id))
    }

    fn unvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post> {
        self.modify(post_id, |post| post.unvote(&requester.id))
    }

    fn get_by_user(&self, username: &str) -> PostResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .read()?
            .iter()
            .filter(|p| p.author.username == username)
            .cloned()
            .collect();
        posts.sort_by(by_newest);
        Ok(posts)
    }
}

impl std::fmt::Debug for InMemoryPostRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPostRepository")
            .field("post_count", &self.len())
            .finish()
    }
}
