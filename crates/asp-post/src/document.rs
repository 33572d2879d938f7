use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use asp_store::{Document, DocumentStore, Filter};
use asp_types::User;

use crate::comment::Comment;
use crate::error::{PostError, PostResult};
use crate::post::{by_newest, by_score, Category, Post};
use crate::traits::{Deleted, PostRepository};

const COLLECTION: &str = "posts";

const VIEW_FIELDS: &[&str] = &["views"];
const COMMENT_FIELDS: &[&str] = &["comments"];
const VOTE_FIELDS: &[&str] = &["votes", "score", "upvotePercentage"];

/// Post repository over a [`DocumentStore`].
///
/// Each mutation reads the post, applies the change to the decoded
/// aggregate, and writes back only the fields it touched. The store makes
/// each write atomic, but nothing locks across the read and the write: two
/// concurrent votes on one post can lose one of them. Whatever is stored
/// was produced by a single [`Post`] mutation, so the persisted `votes`,
/// `score`, and `upvotePercentage` always agree.
pub struct DocumentPostRepository<S: DocumentStore + ?Sized> {
    store: Arc<S>,
}

impl<S: DocumentStore + ?Sized> DocumentPostRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn decode(doc: Document) -> PostResult<Post> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        serde_json::from_value(doc).map_err(|e| {
            warn!(id = %id, error = %e, "undecodable post document");
            PostError::Corrupt {
                id,
                reason: e.to_string(),
            }
        })
    }

    fn decode_sorted(docs: Vec<Document>) -> PostResult<Vec<Post>> {
        let mut posts = docs
            .into_iter()
            .map(Self::decode)
            .collect::<PostResult<Vec<_>>>()?;
        posts.sort_by(by_score);
        Ok(posts)
    }

    fn load(&self, id: &str) -> PostResult<Post> {
        // Ids that could never have been stored are simply absent.
        if asp_store::validate_key(id).is_err() {
            return Err(PostError::PostNotFound);
        }
        let doc = self
            .store
            .get(COLLECTION, id)?
            .ok_or(PostError::PostNotFound)?;
        Self::decode(doc)
    }

    fn encode(post: &Post) -> PostResult<Map<String, Value>> {
        match serde_json::to_value(post) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PostError::Corrupt {
                id: post.id.clone(),
                reason: "post did not encode as an object".into(),
            }),
            Err(e) => Err(PostError::Corrupt {
                id: post.id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Write back the named fields of `post`.
    fn save_fields(&self, post: &Post, fields: &[&str]) -> PostResult<()> {
        let mut full = Self::encode(post)?;
        let patch: Map<String, Value> = fields
            .iter()
            .filter_map(|name| full.remove(*name).map(|v| (name.to_string(), v)))
            .collect();
        if !self.store.update(COLLECTION, &post.id, &patch)? {
            // Deleted between our read and this write.
            return Err(PostError::PostNotFound);
        }
        Ok(())
    }

    fn modify<F>(&self, id: &str, fields: &[&str], f: F) -> PostResult<Post>
    where
        F: FnOnce(&mut Post) -> PostResult<()>,
    {
        let mut post = self.load(id)?;
        f(&mut post)?;
        self.save_fields(&post, fields)?;
        Ok(post)
    }
}

impl<S: DocumentStore + ?Sized> PostRepository for DocumentPostRepository<S> {
    fn get_all(&self) -> PostResult<Vec<Post>> {
        Self::decode_sorted(self.store.list(COLLECTION)?)
    }

    fn add_post(&self, post: Post) -> PostResult<Post> {
        let doc = Value::Object(Self::encode(&post)?);
        self.store.insert(COLLECTION, &post.id, &doc)?;
        debug!(id = %post.id, "post stored");
        Ok(post)
    }

    fn get_by_category(&self, category: Category) -> PostResult<Vec<Post>> {
        let docs = self
            .store
            .find(COLLECTION, &Filter::eq("category", category.as_str()))?;
        Self::decode_sorted(docs)
    }

    fn get_by_id(&self, id: &str) -> PostResult<Post> {
        self.modify(id, VIEW_FIELDS, |post| {
            post.views = post.views.saturating_add(1);
            Ok(())
        })
    }

    fn delete_post(&self, id: &str, requester: &User) -> PostResult<Deleted> {
        let post = self.load(id)?;
        if post.author.id != requester.id {
            return Err(PostError::Unauthorized);
        }
        if !self.store.delete(COLLECTION, id)? {
            return Err(PostError::PostNotFound);
        }
        debug!(id, "post removed");
        Ok(Deleted)
    }

    fn add_comment(&self, post_id: &str, comment: Comment) -> PostResult<Post> {
        self.modify(post_id, COMMENT_FIELDS, |post| post.add_comment(comment))
    }

    fn delete_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        requester: &User,
    ) -> PostResult<Post> {
        self.modify(post_id, COMMENT_FIELDS, |post| {
            post.delete_comment(comment_id, &requester.id)
        })
    }

    fn upvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post> {
        self.modify(post_id, VOTE_FIELDS, |post| post.upvote(&requester.id))
    }

    fn downvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post> {
        self.modify(post_id, VOTE_FIELDS, |post| post.downvote(&requester.id))
    }

    fn unvote_post(&self, post_id: &str, requester: &User) -> PostResult<Post> {
        self.modify(post_id, VOTE_FIELDS, |post| post.unvote(&requester.id))
    }

    fn get_by_user(&self, username: &str) -> PostResult<Vec<Post>> {
        let docs = self
            .store
            .find(COLLECTION, &Filter::eq("author.username", username))?;
        let mut posts = docs
            .into_iter()
            .map(Self::decode)
            .collect::<PostResult<Vec<_>>>()?;
        posts.sort_by(by_newest);
        Ok(posts)
    }
}

impl<S: DocumentStore + ?Sized> std::fmt::Debug for DocumentPostRepository<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPostRepository")
            .field("collection", &COLLECTION)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{NewPost, PostType};
    use asp_store::InMemoryDocumentStore;
    use serde_json::json;
    use std::thread;

    fn alice() -> User {
        User::new("alice", "aaaaaaaaaaaaaaaaaaaaaaaa")
    }

    fn post_by(author: User) -> Post {
        Post::new(
            author,
            NewPost {
                kind: PostType::Text,
                category: Category::Funny,
                title: "joke".into(),
                url: String::new(),
                text: "knock knock".into(),
            },
        )
    }

    fn repo() -> (Arc<InMemoryDocumentStore>, DocumentPostRepository<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        (Arc::clone(&store), DocumentPostRepository::new(store))
    }

    #[test]
    fn stores_wire_shaped_document() {
        let (store, repo) = repo();
        let post = repo.add_post(post_by(alice())).unwrap();
        let doc = store.get(COLLECTION, &post.id).unwrap().unwrap();
        assert_eq!(doc["author"]["username"], "alice");
        assert_eq!(doc["upvotePercentage"], 100);
        assert_eq!(doc["score"], 1);
    }

    #[test]
    fn view_update_touches_only_views() {
        let (store, repo) = repo();
        let post = repo.add_post(post_by(alice())).unwrap();
        // A concurrent writer changes the title behind our back.
        let mut patch = Map::new();
        patch.insert("title".into(), json!("edited"));
        store.update(COLLECTION, &post.id, &patch).unwrap();

        let fetched = repo.get_by_id(&post.id).unwrap();
        assert_eq!(fetched.views, 1);
        let doc = store.get(COLLECTION, &post.id).unwrap().unwrap();
        assert_eq!(doc["title"], "edited");
        assert_eq!(doc["views"], 1);
    }

    #[test]
    fn vote_update_writes_score_fields_together() {
        let (store, repo) = repo();
        let post = repo.add_post(post_by(alice())).unwrap();
        repo.downvote_post(&post.id, &alice()).unwrap();
        let doc = store.get(COLLECTION, &post.id).unwrap().unwrap();
        assert_eq!(doc["votes"], json!([{"user": alice().id, "vote": -1}]));
        assert_eq!(doc["score"], -1);
        assert_eq!(doc["upvotePercentage"], 0);
    }

    #[test]
    fn malformed_id_is_not_found() {
        let (_store, repo) = repo();
        assert!(matches!(
            repo.get_by_id("../../etc"),
            Err(PostError::PostNotFound)
        ));
    }

    #[test]
    fn corrupt_document_surfaces_as_corrupt() {
        let (store, repo) = repo();
        let id = "cccccccccccccccccccccccc";
        store
            .insert(COLLECTION, id, &json!({"id": id, "title": 7}))
            .unwrap();
        assert!(matches!(
            repo.get_by_id(id),
            Err(PostError::Corrupt { .. })
        ));
        assert_eq!(repo.get_all().unwrap_err().kind(), asp_types::ErrorKind::Internal);
    }

    #[test]
    fn null_votes_surface_as_nil_list() {
        let (store, repo) = repo();
        let post = repo.add_post(post_by(alice())).unwrap();
        let mut patch = Map::new();
        patch.insert("votes".into(), Value::Null);
        store.update(COLLECTION, &post.id, &patch).unwrap();
        assert!(matches!(
            repo.upvote_post(&post.id, &alice()),
            Err(PostError::NilList("vote list"))
        ));
    }

    #[test]
    fn concurrent_upvotes_leave_consistent_document() {
        let (store, repo) = repo();
        let repo = Arc::new(repo);
        let post = repo.add_post(post_by(alice())).unwrap();
        let n = 16;
        let handles: Vec<_> = (0..n)
            .map(|i| {
                let repo = Arc::clone(&repo);
                let id = post.id.clone();
                thread::spawn(move || {
                    let voter = User::new(format!("u{i}"), format!("{i:024x}"));
                    repo.upvote_post(&id, &voter).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        // Updates may be lost; the stored fields must still agree.
        let doc = store.get(COLLECTION, &post.id).unwrap().unwrap();
        let stored: Post = serde_json::from_value(doc).unwrap();
        let votes = stored.votes();
        assert!(votes.len() >= 2 && votes.len() <= n + 1);
        assert_eq!(
            stored.score(),
            2 * votes.likes_count() as i64 - votes.len() as i64
        );
        assert_eq!(stored.likes_percent(), votes.likes_percent());
    }
}
