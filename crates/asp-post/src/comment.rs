use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use asp_types::{new_id, User};

use crate::error::{PostError, PostResult};

/// A comment embedded in a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub created: DateTime<Utc>,
    pub author: User,
    pub body: String,
    pub id: String,
}

impl Comment {
    /// New comment with a fresh id, stamped now.
    pub fn new(author: User, body: impl Into<String>) -> Self {
        Self::new_at(author, body, Utc::now())
    }

    pub fn new_at(author: User, body: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            created,
            author,
            body: body.into(),
            id: new_id(),
        }
    }
}

/// Insertion-ordered comments of one post, unique by id.
///
/// Serializes as a bare JSON array; `null` decodes to the uninitialized
/// list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentList {
    entries: Option<Vec<Comment>>,
}

impl CommentList {
    pub fn new() -> Self {
        Self {
            entries: Some(Vec::new()),
        }
    }

    pub fn uninitialized() -> Self {
        Self { entries: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.entries.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.entries.iter().flatten()
    }

    pub fn get(&self, comment_id: &str) -> Option<&Comment> {
        self.iter().find(|c| c.id == comment_id)
    }

    pub fn add(&mut self, comment: Comment) -> PostResult<()> {
        self.entries_mut()?.push(comment);
        Ok(())
    }

    /// Remove a comment on behalf of `requester_id`, who must be its author.
    /// Order of the remaining comments is not preserved.
    pub fn delete(&mut self, comment_id: &str, requester_id: &str) -> PostResult<()> {
        let entries = self.entries_mut()?;
        let i = entries
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or(PostError::CommentNotFound)?;
        if entries[i].author.id != requester_id {
            return Err(PostError::Unauthorized);
        }
        entries.swap_remove(i);
        Ok(())
    }

    fn entries_mut(&mut self) -> PostResult<&mut Vec<Comment>> {
        self.entries.as_mut().ok_or(PostError::NilList("comment list"))
    }
}

impl Default for CommentList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new("alice", "aaaaaaaaaaaaaaaaaaaaaaaa")
    }

    fn bob() -> User {
        User::new("bob", "bbbbbbbbbbbbbbbbbbbbbbbb")
    }

    #[test]
    fn add_appends_in_order() {
        let mut list = CommentList::new();
        list.add(Comment::new(alice(), "first")).unwrap();
        list.add(Comment::new(bob(), "second")).unwrap();
        let bodies: Vec<_> = list.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, ["first", "second"]);
    }

    #[test]
    fn fresh_comments_have_distinct_ids() {
        let a = Comment::new(alice(), "x");
        let b = Comment::new(alice(), "x");
        assert_ne!(a.id, b.id);
        assert!(asp_types::is_valid_id(&a.id));
    }

    #[test]
    fn author_can_delete() {
        let mut list = CommentList::new();
        let c = Comment::new(alice(), "hi");
        let id = c.id.clone();
        list.add(c).unwrap();
        list.delete(&id, &alice().id).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut list = CommentList::new();
        list.add(Comment::new(alice(), "hi")).unwrap();
        assert!(matches!(
            list.delete("cccccccccccccccccccccccc", &alice().id),
            Err(PostError::CommentNotFound)
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn delete_from_empty_list_is_not_found() {
        let mut list = CommentList::new();
        assert!(matches!(
            list.delete("cccccccccccccccccccccccc", &alice().id),
            Err(PostError::CommentNotFound)
        ));
        assert!(list.is_empty());
    }

    #[test]
    fn delete_by_other_user_is_unauthorized() {
        let mut list = CommentList::new();
        let c = Comment::new(alice(), "hi");
        let id = c.id.clone();
        list.add(c).unwrap();
        assert!(matches!(
            list.delete(&id, &bob().id),
            Err(PostError::Unauthorized)
        ));
        assert!(list.get(&id).is_some());
    }

    #[test]
    fn delete_swaps_last_into_place() {
        let mut list = CommentList::new();
        let first = Comment::new(alice(), "1");
        let first_id = first.id.clone();
        list.add(first).unwrap();
        list.add(Comment::new(alice(), "2")).unwrap();
        list.add(Comment::new(alice(), "3")).unwrap();
        list.delete(&first_id, &alice().id).unwrap();
        let bodies: Vec<_> = list.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, ["3", "2"]);
    }

    #[test]
    fn uninitialized_rejects_mutation() {
        let mut list: CommentList = serde_json::from_str("null").unwrap();
        assert!(!list.is_initialized());
        assert!(matches!(
            list.add(Comment::new(alice(), "x")),
            Err(PostError::NilList("comment list"))
        ));
        assert!(matches!(
            list.delete("x", "y"),
            Err(PostError::NilList(_))
        ));
    }

    #[test]
    fn wire_shape() {
        let mut list = CommentList::new();
        list.add(Comment::new(alice(), "hello")).unwrap();
        let json = serde_json::to_value(&list).unwrap();
        let c = &json[0];
        assert_eq!(c["body"], "hello");
        assert_eq!(c["author"]["username"], "alice");
        assert!(c["created"].is_string());
        assert_eq!(c["id"].as_str().unwrap().len(), 24);
    }
}
