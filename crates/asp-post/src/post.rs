//! The post aggregate root.
//!
//! A [`Post`] owns its vote ledger and comment list. Every vote mutation
//! goes through the post so that the materialized `score` and
//! `upvotePercentage` fields are refreshed in the same step.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use asp_types::{new_id, User};

use crate::comment::{Comment, CommentList};
use crate::error::PostResult;
use crate::vote::VoteList;

/// Kind of content a post carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Link,
}

/// Fixed set of topical categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Music,
    Funny,
    Videos,
    Programming,
    News,
    Fashion,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Music,
        Self::Funny,
        Self::Videos,
        Self::Programming,
        Self::News,
        Self::Fashion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Funny => "funny",
            Self::Videos => "videos",
            Self::Programming => "programming",
            Self::News => "news",
            Self::Fashion => "fashion",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name did not match any [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Client-supplied fields of a post being created.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewPost {
    #[serde(rename = "type")]
    pub kind: PostType,
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
}

/// A submitted post with its votes and comments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub(crate) score: i64,
    pub views: u32,
    #[serde(rename = "type")]
    pub kind: PostType,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub author: User,
    pub category: Category,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    pub(crate) votes: VoteList,
    pub(crate) comments: CommentList,
    pub created: DateTime<Utc>,
    #[serde(rename = "upvotePercentage")]
    pub(crate) likes_percent: u32,
    pub id: String,
}

impl Post {
    /// A fresh post: new id, the author's own like, no comments.
    pub fn new(author: User, draft: NewPost) -> Self {
        Self::new_at(author, draft, Utc::now())
    }

    pub fn new_at(author: User, draft: NewPost, created: DateTime<Utc>) -> Self {
        let votes = VoteList::new(author.id.clone());
        let mut post = Self {
            score: 0,
            views: 0,
            kind: draft.kind,
            title: draft.title,
            url: draft.url,
            author,
            category: draft.category,
            text: draft.text,
            votes,
            comments: CommentList::new(),
            created,
            likes_percent: 0,
            id: new_id(),
        };
        post.refresh_score();
        post
    }

    /// `2 * likes - votes`, as of the last vote mutation.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Whole-percent share of likes among votes.
    pub fn likes_percent(&self) -> u32 {
        self.likes_percent
    }

    pub fn votes(&self) -> &VoteList {
        &self.votes
    }

    pub fn comments(&self) -> &CommentList {
        &self.comments
    }

    pub fn upvote(&mut self, user_id: &str) -> PostResult<()> {
        self.votes.upvote(user_id)?;
        self.refresh_score();
        Ok(())
    }

    pub fn downvote(&mut self, user_id: &str) -> PostResult<()> {
        self.votes.downvote(user_id)?;
        self.refresh_score();
        Ok(())
    }

    pub fn unvote(&mut self, user_id: &str) -> PostResult<()> {
        self.votes.unvote(user_id)?;
        self.refresh_score();
        Ok(())
    }

    pub fn add_comment(&mut self, comment: Comment) -> PostResult<()> {
        self.comments.add(comment)
    }

    pub fn delete_comment(&mut self, comment_id: &str, requester_id: &str) -> PostResult<()> {
        self.comments.delete(comment_id, requester_id)
    }

    /// Recompute the materialized score fields from the ledger.
    pub(crate) fn refresh_score(&mut self) {
        self.score = self.votes.score();
        self.likes_percent = self.votes.likes_percent();
    }
}

/// Front-page order: highest score first, older posts first among equals.
pub fn by_score(a: &Post, b: &Post) -> Ordering {
    b.score.cmp(&a.score).then(a.created.cmp(&b.created))
}

/// Newest first.
pub fn by_newest(a: &Post, b: &Post) -> Ordering {
    b.created.cmp(&a.created)
}
