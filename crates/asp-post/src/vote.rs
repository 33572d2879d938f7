//! The per-post vote ledger.
//!
//! A [`VoteList`] holds at most one [`Vote`] per user plus a cached count of
//! likes. The cache always equals the number of `Like` entries; every
//! mutation maintains it incrementally.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PostError, PostResult};

/// A single user's vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum VoteValue {
    Like,
    Dislike,
}

impl From<VoteValue> for i8 {
    fn from(v: VoteValue) -> Self {
        match v {
            VoteValue::Like => 1,
            VoteValue::Dislike => -1,
        }
    }
}

impl TryFrom<i8> for VoteValue {
    type Error = InvalidVote;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Like),
            -1 => Ok(Self::Dislike),
            other => Err(InvalidVote(other)),
        }
    }
}

/// A vote value other than `1` or `-1` was decoded.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidVote(pub i8);

impl fmt::Display for InvalidVote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid vote value {}, expected 1 or -1", self.0)
    }
}

/// One ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(rename = "vote")]
    pub value: VoteValue,
}

/// Ledger of votes on one post, unique by user id.
///
/// Serializes as a bare JSON array of votes. `null` decodes to the
/// uninitialized ledger, on which every mutation fails with
/// [`PostError::NilList`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Vec<Vote>>", into = "Option<Vec<Vote>>")]
pub struct VoteList {
    entries: Option<Vec<Vote>>,
    likes: usize,
}

impl VoteList {
    /// A fresh ledger: the author has liked their own post.
    pub fn new(author_id: impl Into<String>) -> Self {
        Self {
            entries: Some(vec![Vote {
                user_id: author_id.into(),
                value: VoteValue::Like,
            }]),
            likes: 1,
        }
    }

    /// A ledger with no votes at all.
    pub fn empty() -> Self {
        Self {
            entries: Some(Vec::new()),
            likes: 0,
        }
    }

    /// The uninitialized ledger.
    pub fn uninitialized() -> Self {
        Self {
            entries: None,
            likes: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.entries.is_some()
    }

    /// Number of votes (likes and dislikes).
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn likes_count(&self) -> usize {
        self.likes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vote> {
        self.entries.iter().flatten()
    }

    /// The vote cast by `user_id`, if any.
    pub fn get(&self, user_id: &str) -> Option<VoteValue> {
        self.iter()
            .find(|v| v.user_id == user_id)
            .map(|v| v.value)
    }

    /// Record a like from `user_id`.
    ///
    /// The like count only grows when the user moves into the `Like` state;
    /// re-liking is a no-op.
    pub fn upvote(&mut self, user_id: &str) -> PostResult<()> {
        let entries = self.entries_mut()?;
        match entries.iter_mut().find(|v| v.user_id == user_id) {
            Some(vote) if vote.value == VoteValue::Like => {}
            Some(vote) => {
                vote.value = VoteValue::Like;
                self.likes += 1;
            }
            None => {
                entries.push(Vote {
                    user_id: user_id.to_string(),
                    value: VoteValue::Like,
                });
                self.likes += 1;
            }
        }
        Ok(())
    }

    /// Record a dislike from `user_id`.
    pub fn downvote(&mut self, user_id: &str) -> PostResult<()> {
        let entries = self.entries_mut()?;
        let was_like = match entries.iter_mut().find(|v| v.user_id == user_id) {
            Some(vote) => {
                let was_like = vote.value == VoteValue::Like;
                vote.value = VoteValue::Dislike;
                was_like
            }
            None => {
                entries.push(Vote {
                    user_id: user_id.to_string(),
                    value: VoteValue::Dislike,
                });
                false
            }
        };
        if was_like {
            self.likes -= 1;
        }
        Ok(())
    }

    /// Remove `user_id`'s vote. Entry order is not preserved. No-op if the
    /// user has not voted.
    pub fn unvote(&mut self, user_id: &str) -> PostResult<()> {
        let entries = self.entries_mut()?;
        if let Some(i) = entries.iter().position(|v| v.user_id == user_id) {
            if entries.swap_remove(i).value == VoteValue::Like {
                self.likes -= 1;
            }
        }
        Ok(())
    }

    /// `2 * likes - votes`.
    pub fn score(&self) -> i64 {
        2 * self.likes as i64 - self.len() as i64
    }

    /// Share of likes among all votes, truncated to a whole percent. Zero
    /// for an empty ledger.
    pub fn likes_percent(&self) -> u32 {
        match self.len() {
            0 => 0,
            n => (self.likes * 100 / n) as u32,
        }
    }

    fn entries_mut(&mut self) -> PostResult<&mut Vec<Vote>> {
        self.entries.as_mut().ok_or(PostError::NilList("vote list"))
    }
}

impl From<Option<Vec<Vote>>> for VoteList {
    fn from(entries: Option<Vec<Vote>>) -> Self {
        let likes = entries
            .iter()
            .flatten()
            .filter(|v| v.value == VoteValue::Like)
            .count();
        Self { entries, likes }
    }
}

impl From<VoteList> for Option<Vec<Vote>> {
    fn from(list: VoteList) -> Self {
        list.entries
    }
}

impl fmt::Debug for VoteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entries {
            Some(entries) => write!(f, "VoteList({}/{} likes)", self.likes, entries.len()),
            None => write!(f, "VoteList(nil)"),
        }
    }
}
