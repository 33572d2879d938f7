use asp_store::StoreError;
use asp_types::ErrorKind;

/// Errors produced by post aggregate and repository operations.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("post not found")]
    PostNotFound,

    #[error("comment not found")]
    CommentNotFound,

    /// The requester is not the author of the post or comment.
    #[error("unauthorized")]
    Unauthorized,

    /// A vote or comment list was never initialized (e.g. persisted as
    /// `null`). This is a data or programmer error, not a user error.
    #[error("nil {0}")]
    NilList(&'static str),

    /// A stored document could not be decoded into a post.
    #[error("corrupt post document {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PostNotFound | Self::CommentNotFound => ErrorKind::NotFound,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::NilList(_) | Self::Corrupt { .. } | Self::Store(_) => ErrorKind::Internal,
        }
    }
}

/// Result alias for post operations.
pub type PostResult<T> = Result<T, PostError>;
