//! Request handlers.
//!
//! Every handler validates path identifiers first, then authenticates (for
//! protected routes), then runs the repository call on the blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use asp_auth::Session;
use asp_post::{Category, Comment, Deleted, NewPost, Post};
use asp_types::{is_valid_id, Credentials, FieldError, User, ValidationErrors};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Run a blocking repository call off the async executor.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

fn valid_id(id: String, what: &'static str) -> ServerResult<String> {
    if is_valid_id(&id) {
        Ok(id)
    } else {
        Err(ServerError::InvalidId(what))
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> ServerResult<User> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let sessions = state.sessions.clone();
    blocking(move || Ok(sessions.check(&header)?)).await
}

fn require(field: &str, value: &str) -> ServerResult<()> {
    if value.is_empty() {
        return Err(ValidationErrors::single(FieldError::body(field, "is required")).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ServerResult<Json<Session>> {
    let Json(creds) = payload?;
    require("username", &creds.username)?;
    require("password", &creds.password)?;
    let (user, session) = blocking(move || {
        let user = state.users.sign_up(&creds.username, &creds.password)?;
        let session = state.sessions.create(&user)?;
        Ok((user, session))
    })
    .await?;
    info!("registered user: username={} id={}", user.username, user.id);
    Ok(Json(session))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ServerResult<Json<Session>> {
    let Json(creds) = payload?;
    let (user, session) = blocking(move || {
        let user = state.users.authorize(&creds.username, &creds.password)?;
        let session = state.sessions.create(&user)?;
        Ok((user, session))
    })
    .await?;
    info!("logged user: username={} id={}", user.username, user.id);
    Ok(Json(session))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

pub async fn list_posts(State(state): State<AppState>) -> ServerResult<Json<Vec<Post>>> {
    let posts = blocking(move || Ok(state.posts.get_all()?)).await?;
    info!("listed all posts");
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> ServerResult<Json<Post>> {
    let user = authenticate(&state, &headers).await?;
    let Json(draft) = payload?;
    let post = blocking(move || Ok(state.posts.add_post(Post::new(user, draft))?)).await?;
    info!("created post: id={}", post.id);
    Ok(Json(post))
}

/// Unknown category names list nothing.
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ServerResult<Json<Vec<Post>>> {
    let posts = match category.parse::<Category>() {
        Ok(c) => blocking(move || Ok(state.posts.get_by_category(c)?)).await?,
        Err(_) => Vec::new(),
    };
    info!("listed posts by: category={category}");
    Ok(Json(posts))
}

pub async fn show_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ServerResult<Json<Post>> {
    let post_id = valid_id(post_id, "post")?;
    let post = blocking(move || Ok(state.posts.get_by_id(&post_id)?)).await?;
    info!("showed post: id={}", post.id);
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Json<Deleted>> {
    let post_id = valid_id(post_id, "post")?;
    let user = authenticate(&state, &headers).await?;
    let id = post_id.clone();
    let deleted = blocking(move || Ok(state.posts.delete_post(&id, &user)?)).await?;
    info!("deleted post: id={post_id}");
    Ok(Json(deleted))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub comment: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> ServerResult<Json<Post>> {
    let post_id = valid_id(post_id, "post")?;
    let user = authenticate(&state, &headers).await?;
    let Json(body) = payload?;
    require("comment", &body.comment)?;
    let comment = Comment::new(user, body.comment);
    let comment_id = comment.id.clone();
    let post = blocking(move || Ok(state.posts.add_comment(&post_id, comment)?)).await?;
    info!("created comment: id={comment_id}");
    Ok(Json(post))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ServerResult<Json<Post>> {
    let post_id = valid_id(post_id, "post")?;
    let comment_id = valid_id(comment_id, "comment")?;
    let user = authenticate(&state, &headers).await?;
    let id = comment_id.clone();
    let post =
        blocking(move || Ok(state.posts.delete_comment(&post_id, &id, &user)?)).await?;
    info!("deleted comment: id={comment_id}");
    Ok(Json(post))
}

#[derive(Clone, Copy, Debug)]
enum VoteAction {
    Up,
    Down,
    Un,
}

async fn vote(
    state: AppState,
    post_id: String,
    headers: HeaderMap,
    action: VoteAction,
) -> ServerResult<Json<Post>> {
    let post_id = valid_id(post_id, "post")?;
    let user = authenticate(&state, &headers).await?;
    let post = blocking(move || {
        let post = match action {
            VoteAction::Up => state.posts.upvote_post(&post_id, &user)?,
            VoteAction::Down => state.posts.downvote_post(&post_id, &user)?,
            VoteAction::Un => state.posts.unvote_post(&post_id, &user)?,
        };
        Ok(post)
    })
    .await?;
    match action {
        VoteAction::Up => info!("upvoted post: id={}", post.id),
        VoteAction::Down => info!("downvoted post: id={}", post.id),
        VoteAction::Un => info!("unvoted post: id={}", post.id),
    }
    Ok(Json(post))
}

pub async fn upvote(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Json<Post>> {
    vote(state, post_id, headers, VoteAction::Up).await
}

pub async fn downvote(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Json<Post>> {
    vote(state, post_id, headers, VoteAction::Down).await
}

pub async fn unvote(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Json<Post>> {
    vote(state, post_id, headers, VoteAction::Un).await
}

pub async fn list_by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ServerResult<Json<Vec<Post>>> {
    let name = username.clone();
    let posts = blocking(move || Ok(state.posts.get_by_user(&name)?)).await?;
    info!("listed posts by: username={username}");
    Ok(Json(posts))
}
