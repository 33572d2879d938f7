use std::any::Any;

use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::handlers;
use crate::state::AppState;

/// Build the API router over `state`.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/posts/", get(handlers::list_posts))
        .route("/api/posts", post(handlers::create_post))
        .route("/api/posts/:category", get(handlers::list_by_category))
        .route(
            "/api/post/:post_id",
            get(handlers::show_post)
                .post(handlers::create_comment)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/post/:post_id/:comment_id",
            delete(handlers::delete_comment),
        )
        .route("/api/post/:post_id/upvote", get(handlers::upvote))
        .route("/api/post/:post_id/downvote", get(handlers::downvote))
        .route("/api/post/:post_id/unvote", get(handlers::unvote))
        .route("/api/user/:username", get(handlers::list_by_user));
    with_middleware(routes).with_state(state)
}

fn with_middleware(routes: Router<AppState>) -> Router<AppState> {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// A panicking handler answers 500 like any other internal error.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown cause");
    ServerError::Internal(format!("handler panicked: {detail}")).into_response()
}
