//! `/sessions`: attendance session issuance and lifecycle.
//!
//! Mounted behind `allow_teacher`.

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

use get::{get_session, list_sessions};
use post::{close_session, create_session};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/{session_id}", get(get_session))
        .route("/{session_id}/close", post(close_session))
}
