use axum::{Router, routing::post};
use util::state::AppState;

pub mod post;

use post::login;

/// `/auth` routes. Public.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
