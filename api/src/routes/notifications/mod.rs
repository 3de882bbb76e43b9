//! `/notifications`: the persisted side of notification delivery.
//!
//! Live pushes arrive over `/ws/notifications`; these routes serve the
//! backlog after a reconnect and flip read flags. Mounted behind
//! `allow_student`.

use axum::{
    Router,
    routing::{get, patch},
};
use util::state::AppState;

pub mod get;
pub mod patch;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_notifications))
        .route("/{notification_id}/read", patch(patch::mark_read))
}
