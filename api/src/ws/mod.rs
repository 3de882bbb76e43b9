use axum::{Router, middleware::from_fn_with_state, routing::get};
use util::state::AppState;

use crate::auth::guards::allow_student;
use crate::ws::{attendance::ws_attendance_routes, notifications::handlers::notifications_ws_handler};

pub mod attendance;
pub mod core;
pub mod notifications;

/// Routes mounted under `/ws`.
pub fn ws_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(notifications_ws_handler).route_layer(from_fn_with_state(app_state.clone(), allow_student)),
        )
        .nest("/attendance", ws_attendance_routes(app_state))
}
