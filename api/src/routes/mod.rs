//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness check (public)
//! - `/auth` → login (public)
//! - `/sessions` → attendance session issuance and lifecycle (teachers)
//! - `/attendance` → scan redemption (students), manual marks, reports and export (teachers)
//! - `/me` → the caller's own attendance report (students)
//! - `/notifications` → notification backlog and read flags (students)

use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

use crate::auth::guards::{allow_student, allow_teacher};
use crate::routes::{
    attendance::attendance_routes, auth::auth_routes, health::health_routes, me::me_routes,
    notifications::notification_routes, sessions::session_routes,
};

pub mod attendance;
pub mod auth;
pub mod common;
pub mod health;
pub mod me;
pub mod notifications;
pub mod sessions;

/// Builds the `/api` router.
///
/// State is attached once by the caller; nothing here calls `with_state`.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest(
            "/sessions",
            session_routes().route_layer(from_fn_with_state(app_state.clone(), allow_teacher)),
        )
        .nest("/attendance", attendance_routes(app_state.clone()))
        .nest(
            "/me",
            me_routes().route_layer(from_fn_with_state(app_state.clone(), allow_student)),
        )
        .nest(
            "/notifications",
            notification_routes().route_layer(from_fn_with_state(app_state, allow_student)),
        )
}
