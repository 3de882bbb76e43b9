//! `/attendance`: scan redemption, manual marks and the read-side reports.
//!
//! Guards are per route: redemption is for students, everything else for
//! teachers.

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::{allow_student, allow_teacher};

pub mod get;
pub mod post;

use get::{export_attendance, get_attendance, get_low_attendance};
use post::{notify_low_attendance, redeem, submit_manual};

pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/redeem",
            post(redeem).route_layer(from_fn_with_state(app_state.clone(), allow_student)),
        )
        .route("/manual", post(submit_manual).route_layer(from_fn_with_state(app_state.clone(), allow_teacher)))
        .route("/", get(get_attendance).route_layer(from_fn_with_state(app_state.clone(), allow_teacher)))
        .route("/low", get(get_low_attendance).route_layer(from_fn_with_state(app_state.clone(), allow_teacher)))
        .route("/low/notify", post(notify_low_attendance).route_layer(from_fn_with_state(app_state.clone(), allow_teacher)))
        .route("/export", get(export_attendance).route_layer(from_fn_with_state(app_state.clone(), allow_teacher)))
}
