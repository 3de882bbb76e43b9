use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

/// `/me` routes. Mounted behind `allow_student`.
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/attendance", get(get::my_attendance))
        .route("/attendance/{course_id}", get(get::my_course_attendance))
        .route("/attendance/{course_id}/export", get(get::export_my_attendance))
}
