use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::PairQuery;
use crate::services::error::AttendanceError;
use crate::services::session_issuer::{self, SessionView};

/// GET /sessions?classId=..&courseId=..
///
/// Every session held for the pair, oldest first, with status evaluated now.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<PairQuery>,
) -> Result<Json<ApiResponse<Vec<SessionView>>>, AttendanceError> {
    let sessions =
        session_issuer::list_sessions(state.db(), (&user).into(), q.course_id, q.class_id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(sessions, "Sessions retrieved")))
}

/// GET /sessions/{session_id}
///
/// Lets the issuing teacher re-display the QR code.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<Json<ApiResponse<SessionView>>, AttendanceError> {
    let view = session_issuer::get_session(state.db(), (&user).into(), session_id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(view, "Session retrieved")))
}
