use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::error::AttendanceError;
use crate::services::session_issuer::{self, CreateSession, SessionView};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub course_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
}

/// POST /sessions
///
/// Issues a time-boxed attendance session and returns the token with the
/// QR payload to display.
///
/// ### Request Body
/// ```json
/// { "courseId": 1, "classId": 2, "teacherId": 3, "date": "2025-01-10" }
/// ```
///
/// ### Responses
/// - `201 Created` with the session, `token`, `qrPayload` and `expiresAt`
/// - `400 Bad Request` when the date is in the past or beyond the horizon
/// - `403 Forbidden` when the caller is not assigned to the course and class
/// - `409 Conflict` when a session for the same sitting is still active
pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionView>>), AttendanceError> {
    let view = session_issuer::create_session(
        state.db(),
        state.ws(),
        (&user).into(),
        CreateSession {
            course_id: req.course_id,
            class_id: req.class_id,
            teacher_id: req.teacher_id,
            date: req.date,
        },
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(view, "Attendance session created")),
    ))
}

/// POST /sessions/{session_id}/close
///
/// Ends the redemption window early. Closing an expired session is a no-op.
pub async fn close_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<Json<ApiResponse<SessionView>>, AttendanceError> {
    let view = session_issuer::close_session(state.db(), state.ws(), (&user).into(), session_id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(view, "Attendance session closed")))
}
