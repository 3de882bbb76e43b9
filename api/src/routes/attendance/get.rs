use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use chrono::NaiveDate;
use serde::Deserialize;
use util::{config, state::AppState};

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{download_headers, parse_format};
use crate::services::attendance_query::{self, AttendanceSheet, StudentAttendanceRow};
use crate::services::error::AttendanceError;
use crate::services::export;
use crate::services::{Actor, authorize_teacher};

async fn authorize_pair(state: &AppState, user: &AuthUser, course_id: i64, class_id: i64) -> Result<(), AttendanceError> {
    let actor = Actor::from(user);
    authorize_teacher(state.db(), actor, course_id, class_id, actor.id).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub class_id: i64,
    pub course_id: i64,
    pub date: NaiveDate,
}

/// GET /attendance?classId=..&courseId=..&date=YYYY-MM-DD
///
/// One row per enrolled student with the mark for that date and the running
/// percentage. `status` is `null` when no session was held that day.
pub async fn get_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<AttendanceQuery>,
) -> Result<Json<ApiResponse<Vec<StudentAttendanceRow>>>, AttendanceError> {
    authorize_pair(&state, &user, q.course_id, q.class_id).await?;
    let rows = attendance_query::get_attendance(state.db(), q.class_id, q.course_id, q.date).await?;
    Ok(Json(ApiResponse::success(rows, "Attendance retrieved")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowAttendanceQuery {
    pub class_id: i64,
    pub course_id: i64,
    pub threshold: Option<f64>,
}

/// GET /attendance/low?classId=..&courseId=..[&threshold=75]
///
/// Students strictly below the threshold, which defaults to the configured
/// low-attendance percentage.
pub async fn get_low_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<LowAttendanceQuery>,
) -> Result<Json<ApiResponse<Vec<StudentAttendanceRow>>>, AttendanceError> {
    authorize_pair(&state, &user, q.course_id, q.class_id).await?;
    let threshold = q.threshold.unwrap_or_else(config::low_attendance_threshold);
    let rows = attendance_query::get_low_attendance(state.db(), q.class_id, q.course_id, threshold).await?;
    Ok(Json(ApiResponse::success(rows, "Low attendance retrieved")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub class_id: i64,
    pub course_id: i64,
    pub format: Option<String>,
}

/// GET /attendance/export?classId=..&courseId=..[&format=xlsx|csv]
///
/// Downloads the full attendance sheet. Defaults to xlsx.
pub async fn export_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<ExportQuery>,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), AttendanceError> {
    let format = parse_format(q.format.as_deref())?;
    authorize_pair(&state, &user, q.course_id, q.class_id).await?;

    let sheet = AttendanceSheet::load(state.db(), q.class_id, q.course_id).await?;
    let body = export::render(&sheet, format)?;

    let headers = download_headers(format, &format!("attendance_course{}_class{}", q.course_id, q.class_id));

    tracing::info!(
        class_id = q.class_id,
        course_id = q.course_id,
        bytes = body.len(),
        format = format.extension(),
        "Attendance exported"
    );
    Ok((StatusCode::OK, headers, body))
}
