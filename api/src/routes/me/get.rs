use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{download_headers, parse_format};
use crate::services::attendance_query::{self, CourseAttendanceSummary, StudentCourseReport};
use crate::services::error::AttendanceError;
use crate::services::export;

/// GET /me/attendance
///
/// The caller's attendance percentage in each course they are enrolled in.
pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<CourseAttendanceSummary>>>, AttendanceError> {
    let summary = attendance_query::student_summary(state.db(), user.id()).await?;
    Ok(Json(ApiResponse::success(summary, "Attendance summary retrieved")))
}

/// GET /me/attendance/{course_id}
///
/// Every sitting of the course with the caller's mark, oldest first.
///
/// ### Responses
/// - `200 OK` with `{ courseId, courseCode, ..., attendancePercentage, sessions: [{ sessionId, date, status }] }`
/// - `403 Forbidden` when the caller does not take the course
pub async fn my_course_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<i64>,
) -> Result<Json<ApiResponse<StudentCourseReport>>, AttendanceError> {
    let report = attendance_query::student_course_report(state.db(), user.id(), course_id).await?;
    Ok(Json(ApiResponse::success(report, "Course attendance retrieved")))
}

#[derive(Debug, Deserialize)]
pub struct MyExportQuery {
    pub format: Option<String>,
}

/// GET /me/attendance/{course_id}/export[?format=xlsx|csv]
///
/// Downloads the caller's own row of the course sheet.
pub async fn export_my_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<i64>,
    Query(q): Query<MyExportQuery>,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), AttendanceError> {
    let format = parse_format(q.format.as_deref())?;
    let (course, sheet) = attendance_query::student_sheet(state.db(), user.id(), course_id).await?;
    let body = export::render(&sheet, format)?;

    tracing::info!(student_id = user.id(), course_id, bytes = body.len(), "Own attendance exported");
    let headers = download_headers(format, &format!("attendance_{}", course.code));
    Ok((StatusCode::OK, headers, body))
}
