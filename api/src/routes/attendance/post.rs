use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use db::models::attendance_record::{AttendanceStatus, RecordSource};
use serde::{Deserialize, Serialize};
use util::{config, state::AppState};
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{dispatcher, validate_body};
use crate::services::error::AttendanceError;
use crate::services::manual_attendance::{self, ManualEntry, ManualOutcome, ManualSubmission};
use crate::services::scan_redeemer::{self, Redemption};
use crate::services::{Actor, attendance_query, authorize_teacher, ensure_self};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    pub student_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub status: AttendanceStatus,
    pub timestamp: DateTime<Utc>,
    pub session_id: i64,
    pub student_id: i64,
    pub source: RecordSource,
}

/// POST /attendance/redeem
///
/// Exchanges a scanned token for a `Present` mark. `token` may be the bare
/// token or the whole QR payload.
///
/// ### Request Body
/// ```json
/// { "token": "9f0c...", "studentId": 7 }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ status: "Present", timestamp, ... }`
/// - `409 Conflict` with `success: true` and the existing record when the
///   student was already marked. Nothing needs fixing on the client.
/// - `400 Bad Request` for an unknown or malformed token
/// - `403 Forbidden` when not enrolled or `studentId` is someone else
/// - `410 Gone` when the session has expired
pub async fn redeem(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<RedeemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RedeemResponse>>), AttendanceError> {
    validate_body(&req)?;
    ensure_self((&user).into(), req.student_id)?;

    let outcome = scan_redeemer::redeem(state.db(), &dispatcher(&state), &req.token, req.student_id, Utc::now()).await?;

    let (status, message) = match &outcome {
        Redemption::Marked(_) => (StatusCode::OK, "Attendance marked"),
        Redemption::AlreadyMarked(_) => (StatusCode::CONFLICT, "Attendance already marked"),
    };
    let record = outcome.record();

    Ok((
        status,
        Json(ApiResponse::success(
            RedeemResponse {
                status: record.status,
                timestamp: record.recorded_at,
                session_id: record.session_id,
                student_id: record.student_id,
                source: record.source,
            },
            message,
        )),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualRequest {
    pub class_id: i64,
    pub course_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "At least one record is required"))]
    pub records: Vec<ManualEntry>,
}

/// POST /attendance/manual
///
/// Records marks by hand. A manual mark overrides a QR mark for the same
/// student on the same sitting.
///
/// ### Request Body
/// ```json
/// {
///   "classId": 2, "courseId": 1, "teacherId": 3, "date": "2025-01-10",
///   "records": [{ "studentId": 7, "status": "Present" }, { "studentId": 8, "status": "Absent" }]
/// }
/// ```
pub async fn submit_manual(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ManualRequest>,
) -> Result<Json<ApiResponse<ManualOutcome>>, AttendanceError> {
    validate_body(&req)?;

    let outcome = manual_attendance::submit(
        state.db(),
        &dispatcher(&state),
        (&user).into(),
        ManualSubmission {
            class_id: req.class_id,
            course_id: req.course_id,
            teacher_id: req.teacher_id,
            date: req.date,
            records: req.records,
        },
        Utc::now(),
    )
    .await?;

    Ok(Json(ApiResponse::success(outcome, "Attendance recorded")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyLowRequest {
    pub class_id: i64,
    pub course_id: i64,
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct NotifyLowResponse {
    pub notified: usize,
}

/// POST /attendance/low/notify
///
/// Sends a low-attendance alert to every student below the threshold.
pub async fn notify_low_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NotifyLowRequest>,
) -> Result<Json<ApiResponse<NotifyLowResponse>>, AttendanceError> {
    let actor = Actor::from(&user);
    authorize_teacher(state.db(), actor, req.course_id, req.class_id, actor.id).await?;

    let threshold = req.threshold.unwrap_or_else(config::low_attendance_threshold);
    let notified =
        attendance_query::notify_low_attendance(state.db(), &dispatcher(&state), req.class_id, req.course_id, threshold)
            .await?;

    Ok(Json(ApiResponse::success(
        NotifyLowResponse { notified },
        format!("Notified {notified} student(s)"),
    )))
}
