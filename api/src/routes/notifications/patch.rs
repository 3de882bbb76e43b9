use axum::{
    Extension, Json,
    extract::{Path, State},
};
use db::models::notification;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::dispatcher;
use crate::services::error::AttendanceError;

/// PATCH /notifications/{notification_id}/read
///
/// Marks one of the caller's notifications as read. Repeating the call is
/// harmless. Another student's notification answers `404`.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(notification_id): Path<i64>,
) -> Result<Json<ApiResponse<notification::Model>>, AttendanceError> {
    let updated = dispatcher(&state).mark_read(user.id(), notification_id).await?;
    Ok(Json(ApiResponse::success(updated, "Notification marked as read")))
}
