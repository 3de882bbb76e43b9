use axum::{Extension, Json, extract::State};
use db::models::notification;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::dispatcher;
use crate::services::error::AttendanceError;

/// GET /notifications
///
/// Every notification for the caller, newest first.
///
/// ```json
/// {
///   "success": true,
///   "data": [{ "id": 4, "message": "You have been marked present for CS101 on 2025-01-10", "read": false, "createdAt": "..." }],
///   "message": "Notifications retrieved"
/// }
/// ```
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<notification::Model>>>, AttendanceError> {
    let backlog = dispatcher(&state).deliver_backlog(user.id()).await?;
    Ok(Json(ApiResponse::success(backlog, "Notifications retrieved")))
}
