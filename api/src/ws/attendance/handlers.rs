use axum::{
    Extension,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
};
use std::sync::Arc;
use util::state::AppState;
use util::ws::axum_adapter::ws_route;
use util::ws::serve::WsServerOptions;

use super::topics::attendance_session_topic;
use super::ws_handlers::AttendanceWsHandler;
use crate::auth::AuthUser;

/// GET `/ws/attendance/sessions/{session_id}`
///
/// Streams `attendance.session_created`, `attendance.marked` and
/// `attendance.session_closed` envelopes for one session.
pub async fn attendance_session_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> impl IntoResponse {
    ws_route(
        ws,
        State(app_state),
        Some(user.id()),
        attendance_session_topic(session_id),
        Arc::new(AttendanceWsHandler),
        WsServerOptions::default(),
    )
    .await
}
