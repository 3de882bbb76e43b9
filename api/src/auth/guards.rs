use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::{attendance_session, user};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashMap;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, Empty};

type GuardError = (StatusCode, Json<ApiResponse<Empty>>);

fn deny(status: StatusCode, message: &str) -> GuardError {
    (status, Json(ApiResponse::error(message)))
}

/// Extracts the caller and stores it in the request extensions for handlers.
async fn extract_and_insert_authuser(req: Request<Body>) -> Result<(Request<Body>, AuthUser), GuardError> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| deny(StatusCode::UNAUTHORIZED, "Authentication required"))?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Re-reads the caller's role from the database. A token minted before a
/// role change must not keep the old privileges.
async fn current_role(db: &DatabaseConnection, user: &AuthUser) -> Result<user::Role, GuardError> {
    match user::Entity::find_by_id(user.id()).one(db).await {
        Ok(Some(row)) => Ok(row.role),
        Ok(None) => Err(deny(StatusCode::UNAUTHORIZED, "User no longer exists")),
        Err(e) => {
            tracing::warn!(error = %e, user_id = user.id(), "DB error while checking role; denying access");
            Err(deny(StatusCode::INTERNAL_SERVER_ERROR, "Database error while checking role"))
        }
    }
}

/// Replaces the extension with the caller as the database sees them now.
fn refresh_authuser(req: &mut Request<Body>, user: &AuthUser, role: user::Role) {
    let mut claims = user.0.clone();
    claims.role = role;
    req.extensions_mut().insert(AuthUser(claims));
}

async fn require_roles(
    app_state: &AppState,
    req: Request<Body>,
    roles: &[user::Role],
    message: &str,
) -> Result<Request<Body>, GuardError> {
    let (mut req, user) = extract_and_insert_authuser(req).await?;
    let role = current_role(app_state.db(), &user).await?;
    if !roles.contains(&role) {
        return Err(deny(StatusCode::FORBIDDEN, message));
    }
    refresh_authuser(&mut req, &user, role);
    Ok(req)
}

/// Teachers and admins.
pub async fn allow_teacher(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let req = require_roles(
        &app_state,
        req,
        &[user::Role::Teacher, user::Role::Admin],
        "Teacher access required",
    )
    .await?;
    Ok(next.run(req).await)
}

/// Students only.
pub async fn allow_student(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let req = require_roles(&app_state, req, &[user::Role::Student], "Student access required").await?;
    Ok(next.run(req).await)
}

/// Live session view: only the issuing teacher or an admin may subscribe.
pub async fn allow_attendance_ws_access(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (mut req, user) = extract_and_insert_authuser(req).await?;

    let session_id = params
        .get("session_id")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| deny(StatusCode::BAD_REQUEST, "Missing or invalid session_id"))?;

    let session = attendance_session::Model::find_by_id(app_state.db(), session_id)
        .await
        .map_err(|_| deny(StatusCode::INTERNAL_SERVER_ERROR, "Database error while checking session"))?
        .ok_or_else(|| deny(StatusCode::NOT_FOUND, "Attendance session not found"))?;

    let role = current_role(app_state.db(), &user).await?;
    if role != user::Role::Admin && session.teacher_id != user.id() {
        return Err(deny(StatusCode::FORBIDDEN, "Only the issuing teacher may watch this session"));
    }
    refresh_authuser(&mut req, &user, role);

    Ok(next.run(req).await)
}
