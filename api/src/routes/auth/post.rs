use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::user;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::{ApiResponse, Empty};
use crate::routes::common::format_validation_errors;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: user::Model,
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<Empty>::error(message))).into_response()
}

/// POST /auth/login
///
/// Exchanges email and password for a JWT.
///
/// ### Request Body
/// ```json
/// { "email": "teacher@school.test", "password": "secret" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ token, expires_at, user }`
/// - `400 Bad Request` on malformed input
/// - `401 Unauthorized` when the credentials do not match
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    if let Err(e) = req.validate() {
        return fail(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let found = match user::Model::find_by_email(state.db(), &req.email).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(error = %e, "Login lookup failed");
            return fail(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let Some(user) = found.filter(|u| u.verify_password(&req.password)) else {
        tracing::info!(email = %req.email, "Rejected login");
        return fail(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };

    let (token, expires_at) = match generate_jwt(user.id, user.role) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, user_id = user.id, "Failed to sign JWT");
            return fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue token");
        }
    };

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            LoginResponse {
                token,
                expires_at,
                user,
            },
            "Login successful",
        )),
    )
        .into_response()
}
