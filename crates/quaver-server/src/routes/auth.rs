//! Authentication route handlers: login, logout, status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::SESSION_COOKIE;

/// Login request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login/status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Auth status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthStatusResponse {
    pub auth_enabled: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !ctx.config.auth.enabled {
        return Ok((
            StatusCode::OK,
            Json(AuthResponse {
                success: true,
                message: "Auth disabled".into(),
                token: None,
            }),
        ));
    }

    let conn = quaver_db::pool::get_conn(&ctx.db)?;

    let user = quaver_db::queries::users::get_user_by_username(&conn, &payload.username)?
        .ok_or_else(|| quaver_core::Error::Unauthorized("Invalid credentials".into()))?;

    let password_valid = bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);
    if !password_valid {
        return Err(quaver_core::Error::Unauthorized("Invalid credentials".into()).into());
    }

    let token = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now() + Duration::hours(ctx.config.auth.session_timeout_hours as i64);
    quaver_db::queries::auth::create_token(&conn, user.id, &token, &expires.to_rfc3339())?;

    // Opportunistic sweep of expired tokens.
    let _ = quaver_db::queries::auth::delete_expired_tokens(&conn, &Utc::now().to_rfc3339());

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token: Some(token),
        }),
    ))
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout(
    State(ctx): State<AppContext>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = extract_token(&headers) {
        if let Ok(conn) = quaver_db::pool::get_conn(&ctx.db) {
            let _ = quaver_db::queries::auth::delete_token(&conn, &token);
        }
    }

    Ok(StatusCode::OK)
}

/// GET /api/auth/status
#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses(
        (status = 200, description = "Auth status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: axum::http::HeaderMap,
) -> Json<AuthStatusResponse> {
    if !ctx.config.auth.enabled {
        return Json(AuthStatusResponse {
            auth_enabled: false,
            authenticated: true,
            user_id: None,
            username: None,
        });
    }

    if let Some(token) = extract_token(&headers) {
        if let Some(ref api_key) = ctx.config.auth.api_key {
            if token == *api_key {
                return Json(AuthStatusResponse {
                    auth_enabled: true,
                    authenticated: true,
                    user_id: None,
                    username: None,
                });
            }
        }

        if let Ok(conn) = quaver_db::pool::get_conn(&ctx.db) {
            if let Ok(Some(tok)) = quaver_db::queries::auth::get_token(&conn, &token) {
                if tok.expires_at > Utc::now().to_rfc3339() {
                    let user = quaver_db::queries::users::get_user_by_id(&conn, tok.user_id)
                        .ok()
                        .flatten();
                    return Json(AuthStatusResponse {
                        auth_enabled: true,
                        authenticated: true,
                        user_id: Some(tok.user_id.to_string()),
                        username: user.map(|u| u.username),
                    });
                }
            }
        }
    }

    Json(AuthStatusResponse {
        auth_enabled: true,
        authenticated: false,
        user_id: None,
        username: None,
    })
}

/// Extract a bearer token or session cookie from request headers.
fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    // Check Authorization header first.
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(token) = val.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    // Check cookie.
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(cookies_str) = cookie.to_str() {
            for part in cookies_str.split(';') {
                let part = part.trim();
                if let Some(value) = part.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}
