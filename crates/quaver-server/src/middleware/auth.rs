//! Authentication middleware.
//!
//! Validates session cookies or API key bearer tokens and injects the
//! authenticated [`UserId`] into request extensions so that downstream
//! handlers can access it. When auth is disabled in config, the anonymous
//! user is injected instead.

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use quaver_core::UserId;
use quaver_db::pool::DbPool;

use crate::context::AppContext;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "quaver_session";

/// Well-known user ID for unauthenticated requests (auth disabled).
/// Seeded into the users table by migration V2.
const ANONYMOUS_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Validate an auth token from raw HTTP header values.
///
/// Returns `Some(UserId)` on success, `None` on failure. Token resolution
/// order:
/// 1. `Authorization: Bearer <token>` (API clients)
/// 2. Cookie: `quaver_session=<token>` (web browser)
pub fn validate_auth_headers(
    auth_config: &quaver_core::config::AuthConfig,
    db: &DbPool,
    authorization: Option<&str>,
    cookie: Option<&str>,
) -> Option<UserId> {
    // If auth is not enabled, return anonymous user.
    if !auth_config.enabled {
        return Some(
            ANONYMOUS_USER_ID
                .parse()
                .expect("static anonymous UUID is valid"),
        );
    }

    // 1. Check Authorization: Bearer header.
    if let Some(auth_value) = authorization {
        if let Some(token) = auth_value.strip_prefix("Bearer ") {
            if let Some(uid) = validate_token(auth_config, db, token) {
                return Some(uid);
            }
        }
    }

    // 2. Check session cookie.
    if let Some(cookies_str) = cookie {
        for part in cookies_str.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                if let Some(uid) = validate_token(auth_config, db, value) {
                    return Some(uid);
                }
            }
        }
    }

    None
}

/// Validate a single token against the config API key and DB tokens.
fn validate_token(
    auth_config: &quaver_core::config::AuthConfig,
    db: &DbPool,
    token: &str,
) -> Option<UserId> {
    // Check against config API key.
    if let Some(ref api_key) = auth_config.api_key {
        if token == api_key {
            return Some(
                ANONYMOUS_USER_ID
                    .parse()
                    .expect("static anonymous UUID is valid"),
            );
        }
    }

    // Check against DB tokens, rejecting expired ones.
    if let Ok(conn) = quaver_db::pool::get_conn(db) {
        if let Ok(Some(tok)) = quaver_db::queries::auth::get_token(&conn, token) {
            let now = chrono::Utc::now().to_rfc3339();
            if tok.expires_at > now {
                return Some(tok.user_id);
            }
        }
    }

    None
}

/// Authentication middleware. Applied to protected routes only.
///
/// On success, inserts the resolved [`UserId`] into request extensions.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    let cookie = request
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    match validate_auth_headers(
        &ctx.config.auth,
        &ctx.db,
        authorization.as_deref(),
        cookie.as_deref(),
    ) {
        Some(user_id) => {
            request.extensions_mut().insert(user_id);
            Ok(next.run(request).await)
        }
        None => Err((StatusCode::UNAUTHORIZED, "Authentication required").into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quaver_core::config::AuthConfig;
    use quaver_db::pool::init_memory_pool;
    use quaver_db::queries::{auth as auth_q, users};

    fn enabled_config() -> AuthConfig {
        AuthConfig {
            enabled: true,
            api_key: Some("secret-key".into()),
            session_timeout_hours: 24,
        }
    }

    #[test]
    fn disabled_auth_yields_anonymous() {
        let db = init_memory_pool().unwrap();
        let cfg = AuthConfig::default();
        let uid = validate_auth_headers(&cfg, &db, None, None).unwrap();
        assert_eq!(uid.to_string(), ANONYMOUS_USER_ID);
    }

    #[test]
    fn missing_credentials_rejected() {
        let db = init_memory_pool().unwrap();
        let cfg = enabled_config();
        assert!(validate_auth_headers(&cfg, &db, None, None).is_none());
    }

    #[test]
    fn api_key_bearer_accepted() {
        let db = init_memory_pool().unwrap();
        let cfg = enabled_config();
        let uid = validate_auth_headers(&cfg, &db, Some("Bearer secret-key"), None);
        assert!(uid.is_some());
    }

    #[test]
    fn wrong_bearer_rejected() {
        let db = init_memory_pool().unwrap();
        let cfg = enabled_config();
        assert!(validate_auth_headers(&cfg, &db, Some("Bearer wrong"), None).is_none());
    }

    #[test]
    fn db_token_resolves_user() {
        let db = init_memory_pool().unwrap();
        let conn = db.get().unwrap();
        let user = users::create_user(&conn, "cookie_user", "hash", "user").unwrap();
        auth_q::create_token(&conn, user.id, "tok-1", "2099-01-01T00:00:00Z").unwrap();
        drop(conn);

        let cfg = enabled_config();
        let uid = validate_auth_headers(&cfg, &db, Some("Bearer tok-1"), None).unwrap();
        assert_eq!(uid, user.id);
    }

    #[test]
    fn expired_db_token_rejected() {
        let db = init_memory_pool().unwrap();
        let conn = db.get().unwrap();
        let user = users::create_user(&conn, "expired_user", "hash", "user").unwrap();
        auth_q::create_token(&conn, user.id, "tok-old", "2000-01-01T00:00:00Z").unwrap();
        drop(conn);

        let cfg = enabled_config();
        assert!(validate_auth_headers(&cfg, &db, Some("Bearer tok-old"), None).is_none());
    }

    #[test]
    fn session_cookie_resolves_user() {
        let db = init_memory_pool().unwrap();
        let conn = db.get().unwrap();
        let user = users::create_user(&conn, "session_user", "hash", "user").unwrap();
        auth_q::create_token(&conn, user.id, "tok-2", "2099-01-01T00:00:00Z").unwrap();
        drop(conn);

        let cfg = enabled_config();
        let cookie = format!("other=1; {SESSION_COOKIE}=tok-2");
        let uid = validate_auth_headers(&cfg, &db, None, Some(&cookie)).unwrap();
        assert_eq!(uid, user.id);
    }
}
