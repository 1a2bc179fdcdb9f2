//! Axum router construction.
//!
//! Builds the full application router with all route groups, middleware
//! layers, and static file serving.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::login,
        routes::auth::logout,
        routes::auth::auth_status,
        routes::upload::upload,
        routes::quizzes::create_quiz,
        routes::quizzes::list_quizzes,
        routes::quizzes::get_quiz,
        routes::quizzes::play_quiz,
        routes::attempts::create_attempt,
    ),
    components(schemas(
        routes::auth::LoginRequest,
        routes::auth::AuthResponse,
        routes::auth::AuthStatusResponse,
        routes::upload::UploadResponse,
        routes::quizzes::CreateQuizRequest,
        routes::quizzes::CreateAudioRequest,
        routes::quizzes::CreateTimeframeRequest,
        routes::quizzes::CreateOptionRequest,
        routes::quizzes::QuizDetailResponse,
        routes::quizzes::QuizSummaryResponse,
        routes::quizzes::AudioResponse,
        routes::quizzes::QuizQuestion,
        routes::quizzes::QuestionOption,
        routes::quizzes::PlayResponse,
        routes::attempts::CreateAttemptRequest,
        routes::attempts::AttemptResponse,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Leave headroom over the upload ceiling for multipart framing; the
    // handler enforces the exact byte limit.
    let body_limit = ctx.config.storage.max_upload_bytes as usize + 64 * 1024;

    // Auth routes -- always accessible.
    let auth_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/status", get(routes::auth::auth_status));

    // Protected API routes.
    let protected_routes = Router::new()
        // Media streaming
        .route(
            "/media/{audio_id}",
            get(routes::media::get_audio).head(routes::media::head_audio),
        )
        // Upload ingestion
        .route(
            "/upload",
            post(routes::upload::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        // Quizzes
        .route(
            "/quizzes",
            get(routes::quizzes::list_quizzes).post(routes::quizzes::create_quiz),
        )
        .route("/quizzes/{id}", get(routes::quizzes::get_quiz))
        .route("/quizzes/{id}/play", get(routes::quizzes::play_quiz))
        // Attempts
        .route("/attempts", post(routes::attempts::create_attempt));

    // Always apply auth middleware -- it handles both enabled (validates
    // credentials) and disabled (injects anonymous UserId) modes. Without
    // this, Extension<UserId> extractors would fail with 500 when auth is
    // disabled.
    let protected_routes =
        protected_routes.layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    // Combine auth and protected under /api.
    let api = auth_routes.merge(protected_routes);

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Static file serving for UI build.
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                tower_http::services::ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(tower_http::services::ServeFile::new(index_path)),
            );
        }
    }

    app
}
