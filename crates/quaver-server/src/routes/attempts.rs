//! Quiz attempt recording.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use quaver_core::{QuizId, UserId};
use quaver_db::queries::{attempts, quizzes};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;

/// Attempt submission payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateAttemptRequest {
    pub quiz_id: String,
    pub score: f64,
    pub max_score: f64,
}

/// Recorded attempt.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AttemptResponse {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub score: f64,
    pub max_score: f64,
    pub created_at: String,
}

/// POST /api/attempts
///
/// Recording an attempt also unlocks future media reads for this principal
/// on private quizzes (see the access gate).
#[utoipa::path(
    post,
    path = "/api/attempts",
    request_body = CreateAttemptRequest,
    responses(
        (status = 201, description = "Attempt recorded", body = AttemptResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn create_attempt(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<CreateAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id: QuizId = payload
        .quiz_id
        .parse()
        .map_err(|_| quaver_core::Error::not_found("quiz", &payload.quiz_id))?;

    if payload.max_score <= 0.0 || payload.score < 0.0 || payload.score > payload.max_score {
        return Err(quaver_core::Error::Validation(format!(
            "Score {}/{} is out of range",
            payload.score, payload.max_score
        ))
        .into());
    }

    let conn = quaver_db::pool::get_conn(&ctx.db)?;

    quizzes::get_quiz(&conn, quiz_id)?
        .ok_or_else(|| quaver_core::Error::not_found("quiz", quiz_id))?;

    let attempt =
        attempts::create_attempt(&conn, quiz_id, user_id, payload.score, payload.max_score)?;

    tracing::info!(quiz_id = %quiz_id, user_id = %user_id, score = attempt.score, "Attempt recorded");

    Ok((
        StatusCode::CREATED,
        Json(AttemptResponse {
            id: attempt.id.to_string(),
            quiz_id: attempt.quiz_id.to_string(),
            user_id: attempt.user_id.to_string(),
            score: attempt.score,
            max_score: attempt.max_score,
            created_at: attempt.created_at,
        }),
    ))
}
