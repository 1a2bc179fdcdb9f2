//! Quiz route handlers: create, list, detail, and the playable question
//! feed.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use quaver_core::{QuizId, UserId};
use quaver_db::models::{Audio, Quiz};
use quaver_db::queries::{audios, quizzes};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::access::{self, AccessDecision};
use crate::context::AppContext;
use crate::error::AppError;

// ============================================================================
// Request types
// ============================================================================

/// Quiz creation payload: the quiz plus its nested audio graph.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateQuizRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub audios: Vec<CreateAudioRequest>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateAudioRequest {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub filename: String,
    /// Storage path as returned by the upload endpoint.
    pub filepath: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub timeframes: Vec<CreateTimeframeRequest>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateTimeframeRequest {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub options: Vec<CreateOptionRequest>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOptionRequest {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

// ============================================================================
// Response types
// ============================================================================

/// Quiz with its tracks, as returned by create/detail endpoints.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizDetailResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: String,
    pub audios: Vec<AudioResponse>,
}

impl QuizDetailResponse {
    fn new(quiz: Quiz, quiz_audios: Vec<Audio>) -> Self {
        Self {
            id: quiz.id.to_string(),
            title: quiz.title,
            description: quiz.description,
            is_public: quiz.is_public,
            created_at: quiz.created_at,
            audios: quiz_audios.into_iter().map(AudioResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AudioResponse {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub source: Option<String>,
    pub filename: String,
    pub filepath: String,
    pub duration: Option<f64>,
}

impl From<Audio> for AudioResponse {
    fn from(audio: Audio) -> Self {
        Self {
            id: audio.id.to_string(),
            title: audio.title,
            artist: audio.artist,
            source: audio.source,
            filename: audio.filename,
            filepath: audio.filepath,
            duration: audio.duration,
        }
    }
}

/// Public listing entry.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizSummaryResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: String,
    pub created_by: String,
}

/// One playable question: a timeframe with shuffled options.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizQuestion {
    pub timeframe_id: String,
    pub audio_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub options: Vec<QuestionOption>,
    pub correct_option_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PlayResponse {
    pub questions: Vec<QuizQuestion>,
}

/// Number of questions served per play session.
const QUESTIONS_PER_PLAY: usize = 10;

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/quizzes
#[utoipa::path(
    post,
    path = "/api/quizzes",
    request_body = CreateQuizRequest,
    responses(
        (status = 201, description = "Quiz created", body = QuizDetailResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_quiz(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.trim().is_empty() {
        return Err(quaver_core::Error::Validation("Quiz title is required".into()).into());
    }

    for audio in &payload.audios {
        for tf in &audio.timeframes {
            if tf.end_time <= tf.start_time {
                return Err(quaver_core::Error::Validation(format!(
                    "Timeframe end ({}) must be after start ({})",
                    tf.end_time, tf.start_time
                ))
                .into());
            }
        }
    }

    let conn = quaver_db::pool::get_conn(&ctx.db)?;
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| quaver_core::Error::database(e.to_string()))?;

    let quiz = quizzes::create_quiz(
        &tx,
        user_id,
        &payload.title,
        payload.description.as_deref(),
        payload.is_public,
    )?;

    let mut created_audios = Vec::with_capacity(payload.audios.len());
    for audio_req in &payload.audios {
        let audio = audios::create_audio(
            &tx,
            Some(quiz.id),
            &audio_req.title,
            audio_req.artist.as_deref(),
            audio_req.source.as_deref(),
            &audio_req.filename,
            &audio_req.filepath,
            audio_req.duration,
        )?;

        for tf_req in &audio_req.timeframes {
            let tf = audios::create_timeframe(&tx, audio.id, tf_req.start_time, tf_req.end_time)?;
            for opt_req in &tf_req.options {
                audios::create_option(&tx, tf.id, &opt_req.text, opt_req.is_correct)?;
            }
        }

        created_audios.push(audio);
    }

    tx.commit()
        .map_err(|e| quaver_core::Error::database(e.to_string()))?;

    tracing::info!(quiz_id = %quiz.id, tracks = created_audios.len(), "Quiz created");

    Ok((
        StatusCode::CREATED,
        Json(QuizDetailResponse::new(quiz, created_audios)),
    ))
}

/// GET /api/quizzes
#[utoipa::path(
    get,
    path = "/api/quizzes",
    responses(
        (status = 200, description = "Public quizzes", body = [QuizSummaryResponse])
    )
)]
pub async fn list_quizzes(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<QuizSummaryResponse>>, AppError> {
    let conn = quaver_db::pool::get_conn(&ctx.db)?;
    let listed = quizzes::list_public_quizzes(&conn)?
        .into_iter()
        .map(|(quiz, created_by)| QuizSummaryResponse {
            id: quiz.id.to_string(),
            title: quiz.title,
            description: quiz.description,
            created_at: quiz.created_at,
            created_by,
        })
        .collect();
    Ok(Json(listed))
}

/// GET /api/quizzes/{id}
#[utoipa::path(
    get,
    path = "/api/quizzes/{id}",
    params(("id" = String, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz detail", body = QuizDetailResponse),
        (status = 403, description = "Private quiz"),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn get_quiz(
    State(ctx): State<AppContext>,
    Path(quiz_id): Path<String>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<QuizDetailResponse>, AppError> {
    let id: QuizId = quiz_id
        .parse()
        .map_err(|_| quaver_core::Error::not_found("quiz", &quiz_id))?;

    let conn = quaver_db::pool::get_conn(&ctx.db)?;
    let quiz = quizzes::get_quiz(&conn, id)?
        .ok_or_else(|| quaver_core::Error::not_found("quiz", id))?;

    authorize_quiz_read(&conn, &quiz, user_id)?;

    let quiz_audios = audios::list_audios_for_quiz(&conn, id)?;

    Ok(Json(QuizDetailResponse::new(quiz, quiz_audios)))
}

/// GET /api/quizzes/{id}/play
///
/// Builds a play session: up to [`QUESTIONS_PER_PLAY`] randomly selected
/// timeframes across the quiz's tracks, each with shuffled options.
#[utoipa::path(
    get,
    path = "/api/quizzes/{id}/play",
    params(("id" = String, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Play session questions", body = PlayResponse),
        (status = 403, description = "Private quiz"),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn play_quiz(
    State(ctx): State<AppContext>,
    Path(quiz_id): Path<String>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<PlayResponse>, AppError> {
    let id: QuizId = quiz_id
        .parse()
        .map_err(|_| quaver_core::Error::not_found("quiz", &quiz_id))?;

    let conn = quaver_db::pool::get_conn(&ctx.db)?;
    let quiz = quizzes::get_quiz(&conn, id)?
        .ok_or_else(|| quaver_core::Error::not_found("quiz", id))?;

    authorize_quiz_read(&conn, &quiz, user_id)?;

    // Collect all timeframes across all tracks.
    let mut all: Vec<(quaver_db::models::Timeframe, quaver_core::AudioId)> = Vec::new();
    for audio in audios::list_audios_for_quiz(&conn, id)? {
        for tf in audios::list_timeframes_for_audio(&conn, audio.id)? {
            all.push((tf, audio.id));
        }
    }

    let mut rng = rand::thread_rng();
    all.shuffle(&mut rng);
    all.truncate(QUESTIONS_PER_PLAY);

    let mut questions = Vec::with_capacity(all.len());
    for (tf, audio_id) in all {
        let mut opts = audios::list_options_for_timeframe(&conn, tf.id)?;
        let Some(correct) = opts.iter().find(|o| o.is_correct) else {
            // A timeframe without a correct answer is unplayable; skip it.
            tracing::warn!(timeframe_id = %tf.id, "Timeframe has no correct option");
            continue;
        };
        let correct_option_id = correct.id.to_string();

        opts.shuffle(&mut rng);
        questions.push(QuizQuestion {
            timeframe_id: tf.id.to_string(),
            audio_id: audio_id.to_string(),
            start_time: tf.start_time,
            end_time: tf.end_time,
            options: opts
                .into_iter()
                .map(|o| QuestionOption {
                    id: o.id.to_string(),
                    text: o.text,
                })
                .collect(),
            correct_option_id,
        });
    }

    Ok(Json(PlayResponse { questions }))
}

/// Reject reads of private quizzes by principals without access.
fn authorize_quiz_read(
    conn: &rusqlite::Connection,
    quiz: &Quiz,
    user_id: UserId,
) -> Result<(), quaver_core::Error> {
    let attrs = quizzes::get_access_attributes(conn, quiz.id)?;
    match access::evaluate(user_id, attrs.as_ref()) {
        AccessDecision::Granted => Ok(()),
        AccessDecision::Denied(reason) => {
            tracing::debug!(quiz_id = %quiz.id, user_id = %user_id, reason, "Quiz access denied");
            Err(quaver_core::Error::Forbidden("Forbidden".into()))
        }
    }
}
