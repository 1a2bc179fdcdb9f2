//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use quaver_core::{AttemptId, AudioId, OptionId, QuizId, SessionId, TimeframeId, UserId};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

fn parse_opt_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        Some(v) => {
            let uuid = Uuid::parse_str(&v).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(Some(T::from(uuid)))
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// AuthToken
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: String,
}

impl AuthToken {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            token: row.get(2)?,
            expires_at: row.get(3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Quiz
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: QuizId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: String,
}

impl Quiz {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            is_public: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Audio {
    pub id: AudioId,
    pub quiz_id: Option<QuizId>,
    pub title: String,
    pub artist: Option<String>,
    pub source: Option<String>,
    pub filename: String,
    /// Storage path relative to the process working directory, as returned
    /// by the upload endpoint (e.g. `data/uploads/<sha256>.mp3`).
    pub filepath: String,
    pub duration: Option<f64>,
    pub created_at: String,
}

impl Audio {
    /// Build from a row selected as:
    /// id, quiz_id, title, artist, source, filename, filepath, duration,
    /// created_at
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            quiz_id: parse_opt_id(row, 1)?,
            title: row.get(2)?,
            artist: row.get(3)?,
            source: row.get(4)?,
            filename: row.get(5)?,
            filepath: row.get(6)?,
            duration: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Timeframe / AnswerOption
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Timeframe {
    pub id: TimeframeId,
    pub audio_id: AudioId,
    pub start_time: f64,
    pub end_time: f64,
}

impl Timeframe {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            audio_id: parse_id(row, 1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnswerOption {
    pub id: OptionId,
    pub timeframe_id: TimeframeId,
    pub text: String,
    pub is_correct: bool,
}

impl AnswerOption {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            timeframe_id: parse_id(row, 1)?,
            text: row.get(2)?,
            is_correct: row.get::<_, i32>(3)? != 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Attempt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub score: f64,
    pub max_score: f64,
    pub created_at: String,
}

impl Attempt {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            quiz_id: parse_id(row, 1)?,
            user_id: parse_id(row, 2)?,
            score: row.get(3)?,
            max_score: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
