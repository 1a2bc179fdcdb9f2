//! Audio track query operations.
//!
//! This module is the lookup boundary for the media endpoints: given an
//! [`AudioId`] it returns the stored file location and the owning quiz
//! reference that drives the access decision.

use chrono::Utc;
use rusqlite::Connection;
use quaver_core::{AudioId, Error, OptionId, QuizId, Result, TimeframeId};

use crate::models::{AnswerOption, Audio, Timeframe};

const COLS: &str = "id, quiz_id, title, artist, source, filename, filepath, duration, created_at";

/// Create a new audio track.
#[allow(clippy::too_many_arguments)]
pub fn create_audio(
    conn: &Connection,
    quiz_id: Option<QuizId>,
    title: &str,
    artist: Option<&str>,
    source: Option<&str>,
    filename: &str,
    filepath: &str,
    duration: Option<f64>,
) -> Result<Audio> {
    let id = AudioId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO audios (id, quiz_id, title, artist, source, filename, filepath, duration, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            id.to_string(),
            quiz_id.map(|q| q.to_string()),
            title,
            artist,
            source,
            filename,
            filepath,
            duration,
            created_at,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Audio {
        id,
        quiz_id,
        title: title.to_string(),
        artist: artist.map(|s| s.to_string()),
        source: source.map(|s| s.to_string()),
        filename: filename.to_string(),
        filepath: filepath.to_string(),
        duration,
        created_at,
    })
}

/// Get an audio track by primary key.
pub fn get_audio(conn: &Connection, id: AudioId) -> Result<Option<Audio>> {
    let q = format!("SELECT {COLS} FROM audios WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Audio::from_row);
    match result {
        Ok(audio) => Ok(Some(audio)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all tracks belonging to a quiz.
pub fn list_audios_for_quiz(conn: &Connection, quiz_id: QuizId) -> Result<Vec<Audio>> {
    let q = format!("SELECT {COLS} FROM audios WHERE quiz_id = ?1 ORDER BY created_at");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([quiz_id.to_string()], Audio::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Create a guessable timeframe within a track.
pub fn create_timeframe(
    conn: &Connection,
    audio_id: AudioId,
    start_time: f64,
    end_time: f64,
) -> Result<Timeframe> {
    let id = TimeframeId::new();

    conn.execute(
        "INSERT INTO timeframes (id, audio_id, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id.to_string(), audio_id.to_string(), start_time, end_time],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Timeframe {
        id,
        audio_id,
        start_time,
        end_time,
    })
}

/// List timeframes for a track.
pub fn list_timeframes_for_audio(conn: &Connection, audio_id: AudioId) -> Result<Vec<Timeframe>> {
    let mut stmt = conn
        .prepare("SELECT id, audio_id, start_time, end_time FROM timeframes WHERE audio_id = ?1 ORDER BY start_time")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([audio_id.to_string()], Timeframe::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Create an answer option for a timeframe.
pub fn create_option(
    conn: &Connection,
    timeframe_id: TimeframeId,
    text: &str,
    is_correct: bool,
) -> Result<AnswerOption> {
    let id = OptionId::new();

    conn.execute(
        "INSERT INTO options (id, timeframe_id, text, is_correct) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id.to_string(), timeframe_id.to_string(), text, is_correct as i32],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(AnswerOption {
        id,
        timeframe_id,
        text: text.to_string(),
        is_correct,
    })
}

/// List answer options for a timeframe.
pub fn list_options_for_timeframe(
    conn: &Connection,
    timeframe_id: TimeframeId,
) -> Result<Vec<AnswerOption>> {
    let mut stmt = conn
        .prepare("SELECT id, timeframe_id, text, is_correct FROM options WHERE timeframe_id = ?1")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([timeframe_id.to_string()], AnswerOption::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
