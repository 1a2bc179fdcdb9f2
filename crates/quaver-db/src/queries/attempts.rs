//! Quiz attempt operations.

use chrono::Utc;
use rusqlite::Connection;
use quaver_core::{AttemptId, Error, QuizId, Result, UserId};

use crate::models::Attempt;

const COLS: &str = "id, quiz_id, user_id, score, max_score, created_at";

/// Record a quiz attempt.
pub fn create_attempt(
    conn: &Connection,
    quiz_id: QuizId,
    user_id: UserId,
    score: f64,
    max_score: f64,
) -> Result<Attempt> {
    let id = AttemptId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO attempts (id, quiz_id, user_id, score, max_score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id.to_string(),
            quiz_id.to_string(),
            user_id.to_string(),
            score,
            max_score,
            created_at,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Attempt {
        id,
        quiz_id,
        user_id,
        score,
        max_score,
        created_at,
    })
}

/// List attempts for a quiz, newest first.
pub fn list_attempts_for_quiz(conn: &Connection, quiz_id: QuizId) -> Result<Vec<Attempt>> {
    let q = format!("SELECT {COLS} FROM attempts WHERE quiz_id = ?1 ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([quiz_id.to_string()], Attempt::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::{quizzes, users};

    #[test]
    fn record_and_list() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let owner = users::create_user(&conn, "quizmaster", "hash", "user").unwrap();
        let player = users::create_user(&conn, "guesser", "hash", "user").unwrap();
        let quiz = quizzes::create_quiz(&conn, owner.id, "Nineties", None, true).unwrap();

        create_attempt(&conn, quiz.id, player.id, 8.0, 10.0).unwrap();
        create_attempt(&conn, quiz.id, player.id, 10.0, 10.0).unwrap();

        let listed = list_attempts_for_quiz(&conn, quiz.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|a| a.user_id == player.id));
    }

    #[test]
    fn attempt_requires_existing_quiz() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let player = users::create_user(&conn, "stray", "hash", "user").unwrap();

        let err = create_attempt(&conn, QuizId::new(), player.id, 1.0, 10.0);
        assert!(err.is_err());
    }
}
