//! Quiz query operations, including the access-attributes view consumed by
//! the media authorization gate.

use std::collections::HashSet;

use chrono::Utc;
use rusqlite::Connection;
use quaver_core::{Error, QuizId, Result, UserId};

use crate::models::Quiz;

const COLS: &str = "id, user_id, title, description, is_public, created_at";

/// Create a new quiz and return it.
pub fn create_quiz(
    conn: &Connection,
    user_id: UserId,
    title: &str,
    description: Option<&str>,
    is_public: bool,
) -> Result<Quiz> {
    let id = QuizId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO quizzes (id, user_id, title, description, is_public, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id.to_string(),
            user_id.to_string(),
            title,
            description,
            is_public as i32,
            created_at,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Quiz {
        id,
        user_id,
        title: title.to_string(),
        description: description.map(|s| s.to_string()),
        is_public,
        created_at,
    })
}

/// Get a quiz by primary key.
pub fn get_quiz(conn: &Connection, id: QuizId) -> Result<Option<Quiz>> {
    let q = format!("SELECT {COLS} FROM quizzes WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Quiz::from_row);
    match result {
        Ok(quiz) => Ok(Some(quiz)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List public quizzes together with their creator's username.
pub fn list_public_quizzes(conn: &Connection) -> Result<Vec<(Quiz, String)>> {
    let mut stmt = conn
        .prepare(
            "SELECT q.id, q.user_id, q.title, q.description, q.is_public, q.created_at, u.username
             FROM quizzes q
             JOIN users u ON u.id = q.user_id
             WHERE q.is_public = 1
             ORDER BY q.created_at DESC",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            let quiz = Quiz::from_row(row)?;
            let username: String = row.get(6)?;
            Ok((quiz, username))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Everything the access evaluator needs to know about a quiz: its
/// visibility, its owner, and the set of principals with a recorded attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessAttributes {
    pub public: bool,
    pub owner: UserId,
    pub prior_attempt_principals: HashSet<UserId>,
}

/// Build the [`AccessAttributes`] view for a quiz, or `None` if the quiz
/// does not exist.
pub fn get_access_attributes(
    conn: &Connection,
    quiz_id: QuizId,
) -> Result<Option<AccessAttributes>> {
    let Some(quiz) = get_quiz(conn, quiz_id)? else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare("SELECT DISTINCT user_id FROM attempts WHERE quiz_id = ?1")
        .map_err(|e| Error::database(e.to_string()))?;
    let principals = stmt
        .query_map([quiz_id.to_string()], |row| {
            let s: String = row.get(0)?;
            Ok(s)
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?
        .into_iter()
        .filter_map(|s| s.parse::<UserId>().ok())
        .collect();

    Ok(Some(AccessAttributes {
        public: quiz.is_public,
        owner: quiz.user_id,
        prior_attempt_principals: principals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::{attempts, users};

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "maker", "hash", "user").unwrap();

        let quiz = create_quiz(&conn, user.id, "Eighties", Some("Synth hits"), true).unwrap();
        let fetched = get_quiz(&conn, quiz.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Eighties");
        assert!(fetched.is_public);
    }

    #[test]
    fn public_listing_excludes_private() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "lister", "hash", "user").unwrap();

        create_quiz(&conn, user.id, "Open", None, true).unwrap();
        create_quiz(&conn, user.id, "Secret", None, false).unwrap();

        let listed = list_public_quizzes(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0.title, "Open");
        assert_eq!(listed[0].1, "lister");
    }

    #[test]
    fn access_attributes_view() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let owner = users::create_user(&conn, "owner", "hash", "user").unwrap();
        let player = users::create_user(&conn, "player", "hash", "user").unwrap();

        let quiz = create_quiz(&conn, owner.id, "Guess", None, false).unwrap();
        attempts::create_attempt(&conn, quiz.id, player.id, 7.0, 10.0).unwrap();

        let attrs = get_access_attributes(&conn, quiz.id).unwrap().unwrap();
        assert!(!attrs.public);
        assert_eq!(attrs.owner, owner.id);
        assert!(attrs.prior_attempt_principals.contains(&player.id));
        assert!(!attrs.prior_attempt_principals.contains(&owner.id));
    }

    #[test]
    fn access_attributes_missing_quiz() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(get_access_attributes(&conn, QuizId::new()).unwrap().is_none());
    }
}
