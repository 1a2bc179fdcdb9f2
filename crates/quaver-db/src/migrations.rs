//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;
use quaver_core::{Error, Result};

/// V1: initial schema -- creates all core tables and indexes.
const V1_INITIAL: &str = r#"
-- Users and auth
CREATE TABLE users (
    id            TEXT PRIMARY KEY,
    username      TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',
    created_at    TEXT NOT NULL
);

CREATE TABLE auth_tokens (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    token      TEXT UNIQUE NOT NULL,
    expires_at TEXT NOT NULL
);

-- Quizzes
CREATE TABLE quizzes (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(id),
    title       TEXT NOT NULL,
    description TEXT,
    is_public   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

-- Audio tracks. quiz_id is nullable: a track whose quiz was deleted stays
-- on disk but grants no access.
CREATE TABLE audios (
    id         TEXT PRIMARY KEY,
    quiz_id    TEXT REFERENCES quizzes(id) ON DELETE SET NULL,
    title      TEXT NOT NULL,
    artist     TEXT,
    source     TEXT,
    filename   TEXT NOT NULL,
    filepath   TEXT NOT NULL,
    duration   REAL,
    created_at TEXT NOT NULL
);

-- Guessable windows within a track
CREATE TABLE timeframes (
    id         TEXT PRIMARY KEY,
    audio_id   TEXT NOT NULL REFERENCES audios(id) ON DELETE CASCADE,
    start_time REAL NOT NULL,
    end_time   REAL NOT NULL
);

-- Answer options per timeframe
CREATE TABLE options (
    id           TEXT PRIMARY KEY,
    timeframe_id TEXT NOT NULL REFERENCES timeframes(id) ON DELETE CASCADE,
    text         TEXT NOT NULL,
    is_correct   INTEGER NOT NULL DEFAULT 0
);

-- Recorded quiz attempts
CREATE TABLE attempts (
    id         TEXT PRIMARY KEY,
    quiz_id    TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(id),
    score      REAL NOT NULL,
    max_score  REAL NOT NULL,
    created_at TEXT NOT NULL
);

-- Indexes
CREATE INDEX idx_quizzes_user       ON quizzes(user_id);
CREATE INDEX idx_audios_quiz        ON audios(quiz_id);
CREATE INDEX idx_timeframes_audio   ON timeframes(audio_id);
CREATE INDEX idx_options_timeframe  ON options(timeframe_id);
CREATE INDEX idx_attempts_quiz      ON attempts(quiz_id);
CREATE INDEX idx_attempts_user      ON attempts(user_id);
"#;

/// V2: seed the anonymous user used when auth is disabled.
///
/// The auth middleware returns this well-known UUID for unauthenticated
/// requests.  Without a corresponding row in `users`, any INSERT into
/// `quizzes` or `attempts` violates the FK constraint.
const V2_ANONYMOUS_USER: &str = r#"
INSERT OR IGNORE INTO users (id, username, password_hash, role, created_at)
VALUES ('00000000-0000-0000-0000-000000000000', 'anonymous', '!disabled', 'user', datetime('now'));
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL), (2, V2_ANONYMOUS_USER)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn migrations_apply_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='audios'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[test]
    fn anonymous_user_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let username: String = conn
            .query_row(
                "SELECT username FROM users WHERE id = '00000000-0000-0000-0000-000000000000'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(username, "anonymous");
    }
}
