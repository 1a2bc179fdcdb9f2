//! User CRUD operations.

use chrono::Utc;
use rusqlite::Connection;
use quaver_core::{Error, Result, UserId};

use crate::models::User;

const COLS: &str = "id, username, password_hash, role, created_at";

/// Create a new user and return it.
pub fn create_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: &str,
) -> Result<User> {
    let id = UserId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO users (id, username, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id.to_string(), username, password_hash, role, created_at],
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("Username '{username}' already exists"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(User {
        id,
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        role: role.to_string(),
        created_at,
    })
}

/// Get a user by primary key.
pub fn get_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], User::from_row);
    match result {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a user by username.
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE username = ?1");
    let result = conn.query_row(&q, [username], User::from_row);
    match result {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let user = create_user(&conn, "alice", "hash", "user").unwrap();
        assert_eq!(user.username, "alice");

        let by_id = get_user_by_id(&conn, user.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_name = get_user_by_username(&conn, "alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
    }

    #[test]
    fn duplicate_username_conflicts() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        create_user(&conn, "bob", "hash", "user").unwrap();
        let err = create_user(&conn, "bob", "hash2", "user").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn missing_user_is_none() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(get_user_by_username(&conn, "nobody").unwrap().is_none());
        assert!(get_user_by_id(&conn, UserId::new()).unwrap().is_none());
    }
}
