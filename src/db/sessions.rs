//! Users and login sessions.
//!
//! Session tokens are never stored; only their SHA-256 digest is.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::id::RecordId;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: RecordId,
    pub login: String,
    pub created_at: String,
}

/// An active session joined with its user.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: RecordId,
    pub login: String,
    pub expires_at: i64,
}

pub struct UserRepository;

impl UserRepository {
    /// Return the user with `login`, creating it first if needed.
    pub fn upsert_by_login(conn: &Connection, login: &str) -> Result<UserRecord> {
        conn.execute(
            "INSERT INTO users (id, login) VALUES (?1, ?2) ON CONFLICT(login) DO NOTHING",
            params![RecordId::generate(), login],
        )
        .context("Failed to insert user")?;

        Self::get_by_login(conn, login)?.context("User missing after upsert")
    }

    pub fn get_by_login(conn: &Connection, login: &str) -> Result<Option<UserRecord>> {
        conn.query_row(
            "SELECT id, login, created_at FROM users WHERE login = ?1",
            params![login],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    login: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to query user")
    }
}

pub struct SessionRepository;

impl SessionRepository {
    pub fn insert(
        conn: &Connection,
        token_hash: &str,
        user_id: &RecordId,
        expires_at: i64,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token_hash, user_id, expires_at],
        )
        .context("Failed to insert session")?;
        Ok(())
    }

    /// Find a session that has not expired at `now` (unix seconds).
    pub fn find_active(
        conn: &Connection,
        token_hash: &str,
        now: i64,
    ) -> Result<Option<SessionRecord>> {
        conn.query_row(
            "SELECT s.user_id, u.login, s.expires_at FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token_hash = ?1 AND s.expires_at > ?2",
            params![token_hash, now],
            |row| {
                Ok(SessionRecord {
                    user_id: row.get(0)?,
                    login: row.get(1)?,
                    expires_at: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to query session")
    }

    pub fn delete_for_user(conn: &Connection, user_id: &RecordId) -> Result<usize> {
        conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1",
            params![user_id],
        )
        .context("Failed to delete sessions")
    }

    pub fn delete_expired(conn: &Connection, now: i64) -> Result<usize> {
        conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])
            .context("Failed to prune expired sessions")
    }
}
