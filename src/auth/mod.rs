//! Session tokens and session resolution.
//!
//! A token is handed to the user once and only its SHA-256 digest is
//! persisted. Requests carry the token either as `Authorization: Bearer` or
//! in the `gitintel_session` cookie.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::db::{Database, SessionRepository, UserRecord, UserRepository};
use crate::id::RecordId;

pub const SESSION_COOKIE: &str = "gitintel_session";

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: RecordId,
    pub login: String,
}

/// Resolves a raw session token to the user it belongs to.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<Session>>;
}

/// Resolver backed by the `sessions` table.
pub struct SqliteSessionResolver {
    db: Database,
}

impl SqliteSessionResolver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionResolver for SqliteSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Session>> {
        let token_hash = hash_token(token);
        let now = chrono::Utc::now().timestamp();

        let record = self
            .db
            .call(move |conn| SessionRepository::find_active(conn, &token_hash, now))
            .await?;

        Ok(record.map(|record| Session {
            user_id: record.user_id,
            login: record.login,
        }))
    }
}

/// A freshly created session. `token` is not recoverable later.
#[derive(Debug)]
pub struct IssuedSession {
    pub token: String,
    pub user: UserRecord,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

pub fn generate_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Create (or reuse) the user `login` and open a session for it.
pub fn issue_session(
    conn: &rusqlite::Connection,
    login: &str,
    ttl_hours: u64,
) -> Result<IssuedSession> {
    let expires_at = i64::try_from(ttl_hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| anyhow!("Session lifetime of {} hours is out of range", ttl_hours))?;
    let user = UserRepository::upsert_by_login(conn, login)?;
    let token = generate_token();

    SessionRepository::insert(conn, &hash_token(&token), &user.id, expires_at.timestamp())?;
    debug!("Issued session for {} until {}", user.login, expires_at);

    Ok(IssuedSession {
        token,
        user,
        expires_at,
    })
}

/// Pull the session token out of the request headers.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
