//! SQLite persistence.
//!
//! Raw SQL with rusqlite, no ORM. A single [`Database`] handle is opened at
//! start-up and cloned into every component that needs the store.

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod init;
pub mod issues;
pub mod meetings;
pub mod projects;
pub mod schemas;
pub mod sessions;


pub use init::migrate;
pub use issues::IssueRepository;
pub use meetings::MeetingRepository;
pub use projects::ProjectRepository;
pub use schemas::{
    IssueRecord, MeetingRecord, MeetingStatus, NewIssue, NewProject, ProjectRecord,
    DEFAULT_MEETING_NAME,
};
pub use sessions::{SessionRecord, SessionRepository, UserRecord, UserRepository};

/// Shared handle to the SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(db_path).context("Failed to open database connection")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.blocking(f))
            .await
            .context("Database task panicked")?
    }

    /// Run `f` against the connection on the current thread.
    pub fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))?;
        f(&mut conn)
    }
}
