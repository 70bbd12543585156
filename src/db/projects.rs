//! Project record persistence.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schemas::{NewProject, ProjectRecord};
use crate::id::RecordId;

const PROJECT_COLUMNS: &str = "id, owner_id, name, github_url, github_token, created_at";

/// Repository for project records.
pub struct ProjectRepository;

impl ProjectRepository {
    pub fn insert(conn: &Connection, owner_id: &RecordId, project: &NewProject) -> Result<ProjectRecord> {
        let id = RecordId::generate();
        conn.execute(
            "INSERT INTO projects (id, owner_id, name, github_url, github_token) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                owner_id,
                project.name,
                project.github_url,
                project.github_token,
            ],
        )
        .context("Failed to insert project")?;

        Self::get(conn, &id)?.context("Inserted project disappeared")
    }

    pub fn get(conn: &Connection, id: &RecordId) -> Result<Option<ProjectRecord>> {
        conn.query_row(
            &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
            params![id],
            map_project,
        )
        .optional()
        .context("Failed to query project")
    }

    /// Fetch a project only if `owner_id` owns it.
    pub fn get_owned(
        conn: &Connection,
        id: &RecordId,
        owner_id: &RecordId,
    ) -> Result<Option<ProjectRecord>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM projects WHERE id = ?1 AND owner_id = ?2",
                PROJECT_COLUMNS
            ),
            params![id, owner_id],
            map_project,
        )
        .optional()
        .context("Failed to query project")
    }

    /// List projects owned by `owner_id`, newest first.
    pub fn list_for_owner(
        conn: &Connection,
        owner_id: &RecordId,
        limit: usize,
    ) -> Result<Vec<ProjectRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM projects WHERE owner_id = ?1 \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                PROJECT_COLUMNS
            ))
            .context("Failed to prepare projects query")?;

        let projects = stmt
            .query_map(params![owner_id, limit as i64], map_project)
            .context("Failed to list projects")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map projects")?;

        Ok(projects)
    }

    /// List all projects, newest first.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<ProjectRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM projects ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                PROJECT_COLUMNS
            ))
            .context("Failed to prepare projects query")?;

        let projects = stmt
            .query_map(params![limit as i64], map_project)
            .context("Failed to list projects")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map projects")?;

        Ok(projects)
    }
}

fn map_project(row: &Row<'_>) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        github_url: row.get(3)?,
        github_token: row.get(4)?,
        created_at: row.get(5)?,
    })
}
