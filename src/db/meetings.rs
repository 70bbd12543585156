//! Meeting record persistence.
//!
//! Status writes are guarded by `status = 'PROCESSING'` so a meeting that
//! reached a terminal state is never moved again.

use anyhow::{bail, Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

use super::schemas::{MeetingRecord, MeetingStatus, NewIssue, DEFAULT_MEETING_NAME};
use crate::id::RecordId;

const MEETING_COLUMNS: &str = "id, project_id, name, status, created_at, updated_at";

/// Repository for meeting records.
pub struct MeetingRepository;

impl MeetingRepository {
    /// Insert a new meeting (status = PROCESSING).
    pub fn insert(
        conn: &Connection,
        project_id: &RecordId,
        name: Option<&str>,
    ) -> Result<MeetingRecord> {
        let id = RecordId::generate();
        conn.execute(
            "INSERT INTO meetings (id, project_id, name, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                project_id,
                name.unwrap_or(DEFAULT_MEETING_NAME),
                MeetingStatus::Processing.as_str(),
            ],
        )
        .context("Failed to insert meeting")?;

        Self::get(conn, &id)?.context("Inserted meeting disappeared")
    }

    pub fn get(conn: &Connection, id: &RecordId) -> Result<Option<MeetingRecord>> {
        conn.query_row(
            &format!("SELECT {} FROM meetings WHERE id = ?1", MEETING_COLUMNS),
            params![id],
            map_meeting,
        )
        .optional()
        .context("Failed to query meeting")
    }

    /// List a project's meetings, newest first.
    pub fn list_for_project(
        conn: &Connection,
        project_id: &RecordId,
        limit: usize,
    ) -> Result<Vec<MeetingRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM meetings WHERE project_id = ?1 \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                MEETING_COLUMNS
            ))
            .context("Failed to prepare meetings list query")?;

        let meetings = stmt
            .query_map(params![project_id, limit as i64], map_meeting)
            .context("Failed to list meetings")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map meetings")?;

        Ok(meetings)
    }

    /// Persist all issues and mark the meeting COMPLETED in one transaction.
    ///
    /// Either every issue is written and the meeting is completed with the
    /// given name, or nothing changes. Fails if the meeting does not exist or
    /// is no longer PROCESSING.
    pub fn complete_with_issues(
        conn: &mut Connection,
        meeting_id: &RecordId,
        name: &str,
        issues: &[NewIssue],
    ) -> Result<usize> {
        let tx = conn
            .transaction()
            .context("Failed to begin completion transaction")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO issues (id, meeting_id, position, start_ms, end_ms, gist, headline, summary) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .context("Failed to prepare issue insert")?;

            for (position, issue) in issues.iter().enumerate() {
                stmt.execute(params![
                    RecordId::generate(),
                    meeting_id,
                    position as i64,
                    issue.start_ms,
                    issue.end_ms,
                    issue.gist,
                    issue.headline,
                    issue.summary,
                ])
                .with_context(|| format!("Failed to insert issue {} for meeting {}", position, meeting_id))?;
            }
        }

        let updated = tx
            .execute(
                "UPDATE meetings SET status = ?1, name = ?2, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?3 AND status = ?4",
                params![
                    MeetingStatus::Completed.as_str(),
                    name,
                    meeting_id,
                    MeetingStatus::Processing.as_str(),
                ],
            )
            .context("Failed to complete meeting")?;

        if updated == 0 {
            // Dropping `tx` rolls the issue inserts back
            bail!("Meeting {} is missing or no longer processing", meeting_id);
        }

        tx.commit().context("Failed to commit meeting completion")?;

        Ok(issues.len())
    }

    /// Mark a PROCESSING meeting as FAILED. Returns false if nothing changed.
    pub fn mark_failed(conn: &Connection, meeting_id: &RecordId) -> Result<bool> {
        let updated = conn
            .execute(
                "UPDATE meetings SET status = ?1, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?2 AND status = ?3",
                params![
                    MeetingStatus::Failed.as_str(),
                    meeting_id,
                    MeetingStatus::Processing.as_str(),
                ],
            )
            .context("Failed to mark meeting as failed")?;

        Ok(updated > 0)
    }

    /// Mark every PROCESSING meeting as FAILED. Returns how many changed.
    pub fn fail_all_processing(conn: &Connection) -> Result<usize> {
        conn.execute(
            "UPDATE meetings SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE status = ?2",
            params![
                MeetingStatus::Failed.as_str(),
                MeetingStatus::Processing.as_str(),
            ],
        )
        .context("Failed to fail interrupted meetings")
    }
}

fn map_meeting(row: &Row<'_>) -> rusqlite::Result<MeetingRecord> {
    let status: String = row.get(3)?;
    let status = MeetingStatus::parse(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

    Ok(MeetingRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        status,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{migrate, IssueRepository, NewProject, ProjectRepository, UserRepository};

    fn setup_db() -> (Connection, RecordId) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        migrate(&conn).unwrap();

        let owner = UserRepository::upsert_by_login(&conn, "octocat").unwrap();
        let project = ProjectRepository::insert(
            &conn,
            &owner.id,
            &NewProject {
                name: "Widgets".to_string(),
                github_url: "https://github.com/acme/widgets".to_string(),
                github_token: None,
            },
        )
        .unwrap();

        (conn, project.id)
    }

    fn issue(headline: &str, start_ms: i64) -> NewIssue {
        NewIssue {
            start_ms,
            end_ms: start_ms + 30_000,
            gist: format!("{} gist", headline),
            headline: headline.to_string(),
            summary: format!("{} summary", headline),
        }
    }

    #[test]
    fn test_insert_meeting_defaults() {
        let (conn, project_id) = setup_db();
        let meeting = MeetingRepository::insert(&conn, &project_id, None).unwrap();

        assert_eq!(meeting.name, DEFAULT_MEETING_NAME);
        assert_eq!(meeting.status, MeetingStatus::Processing);
        assert_eq!(meeting.project_id, project_id);
    }

    #[test]
    fn test_insert_meeting_requires_project() {
        let (conn, _) = setup_db();
        let result = MeetingRepository::insert(&conn, &RecordId::generate(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_nonexistent_meeting() {
        let (conn, _) = setup_db();
        let result = MeetingRepository::get(&conn, &RecordId::generate()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_complete_with_issues() {
        let (mut conn, project_id) = setup_db();
        let meeting = MeetingRepository::insert(&conn, &project_id, None).unwrap();

        let written = MeetingRepository::complete_with_issues(
            &mut conn,
            &meeting.id,
            "Kickoff",
            &[issue("Kickoff", 0), issue("Roadmap", 30_000)],
        )
        .unwrap();
        assert_eq!(written, 2);

        let meeting = MeetingRepository::get(&conn, &meeting.id).unwrap().unwrap();
        assert_eq!(meeting.status, MeetingStatus::Completed);
        assert_eq!(meeting.name, "Kickoff");

        let issues = IssueRepository::list_for_meeting(&conn, &meeting.id).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].headline, "Kickoff");
        assert_eq!(issues[1].headline, "Roadmap");
    }

    #[test]
    fn test_complete_rolls_back_on_terminal_meeting() {
        let (mut conn, project_id) = setup_db();
        let meeting = MeetingRepository::insert(&conn, &project_id, None).unwrap();
        assert!(MeetingRepository::mark_failed(&conn, &meeting.id).unwrap());

        let result = MeetingRepository::complete_with_issues(
            &mut conn,
            &meeting.id,
            "Late",
            &[issue("Late", 0)],
        );
        assert!(result.is_err());

        let meeting = MeetingRepository::get(&conn, &meeting.id).unwrap().unwrap();
        assert_eq!(meeting.status, MeetingStatus::Failed);
        assert_eq!(IssueRepository::count_for_meeting(&conn, &meeting.id).unwrap(), 0);
    }

    #[test]
    fn test_complete_missing_meeting_fails() {
        let (mut conn, _) = setup_db();
        let result = MeetingRepository::complete_with_issues(
            &mut conn,
            &RecordId::generate(),
            DEFAULT_MEETING_NAME,
            &[],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mark_failed_is_terminal() {
        let (mut conn, project_id) = setup_db();
        let meeting = MeetingRepository::insert(&conn, &project_id, None).unwrap();

        MeetingRepository::complete_with_issues(&mut conn, &meeting.id, "Done", &[]).unwrap();

        // A completed meeting is never flipped to FAILED
        assert!(!MeetingRepository::mark_failed(&conn, &meeting.id).unwrap());
        let meeting = MeetingRepository::get(&conn, &meeting.id).unwrap().unwrap();
        assert_eq!(meeting.status, MeetingStatus::Completed);
    }

    #[test]
    fn test_fail_all_processing() {
        let (mut conn, project_id) = setup_db();
        let done = MeetingRepository::insert(&conn, &project_id, None).unwrap();
        MeetingRepository::complete_with_issues(&mut conn, &done.id, "Done", &[]).unwrap();
        MeetingRepository::insert(&conn, &project_id, None).unwrap();
        MeetingRepository::insert(&conn, &project_id, None).unwrap();

        assert_eq!(MeetingRepository::fail_all_processing(&conn).unwrap(), 2);
        assert_eq!(MeetingRepository::fail_all_processing(&conn).unwrap(), 0);

        let done = MeetingRepository::get(&conn, &done.id).unwrap().unwrap();
        assert_eq!(done.status, MeetingStatus::Completed);
    }

    #[test]
    fn test_list_for_project() {
        let (conn, project_id) = setup_db();
        MeetingRepository::insert(&conn, &project_id, Some("Meeting 1")).unwrap();
        MeetingRepository::insert(&conn, &project_id, Some("Meeting 2")).unwrap();
        MeetingRepository::insert(&conn, &project_id, Some("Meeting 3")).unwrap();

        let meetings = MeetingRepository::list_for_project(&conn, &project_id, 2).unwrap();
        assert_eq!(meetings.len(), 2);
        // Newest first
        assert_eq!(meetings[0].name, "Meeting 3");
    }
}
