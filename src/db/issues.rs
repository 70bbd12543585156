use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use super::schemas::IssueRecord;
use crate::id::RecordId;

/// Repository for issue records. Issues are only ever written by
/// [`super::MeetingRepository::complete_with_issues`].
pub struct IssueRepository;

impl IssueRepository {
    /// List a meeting's issues in the order the summarizer produced them.
    pub fn list_for_meeting(conn: &Connection, meeting_id: &RecordId) -> Result<Vec<IssueRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, meeting_id, position, start_ms, end_ms, gist, headline, summary, created_at \
                 FROM issues WHERE meeting_id = ?1 ORDER BY position ASC",
            )
            .context("Failed to prepare issues query")?;

        let issues = stmt
            .query_map(params![meeting_id], map_issue)
            .context("Failed to query issues")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map issues")?;

        Ok(issues)
    }

    pub fn count_for_meeting(conn: &Connection, meeting_id: &RecordId) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE meeting_id = ?1",
            params![meeting_id],
            |row| row.get(0),
        )
        .context("Failed to count issues")
    }
}

fn map_issue(row: &Row<'_>) -> rusqlite::Result<IssueRecord> {
    Ok(IssueRecord {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        position: row.get(2)?,
        start_ms: row.get(3)?,
        end_ms: row.get(4)?,
        gist: row.get(5)?,
        headline: row.get(6)?,
        summary: row.get(7)?,
        created_at: row.get(8)?,
    })
}
