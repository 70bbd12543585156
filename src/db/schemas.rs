use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Name given to a meeting until its first summary headline is known.
pub const DEFAULT_MEETING_NAME: &str = "Meeting";

/// Lifecycle status of a meeting.
///
/// `Processing` is the only non-terminal state. Once a meeting is
/// `Completed` or `Failed` its status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingStatus {
    Processing,
    Completed,
    Failed,
}

impl MeetingStatus {
    pub fn parse(s: &str) -> Result<MeetingStatus> {
        match s {
            "PROCESSING" => Ok(MeetingStatus::Processing),
            "COMPLETED" => Ok(MeetingStatus::Completed),
            "FAILED" => Ok(MeetingStatus::Failed),
            _ => anyhow::bail!("Invalid meeting status: {}", s),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub github_url: String,
    pub github_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: RecordId,
    pub owner_id: RecordId,
    pub name: String,
    pub github_url: String,
    pub github_token: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MeetingRecord {
    pub id: RecordId,
    pub project_id: RecordId,
    pub name: String,
    pub status: MeetingStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// A summary segment ready to be persisted as an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub start_ms: i64,
    pub end_ms: i64,
    pub gist: String,
    pub headline: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub id: RecordId,
    pub meeting_id: RecordId,
    pub position: i64,
    pub start_ms: i64,
    pub end_ms: i64,
    pub gist: String,
    pub headline: String,
    pub summary: String,
    pub created_at: String,
}

impl IssueRecord {
    pub fn start_label(&self) -> String {
        format_offset(self.start_ms)
    }

    pub fn end_label(&self) -> String {
        format_offset(self.end_ms)
    }
}

/// Render a millisecond offset as `mm:ss`, or `h:mm:ss` past the first hour.
pub fn format_offset(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_status_as_str() {
        assert_eq!(MeetingStatus::Processing.as_str(), "PROCESSING");
        assert_eq!(MeetingStatus::Completed.as_str(), "COMPLETED");
        assert_eq!(MeetingStatus::Failed.as_str(), "FAILED");
    }

    #[test]
    fn test_meeting_status_parse() {
        assert_eq!(
            MeetingStatus::parse("COMPLETED").unwrap(),
            MeetingStatus::Completed
        );
        assert!(MeetingStatus::parse("completed").is_err());
    }

    #[test]
    fn test_meeting_status_serialization() {
        let json = serde_json::to_string(&MeetingStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");

        let parsed: MeetingStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(parsed, MeetingStatus::Failed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MeetingStatus::Processing.is_terminal());
        assert!(MeetingStatus::Completed.is_terminal());
        assert!(MeetingStatus::Failed.is_terminal());
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0), "00:00");
        assert_eq!(format_offset(30_000), "00:30");
        assert_eq!(format_offset(754_999), "12:34");
        assert_eq!(format_offset(3_723_000), "1:02:03");
        assert_eq!(format_offset(-5), "00:00");
    }
}
