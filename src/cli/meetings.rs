use anyhow::{anyhow, Result};

use super::args::{MeetingCliArgs, MeetingCommand};
use crate::db::{Database, IssueRepository, MeetingRepository, ProjectRepository};
use crate::id::RecordId;

pub fn handle_meeting_command(db: &Database, args: MeetingCliArgs) -> Result<()> {
    match args.command {
        MeetingCommand::List { project, limit } => {
            let project_id = RecordId::parse(&project)
                .map_err(|e| anyhow!("Invalid project id '{}': {}", project, e))?;

            let (project, meetings) = db.blocking(|conn| {
                let project = ProjectRepository::get(conn, &project_id)?
                    .ok_or_else(|| anyhow!("Project {} not found", project_id))?;
                let meetings = MeetingRepository::list_for_project(conn, &project_id, limit)?;
                Ok((project, meetings))
            })?;

            if meetings.is_empty() {
                println!("No meetings found for project {}.", project.name);
                return Ok(());
            }

            println!("Found {} meeting(s) in {}:\n", meetings.len(), project.name);
            for meeting in meetings {
                println!("ID: {}", meeting.id);
                println!("Name: {}", meeting.name);
                println!("Status: {}", meeting.status.as_str());
                println!("Created: {}", meeting.created_at);
                println!("---");
            }
            Ok(())
        }
        MeetingCommand::Show { id } => {
            let meeting_id =
                RecordId::parse(&id).map_err(|e| anyhow!("Invalid meeting id '{}': {}", id, e))?;

            let (meeting, issues) = db.blocking(|conn| {
                let meeting = MeetingRepository::get(conn, &meeting_id)?
                    .ok_or_else(|| anyhow!("Meeting {} not found", meeting_id))?;
                let issues = IssueRepository::list_for_meeting(conn, &meeting_id)?;
                Ok((meeting, issues))
            })?;

            println!("Meeting: {} ({})", meeting.name, meeting.id);
            println!("Project: {}", meeting.project_id);
            println!("Status: {}", meeting.status.as_str());
            println!("Updated: {}", meeting.updated_at);

            if issues.is_empty() {
                println!("\nNo issues recorded.");
                return Ok(());
            }

            println!("\n{} issue(s):\n", issues.len());
            for issue in issues {
                println!(
                    "[{} - {}] {}",
                    issue.start_label(),
                    issue.end_label(),
                    issue.headline
                );
                println!("Gist: {}", issue.gist);
                println!("{}", issue.summary);
                println!("---");
            }
            Ok(())
        }
    }
}
