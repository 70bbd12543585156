#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use gitintel::db::{Database, MeetingRepository, NewProject, ProjectRepository, UserRepository};
use gitintel::id::RecordId;
use gitintel::transcription::{MeetingSummary, SummarizationClient, SummarySegment};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// What the scripted client does when called.
pub enum Script {
    Segments(Vec<SummarySegment>),
    Fail(&'static str),
    Panic,
}

/// Summarization client with a canned answer and an optional delay.
pub struct ScriptedClient {
    script: Script,
    delay: Duration,
    pub calls: AtomicU32,
}

impl ScriptedClient {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummarizationClient for ScriptedClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn process(&self, _media_url: &str) -> Result<MeetingSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match &self.script {
            Script::Segments(segments) => Ok(MeetingSummary {
                summaries: segments.clone(),
            }),
            Script::Fail(message) => bail!("{}", message),
            Script::Panic => panic!("scripted client panicked"),
        }
    }
}

pub fn segment(start: i64, end: i64, headline: &str) -> SummarySegment {
    SummarySegment {
        start,
        end,
        gist: format!("{} gist", headline.to_lowercase()),
        headline: headline.to_string(),
        summary: format!("Discussion about {}.", headline.to_lowercase()),
    }
}

pub struct Seeded {
    pub owner_id: RecordId,
    pub project_id: RecordId,
    pub meeting_id: RecordId,
}

/// One user owning one project with one PROCESSING meeting.
pub fn seed(db: &Database, login: &str) -> Seeded {
    db.blocking(|conn| {
        let owner = UserRepository::upsert_by_login(conn, login)?;
        let project = ProjectRepository::insert(
            conn,
            &owner.id,
            &NewProject {
                name: "Widgets".to_string(),
                github_url: "https://github.com/acme/widgets".to_string(),
                github_token: Some("ghp_secret".to_string()),
            },
        )?;
        let meeting = MeetingRepository::insert(conn, &project.id, None)?;
        Ok(Seeded {
            owner_id: owner.id,
            project_id: project.id,
            meeting_id: meeting.id,
        })
    })
    .unwrap()
}

/// Poll until `check` passes or two seconds elapse.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
