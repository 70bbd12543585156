//! Drives one meeting from PROCESSING to a terminal state.
//!
//! summarize → (issues + COMPLETED in one transaction) | FAILED

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::{Database, MeetingRepository, NewIssue, DEFAULT_MEETING_NAME};
use crate::id::RecordId;
use crate::transcription::{SummarizationClient, SummarySegment};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("summarization failed")]
    Summarization(#[source] anyhow::Error),
    #[error("persisting meeting results failed")]
    Persistence(#[source] anyhow::Error),
}

/// A meeting waiting to be summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionJob {
    pub meeting_id: RecordId,
    pub project_id: RecordId,
    pub media_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    Completed { meeting_name: String, issues: usize },
    Failed,
}

#[derive(Clone)]
pub struct IngestionWorkflow {
    db: Database,
    client: Arc<dyn SummarizationClient>,
}

impl IngestionWorkflow {
    pub fn new(db: Database, client: Arc<dyn SummarizationClient>) -> Self {
        Self { db, client }
    }

    /// Run the workflow to completion. Never returns an error: failures are
    /// recorded on the meeting and logged.
    pub async fn run(&self, job: &IngestionJob) -> IngestionOutcome {
        info!(
            "Processing meeting {} (project {}) with {}",
            job.meeting_id,
            job.project_id,
            self.client.name()
        );

        match self.ingest(job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Meeting {} processing failed: {:#}",
                    job.meeting_id,
                    anyhow::Error::new(e)
                );
                self.record_failure(&job.meeting_id).await;
                IngestionOutcome::Failed
            }
        }
    }

    async fn ingest(&self, job: &IngestionJob) -> Result<IngestionOutcome, IngestionError> {
        let summary = self
            .client
            .process(&job.media_url)
            .await
            .map_err(IngestionError::Summarization)?;

        let meeting_name = meeting_name(&summary.summaries);
        let issues: Vec<NewIssue> = summary.summaries.into_iter().map(NewIssue::from).collect();

        let meeting_id = job.meeting_id.clone();
        let name = meeting_name.clone();
        let written = self
            .db
            .call(move |conn| {
                MeetingRepository::complete_with_issues(conn, &meeting_id, &name, &issues)
            })
            .await
            .map_err(IngestionError::Persistence)?;

        info!(
            "Meeting {} processed successfully: {} issue(s), named {:?}",
            job.meeting_id, written, meeting_name
        );

        Ok(IngestionOutcome::Completed {
            meeting_name,
            issues: written,
        })
    }

    /// Flip the meeting to FAILED. Independent of any earlier write.
    pub async fn record_failure(&self, meeting_id: &RecordId) {
        let id = meeting_id.clone();
        match self
            .db
            .call(move |conn| MeetingRepository::mark_failed(conn, &id))
            .await
        {
            Ok(true) => info!("Meeting {} marked as FAILED", meeting_id),
            Ok(false) => warn!(
                "Meeting {} was missing or already terminal; status left unchanged",
                meeting_id
            ),
            Err(e) => error!("Failed to mark meeting {} as FAILED: {:#}", meeting_id, e),
        }
    }
}

/// Name for a completed meeting: the first headline verbatim, or the
/// placeholder when there is none or it is empty.
pub fn meeting_name(segments: &[SummarySegment]) -> String {
    segments
        .first()
        .map(|segment| segment.headline.as_str())
        .filter(|headline| !headline.is_empty())
        .unwrap_or(DEFAULT_MEETING_NAME)
        .to_string()
}

impl From<SummarySegment> for NewIssue {
    fn from(segment: SummarySegment) -> Self {
        Self {
            start_ms: segment.start,
            end_ms: segment.end,
            gist: segment.gist,
            headline: segment.headline,
            summary: segment.summary,
        }
    }
}
