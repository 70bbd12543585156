//! Meeting ingestion: summarize a recording and turn each segment into an
//! issue. Requests only enqueue work; the workflow runs detached.

use anyhow::Result;
use tracing::{info, warn};

use crate::db::{Database, MeetingRepository};

pub mod dispatcher;
pub mod workflow;

pub use dispatcher::IngestionDispatcher;
pub use workflow::{meeting_name, IngestionError, IngestionJob, IngestionOutcome, IngestionWorkflow};

/// Fail meetings a previous run left in PROCESSING. Their workflows died with
/// that process, so nothing would ever move them to a terminal state.
pub async fn fail_interrupted(db: &Database) -> Result<usize> {
    let failed = db
        .call(|conn| MeetingRepository::fail_all_processing(conn))
        .await?;
    if failed > 0 {
        warn!("Marked {} interrupted meeting(s) as FAILED", failed);
    } else {
        info!("No interrupted meetings found");
    }
    Ok(failed)
}
