//! Detached execution of ingestion workflows.
//!
//! Each workflow runs on its own task, tracked so shutdown can wait for
//! in-flight meetings. A panicking workflow is caught here and its meeting is
//! marked FAILED; nothing escapes to the caller or the runtime.

use anyhow::{bail, Result};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use super::workflow::{IngestionJob, IngestionOutcome, IngestionWorkflow};

#[derive(Clone)]
pub struct IngestionDispatcher {
    workflow: IngestionWorkflow,
    tracker: TaskTracker,
}

impl IngestionDispatcher {
    pub fn new(workflow: IngestionWorkflow) -> Self {
        Self {
            workflow,
            tracker: TaskTracker::new(),
        }
    }

    /// Start processing `job` in the background and return immediately.
    pub fn dispatch(&self, job: IngestionJob) -> Result<()> {
        if self.tracker.is_closed() {
            bail!(
                "Ingestion dispatcher is shutting down; meeting {} not started",
                job.meeting_id
            );
        }

        let workflow = self.workflow.clone();
        let meeting_id = job.meeting_id.clone();
        debug!("Dispatching meeting {}", meeting_id);

        self.tracker.spawn(async move {
            let run = tokio::spawn({
                let workflow = workflow.clone();
                async move { workflow.run(&job).await }
            });

            match run.await {
                Ok(IngestionOutcome::Completed { issues, .. }) => {
                    debug!("Workflow for meeting {} finished with {} issue(s)", meeting_id, issues);
                }
                Ok(IngestionOutcome::Failed) => {
                    debug!("Workflow for meeting {} finished as FAILED", meeting_id);
                }
                Err(e) => {
                    if e.is_panic() {
                        error!("Workflow for meeting {} panicked", meeting_id);
                    } else {
                        error!("Workflow for meeting {} was cancelled", meeting_id);
                    }
                    workflow.record_failure(&meeting_id).await;
                }
            }
        });

        Ok(())
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting work and wait for every running workflow to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(
                "Waiting for {} in-flight meeting workflow(s) to finish",
                self.tracker.len()
            );
        }
        self.tracker.wait().await;
        info!("Ingestion dispatcher stopped");
    }
}
