//! Meeting transcription and summarization.
//!
//! The summarizer is an external capability: given a media URL it returns an
//! ordered list of time-stamped summary segments. Everything behind
//! [`SummarizationClient`] is opaque to the ingestion workflow.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{TranscriptionConfig, ASSEMBLY_AI_PROVIDER};

pub mod providers;

pub use providers::AssemblyAIProvider;

/// One summarized stretch of a meeting. Offsets are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySegment {
    pub start: i64,
    pub end: i64,
    pub gist: String,
    pub headline: String,
    pub summary: String,
}

/// Result of processing a meeting recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub summaries: Vec<SummarySegment>,
}

#[async_trait]
pub trait SummarizationClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(&self, media_url: &str) -> Result<MeetingSummary>;
}

/// Per-attempt timeout and retry budget for a summarization call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff: Duration,
}

impl From<&TranscriptionConfig> for RetryPolicy {
    fn from(config: &TranscriptionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            timeout: config.timeout(),
            backoff: config.retry_backoff(),
        }
    }
}

/// Wraps a client so every attempt is time-boxed and failures are retried
/// up to `max_attempts` times.
pub struct BoundedClient {
    inner: Arc<dyn SummarizationClient>,
    policy: RetryPolicy,
}

impl BoundedClient {
    pub fn new(inner: Arc<dyn SummarizationClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl SummarizationClient for BoundedClient {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn process(&self, media_url: &str) -> Result<MeetingSummary> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let outcome = tokio::time::timeout(self.policy.timeout, self.inner.process(media_url)).await;

            let error = match outcome {
                Ok(Ok(summary)) => return Ok(summary),
                Ok(Err(e)) => e,
                Err(_) => anyhow!(
                    "{} timed out after {}s",
                    self.inner.name(),
                    self.policy.timeout.as_secs_f64()
                ),
            };

            warn!(
                "Summarization attempt {}/{} failed: {:#}",
                attempt, max_attempts, error
            );
            last_error = Some(error);

            if attempt < max_attempts && !self.policy.backoff.is_zero() {
                tokio::time::sleep(self.policy.backoff).await;
            }
        }

        let error = last_error.unwrap_or_else(|| anyhow!("no summarization attempt was made"));
        Err(error.context(format!(
            "Summarization failed after {} attempt(s)",
            max_attempts
        )))
    }
}

/// Build the configured summarization client, bounded by its retry policy.
pub fn build_client(config: &TranscriptionConfig) -> Result<Arc<dyn SummarizationClient>> {
    let provider: Arc<dyn SummarizationClient> = match config.provider.as_deref() {
        Some(ASSEMBLY_AI_PROVIDER) => {
            let api_key = config
                .api_key
                .clone()
                .context("api_key is required for AssemblyAI provider")?;

            Arc::new(AssemblyAIProvider::new(
                api_key,
                config.api_endpoint.clone(),
                config.poll_interval(),
            )?)
        }
        Some(other) => bail!(
            "Unknown transcription provider '{}'. Supported providers: {}",
            other,
            ASSEMBLY_AI_PROVIDER
        ),
        None => bail!("No transcription provider configured"),
    };

    info!("Using {} for meeting summaries", provider.name());

    Ok(Arc::new(BoundedClient::new(
        provider,
        RetryPolicy::from(config),
    )))
}
