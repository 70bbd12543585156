use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::transcription::{MeetingSummary, SummarizationClient, SummarySegment};

const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    auto_chapters: bool,
}

/// Shape shared by the create and get transcript endpoints.
#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: TranscriptStatus,
    #[serde(default)]
    chapters: Option<Vec<Chapter>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// Auto-chapter produced by AssemblyAI. Offsets are milliseconds.
#[derive(Debug, Deserialize)]
struct Chapter {
    start: i64,
    end: i64,
    gist: String,
    headline: String,
    summary: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl From<Chapter> for SummarySegment {
    fn from(chapter: Chapter) -> Self {
        Self {
            start: chapter.start,
            end: chapter.end,
            gist: chapter.gist,
            headline: chapter.headline,
            summary: chapter.summary,
        }
    }
}

/// Summarizes meetings with AssemblyAI auto chapters.
///
/// Polls until the transcript completes or errors. The overall wait is
/// bounded by the caller (see `BoundedClient`). A transcript that was
/// submitted but never reached a final status is resumed by the next call for
/// the same media URL, so a retried call does not submit a second job.
pub struct AssemblyAIProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    pending: Mutex<HashMap<String, String>>,
}

impl AssemblyAIProvider {
    pub fn new(api_key: String, endpoint: Option<String>, poll_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::new();
        let base_url = endpoint
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        info!("Initialized AssemblyAI provider with base URL: {}", base_url);

        Ok(Self {
            client,
            api_key,
            base_url,
            poll_interval,
            pending: Mutex::new(HashMap::new()),
        })
    }

    async fn forget(&self, media_url: &str) {
        self.pending.lock().await.remove(media_url);
    }

    /// Read a transcript body, turning non-2xx answers into errors that carry
    /// AssemblyAI's own message when it sent one.
    async fn read_transcript(
        response: reqwest::Response,
        action: &str,
    ) -> Result<TranscriptResponse> {
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read AssemblyAI {} response", action))?;

        if !status.is_success() {
            error!("AssemblyAI {} failed with status {}: {}", action, status, body);
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            bail!("AssemblyAI {} failed ({}): {}", action, status, detail);
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Unexpected AssemblyAI {} response", action))
    }

    async fn submit(&self, media_url: &str) -> Result<String> {
        debug!("Submitting {} to AssemblyAI with auto chapters", media_url);

        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("Authorization", &self.api_key)
            .json(&TranscriptRequest {
                audio_url: media_url,
                auto_chapters: true,
            })
            .send()
            .await
            .context("Failed to reach AssemblyAI")?;

        let transcript = Self::read_transcript(response, "submit").await?;
        debug!("AssemblyAI accepted transcript {}", transcript.id);
        Ok(transcript.id)
    }

    /// Poll until the transcript leaves the queue, then map its chapters.
    ///
    /// The pending entry for `media_url` is dropped once AssemblyAI gives a
    /// final answer for the transcript. Transport errors and server errors
    /// keep it so the next attempt can pick up where this one stopped.
    async fn wait_for_chapters(
        &self,
        media_url: &str,
        transcript_id: &str,
    ) -> Result<MeetingSummary> {
        let url = format!("{}/transcript/{}", self.base_url, transcript_id);

        let mut poll: u64 = 0;

        loop {
            poll += 1;
            let response = self
                .client
                .get(&url)
                .header("Authorization", &self.api_key)
                .send()
                .await
                .context("Failed to poll AssemblyAI")?;

            if response.status().is_client_error() {
                self.forget(media_url).await;
            }
            let transcript = Self::read_transcript(response, "poll").await?;
            match transcript.status {
                TranscriptStatus::Completed => {
                    self.forget(media_url).await;
                    let summaries: Vec<SummarySegment> = transcript
                        .chapters
                        .unwrap_or_default()
                        .into_iter()
                        .map(SummarySegment::from)
                        .collect();
                    info!(
                        "Transcript {} ready after {} poll(s): {} chapter(s)",
                        transcript_id,
                        poll,
                        summaries.len()
                    );
                    return Ok(MeetingSummary { summaries });
                }
                TranscriptStatus::Error => {
                    self.forget(media_url).await;
                    let reason = transcript
                        .error
                        .unwrap_or_else(|| "no reason given".to_string());
                    error!("Transcript {} failed: {}", transcript_id, reason);
                    bail!("AssemblyAI could not process the recording: {}", reason);
                }
                TranscriptStatus::Queued | TranscriptStatus::Processing => {
                    debug!("Transcript {} still {:?}", transcript_id, transcript.status);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl SummarizationClient for AssemblyAIProvider {
    fn name(&self) -> &'static str {
        "AssemblyAI API"
    }

    async fn process(&self, media_url: &str) -> Result<MeetingSummary> {
        info!("Summarizing meeting via AssemblyAI API: {}", media_url);

        let resumed = self.pending.lock().await.get(media_url).cloned();
        let transcript_id = match resumed {
            Some(transcript_id) => {
                info!("Resuming AssemblyAI transcript {}", transcript_id);
                transcript_id
            }
            None => {
                let transcript_id = self.submit(media_url).await?;
                self.pending
                    .lock()
                    .await
                    .insert(media_url.to_string(), transcript_id.clone());
                transcript_id
            }
        };

        self.wait_for_chapters(media_url, &transcript_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use crate::transcription::{BoundedClient, RetryPolicy};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct MockState {
        polls: Arc<AtomicU32>,
        submits: Arc<AtomicU32>,
        fail_with: Option<&'static str>,
        unavailable_polls: u32,
    }

    struct MockServer {
        base_url: String,
        polls: Arc<AtomicU32>,
        submits: Arc<AtomicU32>,
    }

    async fn create_transcript(
        State(state): State<MockState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication error, API token missing/invalid" })),
            ));
        }
        assert_eq!(body["auto_chapters"], json!(true));
        assert_eq!(body["audio_url"], json!("https://cdn.example.com/standup.mp3"));
        state.submits.fetch_add(1, Ordering::SeqCst);
        Ok(Json(json!({ "id": "t-1", "status": "queued" })))
    }

    async fn get_transcript(
        State(state): State<MockState>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        assert_eq!(id, "t-1");
        let poll = state.polls.fetch_add(1, Ordering::SeqCst);
        if poll < state.unavailable_polls {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Service temporarily unavailable" })),
            ));
        }
        if poll == state.unavailable_polls {
            return Ok(Json(json!({ "id": id, "status": "processing" })));
        }
        if let Some(message) = state.fail_with {
            return Ok(Json(json!({ "id": id, "status": "error", "error": message })));
        }
        Ok(Json(json!({
            "id": id,
            "status": "completed",
            "chapters": [
                { "start": 0, "end": 30000, "gist": "intro", "headline": "Kickoff", "summary": "We kicked off." },
                { "start": 30000, "end": 95000, "gist": "roadmap", "headline": "Roadmap review", "summary": "Q3 roadmap." }
            ]
        })))
    }

    async fn spawn_mock(fail_with: Option<&'static str>, unavailable_polls: u32) -> MockServer {
        let polls = Arc::new(AtomicU32::new(0));
        let submits = Arc::new(AtomicU32::new(0));
        let app = Router::new()
            .route("/transcript", post(create_transcript))
            .route("/transcript/:id", get(get_transcript))
            .with_state(MockState {
                polls: polls.clone(),
                submits: submits.clone(),
                fail_with,
                unavailable_polls,
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockServer {
            base_url: format!("http://{}", addr),
            polls,
            submits,
        }
    }

    fn provider(base_url: String, api_key: &str) -> AssemblyAIProvider {
        AssemblyAIProvider::new(
            api_key.to_string(),
            Some(base_url),
            Duration::from_millis(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_process_returns_chapters_in_order() {
        let mock = spawn_mock(None, 0).await;
        let summary = provider(mock.base_url, "test-key")
            .process("https://cdn.example.com/standup.mp3")
            .await
            .unwrap();

        assert_eq!(mock.polls.load(Ordering::SeqCst), 2);
        assert_eq!(mock.submits.load(Ordering::SeqCst), 1);
        assert_eq!(summary.summaries.len(), 2);
        assert_eq!(summary.summaries[0].headline, "Kickoff");
        assert_eq!(summary.summaries[0].end, 30_000);
        assert_eq!(summary.summaries[1].gist, "roadmap");
    }

    #[tokio::test]
    async fn test_process_surfaces_transcript_error() {
        let mock = spawn_mock(Some("Download error"), 0).await;
        let err = provider(mock.base_url, "test-key")
            .process("https://cdn.example.com/standup.mp3")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Download error"));
    }

    #[tokio::test]
    async fn test_process_surfaces_api_error() {
        let mock = spawn_mock(None, 0).await;
        let err = provider(mock.base_url, "wrong-key")
            .process("https://cdn.example.com/standup.mp3")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("API token missing/invalid"));
        assert_eq!(mock.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_resumes_submitted_transcript() {
        let mock = spawn_mock(None, 1).await;
        let client = BoundedClient::new(
            Arc::new(provider(mock.base_url, "test-key")),
            RetryPolicy {
                max_attempts: 2,
                timeout: Duration::from_secs(5),
                backoff: Duration::ZERO,
            },
        );

        let summary = client
            .process("https://cdn.example.com/standup.mp3")
            .await
            .unwrap();

        assert_eq!(summary.summaries.len(), 2);
        assert_eq!(mock.submits.load(Ordering::SeqCst), 1);
        assert_eq!(mock.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_transcript_is_submitted_again() {
        let mock = spawn_mock(Some("Download error"), 0).await;
        let provider = provider(mock.base_url, "test-key");

        for _ in 0..2 {
            assert!(provider
                .process("https://cdn.example.com/standup.mp3")
                .await
                .is_err());
        }
        assert_eq!(mock.submits.load(Ordering::SeqCst), 2);
        assert!(provider.pending.lock().await.is_empty());
    }

    #[test]
    fn test_completed_without_chapters_parses() {
        let response: TranscriptResponse =
            serde_json::from_str(r#"{"id":"t-2","status":"completed","chapters":null}"#).unwrap();
        assert_eq!(response.status, TranscriptStatus::Completed);
        assert!(response.chapters.is_none());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = AssemblyAIProvider::new(
            "key".to_string(),
            Some("http://localhost:9000/v2/".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(provider.base_url, "http://localhost:9000/v2");
    }
}
