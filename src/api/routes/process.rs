//! Meeting processing endpoint.
//!
//! `POST /api/process-meeting` validates the request, checks the meeting is
//! ready, hands it to the dispatcher and answers 202 without waiting.

use axum::{body::Bytes, extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Serialize;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::extractors::AuthenticatedUser;
use crate::api::validation::parse_process_meeting;
use crate::api::AppState;
use crate::db::{MeetingRepository, ProjectRepository};
use crate::id::RecordId;
use crate::ingestion::IngestionJob;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMeetingResponse {
    pub status: &'static str,
    pub meeting_id: RecordId,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/process-meeting", post(process_meeting))
}

/// POST /api/process-meeting - Start summarizing a meeting recording.
async fn process_meeting(
    AuthenticatedUser(session): AuthenticatedUser,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ProcessMeetingResponse>)> {
    let request = parse_process_meeting(&body)?;

    let project_id = request.project_id.clone();
    let meeting_id = request.meeting_id.clone();
    let owner_id = session.user_id.clone();
    let (project, meeting) = state
        .db
        .call(move |conn| {
            let project = ProjectRepository::get_owned(conn, &project_id, &owner_id)?;
            let meeting = MeetingRepository::get(conn, &meeting_id)?;
            Ok((project, meeting))
        })
        .await?;

    if project.is_none() {
        return Err(ApiError::not_found(format!(
            "Project {} not found",
            request.project_id
        )));
    }
    let meeting = meeting
        .filter(|meeting| meeting.project_id == request.project_id)
        .ok_or_else(|| ApiError::not_found(format!("Meeting {} not found", request.meeting_id)))?;
    if meeting.status.is_terminal() {
        return Err(ApiError::conflict(format!(
            "Meeting {} is already {}",
            meeting.id,
            meeting.status.as_str()
        )));
    }

    state.dispatcher.dispatch(IngestionJob {
        meeting_id: request.meeting_id.clone(),
        project_id: request.project_id,
        media_url: request.meeting_url,
    })?;

    info!(
        "Meeting {} accepted for processing (requested by {})",
        request.meeting_id, session.login
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ProcessMeetingResponse {
            status: "processing",
            meeting_id: request.meeting_id,
        }),
    ))
}
