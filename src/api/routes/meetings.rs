//! Meeting API routes.
//!
//! `GET /api/meetings/:id` is how clients find out whether processing
//! finished: the status moves to COMPLETED (with issues) or FAILED.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;

use super::projects::ListParams;
use super::{parse_path_id, DEFAULT_LIST_LIMIT};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extractors::AuthenticatedUser;
use crate::api::validation::parse_create_meeting;
use crate::api::AppState;
use crate::db::{
    IssueRecord, IssueRepository, MeetingRecord, MeetingRepository, MeetingStatus,
    ProjectRepository,
};
use crate::id::RecordId;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingResponse {
    pub id: RecordId,
    pub project_id: RecordId,
    pub name: String,
    pub status: MeetingStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<IssueResponse>>,
}

/// One summarized segment. Offsets are milliseconds, labels are `mm:ss`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub id: RecordId,
    pub start: i64,
    pub end: i64,
    pub start_label: String,
    pub end_label: String,
    pub gist: String,
    pub headline: String,
    pub summary: String,
}

impl From<MeetingRecord> for MeetingResponse {
    fn from(meeting: MeetingRecord) -> Self {
        Self {
            id: meeting.id,
            project_id: meeting.project_id,
            name: meeting.name,
            status: meeting.status,
            created_at: meeting.created_at,
            updated_at: meeting.updated_at,
            issues: None,
        }
    }
}

impl From<IssueRecord> for IssueResponse {
    fn from(issue: IssueRecord) -> Self {
        Self {
            start_label: issue.start_label(),
            end_label: issue.end_label(),
            id: issue.id,
            start: issue.start_ms,
            end: issue.end_ms,
            gist: issue.gist,
            headline: issue.headline,
            summary: issue.summary,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:id/meetings",
            get(list_meetings).post(create_meeting),
        )
        .route("/meetings/:id", get(get_meeting))
}

/// POST /api/projects/:id/meetings - Register a meeting before processing it.
async fn create_meeting(
    AuthenticatedUser(session): AuthenticatedUser,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<MeetingResponse>)> {
    let project_id = parse_path_id(&project_id)?;
    let request = parse_create_meeting(&body)?;

    let lookup = project_id.clone();
    let meeting = state
        .db
        .call(move |conn| {
            if ProjectRepository::get_owned(conn, &lookup, &session.user_id)?.is_none() {
                return Ok(None);
            }
            MeetingRepository::insert(conn, &lookup, request.name.as_deref()).map(Some)
        })
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Project {} not found", project_id)))?;

    Ok((StatusCode::CREATED, Json(meeting.into())))
}

/// GET /api/projects/:id/meetings - List a project's meetings, newest first.
async fn list_meetings(
    AuthenticatedUser(session): AuthenticatedUser,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<MeetingResponse>>> {
    let project_id = parse_path_id(&project_id)?;
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let lookup = project_id.clone();
    let meetings = state
        .db
        .call(move |conn| {
            if ProjectRepository::get_owned(conn, &lookup, &session.user_id)?.is_none() {
                return Ok(None);
            }
            MeetingRepository::list_for_project(conn, &lookup, limit).map(Some)
        })
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Project {} not found", project_id)))?;

    Ok(Json(meetings.into_iter().map(MeetingResponse::from).collect()))
}

/// GET /api/meetings/:id - Get a meeting with its issues.
async fn get_meeting(
    AuthenticatedUser(session): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MeetingResponse>> {
    let id = parse_path_id(&id)?;

    let lookup = id.clone();
    let found = state
        .db
        .call(move |conn| {
            let Some(meeting) = MeetingRepository::get(conn, &lookup)? else {
                return Ok(None);
            };
            if ProjectRepository::get_owned(conn, &meeting.project_id, &session.user_id)?.is_none() {
                return Ok(None);
            }
            let issues = IssueRepository::list_for_meeting(conn, &lookup)?;
            Ok(Some((meeting, issues)))
        })
        .await?;

    let (meeting, issues) =
        found.ok_or_else(|| ApiError::not_found(format!("Meeting {} not found", id)))?;

    let mut response = MeetingResponse::from(meeting);
    response.issues = Some(issues.into_iter().map(IssueResponse::from).collect());
    Ok(Json(response))
}
