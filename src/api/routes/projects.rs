//! Project API routes.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::{parse_path_id, DEFAULT_LIST_LIMIT};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extractors::AuthenticatedUser;
use crate::api::validation::parse_create_project;
use crate::api::AppState;
use crate::db::{ProjectRecord, ProjectRepository};
use crate::id::RecordId;

/// Project as returned by the API. The access token itself never leaves the
/// server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: RecordId,
    pub name: String,
    pub github_url: String,
    pub has_token: bool,
    pub created_at: String,
}

impl From<ProjectRecord> for ProjectResponse {
    fn from(project: ProjectRecord) -> Self {
        Self {
            id: project.id,
            name: project.name,
            github_url: project.github_url,
            has_token: project.github_token.is_some(),
            created_at: project.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    /// Maximum results (default 50)
    pub limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project))
}

/// POST /api/projects - Link a GitHub repository to a new project.
async fn create_project(
    AuthenticatedUser(session): AuthenticatedUser,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let new_project = parse_create_project(&body)?;

    let project = state
        .db
        .call(move |conn| ProjectRepository::insert(conn, &session.user_id, &new_project))
        .await?;

    Ok((StatusCode::CREATED, Json(project.into())))
}

/// GET /api/projects - List the caller's projects.
async fn list_projects(
    AuthenticatedUser(session): AuthenticatedUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let projects = state
        .db
        .call(move |conn| ProjectRepository::list_for_owner(conn, &session.user_id, limit))
        .await?;

    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

/// GET /api/projects/:id - Get one of the caller's projects.
async fn get_project(
    AuthenticatedUser(session): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_path_id(&id)?;
    let lookup = id.clone();
    let project = state
        .db
        .call(move |conn| ProjectRepository::get_owned(conn, &lookup, &session.user_id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Project {} not found", id)))?;

    Ok(Json(project.into()))
}
