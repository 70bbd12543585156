//! API route modules, mounted under `/api`.

pub mod meetings;
pub mod process;
pub mod projects;

use axum::Router;
use std::collections::BTreeMap;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::id::RecordId;

const DEFAULT_LIST_LIMIT: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(process::router())
        .merge(projects::router())
        .merge(meetings::router())
}

/// Ids in the path are validated like ids in a body.
fn parse_path_id(raw: &str) -> ApiResult<RecordId> {
    RecordId::parse(raw).map_err(|e| {
        ApiError::validation(BTreeMap::from([(
            "id".to_string(),
            format!("Invalid id: {}", e),
        )]))
    })
}
