//! Request payload validation.
//!
//! Bodies deserialize into loose structs where every field is optional, then
//! each field is checked on its own so all problems are reported together.

use anyhow::Context;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::{ApiError, ApiResult};
use crate::db::NewProject;
use crate::id::RecordId;

pub const GITHUB_URL_PATTERN: &str = r"^https://github\.com/[\w-]+/[\w-]+$";
const MIN_PROJECT_NAME_LEN: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessMeetingBody {
    meeting_url: Option<String>,
    project_id: Option<String>,
    meeting_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectBody {
    name: Option<String>,
    github_url: Option<String>,
    github_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CreateMeetingBody {
    name: Option<String>,
}

/// `POST /api/process-meeting` after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMeetingRequest {
    pub meeting_url: String,
    pub project_id: RecordId,
    pub meeting_id: RecordId,
}

/// `POST /api/projects/:id/meetings` after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMeetingRequest {
    pub name: Option<String>,
}

/// Collects one message per offending field.
#[derive(Default)]
struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Runs `check` on a required field, recording "Required" when it is absent.
    fn check<V, T>(
        &mut self,
        field: &str,
        value: Option<V>,
        check: impl FnOnce(V) -> Result<T, String>,
    ) -> Option<T> {
        let Some(raw) = value else {
            self.0.insert(field.to_string(), "Required".to_string());
            return None;
        };
        match check(raw) {
            Ok(value) => Some(value),
            Err(message) => {
                self.0.insert(field.to_string(), message);
                None
            }
        }
    }

    fn into_result<T>(self, value: impl FnOnce() -> Option<T>) -> ApiResult<T> {
        if !self.0.is_empty() {
            return Err(ApiError::validation(self.0));
        }
        value().ok_or_else(|| ApiError::bad_request("Invalid request"))
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Malformed JSON body: {}", e)))
}

fn record_id(raw: &str) -> Result<RecordId, String> {
    RecordId::parse(raw).map_err(|e| format!("Invalid id: {}", e))
}

/// Media URLs must be absolute http(s) URLs with a host.
pub fn validate_media_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("Invalid url: {}", e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Unsupported url scheme '{}'", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("Url has no host".to_string());
    }
    Ok(url)
}

pub fn parse_process_meeting(body: &[u8]) -> ApiResult<ProcessMeetingRequest> {
    let body: ProcessMeetingBody = parse_body(body)?;
    let mut errors = FieldErrors::default();

    let meeting_url = errors.check("meetingUrl", body.meeting_url, |raw| {
        validate_media_url(&raw).map(|_| raw.trim().to_string())
    });
    let project_id = errors.check("projectId", body.project_id, |raw| record_id(&raw));
    let meeting_id = errors.check("meetingId", body.meeting_id, |raw| record_id(&raw));

    errors.into_result(|| {
        Some(ProcessMeetingRequest {
            meeting_url: meeting_url?,
            project_id: project_id?,
            meeting_id: meeting_id?,
        })
    })
}

/// Project names are trimmed and must keep at least three characters.
pub fn validate_project_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.chars().count() < MIN_PROJECT_NAME_LEN {
        return Err(format!("Must be at least {} characters", MIN_PROJECT_NAME_LEN));
    }
    Ok(name.to_string())
}

/// Only repository root URLs on github.com are accepted.
pub fn validate_github_url(raw: &str) -> anyhow::Result<Result<String, String>> {
    let pattern = Regex::new(GITHUB_URL_PATTERN).context("Invalid GitHub url pattern")?;
    let url = raw.trim();
    if pattern.is_match(url) {
        Ok(Ok(url.to_string()))
    } else {
        Ok(Err("Must look like https://github.com/<owner>/<repo>".to_string()))
    }
}

pub fn parse_create_project(body: &[u8]) -> ApiResult<NewProject> {
    let body: CreateProjectBody = parse_body(body)?;
    let mut errors = FieldErrors::default();

    let name = errors.check("name", body.name, |raw| validate_project_name(&raw));
    let github_url = body
        .github_url
        .as_deref()
        .map(validate_github_url)
        .transpose()?;
    let github_url = errors.check("githubUrl", github_url, |checked| checked);
    let github_token = body
        .github_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    errors.into_result(|| {
        Some(NewProject {
            name: name?,
            github_url: github_url?,
            github_token,
        })
    })
}

/// An empty body is allowed and means "use the placeholder name".
pub fn parse_create_meeting(body: &[u8]) -> ApiResult<CreateMeetingRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateMeetingRequest::default());
    }

    let body: CreateMeetingBody = parse_body(body)?;
    let name = body
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(CreateMeetingRequest { name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn field_error(err: &ApiError, field: &str) -> Option<String> {
        err.fields().and_then(|f| f.get(field)).cloned()
    }

    #[test]
    fn test_process_meeting_accepts_valid_payload() {
        let request = parse_process_meeting(&body(json!({
            "meetingUrl": "https://cdn.example.com/standup.mp3",
            "projectId": "cproject01",
            "meetingId": "cmeeting01",
        })))
        .unwrap();

        assert_eq!(request.meeting_url, "https://cdn.example.com/standup.mp3");
        assert_eq!(request.project_id.as_str(), "cproject01");
        assert_eq!(request.meeting_id.as_str(), "cmeeting01");
    }

    #[test]
    fn test_process_meeting_reports_every_bad_field() {
        let err = parse_process_meeting(&body(json!({
            "meetingUrl": "not a url",
            "projectId": "project-1",
        })))
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(field_error(&err, "meetingUrl").unwrap().starts_with("Invalid url"));
        assert!(field_error(&err, "projectId").unwrap().starts_with("Invalid id"));
        assert_eq!(field_error(&err, "meetingId").as_deref(), Some("Required"));
    }

    #[test]
    fn test_process_meeting_rejects_non_http_urls() {
        let err = parse_process_meeting(&body(json!({
            "meetingUrl": "ftp://files.example.com/standup.mp3",
            "projectId": "cproject01",
            "meetingId": "cmeeting01",
        })))
        .unwrap_err();
        assert!(field_error(&err, "meetingUrl").unwrap().contains("scheme"));
    }

    #[test]
    fn test_process_meeting_rejects_malformed_json() {
        let err = parse_process_meeting(b"{\"meetingUrl\":").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.fields().is_none());

        let err = parse_process_meeting(b"[1, 2]").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_create_project_trims_and_validates() {
        let project = parse_create_project(&body(json!({
            "name": "  Widgets  ",
            "githubUrl": "https://github.com/acme/widgets",
            "githubToken": "",
        })))
        .unwrap();
        assert_eq!(project.name, "Widgets");
        assert_eq!(project.github_token, None);

        let err = parse_create_project(&body(json!({
            "name": " ab ",
            "githubUrl": "https://gitlab.com/acme/widgets",
        })))
        .unwrap_err();
        assert!(field_error(&err, "name").is_some());
        assert!(field_error(&err, "githubUrl").is_some());
    }

    #[test]
    fn test_create_project_rejects_repo_subpaths() {
        let err = parse_create_project(&body(json!({
            "name": "Widgets",
            "githubUrl": "https://github.com/acme/widgets/tree/main",
        })))
        .unwrap_err();
        assert!(field_error(&err, "githubUrl").is_some());
    }

    #[test]
    fn test_create_meeting_body_is_optional() {
        assert_eq!(parse_create_meeting(b"").unwrap(), CreateMeetingRequest::default());
        assert_eq!(
            parse_create_meeting(&body(json!({ "name": " Standup " }))).unwrap(),
            CreateMeetingRequest {
                name: Some("Standup".to_string())
            }
        );

        let err = parse_create_meeting(&body(json!({ "name": 42 }))).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("Malformed JSON body"));
    }

    #[test]
    fn test_wrongly_typed_field_is_a_malformed_body() {
        let err = parse_process_meeting(&body(json!({
            "meetingUrl": 7,
            "projectId": "cproject01",
            "meetingId": "cmeeting01",
        })))
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.fields().is_none());
        assert!(err.message().contains("expected a string"));
    }

    #[test]
    fn test_null_fields_count_as_missing() {
        let err = parse_create_project(&body(json!({
            "name": null,
            "githubUrl": "https://github.com/acme/widgets",
            "githubToken": null,
        })))
        .unwrap_err();
        assert_eq!(field_error(&err, "name").as_deref(), Some("Required"));
        assert!(field_error(&err, "githubUrl").is_none());
    }
}
