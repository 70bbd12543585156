//! Request extractors shared by the API routes.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use super::error::ApiError;
use super::AppState;
use crate::auth::{extract_token, Session};

/// The caller's session. Rejects with 401 when the request carries no token
/// or the token does not resolve to a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            debug!("Rejecting {} {}: no session token", parts.method, parts.uri.path());
            return Err(ApiError::unauthorized());
        };

        match state.sessions.resolve(&token).await? {
            Some(session) => Ok(Self(session)),
            None => {
                debug!("Rejecting {} {}: unknown or expired session", parts.method, parts.uri.path());
                Err(ApiError::unauthorized())
            }
        }
    }
}
