//! Session extractors

use crate::api::error::ApiError;
use crate::sessions::{self, AuthSession, SESSION_COOKIE};
use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Requires a valid session cookie; rejects with 401 otherwise
pub struct CurrentUser(pub AuthSession);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = sessions::cookie_value(&parts.headers, SESSION_COOKIE)
            .ok_or(ApiError::Unauthorized)?;
        let auth = sessions::validate_session_token(&state.db, &token).await?;
        auth.map(CurrentUser).ok_or(ApiError::Unauthorized)
    }
}

/// Like [`CurrentUser`] but anonymous requests pass through as `None`
pub struct MaybeUser(pub Option<AuthSession>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Some(token) = sessions::cookie_value(&parts.headers, SESSION_COOKIE) else {
            return Ok(MaybeUser(None));
        };
        let auth = sessions::validate_session_token(&state.db, &token).await?;
        Ok(MaybeUser(auth))
    }
}
