//! OAuth login flow
//!
//! `/login/connect` sends the browser to the identity provider with a
//! random state value pinned in a short-lived cookie. The callback
//! checks that state, exchanges the code, upserts the user, runs the
//! per-user membership sync, and establishes a session.

use crate::api::error::{ApiError, ApiResult};
use crate::sessions::{self, SESSION_COOKIE};
use crate::users::{self, CreateUserParams};
use crate::AppState;
use artcc_common::Error;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse, Redirect};
use serde::Deserialize;
use tracing::info;

const STATE_COOKIE: &str = "connect_oauth_state";

fn state_cookie(value: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=600",
        STATE_COOKIE, value
    )
}

fn clear_state_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", STATE_COOKIE)
}

/// GET /login/connect
pub async fn login(State(state): State<AppState>) -> impl IntoResponse {
    let oauth_state = sessions::generate_session_token();
    let url = state.connect.authorize_url(&oauth_state);

    (
        AppendHeaders([(SET_COOKIE, state_cookie(&oauth_state))]),
        Redirect::to(&url),
    )
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// GET /login/connect/callback
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<impl IntoResponse> {
    let code = query
        .code
        .ok_or_else(|| Error::InvalidInput("missing authorization code".to_string()))?;
    let returned_state = query
        .state
        .ok_or_else(|| Error::InvalidInput("missing oauth state".to_string()))?;
    let expected_state = sessions::cookie_value(&headers, STATE_COOKIE)
        .ok_or_else(|| Error::InvalidInput("missing oauth state cookie".to_string()))?;
    if returned_state != expected_state {
        return Err(ApiError::App(Error::InvalidInput(
            "oauth state mismatch".to_string(),
        )));
    }

    let access_token = state.connect.exchange_code(&code).await?;
    let identity = state.connect.fetch_user(&access_token).await?;

    let params = CreateUserParams {
        cid: identity.cid.clone(),
        first_name: identity.personal.name_first.clone(),
        last_name: identity.personal.name_last.clone(),
        email: identity.personal.email.clone(),
        data: serde_json::to_string(&identity).map_err(Error::from)?,
    };

    let user = match users::update_user_identity(&state.db, &params.cid, &params).await? {
        Some(user) => user,
        None => users::create_user(&state.db, &params).await?,
    };

    // Tier may have changed since the last login
    state.membership().sync_user_membership(&user).await?;

    let token = sessions::generate_session_token();
    let session = sessions::create_session(&state.db, &token, &user.id).await?;

    info!(user_id = %user.id, cid = %user.cid, "user logged in");

    Ok((
        AppendHeaders([
            (SET_COOKIE, sessions::session_cookie(&token, session.expires_at)),
            (SET_COOKIE, clear_state_cookie()),
        ]),
        Redirect::to("/"),
    ))
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    if let Some(token) = sessions::cookie_value(&headers, SESSION_COOKIE) {
        let session_id = sessions::session_id_for_token(&token);
        sessions::invalidate_session(&state.db, &session_id).await?;
    }

    Ok((
        AppendHeaders([(SET_COOKIE, sessions::clear_session_cookie())]),
        Redirect::to("/"),
    ))
}
