//! Current-session endpoint

use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::{users, AppState};
use artcc_common::db::models::{Certification, Endorsement, User};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: User,
    pub roles: Vec<String>,
    pub certifications: Vec<Certification>,
    pub endorsements: Vec<Endorsement>,
}

/// GET /api/session
pub async fn current_session(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
) -> ApiResult<Json<SessionInfo>> {
    let certifications = users::certifications_for_user(&state.db, &auth.user.id).await?;
    let endorsements = users::endorsements_for_user(&state.db, &auth.user.id).await?;

    Ok(Json(SessionInfo {
        user: auth.user,
        roles: auth.roles,
        certifications,
        endorsements,
    }))
}

/// PUT /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Json(params): Json<users::UpdateProfileParams>,
) -> ApiResult<Json<User>> {
    let user = users::update_profile(&state.db, &auth.user.id, &params).await?;
    Ok(Json(user))
}
