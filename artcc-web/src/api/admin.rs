//! Administrative endpoints

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentUser;
use crate::membership::certifications;
use crate::{permissions, users, AppState};
use artcc_common::Error;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

/// DELETE /api/users/:id/certifications/:code
pub async fn revoke_certification(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path((user_id, code)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    if !permissions::is_admin(&auth.roles) {
        return Err(ApiError::App(Error::Forbidden(
            "admin role required".to_string(),
        )));
    }

    users::find_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

    let removed = certifications::revoke_certification(&state.db, &user_id, &code).await?;
    if !removed {
        return Err(ApiError::App(Error::NotFound(format!(
            "certification {} for user {}",
            code, user_id
        ))));
    }

    info!(user_id = %user_id, code = %code, by = %auth.user.id, "certification revoked");
    Ok(Json(json!({ "revoked": code })))
}
