//! Data feed proxies

use crate::api::error::ApiResult;
use crate::clients::datafeed::Metar;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

/// GET /api/weather
pub async fn metars(State(state): State<AppState>) -> ApiResult<Json<Vec<Metar>>> {
    let metars = state
        .datafeed
        .fetch_metars(&state.config.facility.metar_airports)
        .await?;
    Ok(Json(metars))
}

/// GET /api/division-events
pub async fn division_events(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let body = state.datafeed.fetch_division_events().await?;
    Ok(Json(body))
}
