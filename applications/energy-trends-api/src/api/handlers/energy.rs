use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json},
};

use crate::api::models::energy::TrendsResponse;
use crate::api::AppState;
use crate::error::Result;
use crate::services::{RangeQuery, TrendsQuery};

/// GET /api/v1/energy/trends
/// Energy and cost analytics for a time range under the given tariff
pub async fn get_trends(
    State(state): State<AppState>,
    Query(params): Query<TrendsQuery>,
) -> Result<Json<TrendsResponse>> {
    let outcome = state.service.trends(&params).await?;
    Ok(Json(TrendsResponse::new(
        outcome,
        state.service.currency(),
    )))
}

/// GET /api/v1/energy/raw
/// Plain-text dump of the stored readings, one per line
pub async fn get_raw(
    State(state): State<AppState>,
    Query(params): Query<RangeQuery>,
) -> Result<impl IntoResponse> {
    let body = state.service.raw_readings(&params).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}
