//! Daily metrics handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;

use crate::auth::{Capability, Claims};
use crate::dto::metrics::MetricsResponse;
use crate::{error::ApiError, AppState};

/// Gets the stored rollup for a date
pub async fn get_metrics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<MetricsResponse>, ApiError> {
    claims.require(Capability::ViewMetrics)?;

    let metrics = state
        .billing
        .get_metrics(date)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no metrics computed for {date}")))?;
    Ok(Json((&metrics).into()))
}

/// Recomputes the rollup for a date
pub async fn refresh_metrics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<MetricsResponse>, ApiError> {
    claims.require(Capability::RefreshMetrics)?;

    let metrics = state.billing.refresh_metrics(date).await?;
    Ok(Json((&metrics).into()))
}
