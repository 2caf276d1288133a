//! Accounting report handler

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::auth::{Capability, Claims};
use crate::dto::metrics::{AccountingQuery, ReportResponse};
use crate::{error::ApiError, AppState};

/// Completed payments between `start` and `end` (inclusive)
pub async fn accounting_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AccountingQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    claims.require(Capability::ViewReports)?;

    let report = state
        .billing
        .accounting_report(query.start, query.end)
        .await?;
    Ok(Json((&report).into()))
}
