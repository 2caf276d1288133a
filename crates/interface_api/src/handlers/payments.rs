//! Gateway payment handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::auth::{Capability, Claims};
use crate::dto::payment::*;
use crate::{error::ApiError, AppState};

/// Applies a gateway verdict supplied by a trusted caller
pub async fn confirm_gateway_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<ConfirmGatewayRequest>,
) -> Result<Json<PaymentOutcomeResponse>, ApiError> {
    claims.require(Capability::ConfirmPayments)?;
    request.validate()?;

    let outcome = state
        .billing
        .confirm_gateway_payment(&request.reference, request.status, Utc::now())
        .await?;
    Ok(Json((&outcome).into()))
}

/// Asks the gateway for the payment's status and applies it
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reference): Path<String>,
) -> Result<Json<PaymentOutcomeResponse>, ApiError> {
    claims.require(Capability::ConfirmPayments)?;

    let outcome = state
        .billing
        .verify_gateway_payment(&reference, Utc::now())
        .await?;
    Ok(Json((&outcome).into()))
}

/// Landing endpoint for the gateway redirect
///
/// Unauthenticated, so the status is never taken from the query string;
/// the gateway is asked directly.
pub async fn gateway_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<PaymentOutcomeResponse>, ApiError> {
    let reference = query
        .reference()
        .ok_or_else(|| ApiError::BadRequest("missing payment reference".to_string()))?;
    info!(payment_ref = %reference, "Gateway callback received");

    let outcome = state
        .billing
        .verify_gateway_payment(reference, Utc::now())
        .await?;
    Ok(Json((&outcome).into()))
}
