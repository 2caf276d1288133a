//! Folio handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{FolioId, Money, ReservationId};
use domain_billing::{PaymentOutcome, PostChargeCommand, RecordPaymentCommand};

use crate::auth::{Capability, Claims};
use crate::dto::folio::*;
use crate::dto::payment::PaymentOutcomeResponse;
use crate::{error::ApiError, AppState};

/// Opens the reservation's folio, or returns the one already open
pub async fn open_folio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<FolioResponse>, ApiError> {
    claims.require(Capability::OpenFolios)?;

    let folio = state
        .billing
        .open_folio(ReservationId::from(reservation_id), Utc::now())
        .await?;
    Ok(Json((&folio).into()))
}

/// Gets the folio of a reservation
pub async fn get_reservation_folio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<FolioResponse>, ApiError> {
    claims.require(Capability::ViewFolios)?;

    let reservation_id = ReservationId::from(reservation_id);
    let folio = state
        .billing
        .folio_for_reservation(reservation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no folio for reservation {reservation_id}")))?;
    Ok(Json((&folio).into()))
}

/// Gets a folio with its line items and payments
pub async fn get_statement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(folio_id): Path<Uuid>,
) -> Result<Json<StatementResponse>, ApiError> {
    claims.require(Capability::ViewFolios)?;

    let statement = state.billing.folio_statement(FolioId::from(folio_id)).await?;
    Ok(Json((&statement).into()))
}

/// Posts a charge to a folio
pub async fn post_charge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(folio_id): Path<Uuid>,
    Json(request): Json<PostChargeRequest>,
) -> Result<(StatusCode, Json<ChargeResponse>), ApiError> {
    claims.require(Capability::PostCharges)?;
    request.validate()?;

    let currency = state.billing.config().currency;
    let posted = state
        .billing
        .post_charge(PostChargeCommand {
            folio_id: FolioId::from(folio_id),
            description: request.description,
            unit_amount: Money::new(request.unit_amount, currency),
            quantity: request.quantity,
            occurred_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json((&posted).into())))
}

/// Records a payment against a folio
///
/// Answers `201 Created` when the payment completed and `202 Accepted`
/// when the guest still has to pay through the gateway.
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(folio_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentOutcomeResponse>), ApiError> {
    claims.require(Capability::RecordPayments)?;
    request.validate()?;

    let currency = state.billing.config().currency;
    let outcome = state
        .billing
        .record_payment(RecordPaymentCommand {
            folio_id: FolioId::from(folio_id),
            amount: Money::new(request.amount, currency),
            method: request.method,
            recorded_by: claims.user_id(),
            notes: request.notes,
            occurred_at: Utc::now(),
        })
        .await?;

    let status = match outcome {
        PaymentOutcome::Completed { .. } => StatusCode::CREATED,
        PaymentOutcome::AwaitingGateway { .. } => StatusCode::ACCEPTED,
    };
    Ok((status, Json((&outcome).into())))
}
