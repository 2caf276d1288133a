//! Front-desk handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use core_kernel::ReservationId;

use crate::auth::{Capability, Claims};
use crate::dto::stay::StayResponse;
use crate::{error::ApiError, AppState};

pub async fn check_in(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<StayResponse>, ApiError> {
    claims.require(Capability::FrontDesk)?;

    let update = state
        .front_desk
        .check_in(ReservationId::from(reservation_id), Utc::now())
        .await?;
    Ok(Json((&update).into()))
}

pub async fn check_out(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<StayResponse>, ApiError> {
    claims.require(Capability::FrontDesk)?;

    let update = state
        .front_desk
        .check_out(ReservationId::from(reservation_id), Utc::now())
        .await?;
    Ok(Json((&update).into()))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<StayResponse>, ApiError> {
    claims.require(Capability::FrontDesk)?;

    let update = state
        .front_desk
        .cancel(ReservationId::from(reservation_id), Utc::now())
        .await?;
    Ok(Json((&update).into()))
}
