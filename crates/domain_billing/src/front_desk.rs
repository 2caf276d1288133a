//! Front-desk operations
//!
//! Check-in, check-out and cancellation move a reservation and its room
//! through their lifecycle and refresh the day's metrics. Check-in is gated
//! on the folio: the guest must have paid at least once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{Currency, ReservationId};
use domain_stay::{Reservation, Room};

use crate::error::BillingError;
use crate::folio::FolioStatus;
use crate::ports::LedgerStore;
use crate::services::rollup_metrics;

/// Reservation and room after a front-desk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StayUpdate {
    pub reservation: Reservation,
    pub room: Room,
}

/// Front-desk application service
pub struct FrontDeskService {
    store: Arc<dyn LedgerStore>,
    currency: Currency,
}

impl FrontDeskService {
    pub fn new(store: Arc<dyn LedgerStore>, currency: Currency) -> Self {
        Self { store, currency }
    }

    /// Checks a guest in
    ///
    /// # Errors
    ///
    /// - `InconsistentState` if the reservation is not confirmed, has no
    ///   folio, or its folio is still open with money owed
    /// - `NotFound` if the reservation or its room does not exist
    pub async fn check_in(
        &self,
        reservation_id: ReservationId,
        at: DateTime<Utc>,
    ) -> Result<StayUpdate, BillingError> {
        let mut tx = self.store.begin().await?;
        let mut reservation = tx.lock_reservation(reservation_id).await?;

        let folio = tx
            .lock_folio_for_reservation(reservation_id)
            .await?
            .ok_or_else(|| {
                BillingError::inconsistent(format!(
                    "reservation {reservation_id} has no folio; payment is required before check-in"
                ))
            })?;
        if folio.status == FolioStatus::Open && folio.has_outstanding_balance() {
            return Err(BillingError::inconsistent(format!(
                "folio {} has an outstanding balance of {}; payment is required before check-in",
                folio.id, folio.balance
            )));
        }

        reservation.check_in(at)?;
        let mut room = tx.lock_room(reservation.room_id).await?;
        room.occupy(at)?;

        tx.update_reservation(&reservation).await?;
        tx.update_room(&room).await?;
        rollup_metrics(tx.as_mut(), at.date_naive(), self.currency).await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            room = %room.number,
            folio_id = %folio.id,
            "Guest checked in"
        );
        Ok(StayUpdate { reservation, room })
    }

    /// Checks a guest out and sends the room to housekeeping
    pub async fn check_out(
        &self,
        reservation_id: ReservationId,
        at: DateTime<Utc>,
    ) -> Result<StayUpdate, BillingError> {
        let mut tx = self.store.begin().await?;
        let mut reservation = tx.lock_reservation(reservation_id).await?;
        reservation.check_out(at)?;

        let mut room = tx.lock_room(reservation.room_id).await?;
        room.mark_for_cleaning(at);

        tx.update_reservation(&reservation).await?;
        tx.update_room(&room).await?;
        rollup_metrics(tx.as_mut(), at.date_naive(), self.currency).await?;
        tx.commit().await?;

        info!(reservation_id = %reservation.id, room = %room.number, "Guest checked out");
        Ok(StayUpdate { reservation, room })
    }

    /// Cancels a reservation and releases its room if it was held
    pub async fn cancel(
        &self,
        reservation_id: ReservationId,
        at: DateTime<Utc>,
    ) -> Result<StayUpdate, BillingError> {
        let mut tx = self.store.begin().await?;
        let mut reservation = tx.lock_reservation(reservation_id).await?;
        reservation.cancel(at)?;

        let mut room = tx.lock_room(reservation.room_id).await?;
        let released = room.release(at);

        tx.update_reservation(&reservation).await?;
        if released {
            tx.update_room(&room).await?;
        }
        rollup_metrics(tx.as_mut(), at.date_naive(), self.currency).await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            room = %room.number,
            room_released = released,
            "Reservation cancelled"
        );
        Ok(StayUpdate { reservation, room })
    }
}
