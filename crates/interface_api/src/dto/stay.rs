//! Front-desk DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_billing::StayUpdate;
use domain_stay::{ReservationStatus, RoomStatus};

#[derive(Debug, Serialize, Deserialize)]
pub struct StayResponse {
    pub reservation_id: Uuid,
    pub reservation_status: ReservationStatus,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub room_id: Uuid,
    pub room_number: String,
    pub room_status: RoomStatus,
}

impl From<&StayUpdate> for StayResponse {
    fn from(update: &StayUpdate) -> Self {
        let StayUpdate { reservation, room } = update;
        Self {
            reservation_id: reservation.id.into(),
            reservation_status: reservation.status,
            check_in_date: reservation.check_in_date,
            check_out_date: reservation.check_out_date,
            checked_in_at: reservation.checked_in_at,
            checked_out_at: reservation.checked_out_at,
            cancelled_at: reservation.cancelled_at,
            room_id: room.id.into(),
            room_number: room.number.clone(),
            room_status: room.status,
        }
    }
}
