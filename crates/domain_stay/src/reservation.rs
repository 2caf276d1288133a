//! Reservations and their front-desk lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoreError, GuestId, Money, ReservationId, RoomId};

/// Reservation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Booked, guest has not arrived
    Confirmed,
    /// Guest is in house
    CheckedIn,
    /// Guest has departed
    CheckedOut,
    /// Cancelled before arrival
    Cancelled,
    /// Guest never arrived
    NoShow,
}

impl ReservationStatus {
    /// Returns the persisted representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "checked_in" => Ok(ReservationStatus::CheckedIn),
            "checked_out" => Ok(ReservationStatus::CheckedOut),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            "no_show" => Ok(ReservationStatus::NoShow),
            other => Err(CoreError::validation(format!(
                "unknown reservation status '{other}'"
            ))),
        }
    }
}

/// A guest's booking of one room for a date range
///
/// The `*_at` timestamps record when each front-desk transition happened;
/// the daily metrics rollup counts arrivals, departures and cancellations by
/// the calendar date of these timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub guest_id: GuestId,
    pub room_id: RoomId,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    /// Number of people staying
    pub guests: u32,
    pub status: ReservationStatus,
    /// Price of the whole stay; becomes the folio's room charges
    pub total_price: Money,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Creates a confirmed reservation
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stay does not last at least one
    /// night or has no guests.
    pub fn new(
        guest_id: GuestId,
        room_id: RoomId,
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
        guests: u32,
        total_price: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        if check_out_date <= check_in_date {
            return Err(CoreError::validation(
                "check-out date must be after check-in date",
            ));
        }
        if guests == 0 {
            return Err(CoreError::validation("a reservation needs at least one guest"));
        }

        Ok(Self {
            id: ReservationId::new_v7(),
            guest_id,
            room_id,
            check_in_date,
            check_out_date,
            guests,
            status: ReservationStatus::Confirmed,
            total_price,
            checked_in_at: None,
            checked_out_at: None,
            cancelled_at: None,
            created_at,
            updated_at: created_at,
        })
    }

    /// Number of nights booked
    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days()
    }

    pub fn is_checked_in(&self) -> bool {
        self.status == ReservationStatus::CheckedIn
    }

    /// Registers the guest's arrival
    ///
    /// # Errors
    ///
    /// Only confirmed reservations can be checked in.
    pub fn check_in(&mut self, at: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            ReservationStatus::Confirmed => {
                self.status = ReservationStatus::CheckedIn;
                self.checked_in_at = Some(at);
                self.updated_at = at;
                Ok(())
            }
            other => Err(self.transition_error(other, ReservationStatus::CheckedIn)),
        }
    }

    /// Registers the guest's departure
    ///
    /// # Errors
    ///
    /// Only checked-in reservations can be checked out.
    pub fn check_out(&mut self, at: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            ReservationStatus::CheckedIn => {
                self.status = ReservationStatus::CheckedOut;
                self.checked_out_at = Some(at);
                self.updated_at = at;
                Ok(())
            }
            other => Err(self.transition_error(other, ReservationStatus::CheckedOut)),
        }
    }

    /// Cancels the reservation
    ///
    /// # Errors
    ///
    /// A stay that has started, finished or was already cancelled cannot be
    /// cancelled.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            ReservationStatus::Confirmed | ReservationStatus::NoShow => {
                self.status = ReservationStatus::Cancelled;
                self.cancelled_at = Some(at);
                self.updated_at = at;
                Ok(())
            }
            other => Err(self.transition_error(other, ReservationStatus::Cancelled)),
        }
    }

    fn transition_error(&self, from: ReservationStatus, to: ReservationStatus) -> CoreError {
        CoreError::invalid_state(format!(
            "reservation {} cannot move from {} to {}",
            self.id, from, to
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn reservation() -> Reservation {
        Reservation::new(
            GuestId::new(),
            RoomId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            2,
            Money::new(dec!(135000), Currency::NGN),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_reservation_is_confirmed() {
        let r = reservation();
        assert_eq!(r.status, ReservationStatus::Confirmed);
        assert_eq!(r.nights(), 3);
        assert!(r.checked_in_at.is_none());
    }

    #[test]
    fn test_rejects_inverted_dates() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let result = Reservation::new(
            GuestId::new(),
            RoomId::new(),
            day,
            day,
            1,
            Money::zero(Currency::NGN),
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "checked_in".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::CheckedIn
        );
        assert_eq!(ReservationStatus::NoShow.to_string(), "no_show");
        assert!("pending".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_check_out_requires_check_in() {
        let mut r = reservation();
        let result = r.check_out(Utc::now());
        assert!(matches!(result, Err(CoreError::InvalidStateTransition(_))));
        assert_eq!(r.status, ReservationStatus::Confirmed);
    }
}
