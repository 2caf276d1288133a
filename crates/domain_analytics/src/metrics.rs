//! Daily metrics rollup

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;
use domain_stay::{Reservation, ReservationStatus, Room, RoomStatus};

/// Raw counts gathered for one date before the rollup is computed
///
/// The PostgreSQL adapter fills this with aggregate queries; in-memory
/// adapters use [`MetricsInputs::from_records`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsInputs {
    pub total_rooms: u32,
    pub occupied_rooms: u32,
    pub available_rooms: u32,
    /// Sum of completed payments created on the date
    pub revenue: Money,
    pub check_ins: u32,
    pub check_outs: u32,
    pub cancellations: u32,
    /// Reservations currently in house that arrived on or before the date
    pub guest_count: u32,
}

impl MetricsInputs {
    /// Derives the inputs for `date` from full room and reservation lists
    ///
    /// Room counts reflect the rooms' current status. Arrivals, departures and
    /// cancellations are counted by the calendar date (UTC) of their
    /// timestamps.
    pub fn from_records(
        date: NaiveDate,
        rooms: &[Room],
        reservations: &[Reservation],
        revenue: Money,
    ) -> Self {
        let rooms_in = |status: RoomStatus| count(rooms.iter().filter(|r| r.status == status));

        let check_ins = count(
            reservations
                .iter()
                .filter(|r| on_date(r.checked_in_at, date)),
        );
        let check_outs = count(
            reservations
                .iter()
                .filter(|r| on_date(r.checked_out_at, date)),
        );
        let cancellations = count(reservations.iter().filter(|r| {
            r.status == ReservationStatus::Cancelled && on_date(r.cancelled_at, date)
        }));
        let guest_count = count(reservations.iter().filter(|r| {
            r.status == ReservationStatus::CheckedIn
                && r.checked_in_at.is_some_and(|at| at.date_naive() <= date)
        }));

        Self {
            total_rooms: count(rooms.iter()),
            occupied_rooms: rooms_in(RoomStatus::Occupied),
            available_rooms: rooms_in(RoomStatus::Available),
            revenue,
            check_ins,
            check_outs,
            cancellations,
            guest_count,
        }
    }
}

fn on_date(at: Option<DateTime<Utc>>, date: NaiveDate) -> bool {
    at.is_some_and(|at| at.date_naive() == date)
}

fn count<T>(iter: impl Iterator<Item = T>) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

/// The stored rollup for one date (unique by `date`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub total_rooms: u32,
    pub occupied_rooms: u32,
    pub available_rooms: u32,
    /// Percentage of rooms occupied, 2 decimal places
    pub occupancy_rate: Decimal,
    pub total_revenue: Money,
    pub guest_count: u32,
    pub check_ins: u32,
    pub check_outs: u32,
    pub cancellations: u32,
}

impl DailyMetrics {
    /// Computes the rollup for `date`
    pub fn compute(date: NaiveDate, inputs: MetricsInputs) -> Self {
        Self {
            date,
            occupancy_rate: occupancy_rate(inputs.occupied_rooms, inputs.total_rooms),
            total_rooms: inputs.total_rooms,
            occupied_rooms: inputs.occupied_rooms,
            available_rooms: inputs.available_rooms,
            total_revenue: inputs.revenue.round_to_currency(),
            guest_count: inputs.guest_count,
            check_ins: inputs.check_ins,
            check_outs: inputs.check_outs,
            cancellations: inputs.cancellations,
        }
    }
}

/// occupied / total × 100, rounded to 2 decimals; 0 when there are no rooms
pub fn occupancy_rate(occupied: u32, total: u32) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(occupied) / Decimal::from(total) * dec!(100)).round_dp(2)
}
