//! Front-desk lifecycle tests for domain_stay

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{CoreError, Currency, GuestId, Money, RoomId};
use domain_stay::{Reservation, ReservationStatus, Room, RoomStatus};

fn confirmed_reservation() -> Reservation {
    Reservation::new(
        GuestId::new(),
        RoomId::new(),
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
        1,
        Money::new(dec!(90000), Currency::NGN),
        Utc::now(),
    )
    .unwrap()
}

#[test]
fn test_full_stay() {
    let mut reservation = confirmed_reservation();
    let arrival = Utc.with_ymd_and_hms(2024, 6, 10, 14, 0, 0).unwrap();
    let departure = Utc.with_ymd_and_hms(2024, 6, 12, 11, 0, 0).unwrap();

    reservation.check_in(arrival).unwrap();
    assert!(reservation.is_checked_in());
    assert_eq!(reservation.checked_in_at, Some(arrival));

    reservation.check_out(departure).unwrap();
    assert_eq!(reservation.status, ReservationStatus::CheckedOut);
    assert_eq!(reservation.checked_out_at, Some(departure));
}

#[test]
fn test_cannot_check_in_twice() {
    let mut reservation = confirmed_reservation();
    reservation.check_in(Utc::now()).unwrap();

    let result = reservation.check_in(Utc::now());
    assert!(matches!(result, Err(CoreError::InvalidStateTransition(_))));
}

#[test]
fn test_cancel_confirmed() {
    let mut reservation = confirmed_reservation();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();

    reservation.cancel(at).unwrap();
    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    assert_eq!(reservation.cancelled_at, Some(at));
}

#[test]
fn test_cannot_cancel_started_or_finished_stay() {
    let mut in_house = confirmed_reservation();
    in_house.check_in(Utc::now()).unwrap();
    assert!(in_house.cancel(Utc::now()).is_err());
    assert!(in_house.cancelled_at.is_none());

    let mut departed = confirmed_reservation();
    departed.check_in(Utc::now()).unwrap();
    departed.check_out(Utc::now()).unwrap();
    assert!(departed.cancel(Utc::now()).is_err());
}

#[test]
fn test_cannot_cancel_twice() {
    let mut reservation = confirmed_reservation();
    let first = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
    reservation.cancel(first).unwrap();

    assert!(reservation.cancel(Utc::now()).is_err());
    assert_eq!(reservation.cancelled_at, Some(first));
}

#[test]
fn test_room_turnover() {
    let mut room = Room::new("101", 1, "standard", Money::new(dec!(45000), Currency::NGN), Utc::now())
        .with_status(RoomStatus::Reserved);

    room.occupy(Utc::now()).unwrap();
    assert_eq!(room.status, RoomStatus::Occupied);

    room.mark_for_cleaning(Utc::now());
    assert_eq!(room.status, RoomStatus::Cleaning);
}

#[test]
fn test_reservation_serializes_status_as_snake_case() {
    let mut reservation = confirmed_reservation();
    reservation.check_in(Utc::now()).unwrap();

    let json = serde_json::to_value(&reservation).unwrap();
    assert_eq!(json["status"], "checked_in");
}
