//! Daily metrics rollup tests

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Currency, GuestId, Money};
use domain_analytics::{DailyMetrics, MetricsInputs};
use domain_stay::{Reservation, Room, RoomStatus};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

fn rooms() -> Vec<Room> {
    let price = Money::new(dec!(40000), Currency::NGN);
    vec![
        Room::new("101", 1, "standard", price, Utc::now()).with_status(RoomStatus::Occupied),
        Room::new("102", 1, "standard", price, Utc::now()).with_status(RoomStatus::Available),
        Room::new("103", 1, "standard", price, Utc::now()).with_status(RoomStatus::Cleaning),
    ]
}

fn reservation(room: &Room) -> Reservation {
    Reservation::new(
        GuestId::new(),
        room.id,
        NaiveDate::from_ymd_opt(2024, 5, 19).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 22).unwrap(),
        1,
        Money::new(dec!(120000), Currency::NGN),
        Utc::now(),
    )
    .unwrap()
}

fn activity(rooms: &[Room]) -> Vec<Reservation> {
    let mut arrived_yesterday = reservation(&rooms[0]);
    arrived_yesterday
        .check_in(Utc.with_ymd_and_hms(2024, 5, 19, 15, 0, 0).unwrap())
        .unwrap();

    let mut arrived_today = reservation(&rooms[0]);
    arrived_today
        .check_in(Utc.with_ymd_and_hms(2024, 5, 20, 13, 0, 0).unwrap())
        .unwrap();

    let mut departed_today = reservation(&rooms[2]);
    departed_today
        .check_in(Utc.with_ymd_and_hms(2024, 5, 17, 13, 0, 0).unwrap())
        .unwrap();
    departed_today
        .check_out(Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap())
        .unwrap();

    let mut cancelled_today = reservation(&rooms[1]);
    cancelled_today
        .cancel(Utc.with_ymd_and_hms(2024, 5, 20, 8, 0, 0).unwrap())
        .unwrap();

    let mut cancelled_earlier = reservation(&rooms[1]);
    cancelled_earlier
        .cancel(Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap())
        .unwrap();

    let mut arrives_tomorrow = reservation(&rooms[1]);
    arrives_tomorrow
        .check_in(Utc.with_ymd_and_hms(2024, 5, 21, 12, 0, 0).unwrap())
        .unwrap();

    vec![
        arrived_yesterday,
        arrived_today,
        departed_today,
        cancelled_today,
        cancelled_earlier,
        arrives_tomorrow,
    ]
}

#[test]
fn test_inputs_from_records() {
    let rooms = rooms();
    let reservations = activity(&rooms);
    let revenue = Money::new(dec!(55000), Currency::NGN);

    let inputs = MetricsInputs::from_records(day(), &rooms, &reservations, revenue);

    assert_eq!(inputs.total_rooms, 3);
    assert_eq!(inputs.occupied_rooms, 1);
    assert_eq!(inputs.available_rooms, 1);
    assert_eq!(inputs.check_ins, 1);
    assert_eq!(inputs.check_outs, 1);
    assert_eq!(inputs.cancellations, 1);
    // in house as of the 20th: arrived on the 19th and the 20th
    assert_eq!(inputs.guest_count, 2);
    assert_eq!(inputs.revenue, revenue);
}

#[test]
fn test_compute_rollup() {
    let rooms = rooms();
    let reservations = activity(&rooms);
    let inputs = MetricsInputs::from_records(
        day(),
        &rooms,
        &reservations,
        Money::new(dec!(55000), Currency::NGN),
    );

    let metrics = DailyMetrics::compute(day(), inputs);

    assert_eq!(metrics.date, day());
    assert_eq!(metrics.occupancy_rate, dec!(33.33));
    assert_eq!(metrics.total_revenue.amount(), dec!(55000));
}

#[test]
fn test_no_rooms_means_zero_occupancy() {
    let inputs = MetricsInputs::from_records(day(), &[], &[], Money::zero(Currency::NGN));
    let metrics = DailyMetrics::compute(day(), inputs);

    assert_eq!(metrics.total_rooms, 0);
    assert!(metrics.occupancy_rate.is_zero());
    assert!(metrics.total_revenue.is_zero());
}

#[test]
fn test_rollup_is_idempotent() {
    let rooms = rooms();
    let reservations = activity(&rooms);
    let revenue = Money::new(dec!(55000), Currency::NGN);

    let first = DailyMetrics::compute(
        day(),
        MetricsInputs::from_records(day(), &rooms, &reservations, revenue),
    );
    let second = DailyMetrics::compute(
        day(),
        MetricsInputs::from_records(day(), &rooms, &reservations, revenue),
    );

    assert_eq!(first, second);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn occupancy_rate_is_bounded(occupied in 0u32..500, extra in 0u32..500) {
            let total = occupied + extra;
            let rate = domain_analytics::metrics::occupancy_rate(occupied, total);
            prop_assert!(rate >= dec!(0));
            prop_assert!(rate <= dec!(100));
            prop_assert!(rate.scale() <= 2);
        }
    }
}
