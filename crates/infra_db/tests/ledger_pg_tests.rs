//! PostgreSQL ledger tests
//!
//! These need a disposable database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/hotel_test cargo test -p infra_db -- --ignored
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Currency, Money};
use domain_billing::{
    BillingConfig, BillingError, BillingService, Folio, FolioStatus, GatewayStatus, LedgerStore,
    LedgerTx, LineItemStatus, MockPaymentGateway, PaymentMethod, PaymentOutcome,
    PaymentStatus, PostChargeCommand, RecordPaymentCommand,
};
use domain_guest::Guest;
use domain_stay::{Reservation, Room, RoomStatus};
use infra_db::{create_pool_from_url, run_migrations, DatabasePool, PgLedgerStore};

fn ngn(amount: Decimal) -> Money {
    Money::new(amount, Currency::NGN)
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2031, 1, 15, hour, 0, 0).unwrap()
}

async fn pool() -> DatabasePool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool_from_url(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

/// Inserts a guest, a reserved room and a confirmed reservation
async fn seed(pool: &DatabasePool, price: Decimal) -> (Guest, Room, Reservation) {
    let tag = Uuid::new_v4().simple().to_string();
    let guest = Guest::new("Ngozi", "Okafor", format!("{tag}@example.com"), Currency::NGN, at(8));
    let room = Room::new(format!("R-{tag}"), 2, "standard", ngn(dec!(30000)), at(8))
        .with_status(RoomStatus::Reserved);
    let reservation = Reservation::new(
        guest.id,
        room.id,
        NaiveDate::from_ymd_opt(2031, 1, 15).unwrap(),
        NaiveDate::from_ymd_opt(2031, 1, 17).unwrap(),
        1,
        ngn(price),
        at(8),
    )
    .unwrap();

    sqlx::query(
        "INSERT INTO guests (id, first_name, last_name, email, total_stays, total_spent,
                             currency, vip, created_at, updated_at)
         VALUES ($1, $2, $3, $4, 0, 0, 'NGN', false, $5, $5)",
    )
    .bind(guest.id.as_uuid())
    .bind(&guest.first_name)
    .bind(&guest.last_name)
    .bind(&guest.email)
    .bind(guest.created_at)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO rooms (id, number, floor, room_type, price_per_night, currency, status,
                            created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, 'NGN', 'reserved', $6, $6)",
    )
    .bind(room.id.as_uuid())
    .bind(&room.number)
    .bind(room.floor)
    .bind(&room.room_type)
    .bind(room.price_per_night.amount())
    .bind(room.created_at)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO reservations (id, guest_id, room_id, check_in_date, check_out_date, guests,
                                   status, total_price, currency, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, 1, 'confirmed', $6, 'NGN', $7, $7)",
    )
    .bind(reservation.id.as_uuid())
    .bind(guest.id.as_uuid())
    .bind(room.id.as_uuid())
    .bind(reservation.check_in_date)
    .bind(reservation.check_out_date)
    .bind(reservation.total_price.amount())
    .bind(reservation.created_at)
    .execute(pool)
    .await
    .unwrap();

    (guest, room, reservation)
}

fn billing(pool: &DatabasePool, gateway: &MockPaymentGateway) -> BillingService {
    BillingService::new(
        Arc::new(PgLedgerStore::new(pool.clone())),
        Arc::new(gateway.clone()),
        BillingConfig::default(),
    )
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_payment_settles_oldest_items_in_postgres() {
    let pool = pool().await;
    let (_, _, reservation) = seed(&pool, dec!(0)).await;
    let service = billing(&pool, &MockPaymentGateway::new());

    let folio = service.open_folio(reservation.id, at(9)).await.unwrap();
    for (hour, amount) in [(10, dec!(30)), (11, dec!(50)), (12, dec!(20))] {
        service
            .post_charge(PostChargeCommand {
                folio_id: folio.id,
                description: format!("Minibar {amount}"),
                unit_amount: ngn(amount),
                quantity: 1,
                occurred_at: at(hour),
            })
            .await
            .unwrap();
    }

    service
        .record_payment(RecordPaymentCommand {
            folio_id: folio.id,
            amount: ngn(dec!(70)),
            method: PaymentMethod::Cash,
            recorded_by: None,
            notes: Some("front desk".to_string()),
            occurred_at: at(13),
        })
        .await
        .unwrap();

    let statement = service.folio_statement(folio.id).await.unwrap();
    let statuses: Vec<_> = statement.line_items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![LineItemStatus::Paid, LineItemStatus::Unpaid, LineItemStatus::Unpaid]
    );
    assert_eq!(statement.folio.balance, ngn(dec!(30)));
    assert_eq!(statement.folio.status, FolioStatus::Partial);
    assert_eq!(statement.payments[0].notes.as_deref(), Some("front desk"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_gateway_confirmation_is_applied_once() {
    let pool = pool().await;
    let (guest, _, reservation) = seed(&pool, dec!(60000)).await;
    let service = billing(&pool, &MockPaymentGateway::new());
    let folio = service.open_folio(reservation.id, at(9)).await.unwrap();

    let reference = match service
        .record_payment(RecordPaymentCommand {
            folio_id: folio.id,
            amount: ngn(dec!(60000)),
            method: PaymentMethod::Gateway,
            recorded_by: None,
            notes: None,
            occurred_at: at(10),
        })
        .await
        .unwrap()
    {
        PaymentOutcome::AwaitingGateway { handoff, .. } => handoff.reference,
        other => panic!("expected handoff, got {other:?}"),
    };

    service
        .confirm_gateway_payment(&reference, GatewayStatus::Success, at(11))
        .await
        .unwrap();
    let again = service
        .confirm_gateway_payment(&reference, GatewayStatus::Success, at(12))
        .await;
    assert!(matches!(again, Err(BillingError::InconsistentState(_))));

    let statement = service.folio_statement(folio.id).await.unwrap();
    assert_eq!(statement.folio.amount_paid, ngn(dec!(60000)));
    assert_eq!(statement.folio.status, FolioStatus::Settled);
    assert_eq!(statement.payments[0].status, PaymentStatus::Completed);

    let total_spent: Decimal =
        sqlx::query_scalar("SELECT total_spent FROM guests WHERE id = $1")
            .bind(guest.id.as_uuid())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(total_spent, dec!(60000));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_uncommitted_transaction_rolls_back() {
    let pool = pool().await;
    let (_, _, reservation) = seed(&pool, dec!(1000)).await;
    let store = PgLedgerStore::new(pool.clone());

    {
        let mut tx = store.begin().await.unwrap();
        let reservation = tx.lock_reservation(reservation.id).await.unwrap();
        tx.insert_folio(&Folio::open(&reservation, at(9))).await.unwrap();
    }

    assert!(store
        .folio_for_reservation(reservation.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_metrics_upsert_is_idempotent() {
    let pool = pool().await;
    let service = billing(&pool, &MockPaymentGateway::new());
    // a date no other test rolls up
    let day = NaiveDate::from_ymd_opt(2031, 2, 1).unwrap();

    let first = service.refresh_metrics(day).await.unwrap();
    let second = service.refresh_metrics(day).await.unwrap();

    assert_eq!(first.total_revenue, second.total_revenue);
    assert!(second.total_revenue.is_zero());
    assert_eq!(service.get_metrics(day).await.unwrap(), Some(second));
}
