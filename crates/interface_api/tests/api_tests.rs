//! HTTP API tests against the in-memory ledger

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{Currency, Money};
use domain_billing::{GatewayStatus, MockLedgerStore, MockPaymentGateway, PaymentStatus};
use domain_guest::Guest;
use domain_stay::{Reservation, ReservationStatus, Room, RoomStatus};
use interface_api::auth::{create_token, Role};
use interface_api::config::ApiConfig;
use interface_api::dto::folio::{ChargeResponse, FolioResponse, StatementResponse};
use interface_api::dto::metrics::{MetricsResponse, ReportResponse};
use interface_api::dto::payment::{OutcomeKind, PaymentOutcomeResponse};
use interface_api::dto::stay::StayResponse;
use interface_api::error::ErrorResponse;
use interface_api::{create_router, AppState};

const SECRET: &str = "api-test-secret";

struct TestApp {
    server: TestServer,
    store: MockLedgerStore,
    gateway: MockPaymentGateway,
    reservation: Reservation,
}

fn bearer(role: Role) -> HeaderValue {
    let token = create_token("front-office", &[role], SECRET, 600).unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

async fn app() -> TestApp {
    let store = MockLedgerStore::new();
    let gateway = MockPaymentGateway::new();
    let now = Utc::now();

    let guest = Guest::new("Tunde", "Bello", "tunde@example.com", Currency::NGN, now);
    let room = Room::new("207", 2, "standard", Money::new(dec!(25000), Currency::NGN), now)
        .with_status(RoomStatus::Reserved);
    let reservation = Reservation::new(
        guest.id,
        room.id,
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        1,
        Money::new(dec!(50000), Currency::NGN),
        now,
    )
    .unwrap();
    store.seed_guest(guest).await;
    store.seed_room(room).await;
    store.seed_reservation(reservation.clone()).await;

    let config = ApiConfig {
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };
    let state = AppState::new(Arc::new(store.clone()), Arc::new(gateway.clone()), config).unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    TestApp {
        server,
        store,
        gateway,
        reservation,
    }
}

impl TestApp {
    async fn open_folio(&self) -> FolioResponse {
        let response = self
            .server
            .post(&format!("/api/v1/reservations/{}/folio", self.reservation.id.as_uuid()))
            .add_header(AUTHORIZATION, bearer(Role::Receptionist))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        response.json()
    }

    async fn pay(&self, folio: &FolioResponse, amount: &str, method: &str) -> axum_test::TestResponse {
        self.server
            .post(&format!("/api/v1/folios/{}/payments", folio.id))
            .add_header(AUTHORIZATION, bearer(Role::Accounting))
            .json(&json!({ "amount": amount, "method": method }))
            .await
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app().await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let ready = app.server.get("/health/ready").await;
    assert_eq!(ready.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = app().await;

    let response = app
        .server
        .get(&format!("/api/v1/reservations/{}/folio", app.reservation.id.as_uuid()))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let forged = app
        .server
        .get(&format!("/api/v1/reservations/{}/folio", app.reservation.id.as_uuid()))
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"))
        .await;
    assert_eq!(forged.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_receptionist_cannot_record_payment() {
    let app = app().await;
    let folio = app.open_folio().await;

    let response = app
        .server
        .post(&format!("/api/v1/folios/{}/payments", folio.id))
        .add_header(AUTHORIZATION, bearer(Role::Receptionist))
        .json(&json!({ "amount": "1000", "method": "cash" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.payment_count().await, 0);
}

#[tokio::test]
async fn test_open_folio_twice_returns_same_folio() {
    let app = app().await;

    let first = app.open_folio().await;
    let second = app.open_folio().await;

    assert_eq!(first.id, second.id);
    assert_eq!(first.balance, dec!(50000));
}

#[tokio::test]
async fn test_charge_then_cash_payment_settles_oldest_first() {
    let app = app().await;
    let folio = app.open_folio().await;

    let charge = app
        .server
        .post(&format!("/api/v1/folios/{}/charges", folio.id))
        .add_header(AUTHORIZATION, bearer(Role::Accounting))
        .json(&json!({ "description": "Airport pickup", "unit_amount": "7500", "quantity": 2 }))
        .await;
    assert_eq!(charge.status_code(), StatusCode::CREATED);
    let charge: ChargeResponse = charge.json();
    assert_eq!(charge.line_item.total, dec!(15000));
    assert_eq!(charge.folio.balance, dec!(65000));

    let response = app.pay(&folio, "20000", "cash").await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let outcome: PaymentOutcomeResponse = response.json();
    assert!(matches!(outcome.outcome, OutcomeKind::Completed));
    assert_eq!(outcome.settled_line_items, vec![charge.line_item.id]);
    let after = outcome.folio.unwrap();
    assert_eq!(after.balance, dec!(45000));

    let statement: StatementResponse = app
        .server
        .get(&format!("/api/v1/folios/{}", folio.id))
        .add_header(AUTHORIZATION, bearer(Role::Receptionist))
        .await
        .json();
    assert_eq!(statement.payments.len(), 1);
    assert_eq!(statement.line_items.len(), 1);
    assert_eq!(statement.folio.amount_paid, dec!(20000));
}

#[tokio::test]
async fn test_invalid_charge_is_unprocessable() {
    let app = app().await;
    let folio = app.open_folio().await;

    let response = app
        .server
        .post(&format!("/api/v1/folios/{}/charges", folio.id))
        .add_header(AUTHORIZATION, bearer(Role::Manager))
        .json(&json!({ "description": "", "unit_amount": "-1", "quantity": 0 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "validation_error");
}

#[tokio::test]
async fn test_unknown_folio_is_not_found() {
    let app = app().await;

    let response = app
        .server
        .get(&format!("/api/v1/folios/{}", uuid::Uuid::new_v4()))
        .add_header(AUTHORIZATION, bearer(Role::Admin))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gateway_payment_confirmed_once() {
    let app = app().await;
    let folio = app.open_folio().await;

    let response = app.pay(&folio, "50000", "gateway").await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let pending: PaymentOutcomeResponse = response.json();
    assert!(matches!(pending.outcome, OutcomeKind::AwaitingGateway));
    assert!(pending.authorization_url.is_some());
    let reference = pending.payment.reference.clone();

    let confirm = || {
        app.server
            .post("/api/v1/payments/gateway/confirm")
            .add_header(AUTHORIZATION, bearer(Role::Accounting))
            .json(&json!({ "reference": reference, "status": "success" }))
    };

    let first = confirm().await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let confirmed: PaymentOutcomeResponse = first.json();
    assert_eq!(confirmed.payment.status, PaymentStatus::Completed);
    assert!(confirmed.folio.unwrap().balance.is_zero());

    let second = confirm().await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);

    let payment = app.store.payment_by_reference(&reference).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_public_callback_asks_the_gateway() {
    let app = app().await;
    let folio = app.open_folio().await;

    let pending: PaymentOutcomeResponse = app.pay(&folio, "50000", "gateway").await.json();
    let reference = pending.payment.reference;

    // the gateway still reports pending: nothing is credited
    let early = app
        .server
        .get("/payments/gateway/callback")
        .add_query_param("reference", &reference)
        .await;
    assert_eq!(early.status_code(), StatusCode::OK);
    let early: PaymentOutcomeResponse = early.json();
    assert!(matches!(early.outcome, OutcomeKind::Pending));

    app.gateway.set_status(&reference, GatewayStatus::Success).await;
    let paid: PaymentOutcomeResponse = app
        .server
        .get("/payments/gateway/callback")
        .add_query_param("trxref", &reference)
        .await
        .json();
    assert!(matches!(paid.outcome, OutcomeKind::Completed));
    assert_eq!(paid.folio.unwrap().amount_paid, dec!(50000));
}

#[tokio::test]
async fn test_callback_without_reference_is_bad_request() {
    let app = app().await;

    let response = app.server.get("/payments/gateway/callback").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_in_requires_payment() {
    let app = app().await;
    let folio = app.open_folio().await;
    let check_in = || {
        app.server
            .post(&format!("/api/v1/reservations/{}/check-in", app.reservation.id.as_uuid()))
            .add_header(AUTHORIZATION, bearer(Role::Receptionist))
    };

    let refused = check_in().await;
    assert_eq!(refused.status_code(), StatusCode::CONFLICT);

    app.pay(&folio, "10000", "card").await;

    let admitted = check_in().await;
    assert_eq!(admitted.status_code(), StatusCode::OK);
    let stay: StayResponse = admitted.json();
    assert_eq!(stay.reservation_status, ReservationStatus::CheckedIn);
    assert_eq!(stay.room_status, RoomStatus::Occupied);
}

#[tokio::test]
async fn test_metrics_refresh_and_fetch() {
    let app = app().await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

    let missing = app
        .server
        .get(&format!("/api/v1/metrics/{date}"))
        .add_header(AUTHORIZATION, bearer(Role::Accounting))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let refreshed = app
        .server
        .post(&format!("/api/v1/metrics/{date}/refresh"))
        .add_header(AUTHORIZATION, bearer(Role::Accounting))
        .await;
    assert_eq!(refreshed.status_code(), StatusCode::OK);

    let stored: MetricsResponse = app
        .server
        .get(&format!("/api/v1/metrics/{date}"))
        .add_header(AUTHORIZATION, bearer(Role::Accounting))
        .await
        .json();
    assert_eq!(stored.date, date);
    assert_eq!(stored.total_rooms, 1);
    assert!(stored.total_revenue.is_zero());
}

#[tokio::test]
async fn test_accounting_report_totals_todays_payments() {
    let app = app().await;
    let folio = app.open_folio().await;
    app.pay(&folio, "12000", "cash").await;
    app.pay(&folio, "8000", "bank_transfer").await;
    let today = Utc::now().date_naive();

    let response = app
        .server
        .get("/api/v1/reports/accounting")
        .add_query_param("start", today)
        .add_query_param("end", today)
        .add_header(AUTHORIZATION, bearer(Role::Accounting))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let report: ReportResponse = response.json();
    assert_eq!(report.total_revenue, dec!(20000));
    assert_eq!(report.payments.len(), 2);
}

#[tokio::test]
async fn test_receptionist_cannot_read_reports() {
    let app = app().await;

    let response = app
        .server
        .get("/api/v1/reports/accounting")
        .add_query_param("start", "2024-05-01")
        .add_query_param("end", "2024-05-31")
        .add_header(AUTHORIZATION, bearer(Role::Receptionist))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
