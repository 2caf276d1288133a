//! PostgreSQL ledger adapter
//!
//! Implements the billing ports on top of a sqlx transaction. Every `lock_*`
//! method issues `SELECT ... FOR UPDATE`, so concurrent reconciliations of the
//! same folio queue behind each other until the first one commits.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, Currency, DomainPort, FolioId, GuestId, HealthCheckResult, HealthCheckable,
    Money, PaymentId, PortError, ReservationId, RoomId,
};
use domain_analytics::{DailyMetrics, MetricsInputs};
use domain_billing::{
    Folio, FolioStatement, GatewayTransaction, LedgerStore, LedgerTx, LineItem, Payment,
};
use domain_guest::Guest;
use domain_stay::{Reservation, Room};

use crate::error::DatabaseError;

const FOLIO_COLUMNS: &str = "id, reservation_id, guest_id, status, room_charges, \
    service_charges, taxes, discount, total_amount, amount_paid, balance, currency, \
    created_at, updated_at";

const LINE_ITEM_COLUMNS: &str = "id, folio_id, description, unit_amount, quantity, total, \
    currency, status, created_at, paid_at";

const PAYMENT_COLUMNS: &str = "id, folio_id, amount, currency, method, status, reference, \
    notes, recorded_by, created_at, completed_at";

const GATEWAY_COLUMNS: &str = "id, payment_id, authorization_url, access_code, \
    gateway_reference, amount, currency, status, paid_at, created_at";

const GUEST_COLUMNS: &str = "id, first_name, last_name, email, phone, total_stays, \
    total_spent, currency, vip, created_at, updated_at";

const RESERVATION_COLUMNS: &str = "id, guest_id, room_id, check_in_date, check_out_date, \
    guests, status, total_price, currency, checked_in_at, checked_out_at, cancelled_at, \
    created_at, updated_at";

const ROOM_COLUMNS: &str = "id, number, floor, room_type, price_per_night, currency, status, \
    created_at, updated_at";

const METRICS_COLUMNS: &str = "date, total_rooms, occupied_rooms, available_rooms, \
    occupancy_rate, total_revenue, currency, guest_count, check_ins, check_outs, cancellations";

fn db(error: sqlx::Error) -> PortError {
    DatabaseError::from(error).into()
}

/// Pool-backed entry point to the ledger
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PgLedgerStore {}

#[async_trait]
impl HealthCheckable for PgLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {e}"))),
        };
        HealthCheckResult {
            adapter_id: "postgres-ledger".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, PortError> {
        let tx = self.pool.begin().await.map_err(db)?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    #[instrument(skip(self))]
    async fn folio_statement(&self, folio_id: FolioId) -> Result<FolioStatement, PortError> {
        let folio: Folio =
            sqlx::query_as::<_, FolioRow>(&format!("SELECT {FOLIO_COLUMNS} FROM folios WHERE id = $1"))
                .bind(folio_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db)?
                .ok_or_else(|| DatabaseError::not_found("Folio", folio_id))?
                .try_into()?;

        let line_items = sqlx::query_as::<_, LineItemRow>(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM folio_line_items
             WHERE folio_id = $1 ORDER BY created_at, id"
        ))
        .bind(folio_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?
        .into_iter()
        .map(LineItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let payments = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE folio_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(folio_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?
        .into_iter()
        .map(Payment::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        debug!(
            line_items = line_items.len(),
            payments = payments.len(),
            "Loaded folio statement"
        );
        Ok(FolioStatement {
            folio,
            line_items,
            payments,
        })
    }

    async fn folio_for_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Folio>, PortError> {
        let row = sqlx::query_as::<_, FolioRow>(&format!(
            "SELECT {FOLIO_COLUMNS} FROM folios WHERE reservation_id = $1"
        ))
        .bind(reservation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        Ok(row.map(Folio::try_from).transpose()?)
    }

    async fn daily_metrics(&self, date: NaiveDate) -> Result<Option<DailyMetrics>, PortError> {
        let row = sqlx::query_as::<_, DailyMetricsRow>(&format!(
            "SELECT {METRICS_COLUMNS} FROM daily_metrics WHERE date = $1"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        Ok(row.map(DailyMetrics::try_from).transpose()?)
    }

    async fn completed_payments_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Payment>, PortError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE status = 'completed'
               AND (created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        Ok(rows
            .into_iter()
            .map(Payment::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

/// One open PostgreSQL transaction
///
/// Dropping it without calling [`LedgerTx::commit`] rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    async fn fetch_locked<R>(&mut self, sql: String, id: Uuid) -> Result<Option<R>, PortError>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db)
    }

    /// Fails with NotFound when an UPDATE touched no row
    fn expect_row(affected: u64, entity: &str, id: impl std::fmt::Display) -> Result<(), PortError> {
        if affected == 0 {
            return Err(DatabaseError::not_found(entity, id).into());
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_folio(&mut self, id: FolioId) -> Result<Folio, PortError> {
        let row: Option<FolioRow> = self
            .fetch_locked(
                format!("SELECT {FOLIO_COLUMNS} FROM folios WHERE id = $1 FOR UPDATE"),
                *id.as_uuid(),
            )
            .await?;
        Ok(row
            .ok_or_else(|| DatabaseError::not_found("Folio", id))?
            .try_into()?)
    }

    async fn lock_folio_for_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<Folio>, PortError> {
        let row: Option<FolioRow> = self
            .fetch_locked(
                format!("SELECT {FOLIO_COLUMNS} FROM folios WHERE reservation_id = $1 FOR UPDATE"),
                *reservation_id.as_uuid(),
            )
            .await?;
        Ok(row.map(Folio::try_from).transpose()?)
    }

    async fn insert_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO folios (
                id, reservation_id, guest_id, status, room_charges, service_charges,
                taxes, discount, total_amount, amount_paid, balance, currency,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(folio.id.as_uuid())
        .bind(folio.reservation_id.as_uuid())
        .bind(folio.guest_id.as_uuid())
        .bind(folio.status.as_str())
        .bind(folio.room_charges.amount())
        .bind(folio.service_charges.amount())
        .bind(folio.taxes.amount())
        .bind(folio.discount.amount())
        .bind(folio.total_amount.amount())
        .bind(folio.amount_paid.amount())
        .bind(folio.balance.amount())
        .bind(folio.currency.code())
        .bind(folio.created_at)
        .bind(folio.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn update_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE folios SET
                status = $2, room_charges = $3, service_charges = $4, taxes = $5,
                discount = $6, total_amount = $7, amount_paid = $8, balance = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(folio.id.as_uuid())
        .bind(folio.status.as_str())
        .bind(folio.room_charges.amount())
        .bind(folio.service_charges.amount())
        .bind(folio.taxes.amount())
        .bind(folio.discount.amount())
        .bind(folio.total_amount.amount())
        .bind(folio.amount_paid.amount())
        .bind(folio.balance.amount())
        .bind(folio.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Self::expect_row(result.rows_affected(), "Folio", folio.id)
    }

    async fn line_items(&mut self, folio_id: FolioId) -> Result<Vec<LineItem>, PortError> {
        let rows = sqlx::query_as::<_, LineItemRow>(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM folio_line_items
             WHERE folio_id = $1 ORDER BY created_at, id"
        ))
        .bind(folio_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db)?;

        Ok(rows
            .into_iter()
            .map(LineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn insert_line_item(&mut self, item: &LineItem) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO folio_line_items (
                id, folio_id, description, unit_amount, quantity, total, currency,
                status, created_at, paid_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.folio_id.as_uuid())
        .bind(&item.description)
        .bind(item.unit_amount.amount())
        .bind(to_int(item.quantity)?)
        .bind(item.total.amount())
        .bind(item.total.currency().code())
        .bind(item.status.as_str())
        .bind(item.created_at)
        .bind(item.paid_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn mark_line_items_paid(&mut self, items: &[LineItem]) -> Result<(), PortError> {
        for item in items {
            let result = sqlx::query(
                "UPDATE folio_line_items SET status = $2, paid_at = $3 WHERE id = $1",
            )
            .bind(item.id.as_uuid())
            .bind(item.status.as_str())
            .bind(item.paid_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db)?;
            Self::expect_row(result.rows_affected(), "LineItem", item.id)?;
        }
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, folio_id, amount, currency, method, status, reference, notes,
                recorded_by, created_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.folio_id.as_uuid())
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(payment.recorded_by.map(Uuid::from))
        .bind(payment.created_at)
        .bind(payment.completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE payments SET status = $2, notes = $3, completed_at = $4 WHERE id = $1",
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(&payment.notes)
        .bind(payment.completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Self::expect_row(result.rows_affected(), "Payment", payment.id)
    }

    async fn lock_payment(&mut self, id: PaymentId) -> Result<Payment, PortError> {
        let row: Option<PaymentRow> = self
            .fetch_locked(
                format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE"),
                *id.as_uuid(),
            )
            .await?;
        Ok(row
            .ok_or_else(|| DatabaseError::not_found("Payment", id))?
            .try_into()?)
    }

    async fn lock_payment_by_reference(&mut self, reference: &str) -> Result<Payment, PortError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = $1 FOR UPDATE"
        ))
        .bind(reference)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db)?;

        Ok(row
            .ok_or_else(|| DatabaseError::not_found("Payment", reference))?
            .try_into()?)
    }

    async fn insert_gateway_transaction(
        &mut self,
        txn: &GatewayTransaction,
    ) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO gateway_transactions (
                id, payment_id, authorization_url, access_code, gateway_reference,
                amount, currency, status, paid_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(txn.id.as_uuid())
        .bind(txn.payment_id.as_uuid())
        .bind(&txn.authorization_url)
        .bind(&txn.access_code)
        .bind(&txn.gateway_reference)
        .bind(txn.amount.amount())
        .bind(txn.amount.currency().code())
        .bind(txn.status.as_str())
        .bind(txn.paid_at)
        .bind(txn.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn lock_gateway_transaction(
        &mut self,
        gateway_reference: &str,
    ) -> Result<Option<GatewayTransaction>, PortError> {
        let row = sqlx::query_as::<_, GatewayTransactionRow>(&format!(
            "SELECT {GATEWAY_COLUMNS} FROM gateway_transactions
             WHERE gateway_reference = $1 FOR UPDATE"
        ))
        .bind(gateway_reference)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db)?;

        Ok(row.map(GatewayTransaction::try_from).transpose()?)
    }

    async fn update_gateway_transaction(
        &mut self,
        txn: &GatewayTransaction,
    ) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE gateway_transactions SET status = $2, paid_at = $3 WHERE id = $1",
        )
        .bind(txn.id.as_uuid())
        .bind(txn.status.as_str())
        .bind(txn.paid_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Self::expect_row(result.rows_affected(), "GatewayTransaction", txn.id)
    }

    async fn lock_guest(&mut self, id: GuestId) -> Result<Guest, PortError> {
        let row: Option<GuestRow> = self
            .fetch_locked(
                format!("SELECT {GUEST_COLUMNS} FROM guests WHERE id = $1 FOR UPDATE"),
                *id.as_uuid(),
            )
            .await?;
        Ok(row
            .ok_or_else(|| DatabaseError::not_found("Guest", id))?
            .try_into()?)
    }

    async fn update_guest(&mut self, guest: &Guest) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE guests SET
                first_name = $2, last_name = $3, email = $4, phone = $5,
                total_stays = $6, total_spent = $7, vip = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(guest.id.as_uuid())
        .bind(&guest.first_name)
        .bind(&guest.last_name)
        .bind(&guest.email)
        .bind(&guest.phone)
        .bind(to_int(guest.total_stays)?)
        .bind(guest.total_spent.amount())
        .bind(guest.vip)
        .bind(guest.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Self::expect_row(result.rows_affected(), "Guest", guest.id)
    }

    async fn lock_reservation(&mut self, id: ReservationId) -> Result<Reservation, PortError> {
        let row: Option<ReservationRow> = self
            .fetch_locked(
                format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE"),
                *id.as_uuid(),
            )
            .await?;
        Ok(row
            .ok_or_else(|| DatabaseError::not_found("Reservation", id))?
            .try_into()?)
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET
                status = $2, checked_in_at = $3, checked_out_at = $4, cancelled_at = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.status.as_str())
        .bind(reservation.checked_in_at)
        .bind(reservation.checked_out_at)
        .bind(reservation.cancelled_at)
        .bind(reservation.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Self::expect_row(result.rows_affected(), "Reservation", reservation.id)
    }

    async fn lock_room(&mut self, id: RoomId) -> Result<Room, PortError> {
        let row: Option<RoomRow> = self
            .fetch_locked(
                format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE"),
                *id.as_uuid(),
            )
            .await?;
        Ok(row
            .ok_or_else(|| DatabaseError::not_found("Room", id))?
            .try_into()?)
    }

    async fn update_room(&mut self, room: &Room) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE rooms SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(room.id.as_uuid())
            .bind(room.status.as_str())
            .bind(room.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db)?;
        Self::expect_row(result.rows_affected(), "Room", room.id)
    }

    #[instrument(skip(self))]
    async fn metrics_inputs(
        &mut self,
        date: NaiveDate,
        currency: Currency,
    ) -> Result<MetricsInputs, PortError> {
        let rooms = sqlx::query_as::<_, RoomCountsRow>(
            r#"
            SELECT
                count(*) AS total,
                count(*) FILTER (WHERE status = 'occupied') AS occupied,
                count(*) FILTER (WHERE status = 'available') AS available
            FROM rooms
            "#,
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db)?;

        let stays = sqlx::query_as::<_, StayCountsRow>(
            r#"
            SELECT
                count(*) FILTER (
                    WHERE (checked_in_at AT TIME ZONE 'UTC')::date = $1) AS check_ins,
                count(*) FILTER (
                    WHERE (checked_out_at AT TIME ZONE 'UTC')::date = $1) AS check_outs,
                count(*) FILTER (
                    WHERE status = 'cancelled'
                      AND (cancelled_at AT TIME ZONE 'UTC')::date = $1) AS cancellations,
                count(*) FILTER (
                    WHERE status = 'checked_in'
                      AND (checked_in_at AT TIME ZONE 'UTC')::date <= $1) AS guest_count
            FROM reservations
            "#,
        )
        .bind(date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db)?;

        let revenue: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM payments
            WHERE status = 'completed'
              AND currency = $2
              AND (created_at AT TIME ZONE 'UTC')::date = $1
            "#,
        )
        .bind(date)
        .bind(currency.code())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db)?;

        Ok(MetricsInputs {
            total_rooms: from_count(rooms.total)?,
            occupied_rooms: from_count(rooms.occupied)?,
            available_rooms: from_count(rooms.available)?,
            revenue: Money::new(revenue, currency),
            check_ins: from_count(stays.check_ins)?,
            check_outs: from_count(stays.check_outs)?,
            cancellations: from_count(stays.cancellations)?,
            guest_count: from_count(stays.guest_count)?,
        })
    }

    async fn upsert_daily_metrics(&mut self, metrics: &DailyMetrics) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO daily_metrics (
                date, total_rooms, occupied_rooms, available_rooms, occupancy_rate,
                total_revenue, currency, guest_count, check_ins, check_outs, cancellations,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
            ON CONFLICT (date) DO UPDATE SET
                total_rooms = EXCLUDED.total_rooms,
                occupied_rooms = EXCLUDED.occupied_rooms,
                available_rooms = EXCLUDED.available_rooms,
                occupancy_rate = EXCLUDED.occupancy_rate,
                total_revenue = EXCLUDED.total_revenue,
                currency = EXCLUDED.currency,
                guest_count = EXCLUDED.guest_count,
                check_ins = EXCLUDED.check_ins,
                check_outs = EXCLUDED.check_outs,
                cancellations = EXCLUDED.cancellations,
                updated_at = now()
            "#,
        )
        .bind(metrics.date)
        .bind(to_int(metrics.total_rooms)?)
        .bind(to_int(metrics.occupied_rooms)?)
        .bind(to_int(metrics.available_rooms)?)
        .bind(metrics.occupancy_rate)
        .bind(metrics.total_revenue.amount())
        .bind(metrics.total_revenue.currency().code())
        .bind(to_int(metrics.guest_count)?)
        .bind(to_int(metrics.check_ins)?)
        .bind(to_int(metrics.check_outs)?)
        .bind(to_int(metrics.cancellations)?)
        .execute(&mut *self.tx)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(db)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct FolioRow {
    id: Uuid,
    reservation_id: Uuid,
    guest_id: Uuid,
    status: String,
    room_charges: Decimal,
    service_charges: Decimal,
    taxes: Decimal,
    discount: Decimal,
    total_amount: Decimal,
    amount_paid: Decimal,
    balance: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LineItemRow {
    id: Uuid,
    folio_id: Uuid,
    description: String,
    unit_amount: Decimal,
    quantity: i32,
    total: Decimal,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    folio_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    status: String,
    reference: String,
    notes: Option<String>,
    recorded_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct GatewayTransactionRow {
    id: Uuid,
    payment_id: Uuid,
    authorization_url: String,
    access_code: String,
    gateway_reference: String,
    amount: Decimal,
    currency: String,
    status: String,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct GuestRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    total_stays: i32,
    total_spent: Decimal,
    currency: String,
    vip: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    guest_id: Uuid,
    room_id: Uuid,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    guests: i32,
    status: String,
    total_price: Decimal,
    currency: String,
    checked_in_at: Option<DateTime<Utc>>,
    checked_out_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    number: String,
    floor: i32,
    room_type: String,
    price_per_night: Decimal,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct DailyMetricsRow {
    date: NaiveDate,
    total_rooms: i32,
    occupied_rooms: i32,
    available_rooms: i32,
    occupancy_rate: Decimal,
    total_revenue: Decimal,
    currency: String,
    guest_count: i32,
    check_ins: i32,
    check_outs: i32,
    cancellations: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct RoomCountsRow {
    total: i64,
    occupied: i64,
    available: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct StayCountsRow {
    check_ins: i64,
    check_outs: i64,
    cancellations: i64,
    guest_count: i64,
}

// ============================================================================
// Row conversion
// ============================================================================

fn currency(code: &str) -> Result<Currency, DatabaseError> {
    code.parse()
        .map_err(|e: core_kernel::MoneyError| DatabaseError::SerializationError(e.to_string()))
}

fn parse<T>(value: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| DatabaseError::SerializationError(e.to_string()))
}

fn to_u32(value: i32, column: &str) -> Result<u32, DatabaseError> {
    u32::try_from(value).map_err(|_| {
        DatabaseError::SerializationError(format!("{column} must not be negative, got {value}"))
    })
}

fn from_count(value: i64) -> Result<u32, PortError> {
    u32::try_from(value).map_err(|_| PortError::transformation(format!("count {value} out of range")))
}

fn to_int(value: u32) -> Result<i32, PortError> {
    i32::try_from(value).map_err(|_| PortError::validation(format!("{value} exceeds INTEGER range")))
}

impl TryFrom<FolioRow> for Folio {
    type Error = DatabaseError;

    fn try_from(row: FolioRow) -> Result<Self, Self::Error> {
        let currency = currency(&row.currency)?;
        let money = |amount| Money::new(amount, currency);

        Ok(Folio {
            id: FolioId::from(row.id),
            reservation_id: ReservationId::from(row.reservation_id),
            guest_id: GuestId::from(row.guest_id),
            status: parse(&row.status)?,
            room_charges: money(row.room_charges),
            service_charges: money(row.service_charges),
            taxes: money(row.taxes),
            discount: money(row.discount),
            total_amount: money(row.total_amount),
            amount_paid: money(row.amount_paid),
            balance: money(row.balance),
            currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = DatabaseError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        let currency = currency(&row.currency)?;
        Ok(LineItem {
            id: row.id.into(),
            folio_id: row.folio_id.into(),
            description: row.description,
            unit_amount: Money::new(row.unit_amount, currency),
            quantity: to_u32(row.quantity, "quantity")?,
            total: Money::new(row.total, currency),
            status: parse(&row.status)?,
            created_at: row.created_at,
            paid_at: row.paid_at,
        })
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id.into(),
            folio_id: row.folio_id.into(),
            amount: Money::new(row.amount, currency(&row.currency)?),
            method: parse(&row.method)?,
            status: parse(&row.status)?,
            reference: row.reference,
            notes: row.notes,
            recorded_by: row.recorded_by.map(Into::into),
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

impl TryFrom<GatewayTransactionRow> for GatewayTransaction {
    type Error = DatabaseError;

    fn try_from(row: GatewayTransactionRow) -> Result<Self, Self::Error> {
        Ok(GatewayTransaction {
            id: row.id.into(),
            payment_id: row.payment_id.into(),
            authorization_url: row.authorization_url,
            access_code: row.access_code,
            gateway_reference: row.gateway_reference,
            amount: Money::new(row.amount, currency(&row.currency)?),
            status: parse(&row.status)?,
            paid_at: row.paid_at,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<GuestRow> for Guest {
    type Error = DatabaseError;

    fn try_from(row: GuestRow) -> Result<Self, Self::Error> {
        Ok(Guest {
            id: row.id.into(),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            total_stays: to_u32(row.total_stays, "total_stays")?,
            total_spent: Money::new(row.total_spent, currency(&row.currency)?),
            vip: row.vip,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = DatabaseError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id.into(),
            guest_id: row.guest_id.into(),
            room_id: row.room_id.into(),
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
            guests: to_u32(row.guests, "guests")?,
            status: parse(&row.status)?,
            total_price: Money::new(row.total_price, currency(&row.currency)?),
            checked_in_at: row.checked_in_at,
            checked_out_at: row.checked_out_at,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<RoomRow> for Room {
    type Error = DatabaseError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Room {
            id: row.id.into(),
            number: row.number,
            floor: row.floor,
            room_type: row.room_type,
            price_per_night: Money::new(row.price_per_night, currency(&row.currency)?),
            status: parse(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DailyMetricsRow> for DailyMetrics {
    type Error = DatabaseError;

    fn try_from(row: DailyMetricsRow) -> Result<Self, Self::Error> {
        Ok(DailyMetrics {
            date: row.date,
            total_rooms: to_u32(row.total_rooms, "total_rooms")?,
            occupied_rooms: to_u32(row.occupied_rooms, "occupied_rooms")?,
            available_rooms: to_u32(row.available_rooms, "available_rooms")?,
            occupancy_rate: row.occupancy_rate,
            total_revenue: Money::new(row.total_revenue, currency(&row.currency)?),
            guest_count: to_u32(row.guest_count, "guest_count")?,
            check_ins: to_u32(row.check_ins, "check_ins")?,
            check_outs: to_u32(row.check_outs, "check_outs")?,
            cancellations: to_u32(row.cancellations, "cancellations")?,
        })
    }
}
