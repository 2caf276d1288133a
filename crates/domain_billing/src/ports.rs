//! Billing ports
//!
//! [`LedgerStore`] hands out [`LedgerTx`] units of work. Every reconciliation
//! runs inside one transaction: `lock_*` methods take row locks (`SELECT ...
//! FOR UPDATE` in PostgreSQL) so two payments against the same folio are
//! serialized, and nothing becomes visible until [`LedgerTx::commit`].
//! Dropping a transaction without committing discards its writes.
//!
//! [`PaymentGateway`] is the external card processor. Gateway calls are never
//! made while a ledger transaction is open.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, DomainPort, FolioId, PaymentId, PortError, ReservationId, RoomId, GuestId};
use domain_analytics::{DailyMetrics, MetricsInputs};
use domain_guest::Guest;
use domain_stay::{Reservation, Room};

use crate::folio::{Folio, LineItem};
use crate::payment::{
    GatewayInit, GatewayInitRequest, GatewayTransaction, GatewayVerification, Payment,
};

/// A folio with everything posted against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolioStatement {
    pub folio: Folio,
    /// Oldest first
    pub line_items: Vec<LineItem>,
    /// Newest first
    pub payments: Vec<Payment>,
}

/// Entry point to the ledger
#[async_trait]
pub trait LedgerStore: DomainPort {
    /// Starts a unit of work
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, PortError>;

    /// Reads a folio with its line items and payments
    async fn folio_statement(&self, folio_id: FolioId) -> Result<FolioStatement, PortError>;

    /// Reads the folio of a reservation, if one was opened
    async fn folio_for_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Folio>, PortError>;

    /// Reads the stored rollup for a date
    async fn daily_metrics(&self, date: NaiveDate) -> Result<Option<DailyMetrics>, PortError>;

    /// Completed payments created within `[start, end]` (inclusive dates),
    /// newest first
    async fn completed_payments_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Payment>, PortError>;
}

/// One ledger transaction
#[async_trait]
pub trait LedgerTx: Send {
    async fn lock_folio(&mut self, id: FolioId) -> Result<Folio, PortError>;
    async fn lock_folio_for_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<Folio>, PortError>;
    async fn insert_folio(&mut self, folio: &Folio) -> Result<(), PortError>;
    async fn update_folio(&mut self, folio: &Folio) -> Result<(), PortError>;

    /// All line items of a folio, oldest first
    async fn line_items(&mut self, folio_id: FolioId) -> Result<Vec<LineItem>, PortError>;
    async fn insert_line_item(&mut self, item: &LineItem) -> Result<(), PortError>;
    /// Persists the paid status of the given items
    async fn mark_line_items_paid(&mut self, items: &[LineItem]) -> Result<(), PortError>;

    /// Fails with `PortError::Conflict` on a duplicate reference
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError>;
    async fn update_payment(&mut self, payment: &Payment) -> Result<(), PortError>;
    async fn lock_payment(&mut self, id: PaymentId) -> Result<Payment, PortError>;
    async fn lock_payment_by_reference(&mut self, reference: &str) -> Result<Payment, PortError>;

    async fn insert_gateway_transaction(&mut self, txn: &GatewayTransaction)
        -> Result<(), PortError>;
    async fn lock_gateway_transaction(
        &mut self,
        gateway_reference: &str,
    ) -> Result<Option<GatewayTransaction>, PortError>;
    async fn update_gateway_transaction(&mut self, txn: &GatewayTransaction)
        -> Result<(), PortError>;

    async fn lock_guest(&mut self, id: GuestId) -> Result<Guest, PortError>;
    async fn update_guest(&mut self, guest: &Guest) -> Result<(), PortError>;

    async fn lock_reservation(&mut self, id: ReservationId) -> Result<Reservation, PortError>;
    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), PortError>;

    async fn lock_room(&mut self, id: RoomId) -> Result<Room, PortError>;
    async fn update_room(&mut self, room: &Room) -> Result<(), PortError>;

    /// Gathers the rollup inputs for a date as seen by this transaction
    async fn metrics_inputs(
        &mut self,
        date: NaiveDate,
        currency: Currency,
    ) -> Result<MetricsInputs, PortError>;
    /// Creates or replaces the row for `metrics.date`
    async fn upsert_daily_metrics(&mut self, metrics: &DailyMetrics) -> Result<(), PortError>;

    /// Makes every write of this transaction visible
    async fn commit(self: Box<Self>) -> Result<(), PortError>;
}

/// External payment processor
#[async_trait]
pub trait PaymentGateway: DomainPort {
    /// Registers a transaction and returns where to send the guest
    async fn initialize(&self, request: &GatewayInitRequest) -> Result<GatewayInit, PortError>;

    /// Asks the processor for the outcome of a transaction
    async fn verify(&self, reference: &str) -> Result<GatewayVerification, PortError>;
}

/// In-memory adapters for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

    use core_kernel::{
        AdapterHealth, GatewayTransactionId, HealthCheckResult, HealthCheckable, LineItemId, Money,
    };

    use crate::folio::sort_for_settlement;
    use crate::payment::{GatewayStatus, PaymentStatus};

    #[derive(Debug, Clone, Default)]
    struct LedgerState {
        folios: HashMap<FolioId, Folio>,
        line_items: HashMap<LineItemId, LineItem>,
        payments: HashMap<PaymentId, Payment>,
        gateway_transactions: HashMap<GatewayTransactionId, GatewayTransaction>,
        guests: HashMap<GuestId, Guest>,
        reservations: HashMap<ReservationId, Reservation>,
        rooms: HashMap<RoomId, Room>,
        metrics: BTreeMap<NaiveDate, DailyMetrics>,
    }

    impl LedgerState {
        fn items_of(&self, folio_id: FolioId) -> Vec<LineItem> {
            let mut items: Vec<_> = self
                .line_items
                .values()
                .filter(|i| i.folio_id == folio_id)
                .cloned()
                .collect();
            sort_for_settlement(&mut items);
            items
        }
    }

    /// In-memory ledger
    ///
    /// Transactions hold the store's mutex for their whole lifetime and work
    /// on a copy of the state, so they are fully serialized and a dropped
    /// transaction leaves no trace.
    #[derive(Debug, Clone, Default)]
    pub struct MockLedgerStore {
        state: Arc<Mutex<LedgerState>>,
        fail_next_commit: Arc<AtomicBool>,
    }

    impl MockLedgerStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn seed_guest(&self, guest: Guest) {
            self.state.lock().await.guests.insert(guest.id, guest);
        }

        pub async fn seed_room(&self, room: Room) {
            self.state.lock().await.rooms.insert(room.id, room);
        }

        pub async fn seed_reservation(&self, reservation: Reservation) {
            self.state
                .lock()
                .await
                .reservations
                .insert(reservation.id, reservation);
        }

        pub async fn guest(&self, id: GuestId) -> Option<Guest> {
            self.state.lock().await.guests.get(&id).cloned()
        }

        pub async fn room(&self, id: RoomId) -> Option<Room> {
            self.state.lock().await.rooms.get(&id).cloned()
        }

        pub async fn reservation(&self, id: ReservationId) -> Option<Reservation> {
            self.state.lock().await.reservations.get(&id).cloned()
        }

        pub async fn payment_by_reference(&self, reference: &str) -> Option<Payment> {
            self.state
                .lock()
                .await
                .payments
                .values()
                .find(|p| p.reference == reference)
                .cloned()
        }

        pub async fn gateway_transaction_for(&self, payment_id: PaymentId) -> Option<GatewayTransaction> {
            self.state
                .lock()
                .await
                .gateway_transactions
                .values()
                .find(|t| t.payment_id == payment_id)
                .cloned()
        }

        pub async fn payment_count(&self) -> usize {
            self.state.lock().await.payments.len()
        }

        /// Makes the next commit fail after all writes were staged
        pub fn fail_next_commit(&self) {
            self.fail_next_commit.store(true, Ordering::SeqCst);
        }
    }

    impl DomainPort for MockLedgerStore {}

    #[async_trait]
    impl HealthCheckable for MockLedgerStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-ledger".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: None,
                checked_at: chrono::Utc::now(),
            }
        }
    }

    #[async_trait]
    impl LedgerStore for MockLedgerStore {
        async fn begin(&self) -> Result<Box<dyn LedgerTx>, PortError> {
            let guard = self.state.clone().lock_owned().await;
            let work = guard.clone();
            Ok(Box::new(MockLedgerTx {
                guard,
                work,
                fail_commit: self.fail_next_commit.clone(),
            }))
        }

        async fn folio_statement(&self, folio_id: FolioId) -> Result<FolioStatement, PortError> {
            let state = self.state.lock().await;
            let folio = state
                .folios
                .get(&folio_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Folio", folio_id))?;
            let mut payments: Vec<_> = state
                .payments
                .values()
                .filter(|p| p.folio_id == folio_id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

            Ok(FolioStatement {
                line_items: state.items_of(folio_id),
                folio,
                payments,
            })
        }

        async fn folio_for_reservation(
            &self,
            reservation_id: ReservationId,
        ) -> Result<Option<Folio>, PortError> {
            let state = self.state.lock().await;
            Ok(state
                .folios
                .values()
                .find(|f| f.reservation_id == reservation_id)
                .cloned())
        }

        async fn daily_metrics(&self, date: NaiveDate) -> Result<Option<DailyMetrics>, PortError> {
            Ok(self.state.lock().await.metrics.get(&date).cloned())
        }

        async fn completed_payments_between(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<Payment>, PortError> {
            let state = self.state.lock().await;
            let mut payments: Vec<_> = state
                .payments
                .values()
                .filter(|p| p.status == PaymentStatus::Completed)
                .filter(|p| {
                    let day = p.created_at.date_naive();
                    day >= start && day <= end
                })
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(payments)
        }
    }

    /// Transaction over [`MockLedgerStore`]
    pub struct MockLedgerTx {
        guard: OwnedMutexGuard<LedgerState>,
        work: LedgerState,
        fail_commit: Arc<AtomicBool>,
    }

    #[async_trait]
    impl LedgerTx for MockLedgerTx {
        async fn lock_folio(&mut self, id: FolioId) -> Result<Folio, PortError> {
            self.work
                .folios
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Folio", id))
        }

        async fn lock_folio_for_reservation(
            &mut self,
            reservation_id: ReservationId,
        ) -> Result<Option<Folio>, PortError> {
            Ok(self
                .work
                .folios
                .values()
                .find(|f| f.reservation_id == reservation_id)
                .cloned())
        }

        async fn insert_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
            if self
                .work
                .folios
                .values()
                .any(|f| f.reservation_id == folio.reservation_id)
            {
                return Err(PortError::conflict(format!(
                    "reservation {} already has a folio",
                    folio.reservation_id
                )));
            }
            self.work.folios.insert(folio.id, folio.clone());
            Ok(())
        }

        async fn update_folio(&mut self, folio: &Folio) -> Result<(), PortError> {
            let slot = self
                .work
                .folios
                .get_mut(&folio.id)
                .ok_or_else(|| PortError::not_found("Folio", folio.id))?;
            *slot = folio.clone();
            Ok(())
        }

        async fn line_items(&mut self, folio_id: FolioId) -> Result<Vec<LineItem>, PortError> {
            Ok(self.work.items_of(folio_id))
        }

        async fn insert_line_item(&mut self, item: &LineItem) -> Result<(), PortError> {
            if !self.work.folios.contains_key(&item.folio_id) {
                return Err(PortError::not_found("Folio", item.folio_id));
            }
            self.work.line_items.insert(item.id, item.clone());
            Ok(())
        }

        async fn mark_line_items_paid(&mut self, items: &[LineItem]) -> Result<(), PortError> {
            for item in items.iter().filter(|i| i.is_paid()) {
                let stored = self
                    .work
                    .line_items
                    .get_mut(&item.id)
                    .ok_or_else(|| PortError::not_found("LineItem", item.id))?;
                if !stored.is_paid() {
                    stored.status = item.status;
                    stored.paid_at = item.paid_at;
                }
            }
            Ok(())
        }

        async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
            if self
                .work
                .payments
                .values()
                .any(|p| p.reference == payment.reference)
            {
                return Err(PortError::conflict(format!(
                    "duplicate payment reference {}",
                    payment.reference
                )));
            }
            self.work.payments.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn update_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
            let slot = self
                .work
                .payments
                .get_mut(&payment.id)
                .ok_or_else(|| PortError::not_found("Payment", payment.id))?;
            *slot = payment.clone();
            Ok(())
        }

        async fn lock_payment(&mut self, id: PaymentId) -> Result<Payment, PortError> {
            self.work
                .payments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Payment", id))
        }

        async fn lock_payment_by_reference(&mut self, reference: &str) -> Result<Payment, PortError> {
            self.work
                .payments
                .values()
                .find(|p| p.reference == reference)
                .cloned()
                .ok_or_else(|| PortError::not_found("Payment", reference))
        }

        async fn insert_gateway_transaction(
            &mut self,
            txn: &GatewayTransaction,
        ) -> Result<(), PortError> {
            if self
                .work
                .gateway_transactions
                .values()
                .any(|t| t.gateway_reference == txn.gateway_reference)
            {
                return Err(PortError::conflict(format!(
                    "duplicate gateway reference {}",
                    txn.gateway_reference
                )));
            }
            self.work.gateway_transactions.insert(txn.id, txn.clone());
            Ok(())
        }

        async fn lock_gateway_transaction(
            &mut self,
            gateway_reference: &str,
        ) -> Result<Option<GatewayTransaction>, PortError> {
            Ok(self
                .work
                .gateway_transactions
                .values()
                .find(|t| t.gateway_reference == gateway_reference)
                .cloned())
        }

        async fn update_gateway_transaction(
            &mut self,
            txn: &GatewayTransaction,
        ) -> Result<(), PortError> {
            let slot = self
                .work
                .gateway_transactions
                .get_mut(&txn.id)
                .ok_or_else(|| PortError::not_found("GatewayTransaction", txn.id))?;
            *slot = txn.clone();
            Ok(())
        }

        async fn lock_guest(&mut self, id: GuestId) -> Result<Guest, PortError> {
            self.work
                .guests
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Guest", id))
        }

        async fn update_guest(&mut self, guest: &Guest) -> Result<(), PortError> {
            self.work.guests.insert(guest.id, guest.clone());
            Ok(())
        }

        async fn lock_reservation(&mut self, id: ReservationId) -> Result<Reservation, PortError> {
            self.work
                .reservations
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Reservation", id))
        }

        async fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), PortError> {
            self.work
                .reservations
                .insert(reservation.id, reservation.clone());
            Ok(())
        }

        async fn lock_room(&mut self, id: RoomId) -> Result<Room, PortError> {
            self.work
                .rooms
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Room", id))
        }

        async fn update_room(&mut self, room: &Room) -> Result<(), PortError> {
            self.work.rooms.insert(room.id, room.clone());
            Ok(())
        }

        async fn metrics_inputs(
            &mut self,
            date: NaiveDate,
            currency: Currency,
        ) -> Result<MetricsInputs, PortError> {
            let revenue = Money::checked_sum(
                currency,
                self.work
                    .payments
                    .values()
                    .filter(|p| p.status == PaymentStatus::Completed)
                    .filter(|p| p.created_at.date_naive() == date)
                    .map(|p| &p.amount),
            )
            .map_err(|e| PortError::transformation(e.to_string()))?;

            let rooms: Vec<_> = self.work.rooms.values().cloned().collect();
            let reservations: Vec<_> = self.work.reservations.values().cloned().collect();
            Ok(MetricsInputs::from_records(date, &rooms, &reservations, revenue))
        }

        async fn upsert_daily_metrics(&mut self, metrics: &DailyMetrics) -> Result<(), PortError> {
            self.work.metrics.insert(metrics.date, metrics.clone());
            Ok(())
        }

        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            if self.fail_commit.swap(false, Ordering::SeqCst) {
                return Err(PortError::connection("injected commit failure"));
            }
            let MockLedgerTx { mut guard, work, .. } = *self;
            *guard = work;
            Ok(())
        }
    }

    /// How the mock gateway answers `initialize`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum InitBehavior {
        Succeed,
        Reject,
        /// Never answers; exercises the caller's timeout
        Hang,
    }

    /// Scriptable payment gateway
    #[derive(Debug, Clone)]
    pub struct MockPaymentGateway {
        init_behavior: Arc<RwLock<InitBehavior>>,
        statuses: Arc<RwLock<HashMap<String, GatewayStatus>>>,
        initialized: Arc<RwLock<Vec<GatewayInitRequest>>>,
    }

    impl Default for MockPaymentGateway {
        fn default() -> Self {
            Self {
                init_behavior: Arc::new(RwLock::new(InitBehavior::Succeed)),
                statuses: Arc::new(RwLock::new(HashMap::new())),
                initialized: Arc::new(RwLock::new(Vec::new())),
            }
        }
    }

    impl MockPaymentGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set_init_behavior(&self, behavior: InitBehavior) {
            *self.init_behavior.write().await = behavior;
        }

        /// Sets what `verify` reports for a reference
        pub async fn set_status(&self, reference: impl Into<String>, status: GatewayStatus) {
            self.statuses.write().await.insert(reference.into(), status);
        }

        pub async fn initialized_requests(&self) -> Vec<GatewayInitRequest> {
            self.initialized.read().await.clone()
        }
    }

    impl DomainPort for MockPaymentGateway {}

    #[async_trait]
    impl PaymentGateway for MockPaymentGateway {
        async fn initialize(&self, request: &GatewayInitRequest) -> Result<GatewayInit, PortError> {
            let behavior = self.init_behavior.read().await.clone();
            match behavior {
                InitBehavior::Succeed => {
                    self.initialized.write().await.push(request.clone());
                    self.statuses
                        .write()
                        .await
                        .entry(request.reference.clone())
                        .or_insert(GatewayStatus::Pending);
                    Ok(GatewayInit {
                        authorization_url: format!("https://checkout.mock/{}", request.reference),
                        access_code: format!("ac_{}", request.reference.to_ascii_lowercase()),
                        reference: request.reference.clone(),
                    })
                }
                InitBehavior::Reject => Err(PortError::ServiceUnavailable {
                    service: "mock gateway".to_string(),
                }),
                InitBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(PortError::Timeout {
                        operation: "initialize".to_string(),
                        duration_ms: 3_600_000,
                    })
                }
            }
        }

        async fn verify(&self, reference: &str) -> Result<GatewayVerification, PortError> {
            let status = self
                .statuses
                .read()
                .await
                .get(reference)
                .copied()
                .ok_or_else(|| PortError::not_found("GatewayTransaction", reference))?;
            Ok(GatewayVerification {
                reference: reference.to_string(),
                status,
                amount: None,
            })
        }
    }
}
