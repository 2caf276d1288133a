//! Billing application service
//!
//! Orchestrates the ledger: every command opens one [`LedgerTx`], validates
//! its input, mutates folio/guest/metrics state through the pure domain
//! functions and commits once. Gateway calls happen between transactions,
//! bounded by [`BillingConfig::gateway_timeout`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use core_kernel::{Currency, FolioId, Money, PortError, ReservationId, UserId};
use domain_analytics::DailyMetrics;
use domain_guest::LoyaltyPolicy;

use crate::allocation::{allocate_payment, AllocationOutcome};
use crate::error::BillingError;
use crate::folio::{Folio, FolioStatus, LineItem};
use crate::payment::{
    GatewayInitRequest, GatewayStatus, GatewayTransaction, Payment, PaymentMethod,
};
use crate::ports::{FolioStatement, LedgerStore, LedgerTx, PaymentGateway};
use crate::report::AccountingReport;
use crate::totals;

/// Default bound on a single gateway call
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by the billing and front-desk services
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Currency of the property; revenue rollups are summed in it
    pub currency: Currency,
    /// VIP promotion rules
    pub loyalty: LoyaltyPolicy,
    /// Bound on each gateway call
    pub gateway_timeout: Duration,
    /// Where the gateway redirects the guest after paying
    pub callback_url: Option<String>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::NGN,
            loyalty: LoyaltyPolicy::default(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            callback_url: None,
        }
    }
}

impl BillingConfig {
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_loyalty(mut self, loyalty: LoyaltyPolicy) -> Self {
        self.loyalty = loyalty;
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }
}

/// Posts an extra charge to a folio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostChargeCommand {
    pub folio_id: FolioId,
    pub description: String,
    pub unit_amount: Money,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Records a payment against a folio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentCommand {
    pub folio_id: FolioId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub recorded_by: Option<UserId>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Where to send the guest to complete a gateway payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayHandoff {
    pub authorization_url: String,
    pub reference: String,
}

/// Result of posting a charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargePosted {
    pub line_item: LineItem,
    pub folio: Folio,
}

/// Result of recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Synchronous method: the payment completed and was allocated
    Completed {
        payment: Payment,
        folio: Folio,
        allocation: AllocationOutcome,
    },
    /// Gateway method: waiting for the guest to pay
    AwaitingGateway {
        payment: Payment,
        handoff: GatewayHandoff,
    },
}

/// Result of a gateway confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    Completed {
        payment: Payment,
        folio: Folio,
        allocation: AllocationOutcome,
    },
    Failed {
        payment: Payment,
    },
    /// The gateway has not decided yet; nothing changed
    Pending {
        payment: Payment,
    },
}

/// Billing application service
pub struct BillingService {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    config: BillingConfig,
}

impl BillingService {
    /// Creates a new billing service
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: BillingConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Returns the reservation's folio, opening it if necessary
    ///
    /// A new folio starts with room charges, total and balance equal to the
    /// reservation's total price. A reservation priced in another currency
    /// than the property's is rejected with `Validation`.
    pub async fn open_folio(
        &self,
        reservation_id: ReservationId,
        at: DateTime<Utc>,
    ) -> Result<Folio, BillingError> {
        let mut tx = self.store.begin().await?;
        let reservation = tx.lock_reservation(reservation_id).await?;
        if reservation.total_price.currency() != self.config.currency {
            return Err(BillingError::validation(format!(
                "reservation {reservation_id} is priced in {}, the property bills in {}",
                reservation.total_price.currency(),
                self.config.currency
            )));
        }

        if let Some(existing) = tx.lock_folio_for_reservation(reservation_id).await? {
            return Ok(existing);
        }

        let folio = Folio::open(&reservation, at);
        tx.insert_folio(&folio).await?;
        tx.commit().await?;

        info!(
            folio_id = %folio.id,
            reservation_id = %reservation_id,
            balance = %folio.balance,
            "Folio opened"
        );
        Ok(folio)
    }

    /// Posts an extra charge and recomputes the folio's totals
    ///
    /// The balance grows by exactly the charge total. A folio that already
    /// received payments has its status re-derived, so a settled folio with
    /// a new charge becomes partial again.
    pub async fn post_charge(&self, cmd: PostChargeCommand) -> Result<ChargePosted, BillingError> {
        let item = LineItem::new(
            cmd.folio_id,
            cmd.description,
            cmd.unit_amount,
            cmd.quantity,
            cmd.occurred_at,
        )?;

        let mut tx = self.store.begin().await?;
        let mut folio = tx.lock_folio(cmd.folio_id).await?;
        folio.ensure_currency(&item.total)?;

        tx.insert_line_item(&item).await?;
        let items = tx.line_items(folio.id).await?;
        totals::recalculate(&mut folio, &items, cmd.occurred_at)?;
        if folio.status != FolioStatus::Open {
            folio.status = FolioStatus::after_payment(&folio.balance);
        }
        tx.update_folio(&folio).await?;
        tx.commit().await?;

        info!(
            folio_id = %folio.id,
            line_item_id = %item.id,
            amount = %item.total,
            balance = %folio.balance,
            "Charge posted"
        );
        Ok(ChargePosted {
            line_item: item,
            folio,
        })
    }

    /// Records a payment
    ///
    /// Cash, card, bank transfer and cheque payments complete immediately and
    /// are allocated in the same transaction. Gateway payments are stored as
    /// pending, the gateway is asked for an authorization URL, and the ledger
    /// is left untouched until [`BillingService::confirm_gateway_payment`].
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount or a currency mismatch
    /// - `NotFound` if the folio or its guest does not exist
    /// - `ExternalService` if the gateway rejects or times out; the payment is
    ///   then stored as failed
    pub async fn record_payment(
        &self,
        cmd: RecordPaymentCommand,
    ) -> Result<PaymentOutcome, BillingError> {
        let mut payment = Payment::new(
            cmd.folio_id,
            cmd.amount,
            cmd.method,
            cmd.recorded_by,
            cmd.occurred_at,
        )?;
        if let Some(notes) = cmd.notes {
            payment = payment.with_notes(notes);
        }

        if cmd.method.completes_immediately() {
            self.record_synchronous(payment, cmd.occurred_at).await
        } else {
            self.initiate_gateway(payment, cmd.occurred_at).await
        }
    }

    async fn record_synchronous(
        &self,
        mut payment: Payment,
        at: DateTime<Utc>,
    ) -> Result<PaymentOutcome, BillingError> {
        let mut tx = self.store.begin().await?;
        let folio = tx.lock_folio(payment.folio_id).await?;
        folio.ensure_currency(&payment.amount)?;

        payment.complete(at)?;
        tx.insert_payment(&payment).await?;
        let (folio, allocation) = self.allocate(tx.as_mut(), folio, &payment, at).await?;
        tx.commit().await?;

        info!(
            folio_id = %folio.id,
            payment_ref = %payment.reference,
            method = %payment.method,
            amount = %payment.amount,
            balance = %folio.balance,
            status = %folio.status,
            "Payment recorded"
        );
        Ok(PaymentOutcome::Completed {
            payment,
            folio,
            allocation,
        })
    }

    async fn initiate_gateway(
        &self,
        payment: Payment,
        at: DateTime<Utc>,
    ) -> Result<PaymentOutcome, BillingError> {
        let mut tx = self.store.begin().await?;
        let folio = tx.lock_folio(payment.folio_id).await?;
        folio.ensure_currency(&payment.amount)?;
        let guest = tx.lock_guest(folio.guest_id).await?;
        tx.insert_payment(&payment).await?;
        tx.commit().await?;

        let request = GatewayInitRequest {
            email: guest.email.clone(),
            amount: payment.amount,
            reference: payment.reference.clone(),
            callback_url: self.config.callback_url.clone(),
        };

        let init = match self
            .call_gateway("initialize", self.gateway.initialize(&request))
            .await
        {
            Ok(init) => init,
            Err(err) => {
                warn!(
                    folio_id = %folio.id,
                    payment_ref = %payment.reference,
                    error = %err,
                    "Gateway initialization failed"
                );
                self.fail_pending_payment(&payment.reference, &err.to_string())
                    .await?;
                return Err(err);
            }
        };

        let mut tx = self.store.begin().await?;
        let gateway_txn = GatewayTransaction::pending(&payment, &init, at);
        tx.insert_gateway_transaction(&gateway_txn).await?;
        tx.commit().await?;

        info!(
            folio_id = %folio.id,
            payment_ref = %payment.reference,
            amount = %payment.amount,
            "Gateway payment initiated"
        );
        Ok(PaymentOutcome::AwaitingGateway {
            payment,
            handoff: GatewayHandoff {
                authorization_url: init.authorization_url,
                reference: init.reference,
            },
        })
    }

    async fn fail_pending_payment(&self, reference: &str, reason: &str) -> Result<(), BillingError> {
        let mut tx = self.store.begin().await?;
        let mut payment = tx.lock_payment_by_reference(reference).await?;
        payment.fail(reason)?;
        tx.update_payment(&payment).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Applies a gateway's verdict on a transaction
    ///
    /// On success the payment completes and is allocated; on failure only
    /// the payment and its gateway transaction are marked failed. A pending
    /// verdict changes nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no payment matches the reference
    /// - `InconsistentState` if the payment was already completed or failed;
    ///   nothing is credited twice
    pub async fn confirm_gateway_payment(
        &self,
        reference: &str,
        status: GatewayStatus,
        at: DateTime<Utc>,
    ) -> Result<ConfirmationOutcome, BillingError> {
        let mut tx = self.store.begin().await?;
        let mut gateway_txn = tx.lock_gateway_transaction(reference).await?;
        let mut payment = match &gateway_txn {
            Some(txn) => tx.lock_payment(txn.payment_id).await?,
            None => tx.lock_payment_by_reference(reference).await?,
        };

        if payment.status.is_final() {
            warn!(
                payment_ref = %payment.reference,
                status = %payment.status,
                "Duplicate gateway confirmation ignored"
            );
            return Err(BillingError::inconsistent(format!(
                "payment {} is already {}",
                payment.reference, payment.status
            )));
        }

        match status {
            GatewayStatus::Pending => Ok(ConfirmationOutcome::Pending { payment }),
            GatewayStatus::Failed => {
                payment.fail("gateway reported failure")?;
                tx.update_payment(&payment).await?;
                if let Some(txn) = gateway_txn.as_mut() {
                    txn.fail();
                    tx.update_gateway_transaction(txn).await?;
                }
                tx.commit().await?;

                warn!(
                    folio_id = %payment.folio_id,
                    payment_ref = %payment.reference,
                    amount = %payment.amount,
                    "Gateway payment failed"
                );
                Ok(ConfirmationOutcome::Failed { payment })
            }
            GatewayStatus::Success => {
                let folio = tx.lock_folio(payment.folio_id).await?;
                payment.complete(at)?;
                tx.update_payment(&payment).await?;
                if let Some(txn) = gateway_txn.as_mut() {
                    txn.succeed(at);
                    tx.update_gateway_transaction(txn).await?;
                }
                let (folio, allocation) = self.allocate(tx.as_mut(), folio, &payment, at).await?;

                // revenue is attributed to the day the payment was created
                let created_on = payment.created_at.date_naive();
                if created_on != at.date_naive() {
                    rollup_metrics(tx.as_mut(), created_on, self.config.currency).await?;
                }
                tx.commit().await?;

                info!(
                    folio_id = %folio.id,
                    payment_ref = %payment.reference,
                    amount = %payment.amount,
                    balance = %folio.balance,
                    status = %folio.status,
                    "Gateway payment confirmed"
                );
                Ok(ConfirmationOutcome::Completed {
                    payment,
                    folio,
                    allocation,
                })
            }
        }
    }

    /// Asks the gateway about a transaction and applies its verdict
    pub async fn verify_gateway_payment(
        &self,
        reference: &str,
        at: DateTime<Utc>,
    ) -> Result<ConfirmationOutcome, BillingError> {
        let verification = self
            .call_gateway("verify", self.gateway.verify(reference))
            .await?;
        debug!(
            payment_ref = %reference,
            status = %verification.status,
            "Gateway verification received"
        );
        self.confirm_gateway_payment(reference, verification.status, at)
            .await
    }

    /// Recomputes and stores the metrics rollup for `date`
    pub async fn refresh_metrics(&self, date: NaiveDate) -> Result<DailyMetrics, BillingError> {
        let mut tx = self.store.begin().await?;
        let metrics = rollup_metrics(tx.as_mut(), date, self.config.currency).await?;
        tx.commit().await?;
        info!(date = %date, occupancy_rate = %metrics.occupancy_rate, "Daily metrics refreshed");
        Ok(metrics)
    }

    /// Returns the stored rollup for `date`, if it was ever computed
    pub async fn get_metrics(&self, date: NaiveDate) -> Result<Option<DailyMetrics>, BillingError> {
        Ok(self.store.daily_metrics(date).await?)
    }

    /// Returns a folio with its line items and payments
    pub async fn folio_statement(&self, folio_id: FolioId) -> Result<FolioStatement, BillingError> {
        Ok(self.store.folio_statement(folio_id).await?)
    }

    /// Returns the folio of a reservation, if one was opened
    pub async fn folio_for_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Folio>, BillingError> {
        Ok(self.store.folio_for_reservation(reservation_id).await?)
    }

    /// Summarizes completed payments between two dates (inclusive)
    pub async fn accounting_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AccountingReport, BillingError> {
        if end < start {
            return Err(BillingError::validation(format!(
                "report start {start} is after end {end}"
            )));
        }
        let payments = self.store.completed_payments_between(start, end).await?;
        AccountingReport::build(start, end, self.config.currency, payments)
    }

    /// Runs the allocator inside `tx` and persists everything it touched,
    /// including the metrics rollup for the allocation date
    async fn allocate(
        &self,
        tx: &mut dyn LedgerTx,
        mut folio: Folio,
        payment: &Payment,
        at: DateTime<Utc>,
    ) -> Result<(Folio, AllocationOutcome), BillingError> {
        let mut guest = tx.lock_guest(folio.guest_id).await?;
        let mut items = tx.line_items(folio.id).await?;

        let outcome = allocate_payment(
            &mut folio,
            &mut items,
            payment,
            &mut guest,
            &self.config.loyalty,
            at,
        )?;

        let settled: Vec<LineItem> = items
            .into_iter()
            .filter(|i| outcome.settled_items.contains(&i.id))
            .collect();
        tx.mark_line_items_paid(&settled).await?;
        tx.update_folio(&folio).await?;
        tx.update_guest(&guest).await?;
        rollup_metrics(tx, at.date_naive(), self.config.currency).await?;

        Ok((folio, outcome))
    }

    async fn call_gateway<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, PortError>>,
    ) -> Result<T, BillingError> {
        match tokio::time::timeout(self.config.gateway_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(BillingError::ExternalService(format!(
                "gateway {operation} failed: {err}"
            ))),
            Err(_) => Err(BillingError::ExternalService(format!(
                "gateway {operation} timed out after {}ms",
                self.config.gateway_timeout.as_millis()
            ))),
        }
    }
}

/// Recomputes the rollup for `date` inside `tx` and upserts it
pub(crate) async fn rollup_metrics(
    tx: &mut dyn LedgerTx,
    date: NaiveDate,
    currency: Currency,
) -> Result<DailyMetrics, BillingError> {
    let inputs = tx.metrics_inputs(date, currency).await?;
    let metrics = DailyMetrics::compute(date, inputs);
    tx.upsert_daily_metrics(&metrics).await?;

    debug!(
        date = %date,
        occupied_rooms = metrics.occupied_rooms,
        total_rooms = metrics.total_rooms,
        revenue = %metrics.total_revenue,
        "Metrics rolled up"
    );
    Ok(metrics)
}
