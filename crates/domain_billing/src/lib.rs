//! Billing Domain - Folio Reconciliation
//!
//! Keeps a guest's running bill (the folio), its line items and its payments
//! consistent as charges and payments arrive, and cascades each change into
//! guest loyalty counters and the daily metrics rollup.
//!
//! # Balance
//!
//! One formula, recomputed from scratch on every mutation:
//!
//! ```text
//! total_amount = room_charges + Σ line items + taxes - discount
//! balance      = total_amount - amount_paid
//! ```
//!
//! After any payment, `status == settled` exactly when `balance <= 0`.
//!
//! # Payment flow
//!
//! ```text
//! record_payment ──cash/card/transfer/cheque──▶ complete ─▶ allocate ─▶ rollup
//!        │
//!        └──gateway──▶ pending ─▶ initialize (external) ─▶ handoff
//!                                                           │
//!                 confirm_gateway_payment(reference, status)◀┘
//!                   success ─▶ complete ─▶ allocate ─▶ rollup
//!                   failure ─▶ payment + gateway transaction failed
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingService, RecordPaymentCommand, PaymentMethod};
//!
//! let outcome = billing.record_payment(RecordPaymentCommand {
//!     folio_id,
//!     amount: Money::new(dec!(25000), Currency::NGN),
//!     method: PaymentMethod::Cash,
//!     recorded_by: Some(user_id),
//!     notes: None,
//!     occurred_at: Utc::now(),
//! }).await?;
//! ```

pub mod adapters;
pub mod allocation;
pub mod error;
pub mod folio;
pub mod front_desk;
pub mod payment;
pub mod ports;
pub mod report;
pub mod services;
pub mod totals;

pub use allocation::{allocate_payment, AllocationOutcome};
pub use error::BillingError;
pub use folio::{Folio, FolioStatus, LineItem, LineItemStatus};
pub use front_desk::{FrontDeskService, StayUpdate};
pub use payment::{
    generate_reference, GatewayInit, GatewayInitRequest, GatewayStatus, GatewayTransaction,
    GatewayVerification, Payment, PaymentMethod, PaymentStatus,
};
pub use ports::{FolioStatement, LedgerStore, LedgerTx, PaymentGateway};
pub use report::{AccountingReport, MethodTotal};
pub use services::{
    BillingConfig, BillingService, ChargePosted, ConfirmationOutcome, GatewayHandoff,
    PaymentOutcome, PostChargeCommand, RecordPaymentCommand, DEFAULT_GATEWAY_TIMEOUT,
};
pub use totals::FolioTotals;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{InitBehavior, MockLedgerStore, MockPaymentGateway};
