//! Payments and gateway transactions
//!
//! Cash, card, bank transfer and cheque payments complete the moment they
//! are recorded. Gateway payments stay `pending` until the external
//! processor confirms them; the [`GatewayTransaction`] tracks that handoff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{FolioId, GatewayTransactionId, Money, PaymentId, UserId};

use crate::error::BillingError;

/// How the guest paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    /// Online payment through the external gateway
    Gateway,
    Cheque,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::BankTransfer,
        PaymentMethod::Gateway,
        PaymentMethod::Cheque,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::Cheque => "cheque",
        }
    }

    /// Returns true if the payment completes when recorded
    pub fn completes_immediately(&self) -> bool {
        !matches!(self, PaymentMethod::Gateway)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "gateway" => Ok(PaymentMethod::Gateway),
            "cheque" => Ok(PaymentMethod::Cheque),
            other => Err(BillingError::validation(format!("unknown payment method '{other}'"))),
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting gateway confirmation
    Pending,
    /// Funds received and allocated to the folio
    Completed,
    /// Gateway reported failure
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Completed and failed are final
    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(BillingError::validation(format!("unknown payment status '{other}'"))),
        }
    }
}

/// Generates a unique payment reference: `PMS-` followed by the 32 uppercase
/// hex characters of a random UUID
pub fn generate_reference() -> String {
    format!("PMS-{}", Uuid::new_v4().simple().to_string().to_ascii_uppercase())
}

/// A payment against a folio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Folio being paid
    pub folio_id: FolioId,
    /// Amount paid
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// Status
    pub status: PaymentStatus,
    /// Unique transaction reference, also sent to the gateway
    pub reference: String,
    /// Free-form notes (failure reasons are appended here)
    pub notes: Option<String>,
    /// Staff member who recorded the payment
    pub recorded_by: Option<UserId>,
    /// Created timestamp; revenue is attributed to this date
    pub created_at: DateTime<Utc>,
    /// When the payment completed
    pub completed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates a pending payment
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Validation` unless `amount` is strictly positive.
    pub fn new(
        folio_id: FolioId,
        amount: Money,
        method: PaymentMethod,
        recorded_by: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::validation(format!(
                "payment amount must be positive, got {amount}"
            )));
        }
        if !amount.fits_minor_unit() {
            return Err(BillingError::validation(format!(
                "payment amount {} has more than {} decimal places",
                amount.amount(),
                amount.currency().decimal_places()
            )));
        }

        Ok(Self {
            id: PaymentId::new_v7(),
            folio_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            reference: generate_reference(),
            notes: None,
            recorded_by,
            created_at: at,
            completed_at: None,
        })
    }

    /// Sets the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Marks the payment as completed
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InconsistentState` unless the payment is pending.
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), BillingError> {
        self.ensure_pending()?;
        self.status = PaymentStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Marks the payment as failed
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InconsistentState` unless the payment is pending.
    pub fn fail(&mut self, reason: &str) -> Result<(), BillingError> {
        self.ensure_pending()?;
        self.status = PaymentStatus::Failed;
        self.notes = Some(match self.notes.take() {
            Some(existing) => format!("{existing}; failed: {reason}"),
            None => format!("failed: {reason}"),
        });
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), BillingError> {
        if self.status.is_final() {
            return Err(BillingError::inconsistent(format!(
                "payment {} is already {}",
                self.reference, self.status
            )));
        }
        Ok(())
    }
}

/// Status of the external gateway transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Pending,
    Success,
    Failed,
}

impl GatewayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayStatus::Pending => "pending",
            GatewayStatus::Success => "success",
            GatewayStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayStatus {
    type Err = BillingError;

    /// Gateway status strings other than `success`/`pending` (e.g.
    /// `abandoned`, `reversed`) are treated as failures.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(GatewayStatus::Success),
            "pending" | "ongoing" | "processing" => Ok(GatewayStatus::Pending),
            "" => Err(BillingError::validation("empty gateway status")),
            _ => Ok(GatewayStatus::Failed),
        }
    }
}

/// The external processor's side of a gateway payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    /// Unique identifier
    pub id: GatewayTransactionId,
    /// Payment this transaction settles
    pub payment_id: PaymentId,
    /// URL the guest is redirected to
    pub authorization_url: String,
    /// Gateway access code
    pub access_code: String,
    /// Gateway reference (unique)
    pub gateway_reference: String,
    /// Amount charged
    pub amount: Money,
    /// Status
    pub status: GatewayStatus,
    /// When the gateway reported success
    pub paid_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl GatewayTransaction {
    /// Creates a pending transaction from a gateway handoff
    pub fn pending(payment: &Payment, init: &GatewayInit, at: DateTime<Utc>) -> Self {
        Self {
            id: GatewayTransactionId::new_v7(),
            payment_id: payment.id,
            authorization_url: init.authorization_url.clone(),
            access_code: init.access_code.clone(),
            gateway_reference: init.reference.clone(),
            amount: payment.amount,
            status: GatewayStatus::Pending,
            paid_at: None,
            created_at: at,
        }
    }

    pub fn succeed(&mut self, at: DateTime<Utc>) {
        self.status = GatewayStatus::Success;
        self.paid_at = Some(at);
    }

    pub fn fail(&mut self) {
        self.status = GatewayStatus::Failed;
    }
}

/// What the gateway returns when a transaction is initialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInit {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Request to initialize a gateway transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInitRequest {
    /// Payer e-mail
    pub email: String,
    /// Amount to charge
    pub amount: Money,
    /// Our payment reference
    pub reference: String,
    /// Where the gateway redirects the guest afterwards
    pub callback_url: Option<String>,
}

/// Result of asking the gateway about a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayVerification {
    pub reference: String,
    pub status: GatewayStatus,
    /// Amount the gateway reports, if any
    pub amount: Option<Money>,
}
