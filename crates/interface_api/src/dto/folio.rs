//! Folio DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use domain_billing::{
    ChargePosted, Folio, FolioStatement, FolioStatus, LineItem, LineItemStatus, Payment,
    PaymentMethod, PaymentStatus,
};

/// Every supported currency has a two-place minor unit
const MINOR_UNIT_PLACES: u32 = 2;

pub(crate) fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if !amount.is_sign_positive() || amount.is_zero() {
        return Err(ValidationError::new("must_be_positive"));
    }
    if amount.normalize().scale() > MINOR_UNIT_PLACES {
        return Err(ValidationError::new("finer_than_minor_unit"));
    }
    Ok(())
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostChargeRequest {
    #[validate(length(min = 1, max = 255))]
    pub description: String,
    #[validate(custom(function = "positive_amount"))]
    pub unit_amount: Decimal,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 1000))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FolioResponse {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub guest_id: Uuid,
    pub status: FolioStatus,
    pub currency: String,
    pub room_charges: Decimal,
    pub service_charges: Decimal,
    pub taxes: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<&Folio> for FolioResponse {
    fn from(folio: &Folio) -> Self {
        Self {
            id: folio.id.into(),
            reservation_id: folio.reservation_id.into(),
            guest_id: folio.guest_id.into(),
            status: folio.status,
            currency: folio.currency.code().to_string(),
            room_charges: folio.room_charges.amount(),
            service_charges: folio.service_charges.amount(),
            taxes: folio.taxes.amount(),
            discount: folio.discount.amount(),
            total_amount: folio.total_amount.amount(),
            amount_paid: folio.amount_paid.amount(),
            balance: folio.balance.amount(),
            updated_at: folio.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineItemResponse {
    pub id: Uuid,
    pub description: String,
    pub unit_amount: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    pub status: LineItemStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.into(),
            description: item.description.clone(),
            unit_amount: item.unit_amount.amount(),
            quantity: item.quantity,
            total: item.total.amount(),
            status: item.status,
            created_at: item.created_at,
            paid_at: item.paid_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub folio_id: Uuid,
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.into(),
            folio_id: payment.folio_id.into(),
            reference: payment.reference.clone(),
            amount: payment.amount.amount(),
            currency: payment.amount.currency().code().to_string(),
            method: payment.method,
            status: payment.status,
            notes: payment.notes.clone(),
            recorded_by: payment.recorded_by.map(Into::into),
            created_at: payment.created_at,
            completed_at: payment.completed_at,
        }
    }
}

/// A folio with everything posted against it
#[derive(Debug, Serialize, Deserialize)]
pub struct StatementResponse {
    pub folio: FolioResponse,
    pub line_items: Vec<LineItemResponse>,
    pub payments: Vec<PaymentResponse>,
}

impl From<&FolioStatement> for StatementResponse {
    fn from(statement: &FolioStatement) -> Self {
        Self {
            folio: (&statement.folio).into(),
            line_items: statement.line_items.iter().map(Into::into).collect(),
            payments: statement.payments.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChargeResponse {
    pub line_item: LineItemResponse,
    pub folio: FolioResponse,
}

impl From<&ChargePosted> for ChargeResponse {
    fn from(posted: &ChargePosted) -> Self {
        Self {
            line_item: (&posted.line_item).into(),
            folio: (&posted.folio).into(),
        }
    }
}
