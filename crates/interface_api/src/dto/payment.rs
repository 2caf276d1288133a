//! Payment DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_billing::{ConfirmationOutcome, GatewayStatus, PaymentOutcome};

use super::folio::{FolioResponse, PaymentResponse};

/// A gateway verdict pushed by a trusted back-office caller
#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmGatewayRequest {
    #[validate(length(min = 1, max = 100))]
    pub reference: String,
    pub status: GatewayStatus,
}

/// Query string of the gateway's redirect back to the hotel
///
/// Paystack-style gateways send the reference as both `reference` and
/// `trxref`.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

impl CallbackQuery {
    pub fn reference(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or(self.trxref.as_deref())
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Completed,
    AwaitingGateway,
    Failed,
    Pending,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentOutcomeResponse {
    pub outcome: OutcomeKind,
    pub payment: PaymentResponse,
    /// Folio after allocation; absent while the gateway has not confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folio: Option<FolioResponse>,
    /// Line items this payment settled, oldest first
    #[serde(default)]
    pub settled_line_items: Vec<uuid::Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub promoted_to_vip: bool,
}

impl From<&PaymentOutcome> for PaymentOutcomeResponse {
    fn from(outcome: &PaymentOutcome) -> Self {
        match outcome {
            PaymentOutcome::Completed {
                payment,
                folio,
                allocation,
            } => Self {
                outcome: OutcomeKind::Completed,
                payment: payment.into(),
                folio: Some(folio.into()),
                settled_line_items: allocation.settled_items.iter().map(|id| (*id).into()).collect(),
                authorization_url: None,
                promoted_to_vip: allocation.loyalty.promoted_to_vip,
            },
            PaymentOutcome::AwaitingGateway { payment, handoff } => Self {
                outcome: OutcomeKind::AwaitingGateway,
                payment: payment.into(),
                folio: None,
                settled_line_items: Vec::new(),
                authorization_url: Some(handoff.authorization_url.clone()),
                promoted_to_vip: false,
            },
        }
    }
}

impl From<&ConfirmationOutcome> for PaymentOutcomeResponse {
    fn from(outcome: &ConfirmationOutcome) -> Self {
        let (kind, payment) = match outcome {
            ConfirmationOutcome::Completed {
                payment,
                folio,
                allocation,
            } => {
                return Self {
                    outcome: OutcomeKind::Completed,
                    payment: payment.into(),
                    folio: Some(folio.into()),
                    settled_line_items: allocation
                        .settled_items
                        .iter()
                        .map(|id| (*id).into())
                        .collect(),
                    authorization_url: None,
                    promoted_to_vip: allocation.loyalty.promoted_to_vip,
                }
            }
            ConfirmationOutcome::Failed { payment } => (OutcomeKind::Failed, payment),
            ConfirmationOutcome::Pending { payment } => (OutcomeKind::Pending, payment),
        };

        Self {
            outcome: kind,
            payment: payment.into(),
            folio: None,
            settled_line_items: Vec::new(),
            authorization_url: None,
            promoted_to_vip: false,
        }
    }
}
