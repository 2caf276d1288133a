//! Payment allocation
//!
//! Applies a completed payment to a folio:
//!
//! 1. `amount_paid += payment.amount`
//! 2. unpaid line items are settled oldest-first while the payment's funds
//!    cover an item's whole total; the walk stops at the first item it cannot
//!    cover
//! 3. totals are recomputed, so `balance = total_amount - amount_paid`
//! 4. status becomes `settled` when the balance is ≤ 0, `partial` otherwise
//! 5. the guest's loyalty counters are credited
//!
//! Funds left over after the walk are not tracked separately; they remain
//! visible through the folio balance. Overpayment simply drives the balance
//! below zero.
//!
//! Allocation is pure: it mutates the values it is given and the caller
//! persists them in one ledger transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::LineItemId;
use domain_guest::{Guest, LoyaltyPolicy, LoyaltyUpdate};

use crate::error::BillingError;
use crate::folio::{sort_for_settlement, Folio, FolioStatus, LineItem};
use crate::payment::{Payment, PaymentStatus};
use crate::totals::{self, FolioTotals};

/// What an allocation changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Line items settled by this payment, in settlement order
    pub settled_items: Vec<LineItemId>,
    /// Folio totals after the payment
    pub totals: FolioTotals,
    /// Folio status after the payment
    pub status: FolioStatus,
    /// Guest loyalty counters after the payment
    pub loyalty: LoyaltyUpdate,
}

/// Applies a completed payment to its folio and guest
///
/// # Arguments
///
/// * `folio` - The folio being paid, locked by the caller
/// * `items` - All line items of the folio (any order)
/// * `payment` - The payment, already marked completed
/// * `guest` - The folio's guest, locked by the caller
/// * `policy` - VIP promotion rules
/// * `at` - Time of the allocation
///
/// # Errors
///
/// Every check happens before anything is mutated:
/// - `Validation` for a non-positive amount or a currency mismatch
/// - `InconsistentState` if the payment is not completed, belongs to another
///   folio, or the guest is not the folio's guest
pub fn allocate_payment(
    folio: &mut Folio,
    items: &mut [LineItem],
    payment: &Payment,
    guest: &mut Guest,
    policy: &LoyaltyPolicy,
    at: DateTime<Utc>,
) -> Result<AllocationOutcome, BillingError> {
    if !payment.amount.is_positive() {
        return Err(BillingError::validation(format!(
            "payment amount must be positive, got {}",
            payment.amount
        )));
    }
    folio.ensure_currency(&payment.amount)?;
    if guest.total_spent.currency() != payment.amount.currency() {
        return Err(BillingError::validation(format!(
            "guest spend is tracked in {}, payment is in {}",
            guest.total_spent.currency(),
            payment.amount.currency()
        )));
    }
    if payment.status != PaymentStatus::Completed {
        return Err(BillingError::inconsistent(format!(
            "payment {} must be completed before allocation, is {}",
            payment.reference, payment.status
        )));
    }
    if payment.folio_id != folio.id {
        return Err(BillingError::inconsistent(format!(
            "payment {} belongs to folio {}, not {}",
            payment.reference, payment.folio_id, folio.id
        )));
    }
    if guest.id != folio.guest_id {
        return Err(BillingError::inconsistent(format!(
            "guest {} is not the guest of folio {}",
            guest.id, folio.id
        )));
    }
    // dry run so a bad line item set is rejected before mutation
    FolioTotals::calculate(folio, items)?;

    folio.amount_paid = folio.amount_paid.checked_add(&payment.amount)?;

    sort_for_settlement(items);
    let mut remaining = payment.amount;
    let mut settled_items = Vec::new();
    for item in items.iter_mut().filter(|i| !i.is_paid()) {
        if remaining.amount() < item.total.amount() {
            break;
        }
        remaining = remaining.checked_sub(&item.total)?;
        item.mark_paid(at);
        settled_items.push(item.id);
    }

    let totals = totals::recalculate(folio, items, at)?;
    folio.status = FolioStatus::after_payment(&totals.balance);

    let loyalty = guest.record_completed_payment(&payment.amount, policy, at)?;

    debug!(
        folio_id = %folio.id,
        payment_ref = %payment.reference,
        settled = settled_items.len(),
        unallocated = %remaining,
        balance = %totals.balance,
        "Payment allocated"
    );

    Ok(AllocationOutcome {
        settled_items,
        totals,
        status: folio.status,
        loyalty,
    })
}
