//! Folio totals calculator
//!
//! Every mutation of a folio (charge posted, payment applied) recomputes its
//! totals from scratch with one formula:
//!
//! ```text
//! service_charges = Σ line_item.total        (paid and unpaid)
//! total_amount    = room_charges + service_charges + taxes - discount
//! balance         = total_amount - amount_paid
//! ```
//!
//! Nothing is ever added to the stored balance incrementally, so repeated
//! recalculation is idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::error::BillingError;
use crate::folio::{Folio, LineItem};

/// Result of a totals calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolioTotals {
    pub service_charges: Money,
    pub total_amount: Money,
    pub balance: Money,
    /// Sum of line items not yet covered by a payment
    pub unpaid_total: Money,
}

impl FolioTotals {
    /// Computes the totals of `folio` given all of its line items
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Validation` if a line item belongs to another
    /// folio or is in a different currency.
    pub fn calculate(folio: &Folio, items: &[LineItem]) -> Result<Self, BillingError> {
        if let Some(stray) = items.iter().find(|item| item.folio_id != folio.id) {
            return Err(BillingError::validation(format!(
                "line item {} does not belong to folio {}",
                stray.id, folio.id
            )));
        }

        let service_charges = Money::checked_sum(folio.currency, items.iter().map(|i| &i.total))?;
        let unpaid_total = Money::checked_sum(
            folio.currency,
            items.iter().filter(|i| !i.is_paid()).map(|i| &i.total),
        )?;

        let total_amount = folio
            .room_charges
            .checked_add(&service_charges)?
            .checked_add(&folio.taxes)?
            .checked_sub(&folio.discount)?;
        let balance = total_amount.checked_sub(&folio.amount_paid)?;

        Ok(Self {
            service_charges,
            total_amount,
            balance,
            unpaid_total,
        })
    }

    /// Writes the computed totals onto the folio
    pub fn apply_to(&self, folio: &mut Folio, at: DateTime<Utc>) {
        folio.service_charges = self.service_charges;
        folio.total_amount = self.total_amount;
        folio.balance = self.balance;
        folio.updated_at = at;
    }
}

/// Recomputes and stores the folio's totals in one step
pub fn recalculate(
    folio: &mut Folio,
    items: &[LineItem],
    at: DateTime<Utc>,
) -> Result<FolioTotals, BillingError> {
    let totals = FolioTotals::calculate(folio, items)?;
    totals.apply_to(folio, at);
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{Currency, FolioId, GuestId, RoomId};
    use domain_stay::Reservation;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ngn(amount: Decimal) -> Money {
        Money::new(amount, Currency::NGN)
    }

    fn folio(room_charges: Decimal) -> Folio {
        let reservation = Reservation::new(
            GuestId::new(),
            RoomId::new(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            1,
            ngn(room_charges),
            Utc::now(),
        )
        .unwrap();
        Folio::open(&reservation, Utc::now())
    }

    #[test]
    fn test_no_line_items() {
        let f = folio(dec!(50000));
        let totals = FolioTotals::calculate(&f, &[]).unwrap();

        assert!(totals.service_charges.is_zero());
        assert_eq!(totals.total_amount, ngn(dec!(50000)));
        assert_eq!(totals.balance, ngn(dec!(50000)));
        assert!(totals.unpaid_total.is_zero());
    }

    #[test]
    fn test_paid_items_still_count_as_charges() {
        let mut f = folio(dec!(50000));
        f.amount_paid = ngn(dec!(52000));
        let mut paid = LineItem::new(f.id, "Dinner", ngn(dec!(2000)), 1, Utc::now()).unwrap();
        paid.mark_paid(Utc::now());
        let unpaid = LineItem::new(f.id, "Laundry", ngn(dec!(700)), 2, Utc::now()).unwrap();

        let totals = FolioTotals::calculate(&f, &[paid, unpaid]).unwrap();

        assert_eq!(totals.service_charges, ngn(dec!(3400)));
        assert_eq!(totals.total_amount, ngn(dec!(53400)));
        assert_eq!(totals.balance, ngn(dec!(1400)));
        assert_eq!(totals.unpaid_total, ngn(dec!(1400)));
    }

    #[test]
    fn test_taxes_and_discount() {
        let mut f = folio(dec!(10000));
        f.taxes = ngn(dec!(750));
        f.discount = ngn(dec!(1000));

        let totals = FolioTotals::calculate(&f, &[]).unwrap();
        assert_eq!(totals.total_amount, ngn(dec!(9750)));
    }

    #[test]
    fn test_recalculation_is_idempotent() {
        let mut f = folio(dec!(10000));
        let items = vec![LineItem::new(f.id, "Minibar", ngn(dec!(1200)), 1, Utc::now()).unwrap()];

        let first = recalculate(&mut f, &items, Utc::now()).unwrap();
        let second = recalculate(&mut f, &items, Utc::now()).unwrap();

        assert_eq!(first, second);
        assert_eq!(f.balance, ngn(dec!(11200)));
    }

    #[test]
    fn test_rejects_foreign_line_item() {
        let f = folio(dec!(10000));
        let stray = LineItem::new(FolioId::new(), "Minibar", ngn(dec!(1200)), 1, Utc::now()).unwrap();
        assert!(FolioTotals::calculate(&f, &[stray]).is_err());
    }
}
