//! Folios and their line items
//!
//! A folio is the running bill of one reservation. Its monetary fields are
//! only ever written through [`crate::totals`], which keeps
//! `total_amount = room_charges + service_charges + taxes - discount` and
//! `balance = total_amount - amount_paid`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Currency, FolioId, GuestId, LineItemId, Money, ReservationId};
use domain_stay::Reservation;

use crate::error::BillingError;

/// Settlement status of a folio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolioStatus {
    /// No payment has been applied yet
    Open,
    /// Payments applied but a balance remains
    Partial,
    /// Balance is zero or negative
    Settled,
}

impl FolioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolioStatus::Open => "open",
            FolioStatus::Partial => "partial",
            FolioStatus::Settled => "settled",
        }
    }

    /// Status after a payment has been applied against `balance`
    pub fn after_payment(balance: &Money) -> Self {
        if balance.amount() <= Decimal::ZERO {
            FolioStatus::Settled
        } else {
            FolioStatus::Partial
        }
    }
}

impl fmt::Display for FolioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolioStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(FolioStatus::Open),
            "partial" => Ok(FolioStatus::Partial),
            "settled" => Ok(FolioStatus::Settled),
            other => Err(BillingError::validation(format!("unknown folio status '{other}'"))),
        }
    }
}

/// A guest's running bill for one reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folio {
    /// Unique identifier
    pub id: FolioId,
    /// Reservation this folio bills (one-to-one)
    pub reservation_id: ReservationId,
    /// Guest responsible for the bill
    pub guest_id: GuestId,
    /// Settlement status
    pub status: FolioStatus,
    /// Accommodation charges, the reservation's total price
    pub room_charges: Money,
    /// Sum of all posted line items
    pub service_charges: Money,
    /// Taxes
    pub taxes: Money,
    /// Discount granted
    pub discount: Money,
    /// room_charges + service_charges + taxes - discount
    pub total_amount: Money,
    /// Sum of completed payments
    pub amount_paid: Money,
    /// total_amount - amount_paid; negative after an overpayment
    pub balance: Money,
    /// Currency of every amount on the folio
    pub currency: Currency,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Folio {
    /// Opens the folio for a reservation
    ///
    /// Room charges, total and balance all start at the reservation's total
    /// price.
    pub fn open(reservation: &Reservation, at: DateTime<Utc>) -> Self {
        let currency = reservation.total_price.currency();
        let zero = Money::zero(currency);

        Self {
            id: FolioId::new_v7(),
            reservation_id: reservation.id,
            guest_id: reservation.guest_id,
            status: FolioStatus::Open,
            room_charges: reservation.total_price,
            service_charges: zero,
            taxes: zero,
            discount: zero,
            total_amount: reservation.total_price,
            amount_paid: zero,
            balance: reservation.total_price,
            currency,
            created_at: at,
            updated_at: at,
        }
    }

    /// Returns true when nothing is owed
    pub fn is_settled(&self) -> bool {
        self.status == FolioStatus::Settled
    }

    /// Returns true when the guest still owes money
    pub fn has_outstanding_balance(&self) -> bool {
        self.balance.is_positive()
    }

    /// Ensures `amount` is in the folio's currency
    pub fn ensure_currency(&self, amount: &Money) -> Result<(), BillingError> {
        if amount.currency() != self.currency {
            return Err(BillingError::validation(format!(
                "amount in {} does not match folio currency {}",
                amount.currency(),
                self.currency
            )));
        }
        Ok(())
    }
}

/// Payment status of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemStatus {
    Unpaid,
    Paid,
}

impl LineItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemStatus::Unpaid => "unpaid",
            LineItemStatus::Paid => "paid",
        }
    }
}

impl FromStr for LineItemStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(LineItemStatus::Unpaid),
            "paid" => Ok(LineItemStatus::Paid),
            other => Err(BillingError::validation(format!(
                "unknown line item status '{other}'"
            ))),
        }
    }
}

/// An extra charge posted to a folio (minibar, laundry, room service...)
///
/// Line items are settled whole: a payment either covers an item's total or
/// leaves it unpaid. Once paid an item is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique identifier (time-ordered)
    pub id: LineItemId,
    /// Owning folio
    pub folio_id: FolioId,
    /// What was charged
    pub description: String,
    /// Price per unit
    pub unit_amount: Money,
    /// Number of units
    pub quantity: u32,
    /// unit_amount × quantity
    pub total: Money,
    /// Payment status
    pub status: LineItemStatus,
    /// When the charge was posted; settlement order
    pub created_at: DateTime<Utc>,
    /// When a payment covered this item
    pub paid_at: Option<DateTime<Utc>>,
}

impl LineItem {
    /// Creates an unpaid line item
    ///
    /// # Arguments
    ///
    /// * `folio_id` - Folio the charge is posted to
    /// * `description` - Non-blank description
    /// * `unit_amount` - Strictly positive price per unit
    /// * `quantity` - At least one
    /// * `at` - Posting time
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Validation` for a blank description, a zero
    /// quantity, a non-positive unit amount or one finer than the currency's
    /// minor unit.
    pub fn new(
        folio_id: FolioId,
        description: impl Into<String>,
        unit_amount: Money,
        quantity: u32,
        at: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(BillingError::validation("line item description must not be blank"));
        }
        if quantity == 0 {
            return Err(BillingError::validation("line item quantity must be at least 1"));
        }
        if !unit_amount.is_positive() {
            return Err(BillingError::validation(format!(
                "line item amount must be positive, got {unit_amount}"
            )));
        }
        if !unit_amount.fits_minor_unit() {
            return Err(BillingError::validation(format!(
                "line item amount {} has more than {} decimal places",
                unit_amount.amount(),
                unit_amount.currency().decimal_places()
            )));
        }

        let total = unit_amount.checked_mul(Decimal::from(quantity))?;

        Ok(Self {
            id: LineItemId::new_v7(),
            folio_id,
            description,
            unit_amount,
            quantity,
            total,
            status: LineItemStatus::Unpaid,
            created_at: at,
            paid_at: None,
        })
    }

    pub fn is_paid(&self) -> bool {
        self.status == LineItemStatus::Paid
    }

    /// Marks the item paid; paid items are left untouched
    pub fn mark_paid(&mut self, at: DateTime<Utc>) {
        if self.is_paid() {
            return;
        }
        self.status = LineItemStatus::Paid;
        self.paid_at = Some(at);
    }
}

/// Sorts line items into settlement order (oldest first)
pub fn sort_for_settlement(items: &mut [LineItem]) {
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::RoomId;
    use rust_decimal_macros::dec;

    fn ngn(amount: Decimal) -> Money {
        Money::new(amount, Currency::NGN)
    }

    #[test]
    fn test_open_folio_from_reservation() {
        let reservation = Reservation::new(
            GuestId::new(),
            RoomId::new(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            1,
            ngn(dec!(80000)),
            Utc::now(),
        )
        .unwrap();

        let folio = Folio::open(&reservation, Utc::now());

        assert_eq!(folio.status, FolioStatus::Open);
        assert_eq!(folio.room_charges, ngn(dec!(80000)));
        assert_eq!(folio.total_amount, ngn(dec!(80000)));
        assert_eq!(folio.balance, ngn(dec!(80000)));
        assert!(folio.amount_paid.is_zero());
        assert_eq!(folio.guest_id, reservation.guest_id);
    }

    #[test]
    fn test_line_item_total() {
        let item = LineItem::new(FolioId::new(), "Laundry", ngn(dec!(1500)), 3, Utc::now()).unwrap();
        assert_eq!(item.total, ngn(dec!(4500)));
        assert_eq!(item.status, LineItemStatus::Unpaid);
    }

    #[test]
    fn test_line_item_validation() {
        let folio_id = FolioId::new();
        assert!(LineItem::new(folio_id, "  ", ngn(dec!(10)), 1, Utc::now()).is_err());
        assert!(LineItem::new(folio_id, "Minibar", ngn(dec!(10)), 0, Utc::now()).is_err());
        assert!(LineItem::new(folio_id, "Minibar", ngn(dec!(0)), 1, Utc::now()).is_err());
        assert!(LineItem::new(folio_id, "Minibar", ngn(dec!(-5)), 1, Utc::now()).is_err());
        assert!(matches!(
            LineItem::new(folio_id, "Minibar", ngn(dec!(10.005)), 1, Utc::now()),
            Err(BillingError::Validation(_))
        ));
        assert!(LineItem::new(folio_id, "Minibar", ngn(dec!(10.05)), 1, Utc::now()).is_ok());
    }

    #[test]
    fn test_status_after_payment() {
        assert_eq!(FolioStatus::after_payment(&ngn(dec!(0))), FolioStatus::Settled);
        assert_eq!(FolioStatus::after_payment(&ngn(dec!(-50))), FolioStatus::Settled);
        assert_eq!(FolioStatus::after_payment(&ngn(dec!(0.01))), FolioStatus::Partial);
    }

    #[test]
    fn test_paid_item_is_immutable() {
        let mut item = LineItem::new(FolioId::new(), "Spa", ngn(dec!(20000)), 1, Utc::now()).unwrap();
        let first = Utc::now();
        item.mark_paid(first);
        item.mark_paid(first + chrono::Duration::hours(1));
        assert_eq!(item.paid_at, Some(first));
    }
}
