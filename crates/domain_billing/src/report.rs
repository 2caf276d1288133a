//! Accounting report over completed payments

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money};

use crate::error::BillingError;
use crate::payment::{Payment, PaymentMethod, PaymentStatus};

/// Revenue collected through one payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub count: usize,
    pub total: Money,
}

/// Completed payments between two dates with per-method totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// One entry per payment method, in [`PaymentMethod::ALL`] order
    pub by_method: Vec<MethodTotal>,
    pub total_revenue: Money,
    /// Newest first
    pub payments: Vec<Payment>,
}

impl AccountingReport {
    /// Builds the report; payments that are not completed or fall outside
    /// `[start, end]` are ignored
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        currency: Currency,
        payments: Vec<Payment>,
    ) -> Result<Self, BillingError> {
        let payments: Vec<Payment> = payments
            .into_iter()
            .filter(|p| p.status == PaymentStatus::Completed)
            .filter(|p| {
                let day = p.created_at.date_naive();
                day >= start && day <= end
            })
            .collect();

        let by_method = PaymentMethod::ALL
            .iter()
            .map(|method| {
                let matching: Vec<&Payment> =
                    payments.iter().filter(|p| p.method == *method).collect();
                Ok(MethodTotal {
                    method: *method,
                    count: matching.len(),
                    total: Money::checked_sum(currency, matching.iter().map(|p| &p.amount))?,
                })
            })
            .collect::<Result<Vec<_>, BillingError>>()?;

        let total_revenue = Money::checked_sum(currency, by_method.iter().map(|m| &m.total))?;

        Ok(Self {
            start,
            end,
            by_method,
            total_revenue,
            payments,
        })
    }

    /// Total collected through `method`
    pub fn total_for(&self, method: PaymentMethod) -> Option<&Money> {
        self.by_method
            .iter()
            .find(|m| m.method == method)
            .map(|m| &m.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::FolioId;
    use rust_decimal_macros::dec;

    fn completed(method: PaymentMethod, amount: rust_decimal::Decimal, day: u32) -> Payment {
        let at = Utc.with_ymd_and_hms(2024, 8, day, 12, 0, 0).unwrap();
        let mut p = Payment::new(FolioId::new(), Money::new(amount, Currency::NGN), method, None, at)
            .unwrap();
        p.complete(at).unwrap();
        p
    }

    #[test]
    fn test_totals_per_method() {
        let start = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        let pending = Payment::new(
            FolioId::new(),
            Money::new(dec!(999), Currency::NGN),
            PaymentMethod::Gateway,
            None,
            Utc::now(),
        )
        .unwrap();

        let report = AccountingReport::build(
            start,
            end,
            Currency::NGN,
            vec![
                completed(PaymentMethod::Cash, dec!(10000), 2),
                completed(PaymentMethod::Cash, dec!(5000), 3),
                completed(PaymentMethod::Card, dec!(20000), 4),
                pending,
            ],
        )
        .unwrap();

        assert_eq!(report.payments.len(), 3);
        assert_eq!(report.by_method.len(), PaymentMethod::ALL.len());
        assert_eq!(
            report.total_for(PaymentMethod::Cash).unwrap().amount(),
            dec!(15000)
        );
        assert!(report.total_for(PaymentMethod::Cheque).unwrap().is_zero());
        assert_eq!(report.total_revenue.amount(), dec!(35000));
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 8, 10).unwrap();
        let report = AccountingReport::build(
            day,
            day,
            Currency::NGN,
            vec![
                completed(PaymentMethod::BankTransfer, dec!(700), 10),
                completed(PaymentMethod::BankTransfer, dec!(300), 11),
            ],
        )
        .unwrap();

        assert_eq!(report.total_revenue.amount(), dec!(700));
    }
}
