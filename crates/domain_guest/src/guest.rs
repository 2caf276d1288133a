//! Guest records and loyalty counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{CoreError, Currency, GuestId, Money};

use crate::loyalty::{LoyaltyPolicy, LoyaltyUpdate};

/// A hotel guest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    /// Unique identifier
    pub id: GuestId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact e-mail, also sent to the payment gateway
    pub email: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Number of completed payments credited to this guest
    pub total_stays: u32,
    /// Sum of all completed payments
    pub total_spent: Money,
    /// VIP flag (one-way)
    pub vip: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    /// Creates a new guest with zeroed loyalty counters
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        currency: Currency,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: GuestId::new_v7(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            total_stays: 0,
            total_spent: Money::zero(currency),
            vip: false,
            created_at,
            updated_at: created_at,
        }
    }

    /// Sets the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Returns "first last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Credits a completed payment to the guest's loyalty counters
    ///
    /// Increments `total_spent` by `amount` and `total_stays` by one, and
    /// promotes the guest to VIP when the new total reaches the policy
    /// threshold. A VIP guest is never demoted here.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Money` if `amount` is in a different currency than
    /// the guest's accumulated spend.
    pub fn record_completed_payment(
        &mut self,
        amount: &Money,
        policy: &LoyaltyPolicy,
        at: DateTime<Utc>,
    ) -> Result<LoyaltyUpdate, CoreError> {
        self.total_spent = self.total_spent.checked_add(amount)?;
        self.total_stays = self.total_stays.saturating_add(1);
        self.updated_at = at;

        let promoted_to_vip = !self.vip && policy.qualifies_for_vip(&self.total_spent);
        if promoted_to_vip {
            self.vip = true;
            info!(
                guest_id = %self.id,
                total_spent = %self.total_spent,
                "Guest promoted to VIP"
            );
        }

        Ok(LoyaltyUpdate {
            total_spent: self.total_spent,
            total_stays: self.total_stays,
            promoted_to_vip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn guest() -> Guest {
        Guest::new("Ada", "Obi", "ada@example.com", Currency::NGN, Utc::now())
    }

    #[test]
    fn test_new_guest_has_zero_counters() {
        let g = guest();
        assert_eq!(g.total_stays, 0);
        assert!(g.total_spent.is_zero());
        assert!(!g.vip);
        assert_eq!(g.full_name(), "Ada Obi");
    }

    #[test]
    fn test_payment_below_threshold() {
        let mut g = guest();
        let update = g
            .record_completed_payment(
                &Money::new(dec!(25000), Currency::NGN),
                &LoyaltyPolicy::default(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(update.total_stays, 1);
        assert_eq!(update.total_spent.amount(), dec!(25000));
        assert!(!update.promoted_to_vip);
        assert!(!g.vip);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut g = guest();
        let update = g
            .record_completed_payment(
                &Money::new(dec!(100000), Currency::NGN),
                &LoyaltyPolicy::default(),
                Utc::now(),
            )
            .unwrap();

        assert!(update.promoted_to_vip);
        assert!(g.vip);
    }

    #[test]
    fn test_currency_mismatch_rejected() {
        let mut g = guest();
        let result = g.record_completed_payment(
            &Money::new(dec!(10), Currency::USD),
            &LoyaltyPolicy::default(),
            Utc::now(),
        );

        assert!(matches!(result, Err(CoreError::Money(_))));
        assert_eq!(g.total_stays, 0);
    }
}
