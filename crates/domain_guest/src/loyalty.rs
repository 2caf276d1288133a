//! Loyalty policy
//!
//! The VIP threshold is expressed in major currency units of the guest's
//! spend currency.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

/// Cumulative spend at which a guest becomes VIP
pub const DEFAULT_VIP_THRESHOLD: Decimal = dec!(100000);

/// Rules for promoting guests based on their spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyPolicy {
    /// Spend level (inclusive) that promotes a guest to VIP
    pub vip_threshold: Decimal,
}

impl LoyaltyPolicy {
    /// Creates a policy with a custom VIP threshold
    pub fn new(vip_threshold: Decimal) -> Self {
        Self { vip_threshold }
    }

    /// Returns true if the given cumulative spend qualifies for VIP
    pub fn qualifies_for_vip(&self, total_spent: &Money) -> bool {
        total_spent.amount() >= self.vip_threshold
    }
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VIP_THRESHOLD)
    }
}

/// Result of crediting a completed payment to a guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyUpdate {
    /// Cumulative spend after the payment
    pub total_spent: Money,
    /// Stay counter after the payment
    pub total_stays: u32,
    /// True if this payment promoted the guest to VIP
    pub promoted_to_vip: bool,
}
