//! Guest Domain
//!
//! Guest records carry denormalized loyalty counters that the billing core
//! updates every time a payment completes:
//!
//! - `total_spent` accumulates every completed payment
//! - `total_stays` is incremented once per completed payment
//! - `vip` is promoted once `total_spent` reaches the VIP threshold and is
//!   never cleared automatically

pub mod guest;
pub mod loyalty;

pub use guest::Guest;
pub use loyalty::{LoyaltyPolicy, LoyaltyUpdate, DEFAULT_VIP_THRESHOLD};
