//! Core Kernel - Foundational types shared by every hotel ledger crate
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for folios, payments, guests and stays
//! - The port error type and marker traits for adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    FolioId, LineItemId, PaymentId, GatewayTransactionId,
    GuestId, ReservationId, RoomId, UserId,
};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
