//! Request handlers

pub mod folios;
pub mod front_desk;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod reports;
