//! Request and response bodies

pub mod folio;
pub mod metrics;
pub mod payment;
pub mod stay;
