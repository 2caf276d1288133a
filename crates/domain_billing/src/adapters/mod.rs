//! External adapters for the billing domain
//!
//! - **HttpPaymentGateway**: Paystack-style card processor over HTTPS
//! - **MockPaymentGateway** / **MockLedgerStore**: in-memory doubles for
//!   tests (re-exported from the ports module behind the `mock` feature)
//!
//! The PostgreSQL ledger lives in `infra_db`.
//!
//! ```rust,ignore
//! use domain_billing::adapters::{HttpPaymentGateway, HttpGatewayConfig};
//! use domain_billing::PaymentGateway;
//! use std::sync::Arc;
//!
//! let gateway = HttpPaymentGateway::new(HttpGatewayConfig {
//!     base_url: "https://api.paystack.co".to_string(),
//!     secret_key: secret,
//!     ..Default::default()
//! })?;
//! let port: Arc<dyn PaymentGateway> = Arc::new(gateway);
//! ```

pub mod http_gateway;

pub use http_gateway::{HttpGatewayConfig, HttpPaymentGateway};
