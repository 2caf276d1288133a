//! API configuration

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Currency;
use domain_billing::adapters::HttpGatewayConfig;
use domain_billing::BillingConfig;
use domain_guest::{LoyaltyPolicy, DEFAULT_VIP_THRESHOLD};

/// API configuration
///
/// Every field can be overridden with an `API_`-prefixed environment
/// variable, e.g. `API_PORT=9000` or `API_VIP_THRESHOLD=250000`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub database_max_connections: u32,
    /// Log level
    pub log_level: String,
    /// ISO 4217 code of the property's currency
    pub currency: String,
    /// Lifetime spend at which a guest becomes VIP
    pub vip_threshold: Decimal,
    /// Payment gateway API base URL
    pub gateway_base_url: String,
    /// Payment gateway secret key
    pub gateway_secret_key: String,
    /// Timeout for gateway calls in seconds
    pub gateway_timeout_secs: u64,
    /// Where the gateway sends the guest after paying
    pub gateway_callback_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/hotel".to_string(),
            database_max_connections: 10,
            log_level: "info".to_string(),
            currency: "NGN".to_string(),
            vip_threshold: DEFAULT_VIP_THRESHOLD,
            gateway_base_url: "https://api.paystack.co".to_string(),
            gateway_secret_key: String::new(),
            gateway_timeout_secs: 10,
            gateway_callback_url: None,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables on top of
    /// the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&ApiConfig::default())?)
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the configured currency
    pub fn currency(&self) -> Result<Currency, config::ConfigError> {
        self.currency
            .parse()
            .map_err(|e| config::ConfigError::Message(format!("currency: {e}")))
    }

    /// Settings for the billing service
    pub fn billing_config(&self) -> Result<BillingConfig, config::ConfigError> {
        if self.vip_threshold <= Decimal::ZERO {
            return Err(config::ConfigError::Message(
                "vip_threshold must be positive".to_string(),
            ));
        }

        let mut billing = BillingConfig::default()
            .with_currency(self.currency()?)
            .with_loyalty(LoyaltyPolicy::new(self.vip_threshold))
            .with_gateway_timeout(Duration::from_secs(self.gateway_timeout_secs));
        if let Some(url) = &self.gateway_callback_url {
            billing = billing.with_callback_url(url.clone());
        }
        Ok(billing)
    }

    /// Settings for the HTTP payment gateway
    pub fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.gateway_base_url.clone(),
            secret_key: self.gateway_secret_key.clone(),
            timeout: Duration::from_secs(self.gateway_timeout_secs),
        }
    }
}
