//! HTTP Payment Gateway Adapter
//!
//! Speaks a Paystack-style REST API:
//!
//! - `POST {base_url}/transaction/initialize` with
//!   `{email, amount, reference, callback_url}` where `amount` is in minor
//!   units (kobo for NGN)
//! - `GET {base_url}/transaction/verify/{reference}`
//!
//! Both answer with an envelope `{status: bool, message, data}`.
//!
//! # Error Handling
//!
//! - 401/403 -> `PortError::Unauthorized`
//! - 404 -> `PortError::NotFound`
//! - 429/5xx -> `PortError::ServiceUnavailable`
//! - `status: false` or an unreadable body -> `PortError::Transformation`
//! - timeouts -> `PortError::Timeout`
//! - connection failures -> `PortError::Connection`

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use core_kernel::{Currency, DomainPort, Money, PortError};

use crate::payment::{GatewayInit, GatewayInitRequest, GatewayStatus, GatewayVerification};
use crate::ports::PaymentGateway;

/// Configuration for the HTTP gateway adapter
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Base URL of the API (e.g., "https://api.paystack.co")
    pub base_url: String,
    /// Secret key sent as a bearer token
    pub secret_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    reference: String,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
}

/// Payment gateway reached over HTTPS
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    config: HttpGatewayConfig,
    client: Client,
}

impl HttpPaymentGateway {
    /// Creates the adapter
    ///
    /// # Errors
    ///
    /// Returns `PortError::Internal` if the HTTP client cannot be built.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn read_envelope<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T, PortError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = %status, body = %body, "Gateway returned an error status");
            return Err(map_status(status, operation));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| PortError::transformation(format!("{operation}: unreadable response: {e}")))?;

        if !envelope.status {
            return Err(PortError::transformation(format!(
                "{operation} rejected: {}",
                envelope.message.unwrap_or_else(|| "no message".to_string())
            )));
        }
        envelope
            .data
            .ok_or_else(|| PortError::transformation(format!("{operation}: response has no data")))
    }
}

fn map_status(status: StatusCode, operation: &str) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized {
            message: format!("{operation}: gateway rejected credentials"),
        },
        StatusCode::NOT_FOUND => PortError::not_found("GatewayTransaction", operation),
        s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => {
            PortError::ServiceUnavailable {
                service: format!("payment gateway ({operation}, HTTP {})", s.as_u16()),
            }
        }
        s => PortError::internal(format!("{operation}: unexpected HTTP {}", s.as_u16())),
    }
}

fn map_transport(err: reqwest::Error, operation: &str, timeout: Duration) -> PortError {
    if err.is_timeout() {
        PortError::Timeout {
            operation: operation.to_string(),
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        PortError::Connection {
            message: format!("{operation}: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl DomainPort for HttpPaymentGateway {}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn initialize(&self, request: &GatewayInitRequest) -> Result<GatewayInit, PortError> {
        let amount = request
            .amount
            .to_minor_units()
            .map_err(|e| PortError::validation(e.to_string()))?;
        let body = InitializeBody {
            email: &request.email,
            amount,
            reference: &request.reference,
            callback_url: request.callback_url.as_deref(),
            currency: request.amount.currency().code(),
        };

        debug!(payment_ref = %request.reference, amount, "Initializing gateway transaction");
        let response = self
            .client
            .post(self.url("transaction/initialize"))
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport(e, "initialize", self.config.timeout))?;

        let data: InitializeData = self.read_envelope("initialize", response).await?;
        Ok(GatewayInit {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<GatewayVerification, PortError> {
        let response = self
            .client
            .get(self.url(&format!("transaction/verify/{reference}")))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| map_transport(e, "verify", self.config.timeout))?;

        let data: VerifyData = self.read_envelope("verify", response).await?;
        let status = data
            .status
            .parse::<GatewayStatus>()
            .map_err(|e| PortError::transformation(e.to_string()))?;
        let amount = match (data.amount, data.currency.as_deref()) {
            (Some(minor), Some(code)) => code
                .parse::<Currency>()
                .ok()
                .map(|currency| Money::from_minor(minor, currency)),
            _ => None,
        };

        debug!(payment_ref = %data.reference, status = %status, "Gateway transaction verified");
        Ok(GatewayVerification {
            reference: data.reference,
            status,
            amount,
        })
    }
}
