//! HTTP API Layer
//!
//! REST API for folio reconciliation using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: folios, payments, front desk, metrics and reports
//! - **Middleware**: JWT authentication and audit logging
//! - **Auth**: staff roles mapped to capabilities, checked per handler
//! - **DTOs**: request/response bodies with validation
//! - **Error Handling**: consistent JSON error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(Arc::new(PgLedgerStore::new(pool)), gateway, config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_billing::{BillingService, FrontDeskService, LedgerStore, PaymentGateway};

use crate::config::ApiConfig;
use crate::handlers::{folios, front_desk, health, metrics, payments, reports};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub billing: Arc<BillingService>,
    pub front_desk: Arc<FrontDeskService>,
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over one ledger store
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown currency or a
    /// non-positive VIP threshold.
    pub fn new<S>(
        store: Arc<S>,
        gateway: Arc<dyn PaymentGateway>,
        config: ApiConfig,
    ) -> Result<Self, ::config::ConfigError>
    where
        S: LedgerStore + HealthCheckable + 'static,
    {
        let billing_config = config.billing_config()?;
        let currency = billing_config.currency;
        let ledger: Arc<dyn LedgerStore> = store.clone();

        Ok(Self {
            billing: Arc::new(BillingService::new(ledger.clone(), gateway, billing_config)),
            front_desk: Arc::new(FrontDeskService::new(ledger, currency)),
            health: store,
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/payments/gateway/callback", get(payments::gateway_callback));

    let reservation_routes = Router::new()
        .route(
            "/:id/folio",
            post(folios::open_folio).get(folios::get_reservation_folio),
        )
        .route("/:id/check-in", post(front_desk::check_in))
        .route("/:id/check-out", post(front_desk::check_out))
        .route("/:id/cancel", post(front_desk::cancel));

    let folio_routes = Router::new()
        .route("/:id", get(folios::get_statement))
        .route("/:id/charges", post(folios::post_charge))
        .route("/:id/payments", post(folios::record_payment));

    let payment_routes = Router::new()
        .route("/gateway/confirm", post(payments::confirm_gateway_payment))
        .route("/:reference/verify", post(payments::verify_payment));

    let metrics_routes = Router::new()
        .route("/:date", get(metrics::get_metrics))
        .route("/:date/refresh", post(metrics::refresh_metrics));

    let report_routes = Router::new().route("/accounting", get(reports::accounting_report));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/reservations", reservation_routes)
        .nest("/folios", folio_routes)
        .nest("/payments", payment_routes)
        .nest("/metrics", metrics_routes)
        .nest("/reports", report_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
