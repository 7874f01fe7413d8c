//! Voyara API Library
//!
//! Travel booking backend: catalog search plus the secure payment subsystem
//! (server-side price derivation, gateway routing, idempotent intent
//! creation, settlement verification).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod tracing;

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use models::payment::GatewayKind;
use services::catalog::CatalogStore;
use services::payments::gateway::GatewayRouter;
use services::payments::razerpay::RazerPayGateway;
use services::payments::stripe::StripeGateway;
use services::payments::PaymentService;
use services::pricing::PriceCalculator;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub catalog: Arc<CatalogStore>,
    pub payments: Arc<PaymentService>,
    /// Kept concrete (in addition to its registry entry) so the callback
    /// handler can verify inbound signatures.
    pub razer: Arc<RazerPayGateway>,
}

impl AppState {
    /// Builds the full service graph: seeded catalog, both gateway
    /// adapters, the router (card/wallet processor as designated default),
    /// and the payment orchestrator.
    pub fn from_config(config: config::AppConfig) -> Result<Self, errors::ServiceError> {
        let catalog = Arc::new(CatalogStore::seeded());
        let timeout = config.gateway_timeout();

        let stripe = Arc::new(StripeGateway::new(
            config.stripe_secret_key.clone(),
            config.stripe_publishable_key.clone(),
            timeout,
        )?);
        let razer = Arc::new(RazerPayGateway::new(
            config.razer_merchant_id.clone(),
            config.razer_verify_key.clone(),
            config.razer_sandbox,
            config.app_url.clone(),
            timeout,
        )?);

        let mut router = GatewayRouter::new(GatewayKind::Stripe);
        router.register(stripe);
        router.register(razer.clone());

        let payments = Arc::new(PaymentService::new(
            PriceCalculator::new(catalog.clone()),
            router,
        ));

        Ok(Self {
            config,
            catalog,
            payments,
            razer,
        })
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/payments", handlers::payments::payment_routes())
        .merge(handlers::catalog::catalog_routes())
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "voyara-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "environment": std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string()),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let methods = state.payments.available_methods();
    let gateways_configured = {
        let mut kinds: Vec<&str> = methods.iter().map(|m| m.gateway.as_str()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds.len()
    };

    let health_data = json!({
        "status": "healthy",
        "checks": {
            "catalog": "healthy",
            "gateways_configured": gateways_configured,
            "payment_methods_available": methods.len(),
        },
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}
