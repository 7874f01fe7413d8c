use axum::{
    extract::{Form, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::models::booking::BookingDetails;
use crate::models::payment::{
    ConfirmationResult, GatewayKind, PaymentCreationResult, PaymentMethod, PaymentMethodInfo,
};
use crate::services::payments::razerpay::RazerCallback;
use crate::ApiResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    /// What is being purchased: identifiers and quantities only. Any prices
    /// in the payload are ignored; the server derives the amount itself.
    pub booking_details: BookingDetails,
    /// Client-chosen token scoping one logical payment attempt. Regenerated
    /// per fresh "Pay" press, reused only on retries of the same attempt.
    #[validate(length(min = 8, max = 128))]
    pub idempotency_key: String,
    #[serde(default = "default_method")]
    pub method: PaymentMethod,
}

fn default_method() -> PaymentMethod {
    PaymentMethod::Card
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 256))]
    pub payment_intent_id: String,
    /// The gateway that issued the intent; ids are gateway-scoped.
    #[serde(alias = "gatewayName")]
    pub gateway: GatewayKind,
    pub booking_details: BookingDetails,
}

/// Create a payment intent for a booking
#[utoipa::path(
    post,
    path = "/api/v1/payments/intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 201, description = "Payment intent created (or replayed)", body = crate::ApiResponse<PaymentCreationResult>),
        (status = 400, description = "Invalid booking data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Idempotency key already in flight", body = crate::errors::ErrorResponse),
        (status = 500, description = "No configured gateway", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway error", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentCreationResult>>), ServiceError> {
    request.validate()?;

    let result = state
        .payments
        .create_payment(
            &request.booking_details,
            request.method,
            &request.idempotency_key,
        )
        .await?;

    let status = if result.is_existing {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(ApiResponse::success(result))))
}

/// Confirm a payment and synthesize the booking record
#[utoipa::path(
    post,
    path = "/api/v1/payments/confirm",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Confirmation outcome", body = crate::ApiResponse<ConfirmationResult>),
        (status = 400, description = "Invalid booking data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Settled amount or currency mismatch", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway error", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<ApiResponse<ConfirmationResult>>, ServiceError> {
    request.validate()?;

    let result = state
        .payments
        .confirm_payment(
            &request.payment_intent_id,
            request.gateway,
            &request.booking_details,
        )
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// List payment methods currently servable
#[utoipa::path(
    get,
    path = "/api/v1/payments/methods",
    responses(
        (status = 200, description = "Methods whose owning gateway is configured", body = crate::ApiResponse<Vec<PaymentMethodInfo>>)
    ),
    tag = "Payments"
)]
pub async fn payment_methods(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PaymentMethodInfo>>>, ServiceError> {
    Ok(Json(ApiResponse::success(state.payments.available_methods())))
}

/// Inbound settlement callback from the redirect/QR aggregator.
///
/// The transport always receives 200 OK (anything else triggers provider
/// retries), but the payload is only trusted when its signature verifies.
/// Mis-signed callbacks are logged and dropped.
#[utoipa::path(
    post,
    path = "/api/v1/payments/callback/razerpay",
    responses((status = 200, description = "Callback received")),
    tag = "Payments"
)]
pub async fn razerpay_callback(
    State(state): State<AppState>,
    Form(callback): Form<RazerCallback>,
) -> (StatusCode, &'static str) {
    match state.razer.verify_callback(&callback) {
        Ok(true) => {
            info!(
                orderid = %callback.orderid,
                status = %callback.status,
                tran_id = callback.tran_id.as_deref().unwrap_or("-"),
                "verified razerpay callback"
            );
        }
        Ok(false) => {
            warn!(
                orderid = %callback.orderid,
                "dropping razerpay callback with invalid signature"
            );
        }
        Err(err) => {
            warn!(error = %err, "dropping razerpay callback; verification unavailable");
        }
    }
    (StatusCode::OK, "OK")
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/intent", post(create_payment_intent))
        .route("/confirm", post(confirm_payment))
        .route("/methods", get(payment_methods))
        .route("/callback/razerpay", post(razerpay_callback))
}
