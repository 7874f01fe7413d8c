use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Currency, PaymentMethod};

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Standard JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Bad Request", "Conflict")
    #[schema(example = "Bad Request")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "currency mismatch: booking mixes MYR and USD")]
    pub message: String,
    /// Machine-readable error code for errors clients must branch on
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "AMOUNT_MISMATCH")]
    pub code: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("booking references an unknown catalog item: {0}")]
    ReferenceNotFound(String),

    #[error("currency mismatch: booking mixes {expected} and {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("booking total must be greater than zero")]
    NonPositiveTotal,

    #[error("amount {minor_units} is below the minimum chargeable amount")]
    AmountBelowMinimum { minor_units: i64 },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("charged amount {charged_minor} does not match expected amount {expected_minor}")]
    AmountMismatch {
        expected_minor: i64,
        charged_minor: i64,
    },

    #[error("settled currency {charged} does not match expected currency {expected}")]
    SettlementCurrencyMismatch { expected: Currency, charged: Currency },

    #[error("signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("no configured gateway supports payment method {0}")]
    NoConfiguredGateway(PaymentMethod),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ReferenceNotFound(_)
            | Self::CurrencyMismatch { .. }
            | Self::InvalidQuantity(_)
            | Self::NonPositiveTotal
            | Self::AmountBelowMinimum { .. }
            | Self::ValidationError(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_)
            | Self::AmountMismatch { .. }
            | Self::SettlementCurrencyMismatch { .. } => StatusCode::CONFLICT,
            Self::SignatureVerification(_) => StatusCode::UNAUTHORIZED,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::NoConfiguredGateway(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code for error kinds clients are expected to branch
    /// on. The confirmation-time mismatch codes are part of the public API.
    pub fn machine_code(&self) -> Option<&'static str> {
        match self {
            Self::ReferenceNotFound(_) => Some("INVALID_BOOKING_REFERENCE"),
            Self::CurrencyMismatch { .. } | Self::SettlementCurrencyMismatch { .. } => {
                Some("CURRENCY_MISMATCH")
            }
            Self::InvalidQuantity(_) => Some("INVALID_QUANTITY"),
            Self::NonPositiveTotal => Some("NON_POSITIVE_TOTAL"),
            Self::AmountBelowMinimum { .. } => Some("AMOUNT_BELOW_MINIMUM"),
            Self::AmountMismatch { .. } => Some("AMOUNT_MISMATCH"),
            Self::SignatureVerification(_) => Some("SIGNATURE_INVALID"),
            Self::NoConfiguredGateway(_) => Some("NO_CONFIGURED_GATEWAY"),
            _ => None,
        }
    }

    /// Message suitable for HTTP responses. Internal failures return generic
    /// text so implementation details never leak to clients.
    pub fn response_message(&self) -> String {
        match self {
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            Self::ReferenceNotFound(_) => {
                "invalid booking data: referenced item does not exist".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            code: self.machine_code().map(str::to_string),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
