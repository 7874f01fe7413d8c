//! Card/wallet adapter backed by Stripe PaymentIntents.
//!
//! Creation is synchronous and returns a client secret for client-side
//! confirmation; settlement status is polled through the retrieve endpoint.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::ServiceError;
use crate::models::currency::Currency;
use crate::models::payment::{
    GatewayKind, PaymentIntent, PaymentMethod, PaymentRequest, PaymentStatus,
};
use crate::services::payments::gateway::PaymentGateway;

const API_BASE: &str = "https://api.stripe.com";

const SUPPORTED_METHODS: [PaymentMethod; 5] = [
    PaymentMethod::Card,
    PaymentMethod::Alipay,
    PaymentMethod::WechatPay,
    PaymentMethod::GrabpayStripe,
    PaymentMethod::FpxStripe,
];

pub struct StripeGateway {
    secret_key: Option<String>,
    publishable_key: Option<String>,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct StripeIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
    amount: i64,
    currency: String,
}

fn map_stripe_status(status: &str) -> PaymentStatus {
    match status {
        "succeeded" => PaymentStatus::Completed,
        "canceled" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

/// Status we report when the provider cannot be consulted: the payment may
/// well have settled, so the client is told to re-check rather than that it
/// failed.
fn inconclusive_intent(payment_id: &str, reason: &str) -> PaymentIntent {
    PaymentIntent {
        id: payment_id.to_string(),
        gateway: GatewayKind::Stripe,
        status: PaymentStatus::Pending,
        amount_minor: None,
        currency: None,
        client_secret: None,
        redirect_url: None,
        qr_code: None,
        metadata: serde_json::json!({ "inconclusive": reason }),
    }
}

fn stripe_method_types(method: PaymentMethod) -> &'static [&'static str] {
    match method {
        PaymentMethod::Card => &["card"],
        PaymentMethod::Alipay => &["alipay"],
        PaymentMethod::WechatPay => &["wechat_pay"],
        PaymentMethod::GrabpayStripe => &["grabpay"],
        PaymentMethod::FpxStripe => &["fpx"],
        _ => &["card"],
    }
}

impl StripeGateway {
    pub fn new(
        secret_key: Option<String>,
        publishable_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client init failed: {e}")))?;
        Ok(Self {
            secret_key,
            publishable_key,
            http,
        })
    }

    fn secret_key(&self) -> Result<&str, ServiceError> {
        self.secret_key.as_deref().ok_or_else(|| {
            ServiceError::InternalError("stripe gateway invoked without credentials".to_string())
        })
    }

    fn intent_from_response(&self, response: StripeIntentResponse) -> PaymentIntent {
        let currency = Currency::from_str(&response.currency).ok();
        PaymentIntent {
            id: response.id.clone(),
            gateway: GatewayKind::Stripe,
            status: map_stripe_status(&response.status),
            amount_minor: Some(response.amount),
            currency,
            client_secret: response.client_secret,
            redirect_url: None,
            qr_code: None,
            metadata: serde_json::json!({
                "stripePaymentIntentId": response.id,
                "stripeStatus": response.status,
            }),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Stripe
    }

    fn supported_methods(&self) -> &[PaymentMethod] {
        &SUPPORTED_METHODS
    }

    fn is_configured(&self) -> bool {
        self.secret_key.is_some() && self.publishable_key.is_some()
    }

    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentIntent, ServiceError> {
        let secret = self.secret_key()?;

        let mut params: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            (
                "currency".to_string(),
                request.currency.code().to_lowercase(),
            ),
            (
                "description".to_string(),
                format!("Travel booking - {}", request.metadata.destination),
            ),
            ("metadata[gateway]".to_string(), "stripe".to_string()),
            (
                "metadata[original_method]".to_string(),
                request.method.to_string(),
            ),
            (
                "metadata[destination]".to_string(),
                request.metadata.destination.clone(),
            ),
            (
                "metadata[travelers]".to_string(),
                request.metadata.travelers.to_string(),
            ),
            (
                "metadata[date_range]".to_string(),
                format!(
                    "{}..{}",
                    request.metadata.start_date, request.metadata.end_date
                ),
            ),
            (
                "metadata[flights_subtotal]".to_string(),
                request.metadata.flights_subtotal.to_string(),
            ),
            (
                "metadata[hotels_subtotal]".to_string(),
                request.metadata.hotels_subtotal.to_string(),
            ),
            (
                "metadata[activities_subtotal]".to_string(),
                request.metadata.activities_subtotal.to_string(),
            ),
        ];
        for method_type in stripe_method_types(request.method) {
            params.push((
                "payment_method_types[]".to_string(),
                (*method_type).to_string(),
            ));
        }

        let response = self
            .http
            .post(format!("{API_BASE}/v1/payment_intents"))
            .bearer_auth(secret)
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("stripe request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body, "stripe payment intent creation failed");
            return Err(ServiceError::ExternalServiceError(format!(
                "stripe returned {status}"
            )));
        }

        let intent: StripeIntentResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("stripe response parse failed: {e}"))
        })?;

        info!(payment_intent_id = %intent.id, "created stripe payment intent");
        Ok(self.intent_from_response(intent))
    }

    async fn confirm_payment(&self, payment_id: &str) -> Result<PaymentIntent, ServiceError> {
        let secret = self.secret_key()?;

        let response = match self
            .http
            .get(format!("{API_BASE}/v1/payment_intents/{payment_id}"))
            .bearer_auth(secret)
            .send()
            .await
        {
            Ok(response) => response,
            // Transport trouble is inconclusive, not a failure: the provider
            // side may have settled. Report pending so the client re-checks.
            Err(e) if e.is_timeout() || e.is_connect() => {
                warn!(payment_id, "stripe status query unreachable; reporting pending");
                return Ok(inconclusive_intent(payment_id, "status query transport error"));
            }
            Err(e) => {
                return Err(ServiceError::ExternalServiceError(format!(
                    "stripe status query failed: {e}"
                )))
            }
        };

        if response.status().is_server_error() {
            warn!(payment_id, status = %response.status(), "stripe status query 5xx; reporting pending");
            return Ok(inconclusive_intent(payment_id, "provider 5xx"));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "stripe status query returned {}",
                response.status()
            )));
        }

        let intent: StripeIntentResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("stripe response parse failed: {e}"))
        })?;

        Ok(self.intent_from_response(intent))
    }
}
