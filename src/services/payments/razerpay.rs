//! Redirect/QR adapter for Malaysian bank-transfer and e-wallet methods,
//! settled through the Razer Merchant Services aggregator.
//!
//! Every message exchanged with the aggregator is authenticated with a
//! keyed hash over its significant fields. Status responses and inbound
//! callbacks whose recomputed signature does not match are rejected
//! outright, whatever their claimed status says.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::models::currency::Currency;
use crate::models::payment::{
    GatewayKind, PaymentIntent, PaymentMethod, PaymentRequest, PaymentStatus,
};
use crate::services::payments::gateway::PaymentGateway;

type HmacSha256 = Hmac<Sha256>;

const SUPPORTED_METHODS: [PaymentMethod; 10] = [
    PaymentMethod::Fpx,
    PaymentMethod::Tngd,
    PaymentMethod::Boost,
    PaymentMethod::Grabpay,
    PaymentMethod::Shopeepay,
    PaymentMethod::MaybankQr,
    PaymentMethod::DuitnowQr,
    PaymentMethod::Bigpay,
    PaymentMethod::Vcash,
    PaymentMethod::RazerPay,
];

/// Inbound webhook payload. `skey` authenticates the other fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RazerCallback {
    #[serde(rename = "tranID", default)]
    pub tran_id: Option<String>,
    pub orderid: String,
    pub status: String,
    #[serde(default)]
    pub domain: Option<String>,
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub appcode: Option<String>,
    pub skey: String,
}

pub struct RazerPayGateway {
    merchant_id: Option<String>,
    verify_key: Option<String>,
    sandbox: bool,
    app_url: String,
    http: reqwest::Client,
}

fn keyed_hash(key: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC-SHA256 accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Aggregator status vocabulary: 00 settled, 11 failed, 22 pending.
pub(crate) fn map_razer_status(code: &str) -> PaymentStatus {
    match code {
        "00" => PaymentStatus::Completed,
        "11" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

fn razer_channel(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Fpx => "fpx",
        PaymentMethod::Tngd => "tngd",
        PaymentMethod::Boost => "boost",
        PaymentMethod::Grabpay => "grabpay",
        PaymentMethod::Shopeepay => "shopeepay",
        PaymentMethod::MaybankQr => "maybank2u",
        PaymentMethod::DuitnowQr => "duitnow",
        PaymentMethod::Bigpay => "bigpay",
        PaymentMethod::Vcash => "vcash",
        PaymentMethod::RazerPay => "razerpay",
        _ => "fpx",
    }
}

fn parse_status_response(raw: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in raw.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    fields
}

/// Status reported when the aggregator cannot be consulted: the payment
/// may have settled, so the client re-checks instead of being told it
/// failed.
fn inconclusive_intent(payment_id: &str, reason: &str) -> PaymentIntent {
    PaymentIntent {
        id: payment_id.to_string(),
        gateway: GatewayKind::Razerpay,
        status: PaymentStatus::Pending,
        amount_minor: None,
        currency: None,
        client_secret: None,
        redirect_url: None,
        qr_code: None,
        metadata: serde_json::json!({ "inconclusive": reason }),
    }
}

#[derive(Debug, Deserialize)]
struct QrResponse {
    #[serde(default)]
    qr_code_url: Option<String>,
    #[serde(default)]
    expiry_time: Option<String>,
}

impl RazerPayGateway {
    pub fn new(
        merchant_id: Option<String>,
        verify_key: Option<String>,
        sandbox: bool,
        app_url: String,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client init failed: {e}")))?;
        Ok(Self {
            merchant_id,
            verify_key,
            sandbox,
            app_url,
            http,
        })
    }

    fn api_base(&self) -> &'static str {
        if self.sandbox {
            "https://sandbox-pay.razer.com/RMS"
        } else {
            "https://pay.razer.com/RMS"
        }
    }

    fn credentials(&self) -> Result<(&str, &str), ServiceError> {
        match (self.merchant_id.as_deref(), self.verify_key.as_deref()) {
            (Some(merchant), Some(key)) => Ok((merchant, key)),
            _ => Err(ServiceError::InternalError(
                "razerpay gateway invoked without credentials".to_string(),
            )),
        }
    }

    /// Creation-time verification code over merchant + order + amount +
    /// currency.
    fn vcode(&self, order_id: &str, amount_minor: i64, currency: Currency) -> Result<String, ServiceError> {
        let (merchant, key) = self.credentials()?;
        Ok(keyed_hash(
            key,
            &format!("{merchant}{order_id}{amount_minor}{currency}"),
        ))
    }

    /// Query-time key over merchant + order.
    fn skey(&self, order_id: &str) -> Result<String, ServiceError> {
        let (merchant, key) = self.credentials()?;
        Ok(keyed_hash(key, &format!("{merchant}{order_id}")))
    }

    /// Signature the aggregator attaches to status responses and callbacks:
    /// merchant + order + status + amount + currency.
    fn status_signature(
        &self,
        order_id: &str,
        status: &str,
        amount: &str,
        currency: &str,
    ) -> Result<String, ServiceError> {
        let (merchant, key) = self.credentials()?;
        Ok(keyed_hash(
            key,
            &format!("{merchant}{order_id}{status}{amount}{currency}"),
        ))
    }

    /// Recomputes the callback signature and compares in constant time.
    pub fn verify_callback(&self, callback: &RazerCallback) -> Result<bool, ServiceError> {
        let expected = self.status_signature(
            &callback.orderid,
            &callback.status,
            &callback.amount,
            &callback.currency,
        )?;
        Ok(constant_time_eq(&expected, &callback.skey))
    }

    fn generate_order_id() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();
        format!("ORDER_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
    }
}

#[async_trait]
impl PaymentGateway for RazerPayGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Razerpay
    }

    fn supported_methods(&self) -> &[PaymentMethod] {
        &SUPPORTED_METHODS
    }

    fn is_configured(&self) -> bool {
        self.merchant_id.is_some() && self.verify_key.is_some()
    }

    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentIntent, ServiceError> {
        let (merchant, _) = self.credentials()?;
        let order_id = Self::generate_order_id();
        let amount = request.amount_minor.to_string();
        let vcode = self.vcode(&order_id, request.amount_minor, request.currency)?;
        let channel = razer_channel(request.method);

        let params: Vec<(&str, String)> = vec![
            ("merchant_id", merchant.to_string()),
            ("orderid", order_id.clone()),
            ("amount", amount),
            ("currency", request.currency.code().to_string()),
            ("channel", channel.to_string()),
            ("point", request.method.is_qr().to_string()),
            ("vcode", vcode),
            ("return_url", format!("{}/payment/success", self.app_url)),
            (
                "callback_url",
                format!("{}/api/v1/payments/callback/razerpay", self.app_url),
            ),
            ("cancel_url", format!("{}/payment/cancel", self.app_url)),
            ("bill_name", "Travel Booking".to_string()),
            (
                "bill_desc",
                format!("Travel booking to {}", request.metadata.destination),
            ),
            ("country", "MY".to_string()),
        ];

        let metadata = serde_json::json!({
            "razerOrderId": order_id,
            "channel": channel,
            "paymentMethod": request.method,
            "destination": request.metadata.destination,
            "travelers": request.metadata.travelers,
            "dateRange": format!(
                "{}..{}",
                request.metadata.start_date, request.metadata.end_date
            ),
            "flightsSubtotal": request.metadata.flights_subtotal,
            "hotelsSubtotal": request.metadata.hotels_subtotal,
            "activitiesSubtotal": request.metadata.activities_subtotal,
        });

        if request.method.is_qr() {
            let response = self
                .http
                .post(format!("{}/qr_pay.php", self.api_base()))
                .form(&params)
                .send()
                .await
                .map_err(|e| {
                    ServiceError::ExternalServiceError(format!("razerpay qr request failed: {e}"))
                })?;

            if !response.status().is_success() {
                return Err(ServiceError::ExternalServiceError(format!(
                    "razerpay qr endpoint returned {}",
                    response.status()
                )));
            }

            let qr: QrResponse = response.json().await.map_err(|e| {
                ServiceError::ExternalServiceError(format!("razerpay qr parse failed: {e}"))
            })?;
            let qr_code = qr.qr_code_url.ok_or_else(|| {
                ServiceError::ExternalServiceError(
                    "razerpay qr response carried no payload".to_string(),
                )
            })?;

            info!(order_id = %order_id, channel, "created razerpay qr payment");
            let mut metadata = metadata;
            if let Some(expiry) = qr.expiry_time {
                metadata["qrExpiryTime"] = serde_json::Value::String(expiry);
            }
            return Ok(PaymentIntent {
                id: order_id,
                gateway: GatewayKind::Razerpay,
                status: PaymentStatus::Pending,
                amount_minor: Some(request.amount_minor),
                currency: Some(request.currency),
                client_secret: None,
                redirect_url: None,
                qr_code: Some(qr_code),
                metadata,
            });
        }

        // Redirect flows (FPX, e-wallets): the client is sent to the
        // aggregator's hosted payment page.
        let mut redirect = url::Url::parse(&format!("{}/pay/{merchant}", self.api_base()))
            .map_err(|e| ServiceError::InternalError(format!("redirect url build failed: {e}")))?;
        {
            let mut query = redirect.query_pairs_mut();
            for (key, value) in &params {
                query.append_pair(key, value);
            }
        }

        info!(order_id = %order_id, channel, "created razerpay redirect payment");
        Ok(PaymentIntent {
            id: order_id,
            gateway: GatewayKind::Razerpay,
            status: PaymentStatus::Pending,
            amount_minor: Some(request.amount_minor),
            currency: Some(request.currency),
            client_secret: None,
            redirect_url: Some(redirect.to_string()),
            qr_code: None,
            metadata,
        })
    }

    async fn confirm_payment(&self, payment_id: &str) -> Result<PaymentIntent, ServiceError> {
        let (merchant, _) = self.credentials()?;
        let skey = self.skey(payment_id)?;

        let response = match self
            .http
            .post(format!("{}/query_status.php", self.api_base()))
            .form(&[
                ("merchant_id", merchant.to_string()),
                ("orderid", payment_id.to_string()),
                ("skey", skey),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() => {
                warn!(payment_id, "razerpay status query unreachable; reporting pending");
                return Ok(inconclusive_intent(payment_id, "status query transport error"));
            }
            Err(e) => {
                return Err(ServiceError::ExternalServiceError(format!(
                    "razerpay status query failed: {e}"
                )))
            }
        };

        if response.status().is_server_error() {
            warn!(payment_id, status = %response.status(), "razerpay status query 5xx; reporting pending");
            return Ok(inconclusive_intent(payment_id, "provider 5xx"));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "razerpay status query returned {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("razerpay status read failed: {e}"))
        })?;
        let fields = parse_status_response(&body);

        let field = |name: &str| -> Result<&String, ServiceError> {
            fields.get(name).ok_or_else(|| {
                ServiceError::ExternalServiceError(format!(
                    "razerpay status response missing {name}"
                ))
            })
        };

        let status_code = field("status_code")?.clone();
        let amount = field("amount")?.clone();
        let currency_raw = field("currency")?.clone();
        let signature = field("vcode")?.clone();

        // The response's own signature covers the status, amount and
        // currency. Reject on mismatch no matter what the status claims.
        let expected = self.status_signature(payment_id, &status_code, &amount, &currency_raw)?;
        if !constant_time_eq(&expected, &signature) {
            error!(payment_id, "razerpay status response failed signature verification");
            return Err(ServiceError::SignatureVerification(
                "razerpay status response signature mismatch".to_string(),
            ));
        }

        let amount_minor: i64 = amount.parse().map_err(|_| {
            ServiceError::ExternalServiceError(format!(
                "razerpay reported a non-numeric amount: {amount}"
            ))
        })?;
        let currency = currency_raw.parse::<Currency>().ok();

        Ok(PaymentIntent {
            id: payment_id.to_string(),
            gateway: GatewayKind::Razerpay,
            status: map_razer_status(&status_code),
            amount_minor: Some(amount_minor),
            currency,
            client_secret: None,
            redirect_url: None,
            qr_code: None,
            metadata: serde_json::json!({
                "razerStatus": status_code,
                "razerMessage": fields.get("status_message"),
                "transactionId": fields.get("tranID"),
            }),
        })
    }
}
