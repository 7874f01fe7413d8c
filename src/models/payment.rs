//! Payment-domain types shared by the gateway adapters, the router and the
//! orchestrator.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::models::booking::BookingConfirmation;
use crate::models::currency::Currency;

/// Closed set of known gateways. Adapters are registered under these
/// identifiers at startup and resolved through the router; there is no
/// stringly-typed dispatch anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    Stripe,
    Razerpay,
}

impl GatewayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GatewayKind::Stripe => "stripe",
            GatewayKind::Razerpay => "razerpay",
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stripe" => Ok(GatewayKind::Stripe),
            "razerpay" => Ok(GatewayKind::Razerpay),
            other => Err(ServiceError::BadRequest(format!(
                "unknown payment gateway: {other}"
            ))),
        }
    }
}

/// Display category used by the payment-method picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MethodCategory {
    Card,
    Wallet,
    Banking,
    Qr,
}

/// All payment methods the platform understands. Which of these are
/// actually servable depends on which gateway adapters are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Alipay,
    WechatPay,
    GrabpayStripe,
    FpxStripe,
    Fpx,
    Tngd,
    Boost,
    Grabpay,
    Shopeepay,
    MaybankQr,
    DuitnowQr,
    Bigpay,
    Vcash,
    RazerPay,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Alipay => "alipay",
            PaymentMethod::WechatPay => "wechat_pay",
            PaymentMethod::GrabpayStripe => "grabpay_stripe",
            PaymentMethod::FpxStripe => "fpx_stripe",
            PaymentMethod::Fpx => "fpx",
            PaymentMethod::Tngd => "tngd",
            PaymentMethod::Boost => "boost",
            PaymentMethod::Grabpay => "grabpay",
            PaymentMethod::Shopeepay => "shopeepay",
            PaymentMethod::MaybankQr => "maybank_qr",
            PaymentMethod::DuitnowQr => "duitnow_qr",
            PaymentMethod::Bigpay => "bigpay",
            PaymentMethod::Vcash => "vcash",
            PaymentMethod::RazerPay => "razer_pay",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit/Debit Card",
            PaymentMethod::Alipay => "Alipay",
            PaymentMethod::WechatPay => "WeChat Pay",
            PaymentMethod::GrabpayStripe => "GrabPay (via Stripe)",
            PaymentMethod::FpxStripe => "FPX (via Stripe)",
            PaymentMethod::Fpx => "Online Banking (FPX)",
            PaymentMethod::Tngd => "Touch 'n Go eWallet",
            PaymentMethod::Boost => "Boost",
            PaymentMethod::Grabpay => "GrabPay",
            PaymentMethod::Shopeepay => "ShopeePay",
            PaymentMethod::MaybankQr => "Maybank QR",
            PaymentMethod::DuitnowQr => "DuitNow QR",
            PaymentMethod::Bigpay => "BigPay",
            PaymentMethod::Vcash => "vcash",
            PaymentMethod::RazerPay => "Razer Pay Wallet",
        }
    }

    pub fn category(self) -> MethodCategory {
        match self {
            PaymentMethod::Card => MethodCategory::Card,
            PaymentMethod::Fpx | PaymentMethod::FpxStripe => MethodCategory::Banking,
            PaymentMethod::MaybankQr | PaymentMethod::DuitnowQr => MethodCategory::Qr,
            _ => MethodCategory::Wallet,
        }
    }

    /// QR methods return a scan-to-pay payload instead of a redirect URL.
    pub fn is_qr(self) -> bool {
        self.category() == MethodCategory::Qr
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-state settlement model every provider vocabulary is translated
/// into. Transport timeouts map to `Pending`, never `Failed`: the provider
/// side may have succeeded and the client should re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Audit metadata attached to every provider-side payment object so a human
/// or reconciliation job can reconstruct what was charged for without
/// re-trusting the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingMetadata {
    pub destination: String,
    pub travelers: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub flights_subtotal: Decimal,
    pub hotels_subtotal: Decimal,
    pub activities_subtotal: Decimal,
}

/// What the orchestrator hands a gateway adapter. The amount is already in
/// the provider's smallest currency unit.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount_minor: i64,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub metadata: BookingMetadata,
}

/// A provider-side payment object. Identified by the gateway-scoped id plus
/// the gateway itself; raw ids from different gateways may collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub gateway: GatewayKind,
    pub status: PaymentStatus,
    /// Provider-reported amount in minor units; absent when the provider
    /// could not be reached (timeout → pending).
    pub amount_minor: Option<i64>,
    pub currency: Option<Currency>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub qr_code: Option<String>,
    pub metadata: serde_json::Value,
}

/// Client-facing result of payment-intent creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreationResult {
    pub payment_intent_id: String,
    pub gateway: GatewayKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    /// The server-derived authoritative amount, never a client number.
    pub calculated_amount: Decimal,
    pub currency: Currency,
    pub is_existing: bool,
}

/// Client-facing result of payment confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResult {
    pub success: bool,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingConfirmation>,
}

/// One servable payment method, as listed by `GET /payments/methods`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodInfo {
    pub method: PaymentMethod,
    pub gateway: GatewayKind,
    pub name: String,
    pub category: MethodCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_serde_uses_snake_case_tokens() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::DuitnowQr).unwrap(),
            "\"duitnow_qr\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"wechat_pay\"").unwrap();
        assert_eq!(parsed, PaymentMethod::WechatPay);
    }

    #[test]
    fn qr_methods_are_categorized() {
        assert!(PaymentMethod::MaybankQr.is_qr());
        assert!(PaymentMethod::DuitnowQr.is_qr());
        assert!(!PaymentMethod::Fpx.is_qr());
        assert_eq!(PaymentMethod::Fpx.category(), MethodCategory::Banking);
        assert_eq!(PaymentMethod::Card.category(), MethodCategory::Card);
        assert_eq!(PaymentMethod::Tngd.category(), MethodCategory::Wallet);
    }

    #[test]
    fn gateway_kind_round_trips() {
        assert_eq!(GatewayKind::from_str("stripe").unwrap(), GatewayKind::Stripe);
        assert_eq!(
            GatewayKind::from_str("RAZERPAY").unwrap(),
            GatewayKind::Razerpay
        );
        assert!(GatewayKind::from_str("paypal").is_err());
    }
}
