//! Shared fixture for HTTP-level tests: the full `/api/v1` router backed by
//! a controllable in-process gateway, a real (sandbox-configured or
//! unconfigured) redirect/QR adapter, and a seeded catalog.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde_json::Value;
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use voyara_api::config::AppConfig;
use voyara_api::errors::ServiceError;
use voyara_api::models::catalog::{Activity, Flight, Hotel};
use voyara_api::models::payment::{
    GatewayKind, PaymentIntent, PaymentMethod, PaymentRequest, PaymentStatus,
};
use voyara_api::models::Currency;
use voyara_api::services::catalog::CatalogStore;
use voyara_api::services::payments::gateway::{GatewayRouter, PaymentGateway};
use voyara_api::services::payments::razerpay::RazerPayGateway;
use voyara_api::services::payments::PaymentService;
use voyara_api::services::pricing::PriceCalculator;
use voyara_api::AppState;

pub const RAZER_MERCHANT: &str = "MERCHANT123";
pub const RAZER_VERIFY_KEY: &str = "verify-key-abc";

/// Controllable card/wallet gateway standing in for the real processor.
pub struct FakeGateway {
    pub settled: Mutex<Option<(PaymentStatus, i64, Currency)>>,
    pub created: Mutex<Vec<PaymentRequest>>,
    pub fail_create: AtomicBool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            settled: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
        }
    }

    pub fn settle(&self, status: PaymentStatus, amount_minor: i64, currency: Currency) {
        *self.settled.lock().unwrap() = Some((status, amount_minor, currency));
    }
}

const FAKE_METHODS: [PaymentMethod; 5] = [
    PaymentMethod::Card,
    PaymentMethod::Alipay,
    PaymentMethod::WechatPay,
    PaymentMethod::GrabpayStripe,
    PaymentMethod::FpxStripe,
];

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Stripe
    }

    fn supported_methods(&self) -> &[PaymentMethod] {
        &FAKE_METHODS
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentIntent, ServiceError> {
        if self.fail_create.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ServiceError::ExternalServiceError(
                "fake gateway rejected the request".to_string(),
            ));
        }
        self.created.lock().unwrap().push(request.clone());
        let count = self.created.lock().unwrap().len();
        Ok(PaymentIntent {
            id: format!("pi_fake_{count}"),
            gateway: GatewayKind::Stripe,
            status: PaymentStatus::Pending,
            amount_minor: Some(request.amount_minor),
            currency: Some(request.currency),
            client_secret: Some(format!("pi_fake_{count}_secret")),
            redirect_url: None,
            qr_code: None,
            metadata: serde_json::json!({}),
        })
    }

    async fn confirm_payment(&self, payment_id: &str) -> Result<PaymentIntent, ServiceError> {
        let (status, amount_minor, currency) = self
            .settled
            .lock()
            .unwrap()
            .unwrap_or((PaymentStatus::Pending, 0, Currency::Myr));
        Ok(PaymentIntent {
            id: payment_id.to_string(),
            gateway: GatewayKind::Stripe,
            status,
            amount_minor: Some(amount_minor),
            currency: Some(currency),
            client_secret: None,
            redirect_url: None,
            qr_code: None,
            metadata: serde_json::json!({}),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<CatalogStore>,
    pub gateway: Arc<FakeGateway>,
}

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "development".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        app_url: "http://localhost:5000".to_string(),
        gateway_timeout_secs: 5,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        cors_allow_credentials: false,
        stripe_secret_key: None,
        stripe_publishable_key: None,
        razer_merchant_id: None,
        razer_verify_key: None,
        razer_sandbox: true,
    }
}

impl TestApp {
    /// Fake card/wallet gateway configured; redirect/QR adapter registered
    /// but unconfigured (no credentials).
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Same, but the redirect/QR adapter carries sandbox credentials so
    /// callback signatures can be verified.
    pub fn with_razer_credentials() -> Self {
        Self::build(true)
    }

    fn build(razer_configured: bool) -> Self {
        let catalog = Arc::new(CatalogStore::seeded());
        let gateway = Arc::new(FakeGateway::new());

        let (merchant, key) = if razer_configured {
            (
                Some(RAZER_MERCHANT.to_string()),
                Some(RAZER_VERIFY_KEY.to_string()),
            )
        } else {
            (None, None)
        };
        let razer = Arc::new(
            RazerPayGateway::new(
                merchant,
                key,
                true,
                "http://localhost:5000".to_string(),
                Duration::from_secs(5),
            )
            .unwrap(),
        );

        let mut router = GatewayRouter::new(GatewayKind::Stripe);
        router.register(gateway.clone());
        router.register(razer.clone());

        let payments = Arc::new(PaymentService::new(
            PriceCalculator::new(catalog.clone()),
            router,
        ));

        let state = AppState {
            config: test_config(),
            catalog: catalog.clone(),
            payments,
            razer,
        };

        let router = Router::new()
            .nest("/api/v1", voyara_api::api_v1_routes())
            .layer(axum::middleware::from_fn(
                voyara_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(state);

        Self {
            router,
            catalog,
            gateway,
        }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn form(&self, path: &str, body: String) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Seeds a known-price booking: outbound 420.00 MYR, return 435.00
    /// MYR, hotel 320.00 MYR/night. Total over 2 nights: 1495.00 MYR.
    pub fn seed_worked_example(&self) -> (Uuid, Uuid, Uuid) {
        let outbound = self
            .catalog
            .insert_flight(flight_fixture(Decimal::new(42000, 2), Currency::Myr));
        let ret = self
            .catalog
            .insert_flight(flight_fixture(Decimal::new(43500, 2), Currency::Myr));
        let hotel = self
            .catalog
            .insert_hotel(hotel_fixture(Decimal::new(32000, 2), Currency::Myr));
        (outbound, ret, hotel)
    }
}

pub fn flight_fixture(price: Decimal, currency: Currency) -> Flight {
    Flight {
        id: Uuid::new_v4(),
        airline: "Test Air".to_string(),
        flight_number: "TA100".to_string(),
        origin: "PEN".to_string(),
        destination: "DAD".to_string(),
        departure_time: "08:00".to_string(),
        arrival_time: "12:00".to_string(),
        departure_date: chrono::NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
        arrival_date: chrono::NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
        duration: "4h".to_string(),
        stops: "Direct".to_string(),
        layover_duration: None,
        layover_location: None,
        price,
        currency,
    }
}

pub fn hotel_fixture(price_per_night: Decimal, currency: Currency) -> Hotel {
    Hotel {
        id: Uuid::new_v4(),
        name: "Test Hotel".to_string(),
        location: "Beach".to_string(),
        city: "Da Nang".to_string(),
        price_per_night,
        currency,
        rating: "4.5".to_string(),
        review_count: 10,
        distance_to_beach: "50m".to_string(),
        distance_to_landmark: "1km".to_string(),
        amenities: vec![],
        image_url: String::new(),
    }
}

#[allow(dead_code)]
pub fn activity_fixture(price: Decimal, currency: Currency) -> Activity {
    Activity {
        id: Uuid::new_v4(),
        name: "Test Activity".to_string(),
        city: "Da Nang".to_string(),
        description: String::new(),
        duration: "2h".to_string(),
        price,
        currency,
        category: "Nature".to_string(),
        image_url: String::new(),
    }
}

/// The booking-wizard payload for the worked example.
pub fn booking_details(outbound: Uuid, ret: Uuid, hotel: Uuid, nights: u32) -> Value {
    serde_json::json!({
        "destination": "hoi-an-da-nang",
        "travelers": 2,
        "dates": {
            "startDate": "2025-10-25",
            "endDate": "2025-10-27",
            "duration": 3
        },
        "flights": {
            "outbound": { "id": outbound.to_string(), "price": "999.99", "currency": "MYR" },
            "return": { "id": ret.to_string(), "price": "999.99", "currency": "MYR" }
        },
        "hotels": {
            "selectedHotels": [{
                "id": hotel.to_string(),
                "pricePerNight": "1.00",
                "nights": nights
            }]
        }
    })
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Recomputes the aggregator's callback signature the way the provider
/// would sign it.
pub fn razer_callback_signature(
    order_id: &str,
    status: &str,
    amount: &str,
    currency: &str,
) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(RAZER_VERIFY_KEY.as_bytes()).unwrap();
    mac.update(format!("{RAZER_MERCHANT}{order_id}{status}{amount}{currency}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
