//! End-to-end tests for the payment surface: intent creation with
//! server-derived amounts, idempotent replays, settlement verification,
//! method listing, routing, and callback signature handling.

mod common;

use axum::http::Method;
use common::{booking_details, response_json, TestApp};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;
use voyara_api::models::payment::PaymentStatus;
use voyara_api::models::Currency;

#[tokio::test]
async fn creates_intent_with_server_derived_amount() {
    let app = TestApp::new();
    let (outbound, ret, hotel) = app.seed_worked_example();

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/intent",
            Some(json!({
                "bookingDetails": booking_details(outbound, ret, hotel, 2),
                "idempotencyKey": "payment_1700000000_abc123xyz",
                "method": "card"
            })),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["calculatedAmount"], json!("1495.00"));
    assert_eq!(body["data"]["currency"], json!("MYR"));
    assert_eq!(body["data"]["isExisting"], json!(false));
    assert!(body["data"]["clientSecret"].is_string());

    // The gateway was asked for exactly the derived minor-unit amount,
    // not anything the client claimed.
    let created = app.gateway.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount_minor, 149500);
}

#[tokio::test]
async fn replayed_idempotency_key_returns_existing_intent() {
    let app = TestApp::new();
    let (outbound, ret, hotel) = app.seed_worked_example();
    let payload = json!({
        "bookingDetails": booking_details(outbound, ret, hotel, 2),
        "idempotencyKey": "payment_1700000000_replayme",
        "method": "card"
    });

    let first = app
        .request(Method::POST, "/api/v1/payments/intent", Some(payload.clone()))
        .await;
    assert_eq!(first.status(), 201);
    let first = response_json(first).await;

    let second = app
        .request(Method::POST, "/api/v1/payments/intent", Some(payload))
        .await;
    assert_eq!(second.status(), 200);
    let second = response_json(second).await;

    assert_eq!(second["data"]["isExisting"], json!(true));
    assert_eq!(
        second["data"]["paymentIntentId"],
        first["data"]["paymentIntentId"]
    );
    assert_eq!(app.gateway.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_reference_is_a_400_with_machine_code() {
    let app = TestApp::new();
    let (_, ret, hotel) = app.seed_worked_example();

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/intent",
            Some(json!({
                "bookingDetails": booking_details(Uuid::new_v4(), ret, hotel, 2),
                "idempotencyKey": "payment_1700000000_stale",
                "method": "card"
            })),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["code"], json!("INVALID_BOOKING_REFERENCE"));
}

#[tokio::test]
async fn cross_currency_intent_is_rejected() {
    let app = TestApp::new();
    let (outbound, ret, _) = app.seed_worked_example();
    let usd_hotel = app
        .catalog
        .insert_hotel(common::hotel_fixture(Decimal::new(32000, 2), Currency::Usd));

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/intent",
            Some(json!({
                "bookingDetails": booking_details(outbound, ret, usd_hotel, 2),
                "idempotencyKey": "payment_1700000000_mixed",
                "method": "card"
            })),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["code"], json!("CURRENCY_MISMATCH"));
}

#[tokio::test]
async fn confirmation_accepts_exact_settlement_and_builds_booking() {
    let app = TestApp::new();
    let (outbound, ret, hotel) = app.seed_worked_example();
    let details = booking_details(outbound, ret, hotel, 2);

    let created = app
        .request(
            Method::POST,
            "/api/v1/payments/intent",
            Some(json!({
                "bookingDetails": details.clone(),
                "idempotencyKey": "payment_1700000000_confirm",
                "method": "card"
            })),
        )
        .await;
    let created = response_json(created).await;
    let intent_id = created["data"]["paymentIntentId"].as_str().unwrap();

    app.gateway
        .settle(PaymentStatus::Completed, 149500, Currency::Myr);

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/confirm",
            Some(json!({
                "paymentIntentId": intent_id,
                "gateway": "stripe",
                "bookingDetails": details
            })),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("completed"));
    assert_eq!(body["data"]["booking"]["amount"], json!("1495.00"));
    assert_eq!(body["data"]["booking"]["currency"], json!("MYR"));
    assert_eq!(body["data"]["booking"]["paymentIntentId"], json!(intent_id));
}

#[tokio::test]
async fn confirmation_rejects_single_minor_unit_drift() {
    let app = TestApp::new();
    let (outbound, ret, hotel) = app.seed_worked_example();
    let details = booking_details(outbound, ret, hotel, 2);

    let created = app
        .request(
            Method::POST,
            "/api/v1/payments/intent",
            Some(json!({
                "bookingDetails": details.clone(),
                "idempotencyKey": "payment_1700000000_drift",
                "method": "card"
            })),
        )
        .await;
    let created = response_json(created).await;
    let intent_id = created["data"]["paymentIntentId"].as_str().unwrap();

    app.gateway
        .settle(PaymentStatus::Completed, 149499, Currency::Myr);

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/confirm",
            Some(json!({
                "paymentIntentId": intent_id,
                "gateway": "stripe",
                "bookingDetails": details
            })),
        )
        .await;

    assert_eq!(response.status(), 409);
    let body = response_json(response).await;
    assert_eq!(body["code"], json!("AMOUNT_MISMATCH"));
}

#[tokio::test]
async fn pending_settlement_reports_no_booking() {
    let app = TestApp::new();
    let (outbound, ret, hotel) = app.seed_worked_example();
    let details = booking_details(outbound, ret, hotel, 2);

    let created = app
        .request(
            Method::POST,
            "/api/v1/payments/intent",
            Some(json!({
                "bookingDetails": details.clone(),
                "idempotencyKey": "payment_1700000000_pending",
                "method": "card"
            })),
        )
        .await;
    let created = response_json(created).await;
    let intent_id = created["data"]["paymentIntentId"].as_str().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/confirm",
            Some(json!({
                "paymentIntentId": intent_id,
                "gateway": "stripe",
                "bookingDetails": details
            })),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["success"], json!(false));
    assert_eq!(body["data"]["status"], json!("pending"));
    assert!(body["data"]["booking"].is_null());
}

#[tokio::test]
async fn method_listing_only_covers_configured_gateways() {
    let app = TestApp::new();

    let response = app
        .request(Method::GET, "/api/v1/payments/methods", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let methods = body["data"].as_array().unwrap();

    assert!(!methods.is_empty());
    assert!(methods.iter().all(|m| m["gateway"] == json!("stripe")));
    assert!(methods.iter().any(|m| m["method"] == json!("card")));
    // Razer-owned methods are absent while the adapter has no credentials
    assert!(!methods.iter().any(|m| m["method"] == json!("duitnow_qr")));
}

#[tokio::test]
async fn exclusive_method_without_its_gateway_is_a_routing_error() {
    let app = TestApp::new();
    let (outbound, ret, hotel) = app.seed_worked_example();

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/intent",
            Some(json!({
                "bookingDetails": booking_details(outbound, ret, hotel, 2),
                "idempotencyKey": "payment_1700000000_duitnow",
                "method": "duitnow_qr"
            })),
        )
        .await;

    // The configured card processor never serves a QR-exclusive method.
    assert_eq!(response.status(), 500);
    let body = response_json(response).await;
    assert_eq!(body["code"], json!("NO_CONFIGURED_GATEWAY"));
    assert!(app.gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn callback_with_valid_signature_is_accepted() {
    let app = TestApp::with_razer_credentials();
    let skey = common::razer_callback_signature("ORDER_77", "00", "149500", "MYR");

    let response = app
        .form(
            "/api/v1/payments/callback/razerpay",
            format!(
                "tranID=99812&orderid=ORDER_77&status=00&amount=149500&currency=MYR&skey={skey}"
            ),
        )
        .await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn tampered_callback_is_dropped_but_still_acknowledged() {
    let app = TestApp::with_razer_credentials();
    let skey = common::razer_callback_signature("ORDER_77", "00", "149500", "MYR");

    // Amount altered after signing; transport still gets 200 so the
    // provider stops retrying, but the payload is never actioned.
    let response = app
        .form(
            "/api/v1/payments/callback/razerpay",
            format!("tranID=99812&orderid=ORDER_77&status=00&amount=1&currency=MYR&skey={skey}"),
        )
        .await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn status_and_health_respond() {
    let app = TestApp::new();

    let status = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(status.status(), 200);
    let body = response_json(status).await;
    assert_eq!(body["data"]["service"], json!("voyara-api"));

    let health = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(health.status(), 200);
    let body = response_json(health).await;
    assert_eq!(body["data"]["status"], json!("healthy"));
}

#[tokio::test]
async fn catalog_surface_serves_seeded_inventory() {
    let app = TestApp::new();

    let activities = app
        .request(Method::GET, "/api/v1/activities/Da%20Nang", None)
        .await;
    assert_eq!(activities.status(), 200);
    let body = response_json(activities).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let hotels = app
        .request(
            Method::GET,
            "/api/v1/hotels/search/Hoi%20An/2025-10-25/2025-10-30",
            None,
        )
        .await;
    assert_eq!(hotels.status(), 200);
    let body = response_json(hotels).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let missing = app
        .request(
            Method::GET,
            &format!("/api/v1/itineraries/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn flight_search_returns_bookable_fares() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::GET,
            "/api/v1/flights?destination=hoi-an-da-nang&startDate=2025-10-25&endDate=2025-10-30&travelers=2&currency=MYR",
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let fares = body["data"]["outboundFlights"].as_array().unwrap();
    assert_eq!(fares.len(), 5);

    // A returned fare id can immediately be referenced by a booking intent.
    let fare_id: Uuid = fares[0]["id"].as_str().unwrap().parse().unwrap();
    assert!(app.catalog.get_flight(fare_id).is_some());
}
