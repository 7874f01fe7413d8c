//! Payment orchestration.
//!
//! `PaymentService` is the façade the HTTP boundary talks to. On creation it
//! sequences idempotency check → price computation → gateway routing →
//! intent creation; on confirmation it refreshes provider status, recomputes
//! the total from current catalog state, and accepts the payment only when
//! the settled amount matches the recomputation exactly. Every validation
//! runs before any network call to a provider: the system never asks a
//! gateway to charge an amount it has not first derived from the catalog.

pub mod gateway;
pub mod idempotency;
pub mod razerpay;
pub mod stripe;

use chrono::Utc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::booking::{BookingConfirmation, BookingDetails, BookingIntent};
use crate::models::currency::{to_minor_units, MIN_CHARGE_MINOR_UNITS};
use crate::models::payment::{
    BookingMetadata, ConfirmationResult, GatewayKind, PaymentCreationResult, PaymentMethod,
    PaymentMethodInfo, PaymentRequest, PaymentStatus,
};
use crate::services::pricing::PriceCalculator;

use gateway::GatewayRouter;
use idempotency::IdempotencyLedger;

pub struct PaymentService {
    calculator: PriceCalculator,
    router: GatewayRouter,
    ledger: IdempotencyLedger,
}

impl PaymentService {
    pub fn new(calculator: PriceCalculator, router: GatewayRouter) -> Self {
        Self {
            calculator,
            router,
            ledger: IdempotencyLedger::new(),
        }
    }

    /// Creates a payment intent for a booking, or returns the previously
    /// created one when the idempotency key has already been used.
    #[instrument(skip(self, details), fields(method = %method))]
    pub async fn create_payment(
        &self,
        details: &BookingDetails,
        method: PaymentMethod,
        idempotency_key: &str,
    ) -> Result<PaymentCreationResult, ServiceError> {
        let intent = details.normalize()?;

        if let Some(existing) = self.ledger.check_or_reserve(idempotency_key, method)? {
            info!(
                payment_intent_id = %existing.payment_intent_id,
                "idempotency key replay; returning existing intent"
            );
            return Ok(PaymentCreationResult {
                is_existing: true,
                ..existing
            });
        }

        match self.create_new_intent(&intent, method).await {
            Ok(result) => {
                self.ledger.record(idempotency_key, method, result.clone());
                Ok(result)
            }
            Err(err) => {
                // Free the key so the client can retry this logical attempt.
                self.ledger.release(idempotency_key, method);
                Err(err)
            }
        }
    }

    async fn create_new_intent(
        &self,
        intent: &BookingIntent,
        method: PaymentMethod,
    ) -> Result<PaymentCreationResult, ServiceError> {
        let computed = self.calculator.compute_total(intent)?;
        let amount_minor = to_minor_units(computed.amount, computed.currency)?;
        if amount_minor < MIN_CHARGE_MINOR_UNITS {
            return Err(ServiceError::AmountBelowMinimum {
                minor_units: amount_minor,
            });
        }

        let gateway = self.router.select_for_method(method)?;
        let request = PaymentRequest {
            amount_minor,
            currency: computed.currency,
            method,
            metadata: BookingMetadata {
                destination: intent.destination.clone(),
                travelers: intent.travelers,
                start_date: intent.dates.start_date,
                end_date: intent.dates.end_date,
                flights_subtotal: computed.flights_subtotal,
                hotels_subtotal: computed.hotels_subtotal,
                activities_subtotal: computed.activities_subtotal,
            },
        };

        let provider_intent = gateway.create_payment(&request).await?;
        info!(
            payment_intent_id = %provider_intent.id,
            gateway = %provider_intent.gateway,
            amount_minor,
            currency = %computed.currency,
            "created payment intent"
        );

        Ok(PaymentCreationResult {
            payment_intent_id: provider_intent.id,
            gateway: provider_intent.gateway,
            client_secret: provider_intent.client_secret,
            redirect_url: provider_intent.redirect_url,
            qr_code: provider_intent.qr_code,
            calculated_amount: computed.amount,
            currency: computed.currency,
            is_existing: false,
        })
    }

    /// Verifies a settled payment against a fresh recomputation of the
    /// booking total. The creation-time amount is never reused: only the
    /// comparison between the provider-reported charge and the recomputed
    /// total decides acceptance.
    #[instrument(skip(self, details), fields(gateway = %gateway))]
    pub async fn confirm_payment(
        &self,
        payment_intent_id: &str,
        gateway: GatewayKind,
        details: &BookingDetails,
    ) -> Result<ConfirmationResult, ServiceError> {
        let intent = details.normalize()?;
        let adapter = self.router.get(gateway)?;
        let provider = adapter.confirm_payment(payment_intent_id).await?;

        if provider.status != PaymentStatus::Completed {
            info!(
                payment_intent_id,
                status = %provider.status,
                "payment not settled; no booking created"
            );
            return Ok(ConfirmationResult {
                success: false,
                status: provider.status,
                booking: None,
            });
        }

        let computed = self.calculator.compute_total(&intent)?;
        let expected_minor = to_minor_units(computed.amount, computed.currency)?;

        let charged_minor = provider.amount_minor.ok_or_else(|| {
            ServiceError::ExternalServiceError(
                "provider reported a settled payment without an amount".to_string(),
            )
        })?;
        let charged_currency = provider.currency.ok_or_else(|| {
            ServiceError::ExternalServiceError(
                "provider reported a settled payment without a currency".to_string(),
            )
        })?;

        if charged_currency != computed.currency {
            error!(
                payment_intent_id,
                expected = %computed.currency,
                charged = %charged_currency,
                "settlement currency does not match recomputed total; rejecting confirmation"
            );
            return Err(ServiceError::SettlementCurrencyMismatch {
                expected: computed.currency,
                charged: charged_currency,
            });
        }

        if charged_minor != expected_minor {
            error!(
                payment_intent_id,
                expected_minor,
                charged_minor,
                "settled amount does not match recomputed total; rejecting confirmation"
            );
            return Err(ServiceError::AmountMismatch {
                expected_minor,
                charged_minor,
            });
        }

        let booking = BookingConfirmation {
            booking_id: Uuid::new_v4(),
            destination: intent.destination.clone(),
            travelers: intent.travelers,
            start_date: intent.dates.start_date,
            end_date: intent.dates.end_date,
            amount: computed.amount,
            currency: computed.currency,
            gateway,
            payment_intent_id: payment_intent_id.to_string(),
            confirmed_at: Utc::now(),
        };
        info!(booking_id = %booking.booking_id, payment_intent_id, "booking confirmed");

        Ok(ConfirmationResult {
            success: true,
            status: PaymentStatus::Completed,
            booking: Some(booking),
        })
    }

    pub fn available_methods(&self) -> Vec<PaymentMethodInfo> {
        self.router.available_methods()
    }
}

#[cfg(test)]
mod tests {
    use super::gateway::test_support::FakeGateway;
    use super::*;
    use crate::models::booking::{FlightRef, FlightSelection, HotelRef, HotelSelection, TripDates};
    use crate::models::catalog::{Flight, Hotel};
    use crate::models::Currency;
    use crate::services::catalog::CatalogStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn flight(price: Decimal) -> Flight {
        Flight {
            id: Uuid::new_v4(),
            airline: "Test Air".to_string(),
            flight_number: "TA1".to_string(),
            origin: "PEN".to_string(),
            destination: "DAD".to_string(),
            departure_time: "08:00".to_string(),
            arrival_time: "12:00".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            arrival_date: NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            duration: "4h".to_string(),
            stops: "Direct".to_string(),
            layover_duration: None,
            layover_location: None,
            price,
            currency: Currency::Myr,
        }
    }

    fn hotel(price_per_night: Decimal) -> Hotel {
        Hotel {
            id: Uuid::new_v4(),
            name: "Test Hotel".to_string(),
            location: "Beach".to_string(),
            city: "Da Nang".to_string(),
            price_per_night,
            currency: Currency::Myr,
            rating: "4.5".to_string(),
            review_count: 1,
            distance_to_beach: "50m".to_string(),
            distance_to_landmark: "1km".to_string(),
            amenities: vec![],
            image_url: String::new(),
        }
    }

    struct Fixture {
        catalog: Arc<CatalogStore>,
        stripe: Arc<FakeGateway>,
        service: PaymentService,
        details: BookingDetails,
    }

    /// Catalog priced so the booking totals 420 + 435 + 320 x 2 nights
    /// = 1495.00 MYR (149500 minor units).
    fn fixture() -> Fixture {
        let catalog = Arc::new(CatalogStore::new());
        let outbound = catalog.insert_flight(flight(dec!(420.00)));
        let ret = catalog.insert_flight(flight(dec!(435.00)));
        let stay = catalog.insert_hotel(hotel(dec!(320.00)));

        let stripe = Arc::new(FakeGateway::new(
            GatewayKind::Stripe,
            vec![PaymentMethod::Card],
            true,
        ));
        let mut router = GatewayRouter::new(GatewayKind::Stripe);
        router.register(stripe.clone());

        let service = PaymentService::new(PriceCalculator::new(catalog.clone()), router);

        let details = BookingDetails {
            destination: "hoi-an-da-nang".to_string(),
            travelers: 2,
            dates: TripDates {
                start_date: NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 10, 27).unwrap(),
                duration: Some(3),
            },
            flights: Some(FlightSelection {
                outbound: Some(FlightRef {
                    id: outbound.to_string(),
                }),
                return_flight: Some(FlightRef {
                    id: ret.to_string(),
                }),
            }),
            hotels: Some(HotelSelection {
                selected_hotels: vec![HotelRef {
                    id: stay.to_string(),
                    nights: Some(2),
                }],
            }),
            itinerary: None,
        };

        Fixture {
            catalog,
            stripe,
            service,
            details,
        }
    }

    #[tokio::test]
    async fn charges_the_server_derived_amount() {
        let fx = fixture();
        let result = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "key-1")
            .await
            .unwrap();

        assert_eq!(result.calculated_amount, dec!(1495.00));
        assert_eq!(result.currency, Currency::Myr);
        assert!(!result.is_existing);
        assert!(result.client_secret.is_some());

        let created = fx.stripe.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].amount_minor, 149500);
        assert_eq!(created[0].metadata.flights_subtotal, dec!(855.00));
        assert_eq!(created[0].metadata.hotels_subtotal, dec!(640.00));
    }

    #[tokio::test]
    async fn replayed_key_returns_same_intent_without_second_charge() {
        let fx = fixture();
        let first = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "abc")
            .await
            .unwrap();
        let second = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "abc")
            .await
            .unwrap();

        assert!(!first.is_existing);
        assert!(second.is_existing);
        assert_eq!(first.payment_intent_id, second.payment_intent_id);
        assert_eq!(fx.stripe.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_creation_releases_the_key_for_retry() {
        let fx = fixture();
        fx.stripe
            .fail_create
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let err = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "retry-key")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ExternalServiceError(_)));

        fx.stripe
            .fail_create
            .store(false, std::sync::atomic::Ordering::SeqCst);
        let retried = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "retry-key")
            .await
            .unwrap();
        assert!(!retried.is_existing);
    }

    #[tokio::test]
    async fn trivial_amounts_are_blocked_before_any_gateway_call() {
        let catalog = Arc::new(CatalogStore::new());
        let cheap = catalog.insert_flight(flight(dec!(0.50)));

        let stripe = Arc::new(FakeGateway::new(
            GatewayKind::Stripe,
            vec![PaymentMethod::Card],
            true,
        ));
        let mut router = GatewayRouter::new(GatewayKind::Stripe);
        router.register(stripe.clone());
        let service = PaymentService::new(PriceCalculator::new(catalog), router);

        let details = BookingDetails {
            destination: "phu-quoc".to_string(),
            travelers: 1,
            dates: TripDates {
                start_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 12, 2).unwrap(),
                duration: None,
            },
            flights: Some(FlightSelection {
                outbound: Some(FlightRef {
                    id: cheap.to_string(),
                }),
                return_flight: None,
            }),
            hotels: None,
            itinerary: None,
        };

        let err = service
            .create_payment(&details, PaymentMethod::Card, "k")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AmountBelowMinimum { minor_units: 50 }
        ));
        assert!(stripe.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirmation_accepts_exact_settlement() {
        let fx = fixture();
        let created = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "k1")
            .await
            .unwrap();
        fx.stripe
            .settle(PaymentStatus::Completed, 149500, Currency::Myr);

        let confirmation = fx
            .service
            .confirm_payment(&created.payment_intent_id, GatewayKind::Stripe, &fx.details)
            .await
            .unwrap();

        assert!(confirmation.success);
        let booking = confirmation.booking.unwrap();
        assert_eq!(booking.amount, dec!(1495.00));
        assert_eq!(booking.currency, Currency::Myr);
        assert_eq!(booking.payment_intent_id, created.payment_intent_id);
    }

    #[tokio::test]
    async fn confirmation_rejects_one_minor_unit_drift() {
        let fx = fixture();
        let created = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "k1")
            .await
            .unwrap();
        fx.stripe
            .settle(PaymentStatus::Completed, 149499, Currency::Myr);

        let err = fx
            .service
            .confirm_payment(&created.payment_intent_id, GatewayKind::Stripe, &fx.details)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AmountMismatch {
                expected_minor: 149500,
                charged_minor: 149499
            }
        ));
    }

    #[tokio::test]
    async fn confirmation_rejects_currency_drift() {
        let fx = fixture();
        let created = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "k1")
            .await
            .unwrap();
        fx.stripe
            .settle(PaymentStatus::Completed, 149500, Currency::Sgd);

        let err = fx
            .service
            .confirm_payment(&created.payment_intent_id, GatewayKind::Stripe, &fx.details)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::SettlementCurrencyMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn unsettled_payment_creates_no_booking() {
        let fx = fixture();
        let created = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "k1")
            .await
            .unwrap();
        // Fake reports pending by default

        let confirmation = fx
            .service
            .confirm_payment(&created.payment_intent_id, GatewayKind::Stripe, &fx.details)
            .await
            .unwrap();
        assert!(!confirmation.success);
        assert_eq!(confirmation.status, PaymentStatus::Pending);
        assert!(confirmation.booking.is_none());
    }

    #[tokio::test]
    async fn catalog_price_change_between_create_and_confirm_is_caught() {
        let fx = fixture();
        let created = fx
            .service
            .create_payment(&fx.details, PaymentMethod::Card, "k1")
            .await
            .unwrap();
        fx.stripe
            .settle(PaymentStatus::Completed, 149500, Currency::Myr);

        // Hotel price drifts after the intent was created; the fresh
        // recomputation must disagree with the settled amount.
        let hotel_id = fx.details.hotels.as_ref().unwrap().selected_hotels[0]
            .id
            .parse()
            .unwrap();
        let mut drifted = fx.catalog.get_hotel(hotel_id).unwrap();
        drifted.price_per_night = dec!(321.00);
        fx.catalog.insert_hotel(drifted);

        let err = fx
            .service
            .confirm_payment(&created.payment_intent_id, GatewayKind::Stripe, &fx.details)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AmountMismatch { .. }));
    }
}
