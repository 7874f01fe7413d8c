//! Server-side price derivation.
//!
//! The calculator is the only component allowed to produce a charge amount.
//! It re-derives the total from catalog prices alone; the booking intent
//! contributes identifiers and quantities, never prices. It runs twice per
//! successful payment: once before asking the gateway for money and once
//! more at confirmation, against current catalog state, so a price change
//! or tampering attempt between the two calls is caught.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::ServiceError;
use crate::models::booking::BookingIntent;
use crate::models::currency::Currency;
use crate::services::catalog::CatalogStore;

pub const MIN_NIGHTS: u32 = 1;
pub const MAX_NIGHTS: u32 = 30;
pub const MIN_TRAVELERS: u32 = 1;
pub const MAX_TRAVELERS: u32 = 8;

/// The authoritative charge amount, with per-category subtotals for audit
/// metadata. Derived deterministically from the intent and catalog state at
/// computation time; never persisted or cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedTotal {
    pub amount: Decimal,
    pub currency: Currency,
    pub flights_subtotal: Decimal,
    pub hotels_subtotal: Decimal,
    pub activities_subtotal: Decimal,
}

#[derive(Clone)]
pub struct PriceCalculator {
    catalog: Arc<CatalogStore>,
}

/// The first resolved item establishes the computation currency; every
/// subsequent item must match it exactly. There is deliberately no
/// conversion step here: cross-currency intents are rejected, not fixed.
fn pin_currency(current: &mut Option<Currency>, found: Currency) -> Result<(), ServiceError> {
    match *current {
        None => {
            *current = Some(found);
            Ok(())
        }
        Some(expected) if expected == found => Ok(()),
        Some(expected) => Err(ServiceError::CurrencyMismatch { expected, found }),
    }
}

impl PriceCalculator {
    pub fn new(catalog: Arc<CatalogStore>) -> Self {
        Self { catalog }
    }

    pub fn compute_total(&self, intent: &BookingIntent) -> Result<ComputedTotal, ServiceError> {
        if !(MIN_TRAVELERS..=MAX_TRAVELERS).contains(&intent.travelers) {
            return Err(ServiceError::InvalidQuantity(format!(
                "travelers must be between {MIN_TRAVELERS} and {MAX_TRAVELERS}, got {}",
                intent.travelers
            )));
        }

        let mut currency: Option<Currency> = None;
        let mut flights_subtotal = Decimal::ZERO;
        let mut hotels_subtotal = Decimal::ZERO;
        let mut activities_subtotal = Decimal::ZERO;

        for flight_id in [intent.outbound_flight_id, intent.return_flight_id]
            .into_iter()
            .flatten()
        {
            let flight = self.catalog.get_flight(flight_id).ok_or_else(|| {
                ServiceError::ReferenceNotFound(format!("flight {flight_id}"))
            })?;
            pin_currency(&mut currency, flight.currency)?;
            flights_subtotal += flight.price;
        }

        for stay in &intent.hotel_stays {
            if !(MIN_NIGHTS..=MAX_NIGHTS).contains(&stay.nights) {
                return Err(ServiceError::InvalidQuantity(format!(
                    "hotel nights must be between {MIN_NIGHTS} and {MAX_NIGHTS}, got {}",
                    stay.nights
                )));
            }
            let hotel = self.catalog.get_hotel(stay.hotel_id).ok_or_else(|| {
                ServiceError::ReferenceNotFound(format!("hotel {}", stay.hotel_id))
            })?;
            pin_currency(&mut currency, hotel.currency)?;
            hotels_subtotal += hotel.price_per_night * Decimal::from(stay.nights);
        }

        for activity_id in &intent.activity_ids {
            let activity = self.catalog.get_activity(*activity_id).ok_or_else(|| {
                ServiceError::ReferenceNotFound(format!("activity {activity_id}"))
            })?;
            pin_currency(&mut currency, activity.currency)?;
            activities_subtotal += activity.price;
        }

        let amount = flights_subtotal + hotels_subtotal + activities_subtotal;
        let currency = currency.ok_or(ServiceError::NonPositiveTotal)?;
        if amount <= Decimal::ZERO {
            return Err(ServiceError::NonPositiveTotal);
        }

        debug!(%amount, %currency, "computed booking total");

        Ok(ComputedTotal {
            amount,
            currency,
            flights_subtotal,
            hotels_subtotal,
            activities_subtotal,
        })
    }
}
