//! Booking intents.
//!
//! The wire shape ([`BookingDetails`]) mirrors what the checkout wizard
//! sends: nested flight/hotel/activity selections that also carry
//! client-side prices. Those prices are never read. Normalization strips
//! the payload down to the canonical [`BookingIntent`] (identifiers and
//! quantities only), and that canonical shape is the only thing the price
//! calculator ever sees.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::currency::Currency;
use crate::models::payment::GatewayKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelStay {
    pub hotel_id: Uuid,
    pub nights: u32,
}

/// Canonical, price-free description of what is being purchased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingIntent {
    pub destination: String,
    pub travelers: u32,
    pub dates: DateRange,
    pub outbound_flight_id: Option<Uuid>,
    pub return_flight_id: Option<Uuid>,
    pub hotel_stays: Vec<HotelStay>,
    pub activity_ids: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// Wire shapes accepted from the booking wizard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TripDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Client-claimed trip length; used only as the default hotel-night
    /// count, and cross-checked against the date range.
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FlightRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightSelection {
    #[serde(default)]
    pub outbound: Option<FlightRef>,
    #[serde(default, rename = "return")]
    pub return_flight: Option<FlightRef>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelRef {
    pub id: String,
    #[serde(default)]
    pub nights: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelSelection {
    #[serde(default)]
    pub selected_hotels: Vec<HotelRef>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ActivityRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItinerarySelection {
    #[serde(default)]
    pub selected_activities: Vec<ActivityRef>,
}

/// Client-submitted booking payload. Unknown fields (including any claimed
/// prices or totals) are ignored by deserialization.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub destination: String,
    pub travelers: u32,
    pub dates: TripDates,
    #[serde(default)]
    pub flights: Option<FlightSelection>,
    #[serde(default)]
    pub hotels: Option<HotelSelection>,
    #[serde(default)]
    pub itinerary: Option<ItinerarySelection>,
}

fn parse_ref(kind: &str, raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| {
        ServiceError::ValidationError(format!("{kind} reference '{raw}' is not a valid id"))
    })
}

impl BookingDetails {
    /// Converts any accepted client shape into the canonical
    /// [`BookingIntent`]. Synthesized placeholder references (the wizard
    /// sometimes sends ids like "outbound-flight") fail here with a
    /// validation error rather than reaching the calculator.
    pub fn normalize(&self) -> Result<BookingIntent, ServiceError> {
        let span = (self.dates.end_date - self.dates.start_date).num_days();
        if span < 0 {
            return Err(ServiceError::ValidationError(
                "trip endDate is before startDate".to_string(),
            ));
        }
        let duration_days = self.dates.duration.unwrap_or(span as u32 + 1);
        let default_nights = span.max(1) as u32;

        let (outbound_flight_id, return_flight_id) = match &self.flights {
            Some(selection) => {
                let outbound = selection
                    .outbound
                    .as_ref()
                    .map(|f| parse_ref("flight", &f.id))
                    .transpose()?;
                let ret = selection
                    .return_flight
                    .as_ref()
                    .map(|f| parse_ref("flight", &f.id))
                    .transpose()?;
                (outbound, ret)
            }
            None => (None, None),
        };

        let hotel_stays = match &self.hotels {
            Some(selection) => selection
                .selected_hotels
                .iter()
                .map(|h| {
                    Ok(HotelStay {
                        hotel_id: parse_ref("hotel", &h.id)?,
                        nights: h.nights.unwrap_or(default_nights),
                    })
                })
                .collect::<Result<Vec<_>, ServiceError>>()?,
            None => Vec::new(),
        };

        let activity_ids = match &self.itinerary {
            Some(selection) => selection
                .selected_activities
                .iter()
                .map(|a| parse_ref("activity", &a.id))
                .collect::<Result<Vec<_>, ServiceError>>()?,
            None => Vec::new(),
        };

        Ok(BookingIntent {
            destination: self.destination.clone(),
            travelers: self.travelers,
            dates: DateRange {
                start_date: self.dates.start_date,
                end_date: self.dates.end_date,
                duration_days,
            },
            outbound_flight_id,
            return_flight_id,
            hotel_stays,
            activity_ids,
        })
    }
}

/// Booking record synthesized after a verified confirmation. The amount is
/// always the freshly recomputed, server-verified total.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub destination: String,
    pub travelers: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: Decimal,
    pub currency: Currency,
    pub gateway: GatewayKind,
    pub payment_intent_id: String,
    pub confirmed_at: DateTime<Utc>,
}
