//! Catalog records and search-response envelopes.
//!
//! Prices are `Decimal` (serialized as strings) and every priced record
//! carries its currency. Records are immutable once seeded; payment code
//! only ever reads them through point lookups.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::currency::Currency;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: Uuid,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub duration: String,
    pub stops: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layover_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layover_location: Option<String>,
    pub price: Decimal,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub city: String,
    pub price_per_night: Decimal,
    pub currency: Currency,
    pub rating: String,
    pub review_count: u32,
    pub distance_to_beach: String,
    pub distance_to_landmark: String,
    pub amenities: Vec<String>,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub cuisine: String,
    pub city: String,
    pub location: String,
    pub rating: String,
    pub price_range: String,
    pub specialties: String,
    pub opening_hours: String,
    pub serving_times: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub description: String,
    pub duration: String,
    pub price: Decimal,
    pub currency: Currency,
    pub category: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transportation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub transport_type: String,
    pub from: String,
    pub to: String,
    pub duration: String,
    pub price: Decimal,
    pub currency: Currency,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: Uuid,
    pub name: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_flight_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_hotel_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_activity_ids: Option<Vec<Uuid>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewItinerary {
    pub name: String,
    pub destination: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub total_cost: Option<Decimal>,
    #[serde(default)]
    pub selected_flight_id: Option<Uuid>,
    #[serde(default)]
    pub selected_hotel_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub selected_activity_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchCriteria {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: u32,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchResponse {
    pub outbound_flights: Vec<Flight>,
    pub return_flights: Vec<Flight>,
    pub search_criteria: FlightSearchCriteria,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchCriteria {
    pub destination: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub travelers: u32,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchResponse {
    pub hotels: Vec<Hotel>,
    pub search_criteria: HotelSearchCriteria,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeResult {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: u32,
    pub price_per_person: Decimal,
    pub total_price: Decimal,
    pub currency: Currency,
    pub flight_price: Decimal,
    pub hotel_price: Decimal,
    /// Percentage saved against the average priced range; never negative.
    pub savings: i64,
    pub is_recommended: bool,
    pub is_deal_of_the_day: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BestDatesCriteria {
    pub destination: String,
    pub month1: String,
    pub month2: String,
    pub travelers: u32,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BestDatesResponse {
    pub results: Vec<DateRangeResult>,
    pub search_criteria: BestDatesCriteria,
    pub average_price: Decimal,
    pub currency: Currency,
}
