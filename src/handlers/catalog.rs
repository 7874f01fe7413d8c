use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::models::catalog::{
    Activity, BestDatesResponse, Flight, FlightSearchResponse, Hotel, HotelSearchResponse,
    Itinerary, NewItinerary, Restaurant, Transportation,
};
use crate::models::currency::Currency;
use crate::ApiResponse;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchQuery {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: u32,
    #[serde(default)]
    pub currency: Option<Currency>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchQuery {
    pub destination: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub travelers: u32,
    #[serde(default)]
    pub currency: Option<Currency>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BestDatesQuery {
    pub destination: String,
    pub month1: String,
    pub month2: String,
    pub travelers: u32,
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Search flights by destination and travel dates
#[utoipa::path(
    get,
    path = "/api/v1/flights",
    params(FlightSearchQuery),
    responses(
        (status = 200, description = "Outbound and return fares", body = crate::ApiResponse<FlightSearchResponse>),
        (status = 400, description = "Invalid search parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightSearchQuery>,
) -> Result<Json<ApiResponse<FlightSearchResponse>>, ServiceError> {
    let response = state.catalog.search_flights_by_dates(
        &query.destination,
        query.start_date,
        query.end_date,
        query.travelers,
        query.currency.unwrap_or(Currency::Myr),
    );
    Ok(Json(ApiResponse::success(response)))
}

/// Legacy route-based flight search
#[utoipa::path(
    get,
    path = "/api/v1/flights/search/{origin}/{destination}/{departure_date}",
    params(
        ("origin" = String, Path, description = "Origin airport code"),
        ("destination" = String, Path, description = "Destination airport code"),
        ("departure_date" = String, Path, description = "Departure date (YYYY-MM-DD)")
    ),
    responses((status = 200, description = "Matching flights", body = crate::ApiResponse<Vec<Flight>>)),
    tag = "Catalog"
)]
pub async fn search_flights_legacy(
    State(state): State<AppState>,
    Path((origin, destination, departure_date)): Path<(String, String, NaiveDate)>,
) -> Result<Json<ApiResponse<Vec<Flight>>>, ServiceError> {
    let flights = state
        .catalog
        .search_flights(&origin, &destination, departure_date);
    Ok(Json(ApiResponse::success(flights)))
}

/// Search hotels by destination
#[utoipa::path(
    get,
    path = "/api/v1/hotels",
    params(HotelSearchQuery),
    responses((status = 200, description = "Hotels for the destination", body = crate::ApiResponse<HotelSearchResponse>)),
    tag = "Catalog"
)]
pub async fn search_hotels_by_destination(
    State(state): State<AppState>,
    Query(query): Query<HotelSearchQuery>,
) -> Result<Json<ApiResponse<HotelSearchResponse>>, ServiceError> {
    let response = state.catalog.search_hotels_by_destination(
        &query.destination,
        query.check_in,
        query.check_out,
        query.travelers,
        query.currency.unwrap_or(Currency::Myr),
    );
    Ok(Json(ApiResponse::success(response)))
}

/// City-scoped hotel search
#[utoipa::path(
    get,
    path = "/api/v1/hotels/search/{city}/{check_in}/{check_out}",
    params(
        ("city" = String, Path, description = "City name"),
        ("check_in" = String, Path, description = "Check-in date (YYYY-MM-DD)"),
        ("check_out" = String, Path, description = "Check-out date (YYYY-MM-DD)")
    ),
    responses((status = 200, description = "Hotels in the city", body = crate::ApiResponse<Vec<Hotel>>)),
    tag = "Catalog"
)]
pub async fn search_hotels(
    State(state): State<AppState>,
    Path((city, _check_in, _check_out)): Path<(String, NaiveDate, NaiveDate)>,
) -> Result<Json<ApiResponse<Vec<Hotel>>>, ServiceError> {
    Ok(Json(ApiResponse::success(state.catalog.search_hotels(&city))))
}

/// Activities available in a city
#[utoipa::path(
    get,
    path = "/api/v1/activities/{city}",
    params(("city" = String, Path, description = "City name")),
    responses((status = 200, description = "Activities in the city", body = crate::ApiResponse<Vec<Activity>>)),
    tag = "Catalog"
)]
pub async fn activities_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<ApiResponse<Vec<Activity>>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.catalog.activities_by_city(&city),
    )))
}

/// Restaurants in a city, filtered by cuisine
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{city}/{cuisine}",
    params(
        ("city" = String, Path, description = "City name"),
        ("cuisine" = String, Path, description = "Cuisine filter")
    ),
    responses((status = 200, description = "Matching restaurants", body = crate::ApiResponse<Vec<Restaurant>>)),
    tag = "Catalog"
)]
pub async fn restaurants_by_city(
    State(state): State<AppState>,
    Path((city, cuisine)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<Restaurant>>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.catalog.restaurants_by_city(&city, Some(&cuisine)),
    )))
}

/// Transportation options between two points
#[utoipa::path(
    get,
    path = "/api/v1/transportation/{from}/{to}",
    params(
        ("from" = String, Path, description = "Origin"),
        ("to" = String, Path, description = "Destination")
    ),
    responses((status = 200, description = "Matching options", body = crate::ApiResponse<Vec<Transportation>>)),
    tag = "Catalog"
)]
pub async fn transportation_options(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<Transportation>>>, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.catalog.transportation_options(&from, &to),
    )))
}

/// Cheapest travel windows across two candidate months
#[utoipa::path(
    get,
    path = "/api/v1/best-dates",
    params(BestDatesQuery),
    responses(
        (status = 200, description = "Top date ranges by price", body = crate::ApiResponse<BestDatesResponse>),
        (status = 400, description = "Invalid search parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn best_dates(
    State(state): State<AppState>,
    Query(query): Query<BestDatesQuery>,
) -> Result<Json<ApiResponse<BestDatesResponse>>, ServiceError> {
    let response = state.catalog.best_dates(
        &query.destination,
        &query.month1,
        &query.month2,
        query.travelers,
        query.currency.unwrap_or(Currency::Myr),
    )?;
    Ok(Json(ApiResponse::success(response)))
}

/// Store an itinerary
#[utoipa::path(
    post,
    path = "/api/v1/itineraries",
    request_body = NewItinerary,
    responses((status = 201, description = "Itinerary created", body = crate::ApiResponse<Itinerary>)),
    tag = "Catalog"
)]
pub async fn create_itinerary(
    State(state): State<AppState>,
    Json(new): Json<NewItinerary>,
) -> Result<(StatusCode, Json<ApiResponse<Itinerary>>), ServiceError> {
    let itinerary = state.catalog.create_itinerary(new);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(itinerary))))
}

/// Fetch a stored itinerary
#[utoipa::path(
    get,
    path = "/api/v1/itineraries/{id}",
    params(("id" = Uuid, Path, description = "Itinerary id")),
    responses(
        (status = 200, description = "Itinerary", body = crate::ApiResponse<Itinerary>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_itinerary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Itinerary>>, ServiceError> {
    let itinerary = state
        .catalog
        .get_itinerary(id)
        .ok_or_else(|| ServiceError::NotFound(format!("itinerary {id}")))?;
    Ok(Json(ApiResponse::success(itinerary)))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/flights", get(search_flights))
        .route(
            "/flights/search/:origin/:destination/:departure_date",
            get(search_flights_legacy),
        )
        .route("/hotels", get(search_hotels_by_destination))
        .route("/hotels/search/:city/:check_in/:check_out", get(search_hotels))
        .route("/activities/:city", get(activities_by_city))
        .route("/restaurants/:city/:cuisine", get(restaurants_by_city))
        .route("/transportation/:from/:to", get(transportation_options))
        .route("/best-dates", get(best_dates))
        .route("/itineraries", post(create_itinerary))
        .route("/itineraries/:id", get(get_itinerary))
}
