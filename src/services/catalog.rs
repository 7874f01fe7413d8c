//! In-memory catalog of flights, hotels, restaurants, activities and
//! transportation options, plus stored itineraries.
//!
//! The store is seeded at startup and never mutated by payment code; the
//! price calculator depends only on the point lookups. Search operations
//! simulate live fares with bounded random variation, the way the mock
//! upstream did. The display-currency conversion below exists only for
//! search responses; charge amounts are never converted anywhere.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use dashmap::DashMap;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::catalog::{
    Activity, BestDatesCriteria, BestDatesResponse, DateRangeResult, Flight, FlightSearchCriteria,
    FlightSearchResponse, Hotel, HotelSearchCriteria, HotelSearchResponse, Itinerary,
    NewItinerary, Restaurant, Transportation,
};
use crate::models::currency::Currency;

/// Exchange rates relative to MYR, used for display conversion in search
/// results only.
fn exchange_rate(currency: Currency) -> f64 {
    match currency {
        Currency::Myr => 1.0,
        Currency::Inr => 18.5,
        Currency::Usd => 0.21,
        Currency::Sgd => 0.29,
        Currency::Vnd => 5250.0,
    }
}

fn convert_display_amount(amount: f64, from: Currency, to: Currency) -> f64 {
    let in_myr = amount / exchange_rate(from);
    in_myr * exchange_rate(to)
}

struct FlightTemplate {
    airline: &'static str,
    flight_number: &'static str,
    departure_time: &'static str,
    arrival_time: &'static str,
    duration: &'static str,
    stops: &'static str,
    layover_duration: &'static str,
    layover_location: &'static str,
    base_price: i64,
}

const FLIGHT_TEMPLATES: [FlightTemplate; 5] = [
    FlightTemplate {
        airline: "Malaysia Airlines",
        flight_number: "MH780 + VN1547",
        departure_time: "08:30",
        arrival_time: "15:45",
        duration: "7h 15m",
        stops: "1 stop in KUL",
        layover_duration: "2h 30m",
        layover_location: "Kuala Lumpur",
        base_price: 1045,
    },
    FlightTemplate {
        airline: "Vietnam Airlines",
        flight_number: "VN634 + VN1203",
        departure_time: "10:15",
        arrival_time: "18:20",
        duration: "8h 05m",
        stops: "1 stop in SGN",
        layover_duration: "3h 15m",
        layover_location: "Ho Chi Minh",
        base_price: 1105,
    },
    FlightTemplate {
        airline: "AirAsia",
        flight_number: "AK6148 + VN1456",
        departure_time: "06:45",
        arrival_time: "16:30",
        duration: "9h 45m",
        stops: "1 stop in KUL",
        layover_duration: "4h 20m",
        layover_location: "Kuala Lumpur",
        base_price: 965,
    },
    FlightTemplate {
        airline: "Scoot",
        flight_number: "TR409 + VN1289",
        departure_time: "14:20",
        arrival_time: "22:15",
        duration: "7h 55m",
        stops: "1 stop in SIN",
        layover_duration: "2h 45m",
        layover_location: "Singapore",
        base_price: 1025,
    },
    FlightTemplate {
        airline: "Jetstar Asia",
        flight_number: "3K582 + VN1678",
        departure_time: "12:30",
        arrival_time: "21:45",
        duration: "9h 15m",
        stops: "1 stop in SIN",
        layover_duration: "3h 50m",
        layover_location: "Singapore",
        base_price: 1135,
    },
];

fn destination_airport(destination: &str) -> &'static str {
    match destination {
        "hoi-an-da-nang" => "DAD",
        "hanoi-halong" => "HAN",
        "ho-chi-minh" => "SGN",
        "phu-quoc" => "PQC",
        _ => "DAD",
    }
}

fn destination_cities(destination: &str) -> Vec<String> {
    match destination {
        "Vietnam" | "hoi-an-da-nang" => vec!["Hoi An".to_string(), "Da Nang".to_string()],
        other => vec![other.to_string()],
    }
}

pub struct CatalogStore {
    flights: DashMap<Uuid, Flight>,
    hotels: DashMap<Uuid, Hotel>,
    restaurants: DashMap<Uuid, Restaurant>,
    activities: DashMap<Uuid, Activity>,
    transportation: DashMap<Uuid, Transportation>,
    itineraries: DashMap<Uuid, Itinerary>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            flights: DashMap::new(),
            hotels: DashMap::new(),
            restaurants: DashMap::new(),
            activities: DashMap::new(),
            transportation: DashMap::new(),
            itineraries: DashMap::new(),
        }
    }

    /// A store populated with the sample inventory.
    pub fn seeded() -> Self {
        let store = Self::new();
        store.seed();
        store
    }

    pub fn insert_flight(&self, flight: Flight) -> Uuid {
        let id = flight.id;
        self.flights.insert(id, flight);
        id
    }

    pub fn insert_hotel(&self, hotel: Hotel) -> Uuid {
        let id = hotel.id;
        self.hotels.insert(id, hotel);
        id
    }

    pub fn insert_activity(&self, activity: Activity) -> Uuid {
        let id = activity.id;
        self.activities.insert(id, activity);
        id
    }

    pub fn insert_restaurant(&self, restaurant: Restaurant) -> Uuid {
        let id = restaurant.id;
        self.restaurants.insert(id, restaurant);
        id
    }

    pub fn insert_transportation(&self, transportation: Transportation) -> Uuid {
        let id = transportation.id;
        self.transportation.insert(id, transportation);
        id
    }

    // -- point lookups (the only operations payment code depends on) -------

    pub fn get_flight(&self, id: Uuid) -> Option<Flight> {
        self.flights.get(&id).map(|f| f.clone())
    }

    pub fn get_hotel(&self, id: Uuid) -> Option<Hotel> {
        self.hotels.get(&id).map(|h| h.clone())
    }

    pub fn get_activity(&self, id: Uuid) -> Option<Activity> {
        self.activities.get(&id).map(|a| a.clone())
    }

    // -- searches -----------------------------------------------------------

    pub fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> Vec<Flight> {
        let mut flights: Vec<Flight> = self
            .flights
            .iter()
            .filter(|f| {
                f.origin == origin
                    && f.destination == destination
                    && f.departure_date == departure_date
            })
            .map(|f| f.clone())
            .collect();
        flights.sort_by(|a, b| a.price.cmp(&b.price));
        flights
    }

    pub fn search_flights_by_dates(
        &self,
        destination: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        travelers: u32,
        currency: Currency,
    ) -> FlightSearchResponse {
        let destination_code = destination_airport(destination);
        let origin = "PEN";

        let outbound_flights =
            self.generate_flights_for_date(origin, destination_code, start_date, currency);
        let return_flights =
            self.generate_flights_for_date(destination_code, origin, end_date, currency);

        FlightSearchResponse {
            outbound_flights,
            return_flights,
            search_criteria: FlightSearchCriteria {
                destination: destination.to_string(),
                start_date,
                end_date,
                travelers,
                currency,
            },
        }
    }

    /// Simulated live fares: template fares with ±10% variation, registered
    /// in the store so a later booking intent can reference them by id.
    fn generate_flights_for_date(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        currency: Currency,
    ) -> Vec<Flight> {
        let mut rng = rand::thread_rng();
        let mut flights: Vec<Flight> = FLIGHT_TEMPLATES
            .iter()
            .map(|template| {
                let variation: f64 = rng.gen_range(0.90..1.10);
                let price_myr = template.base_price as f64 * variation;
                let price = match currency {
                    Currency::Myr => price_myr,
                    other => convert_display_amount(price_myr, Currency::Myr, other),
                };

                let flight = Flight {
                    id: Uuid::new_v4(),
                    airline: template.airline.to_string(),
                    flight_number: template.flight_number.to_string(),
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    departure_time: template.departure_time.to_string(),
                    arrival_time: template.arrival_time.to_string(),
                    departure_date: date,
                    arrival_date: date,
                    duration: template.duration.to_string(),
                    stops: template.stops.to_string(),
                    layover_duration: Some(template.layover_duration.to_string()),
                    layover_location: Some(template.layover_location.to_string()),
                    price: Decimal::from(price.round() as i64),
                    currency,
                };
                self.insert_flight(flight.clone());
                flight
            })
            .collect();
        flights.sort_by(|a, b| a.price.cmp(&b.price));
        flights
    }

    pub fn search_hotels(&self, city: &str) -> Vec<Hotel> {
        let mut hotels: Vec<Hotel> = self
            .hotels
            .iter()
            .filter(|h| h.city == city)
            .map(|h| h.clone())
            .collect();
        hotels.sort_by(|a, b| a.price_per_night.cmp(&b.price_per_night));
        hotels
    }

    pub fn search_hotels_by_destination(
        &self,
        destination: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        travelers: u32,
        currency: Currency,
    ) -> HotelSearchResponse {
        let cities = destination_cities(destination);
        let mut hotels: Vec<Hotel> = self
            .hotels
            .iter()
            .filter(|h| cities.iter().any(|c| c == &h.city))
            .map(|entry| {
                let mut hotel = entry.clone();
                if hotel.currency != currency {
                    let nightly = hotel.price_per_night.to_f64().unwrap_or(0.0);
                    let converted = convert_display_amount(nightly, hotel.currency, currency);
                    hotel.price_per_night =
                        Decimal::from((converted * 100.0).round() as i64) / Decimal::from(100);
                    hotel.currency = currency;
                }
                hotel
            })
            .collect();
        hotels.sort_by(|a, b| a.price_per_night.cmp(&b.price_per_night));

        HotelSearchResponse {
            hotels,
            search_criteria: HotelSearchCriteria {
                destination: destination.to_string(),
                check_in,
                check_out,
                travelers,
                currency,
            },
        }
    }

    pub fn restaurants_by_city(&self, city: &str, cuisine: Option<&str>) -> Vec<Restaurant> {
        self.restaurants
            .iter()
            .filter(|r| r.city == city && cuisine.map_or(true, |c| r.cuisine == c))
            .map(|r| r.clone())
            .collect()
    }

    pub fn activities_by_city(&self, city: &str) -> Vec<Activity> {
        self.activities
            .iter()
            .filter(|a| a.city == city)
            .map(|a| a.clone())
            .collect()
    }

    pub fn transportation_options(&self, from: &str, to: &str) -> Vec<Transportation> {
        let mut options: Vec<Transportation> = self
            .transportation
            .iter()
            .filter(|t| t.from.contains(from) && t.to.contains(to))
            .map(|t| t.clone())
            .collect();
        options.sort_by(|a, b| a.price.cmp(&b.price));
        options
    }

    // -- itineraries --------------------------------------------------------

    pub fn create_itinerary(&self, new: NewItinerary) -> Itinerary {
        let itinerary = Itinerary {
            id: Uuid::new_v4(),
            name: new.name,
            destination: new.destination,
            description: new.description,
            currency: new.currency.unwrap_or(Currency::Usd),
            total_cost: new.total_cost,
            selected_flight_id: new.selected_flight_id,
            selected_hotel_ids: new.selected_hotel_ids,
            selected_activity_ids: new.selected_activity_ids,
            created_at: Utc::now(),
        };
        self.itineraries.insert(itinerary.id, itinerary.clone());
        itinerary
    }

    pub fn get_itinerary(&self, id: Uuid) -> Option<Itinerary> {
        self.itineraries.get(&id).map(|i| i.clone())
    }

    // -- best dates ---------------------------------------------------------

    pub fn best_dates(
        &self,
        destination: &str,
        month1: &str,
        month2: &str,
        travelers: u32,
        currency: Currency,
    ) -> Result<BestDatesResponse, ServiceError> {
        const TRIP_DURATION: u32 = 6;
        const NIGHTS: i64 = 5;
        const BASE_FLIGHT_PRICE: f64 = 1045.0;
        const BASE_HOTEL_PRICE: f64 = 150.0;

        let mut rng = rand::thread_rng();
        let mut ranges: Vec<DateRangeResult> = Vec::new();

        for (month_index, month_str) in [month1, month2].iter().enumerate() {
            let (year, month) = parse_month(month_str)?;
            let days = days_in_month(year, month)?;
            let last_start_day = days.saturating_sub(TRIP_DURATION).min(25);

            for day in 1..=last_start_day {
                let start_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                    ServiceError::ValidationError(format!("invalid date {year}-{month}-{day}"))
                })?;
                let end_date = start_date + chrono::Duration::days(TRIP_DURATION as i64 - 1);

                let high_season = month >= 11 || month <= 3;
                let weekend = matches!(start_date.weekday(), Weekday::Sat | Weekday::Sun);

                let mut flight_multiplier = if high_season { 1.15 } else { 0.95 };
                let mut hotel_multiplier = if high_season { 1.2 } else { 0.9 };
                if weekend {
                    flight_multiplier += 0.05;
                    hotel_multiplier += 0.1;
                }
                flight_multiplier *= rng.gen_range(0.85..1.15);
                hotel_multiplier *= rng.gen_range(0.90..1.10);

                let flight_price_myr = (BASE_FLIGHT_PRICE * flight_multiplier).round();
                let hotel_per_night_myr = (BASE_HOTEL_PRICE * hotel_multiplier).round();
                let hotel_total_myr = hotel_per_night_myr * NIGHTS as f64;

                let (flight_price, hotel_total) = match currency {
                    Currency::Myr => (flight_price_myr, hotel_total_myr),
                    other => (
                        convert_display_amount(flight_price_myr, Currency::Myr, other).round(),
                        convert_display_amount(hotel_total_myr, Currency::Myr, other).round(),
                    ),
                };

                let price_per_person = flight_price + hotel_total;
                let total_price = price_per_person * travelers as f64;

                ranges.push(DateRangeResult {
                    id: format!("range-{}-{}", month_index, day),
                    start_date,
                    end_date,
                    duration: TRIP_DURATION,
                    price_per_person: Decimal::from(price_per_person as i64),
                    total_price: Decimal::from(total_price as i64),
                    currency,
                    flight_price: Decimal::from(flight_price as i64),
                    hotel_price: Decimal::from(hotel_total as i64),
                    savings: 0,
                    is_recommended: false,
                    is_deal_of_the_day: false,
                });
            }
        }

        if ranges.is_empty() {
            return Err(ServiceError::ValidationError(
                "no candidate date ranges in the requested months".to_string(),
            ));
        }

        let sum: i64 = ranges
            .iter()
            .map(|r| r.price_per_person.to_i64().unwrap_or(0))
            .sum();
        let average = sum as f64 / ranges.len() as f64;

        for range in &mut ranges {
            let per_person = range.price_per_person.to_f64().unwrap_or(0.0);
            let savings = (((average - per_person) / average) * 100.0).round() as i64;
            range.savings = savings.max(0);
        }

        ranges.sort_by(|a, b| a.price_per_person.cmp(&b.price_per_person));
        ranges.truncate(8);

        if let Some(first) = ranges.first_mut() {
            first.is_deal_of_the_day = true;
        }
        if ranges.len() > 2 {
            ranges[0].is_recommended = true;
            ranges[1].is_recommended = true;
        }

        Ok(BestDatesResponse {
            average_price: Decimal::from(average.round() as i64),
            currency,
            results: ranges,
            search_criteria: BestDatesCriteria {
                destination: destination.to_string(),
                month1: month1.to_string(),
                month2: month2.to_string(),
                travelers,
                currency,
            },
        })
    }

    // -- seed data ----------------------------------------------------------

    fn seed(&self) {
        let seed_date = NaiveDate::from_ymd_opt(2025, 10, 25).unwrap_or_default();
        for template in FLIGHT_TEMPLATES.iter() {
            self.insert_flight(Flight {
                id: Uuid::new_v4(),
                airline: template.airline.to_string(),
                flight_number: template.flight_number.to_string(),
                origin: "PEN".to_string(),
                destination: "DAD".to_string(),
                departure_time: template.departure_time.to_string(),
                arrival_time: template.arrival_time.to_string(),
                departure_date: seed_date,
                arrival_date: seed_date,
                duration: template.duration.to_string(),
                stops: template.stops.to_string(),
                layover_duration: Some(template.layover_duration.to_string()),
                layover_location: Some(template.layover_location.to_string()),
                price: Decimal::from(template.base_price),
                currency: Currency::Myr,
            });
        }

        let hotels = [
            (
                "Thuan Tinh Island Tour Eco Home",
                "Ancient Town",
                "Hoi An",
                120,
                "4.2",
                156,
                "2.8 km to An Bang Beach",
                "1.2 km to Ancient Town",
                vec!["Free WiFi", "Air Con", "Pool", "Breakfast"],
            ),
            (
                "Sunflower Village Hotel",
                "Ancient Town",
                "Hoi An",
                150,
                "4.5",
                203,
                "3.2 km to Cua Dai Beach",
                "0.8 km to Ancient Town",
                vec!["Free WiFi", "Bike Rental", "Garden View"],
            ),
            (
                "My Khe Beach Hotel",
                "My Khe Beach",
                "Da Nang",
                180,
                "4.3",
                287,
                "50m to My Khe Beach",
                "8 km to Dragon Bridge",
                vec!["Beachfront", "Pool", "Gym", "Spa"],
            ),
            (
                "Ocean Bay Hotel",
                "My Khe Beach",
                "Da Nang",
                165,
                "4.6",
                412,
                "200m to My Khe Beach",
                "5 km to Han Market",
                vec!["Ocean View", "Restaurant", "Rooftop Bar"],
            ),
        ];
        for (name, location, city, price, rating, reviews, beach, landmark, amenities) in hotels {
            self.insert_hotel(Hotel {
                id: Uuid::new_v4(),
                name: name.to_string(),
                location: location.to_string(),
                city: city.to_string(),
                price_per_night: Decimal::from(price),
                currency: Currency::Myr,
                rating: rating.to_string(),
                review_count: reviews,
                distance_to_beach: beach.to_string(),
                distance_to_landmark: landmark.to_string(),
                amenities: amenities.into_iter().map(str::to_string).collect(),
                image_url: String::new(),
            });
        }

        let restaurants = [
            (
                "Ganesh Indian Restaurant",
                "Hoi An",
                "Ancient Town, 0.5km from hotels",
                "4.5",
                "RM 50-75",
                "North Indian curries, tandoori, fresh naan",
                "11:00 - 22:00",
            ),
            (
                "Maharaja Indian Kitchen",
                "Hoi An",
                "Riverside area, 0.8km from hotels",
                "4.2",
                "RM 42-63",
                "South Indian dishes, thali sets, vegetarian options",
                "10:30 - 21:30",
            ),
            (
                "Spice Garden Indian Restaurant",
                "Da Nang",
                "My Khe Beach area, 0.3km from hotel",
                "4.7",
                "RM 63-93",
                "Punjabi cuisine, seafood curries, beach view dining",
                "11:30 - 23:00",
            ),
            (
                "Bombay Palace Da Nang",
                "Da Nang",
                "Han Market area, 1.2km from hotel",
                "4.6",
                "RM 55-80",
                "Authentic curries, biryani, Indian street food",
                "11:00 - 22:30",
            ),
        ];
        for (name, city, location, rating, price_range, specialties, hours) in restaurants {
            self.insert_restaurant(Restaurant {
                id: Uuid::new_v4(),
                name: name.to_string(),
                cuisine: "Indian".to_string(),
                city: city.to_string(),
                location: location.to_string(),
                rating: rating.to_string(),
                price_range: price_range.to_string(),
                specialties: specialties.to_string(),
                opening_hours: hours.to_string(),
                serving_times: vec!["Lunch".to_string(), "Dinner".to_string()],
            });
        }

        let activities = [
            (
                "Bà Nà Hills Day Trip",
                "Da Nang",
                "Golden Bridge, French Village, cable car rides, alpine coaster",
                "Full day (8 hours)",
                7200,
                Currency::Inr,
                "Must-Visit",
            ),
            (
                "Marble Mountains",
                "Da Nang",
                "Cave exploration, Buddhist temples, panoramic city views",
                "Half day (4 hours)",
                2100,
                Currency::Inr,
                "Cultural",
            ),
            (
                "Cooking Class",
                "Hoi An",
                "Learn to make pho, spring rolls, and local specialties",
                "Half day (3 hours)",
                3800,
                Currency::Inr,
                "Interactive",
            ),
            (
                "Basket Boat Tour",
                "Hoi An",
                "Coconut forest, traditional fishing, cultural experience",
                "Half day (3 hours)",
                1850,
                Currency::Inr,
                "Nature",
            ),
            (
                "Dragon Bridge Fire Show",
                "Da Nang",
                "Spectacular fire and water show every weekend at 9 PM",
                "Evening (1 hour)",
                0,
                Currency::Usd,
                "Free",
            ),
            (
                "Beach Activities",
                "Da Nang",
                "Surfing lessons, jet ski, parasailing, beach volleyball",
                "Flexible timing",
                2100,
                Currency::Inr,
                "Adventure",
            ),
        ];
        for (name, city, description, duration, price, currency, category) in activities {
            self.insert_activity(Activity {
                id: Uuid::new_v4(),
                name: name.to_string(),
                city: city.to_string(),
                description: description.to_string(),
                duration: duration.to_string(),
                price: Decimal::from(price),
                currency,
                category: category.to_string(),
                image_url: String::new(),
            });
        }

        let transport = [
            ("Private Car", "Da Nang Airport", "Hoi An", "45 mins", 150, "Door-to-door service, hotel pickup"),
            ("Taxi", "Da Nang Airport", "Hoi An", "45 mins", 105, "Metered taxi service"),
            ("Bus", "Da Nang Airport", "Hoi An", "1 hour", 34, "Public bus service"),
            ("Private Transfer", "Hoi An", "Da Nang", "30 mins", 105, "Door-to-door service, hotel pickup"),
            ("Local Bus", "Hoi An", "Da Nang", "45 mins", 13, "Hourly service, central pickup points"),
            ("Private Car", "Da Nang", "Airport", "25 mins", 63, "Hotel pickup to airport"),
        ];
        for (transport_type, from, to, duration, price, description) in transport {
            self.insert_transportation(Transportation {
                id: Uuid::new_v4(),
                transport_type: transport_type.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                duration: duration.to_string(),
                price: Decimal::from(price),
                currency: Currency::Myr,
                description: description.to_string(),
            });
        }
    }
}

fn parse_month(raw: &str) -> Result<(i32, u32), ServiceError> {
    let invalid =
        || ServiceError::ValidationError(format!("month '{raw}' is not in YYYY-MM format"));
    let (year_str, month_str) = raw.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year_str.parse().map_err(|_| invalid())?;
    let month: u32 = month_str.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

fn days_in_month(year: i32, month: u32) -> Result<u32, ServiceError> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("invalid month {year}-{month:02}"))
        })
}
