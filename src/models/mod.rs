pub mod booking;
pub mod catalog;
pub mod currency;
pub mod payment;

pub use booking::{BookingConfirmation, BookingDetails, BookingIntent, DateRange, HotelStay};
pub use catalog::{
    Activity, BestDatesResponse, Flight, FlightSearchResponse, Hotel, HotelSearchResponse,
    Itinerary, NewItinerary, Restaurant, Transportation,
};
pub use currency::{from_minor_units, to_minor_units, Currency, MIN_CHARGE_MINOR_UNITS};
pub use payment::{
    BookingMetadata, ConfirmationResult, GatewayKind, MethodCategory, PaymentCreationResult,
    PaymentIntent, PaymentMethod, PaymentMethodInfo, PaymentRequest, PaymentStatus,
};
