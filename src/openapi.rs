use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Voyara API",
        version = "0.1.0",
        description = r#"
Travel booking backend.

Catalog search (flights, hotels, activities, best travel dates) plus the
payment subsystem: the server re-derives every charge amount from its own
catalog, routes payment methods to the owning gateway, guarantees
idempotent intent creation, and re-verifies the settled amount before a
booking is confirmed.

Charge amounts in requests are ignored; only catalog prices decide what a
booking costs.
        "#,
    ),
    paths(
        crate::handlers::payments::create_payment_intent,
        crate::handlers::payments::confirm_payment,
        crate::handlers::payments::payment_methods,
        crate::handlers::payments::razerpay_callback,
        crate::handlers::catalog::search_flights,
        crate::handlers::catalog::search_flights_legacy,
        crate::handlers::catalog::search_hotels_by_destination,
        crate::handlers::catalog::search_hotels,
        crate::handlers::catalog::activities_by_city,
        crate::handlers::catalog::restaurants_by_city,
        crate::handlers::catalog::transportation_options,
        crate::handlers::catalog::best_dates,
        crate::handlers::catalog::create_itinerary,
        crate::handlers::catalog::get_itinerary,
    ),
    tags(
        (name = "Payments", description = "Payment intent creation, confirmation and callbacks"),
        (name = "Catalog", description = "Flight, hotel, activity and itinerary search")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
