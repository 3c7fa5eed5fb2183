//! Application router configuration.

use axum::{Router, middleware, routing::get};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, endpoints,
    logging::logging_middleware,
    not_found::get_404_not_found,
    sales::{get_filters, get_health, get_sale, get_sales, get_stats},
};

/// Return a router with all the app's routes.
///
/// Cross-origin requests are allowed from any origin so that a front end
/// served from another host can call the API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::SALES, get(get_sales))
        .route(endpoints::SALES_FILTERS, get(get_filters))
        .route(endpoints::SALES_STATS, get(get_stats))
        .route(endpoints::SALE, get(get_sale))
        .route(endpoints::HEALTH, get(get_health))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
