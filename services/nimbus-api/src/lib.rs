//! Nimbus API service library.
//!
//! Exposes the router and internal modules so integration tests can drive
//! the service with fake collaborators.

pub mod clients;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod prediction;
pub mod satellite;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};

use state::AppState;

/// All `/api` routes with the state attached. Middleware and `/metrics` are
/// added by the binary.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Satellite
        .route("/api/satellite-image", get(handlers::satellite_image_handler))
        .route("/api/satellite-image/disk-usage", get(handlers::disk_usage_handler))
        // Hail prediction
        .route("/api/main-prediction", get(handlers::main_prediction_handler))
        // OpenWeather
        .route("/api/clima", get(handlers::all_cities_weather_handler))
        .route("/api/clima/:city", get(handlers::city_weather_handler))
        // News
        .route("/api/noticias", get(handlers::all_news_handler))
        .route("/api/noticias/:category", get(handlers::news_by_category_handler))
        // Open-Meteo
        .route("/api/meteo/ip", get(handlers::meteo_ip_handler))
        .route("/api/meteo/coords", get(handlers::meteo_coords_handler))
        .route("/api/meteo/ciudad/:city", get(handlers::meteo_city_handler))
        // Health check
        .route("/api/health", get(handlers::health_handler))
        .layer(Extension(state))
}
