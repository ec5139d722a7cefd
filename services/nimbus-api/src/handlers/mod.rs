//! HTTP request handlers.
//!
//! - `satellite`: latest satellite image and cache disk usage
//! - `weather`: OpenWeather city table and Open-Meteo lookups
//! - `news`: headlines by category
//! - `prediction`: hail prediction
//! - `health`: health check and Prometheus metrics

pub mod health;
pub mod news;
pub mod prediction;
pub mod satellite;
pub mod weather;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub use health::{health_handler, metrics_handler};
pub use news::{all_news_handler, news_by_category_handler};
pub use prediction::main_prediction_handler;
pub use satellite::{disk_usage_handler, satellite_image_handler};
pub use weather::{
    all_cities_weather_handler, city_weather_handler, meteo_city_handler, meteo_coords_handler,
    meteo_ip_handler,
};

/// `{"error": message}` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Parse a required float query parameter. Missing and empty both count as
/// absent.
pub(crate) fn parse_coord(raw: Option<&str>) -> Option<Result<f64, String>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    Some(
        raw.parse::<f64>()
            .map_err(|_| format!("'{}' no es un número válido", raw)),
    )
}
