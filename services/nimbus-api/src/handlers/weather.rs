//! Weather endpoints: OpenWeather for the configured cities, Open-Meteo for
//! arbitrary places.
//!
//! Upstream failures are reported as `{"error": ...}` bodies with status 200,
//! which is what the frontend checks for.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{instrument, warn};

use super::{error_response, parse_coord};
use crate::config::{find_city, CITIES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CoordsQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

fn upstream_error(e: anyhow::Error) -> Value {
    json!({ "error": format!("{:#}", e) })
}

async fn city_weather_value(state: &AppState, slug: &str) -> Value {
    let Some(city) = find_city(slug) else {
        return json!({ "error": "Ciudad no configurada" });
    };
    match state.openweather.current(city.id).await {
        Ok(weather) => serde_json::to_value(weather).unwrap_or_else(|e| json!({ "error": e.to_string() })),
        Err(e) => {
            warn!(city = slug, error = %e, "OpenWeather request failed");
            upstream_error(e)
        }
    }
}

/// GET /api/clima/:city
#[instrument(skip(state))]
pub async fn city_weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city): Path<String>,
) -> Json<Value> {
    Json(city_weather_value(&state, &city).await)
}

/// GET /api/clima - every configured city, keyed by slug
pub async fn all_cities_weather_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let results = join_all(CITIES.iter().map(|c| city_weather_value(&state, c.slug))).await;
    let mut all = Map::new();
    for (city, value) in CITIES.iter().zip(results) {
        all.insert(city.slug.to_string(), value);
    }
    Json(Value::Object(all))
}

/// GET /api/meteo/ip - weather where the caller's IP is
///
/// The caller is taken from the first `X-Forwarded-For` entry; without one,
/// ip-api locates the server's own address.
#[instrument(skip(state, headers))]
pub async fn meteo_ip_handler(Extension(state): Extension<Arc<AppState>>, headers: HeaderMap) -> Json<Value> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let location = match state.ip_geo.locate(forwarded.as_deref()).await {
        Ok(location) => location,
        Err(e) => return Json(upstream_error(e)),
    };
    let weather = match state.meteo.current_weather(location.lat, location.lon).await {
        Ok(weather) => weather,
        Err(e) => return Json(upstream_error(e)),
    };

    Json(json!({
        "source": "ip-api",
        "ip": location.ip,
        "city": location.city,
        "region": location.region,
        "country": location.country,
        "lat": location.lat,
        "lon": location.lon,
        "weather": weather,
    }))
}

/// GET /api/meteo/coords?lat=-32.889&lon=-68.845
#[instrument(skip(state))]
pub async fn meteo_coords_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CoordsQuery>,
) -> Response {
    let (lat, lon) = match (parse_coord(params.lat.as_deref()), parse_coord(params.lon.as_deref())) {
        (Some(Ok(lat)), Some(Ok(lon))) => (lat, lon),
        (None, _) | (_, None) => {
            return error_response(StatusCode::BAD_REQUEST, "Debes enviar lat y lon como parámetros")
        }
        (Some(Err(e)), _) | (_, Some(Err(e))) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.meteo.current_weather(lat, lon).await {
        Ok(weather) => Json(weather).into_response(),
        Err(e) => Json(upstream_error(e)).into_response(),
    }
}

/// GET /api/meteo/ciudad/:city - geocode by name, then current weather
#[instrument(skip(state))]
pub async fn meteo_city_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city): Path<String>,
) -> Json<Value> {
    match state.meteo.city_weather(&city).await {
        Ok(report) => Json(serde_json::to_value(report).unwrap_or_else(|e| json!({ "error": e.to_string() }))),
        Err(e) => Json(upstream_error(e)),
    }
}
