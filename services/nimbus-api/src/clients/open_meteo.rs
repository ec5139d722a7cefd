//! Open-Meteo geocoding and forecast.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::read_json;
use crate::metrics;

/// Daily variables requested for the hail features.
pub const DAILY_FIELDS: [&str; 11] = [
    "precipitation_sum",
    "snowfall_sum",
    "temperature_2m_max",
    "temperature_2m_min",
    "weather_code",
    "rain_sum",
    "precipitation_hours",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
    "shortwave_radiation_sum",
    "et0_fao_evapotranspiration",
];

/// Hourly variables averaged into the hail features.
pub const HOURLY_FIELDS: [&str; 3] = ["dew_point_2m", "relative_humidity_2m", "pressure_msl"];

/// First geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    name: Option<String>,
    country: Option<String>,
}

/// Current conditions at a point, passed through from Open-Meteo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherReport {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub current_weather: Option<Value>,
}

/// Geocoded city plus its current conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityReport {
    pub source: &'static str,
    pub city: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub weather: CurrentWeatherReport,
}

/// Daily and hourly series keyed by variable name. Values may be null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub daily: HashMap<String, Value>,
    #[serde(default)]
    pub hourly: HashMap<String, Value>,
}

impl ForecastResponse {
    /// Numeric values of a series; nulls and non-numbers are dropped.
    fn series(map: &HashMap<String, Value>, name: &str) -> Vec<f64> {
        map.get(name)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }

    /// First value of a daily series.
    pub fn daily_first(&self, name: &str) -> Option<f64> {
        self.daily
            .get(name)
            .and_then(Value::as_array)
            .and_then(|values| values.first())
            .and_then(Value::as_f64)
    }

    /// Mean of an hourly series, `None` when it has no numeric values.
    pub fn hourly_mean(&self, name: &str) -> Option<f64> {
        let values = Self::series(&self.hourly, name);
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new(http: Client, geocoding_url: impl Into<String>, forecast_url: impl Into<String>) -> Self {
        Self {
            http,
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn geocode(&self, city: &str) -> Result<GeoPlace> {
        let result: Result<GeocodingResponse> = async {
            let res = self
                .http
                .get(&self.geocoding_url)
                .query(&[("name", city), ("count", "1"), ("language", "es")])
                .send()
                .await
                .context("Failed to send request to Open-Meteo geocoding")?;
            read_json::<GeocodingResponse>(res, "Open-Meteo geocoding").await
        }
        .await;
        metrics::record_upstream("open_meteo_geocoding", result.is_ok());

        let first = result?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Ciudad '{}' no encontrada", city))?;
        Ok(GeoPlace {
            lat: first.latitude,
            lon: first.longitude,
            name: first.name,
            country: first.country,
        })
    }

    #[instrument(skip(self))]
    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<CurrentWeatherReport> {
        let result: Result<CurrentWeatherReport> = async {
            let res = self
                .http
                .get(&self.forecast_url)
                .query(&[
                    ("latitude", lat.to_string()),
                    ("longitude", lon.to_string()),
                    ("current_weather", "true".to_string()),
                    ("timezone", "auto".to_string()),
                ])
                .send()
                .await
                .context("Failed to send request to Open-Meteo forecast")?;
            read_json::<CurrentWeatherReport>(res, "Open-Meteo forecast").await
        }
        .await;
        metrics::record_upstream("open_meteo_forecast", result.is_ok());
        result
    }

    /// One-day forecast with the daily and hourly variables the hail model
    /// is trained on.
    #[instrument(skip(self))]
    pub async fn hail_forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse> {
        let result: Result<ForecastResponse> = async {
            let res = self
                .http
                .get(&self.forecast_url)
                .query(&[
                    ("latitude", lat.to_string()),
                    ("longitude", lon.to_string()),
                    ("daily", DAILY_FIELDS.join(",")),
                    ("hourly", HOURLY_FIELDS.join(",")),
                    ("forecast_days", "1".to_string()),
                    ("timezone", "auto".to_string()),
                ])
                .send()
                .await
                .context("Failed to send request to Open-Meteo forecast")?;
            read_json::<ForecastResponse>(res, "Open-Meteo forecast").await
        }
        .await;
        metrics::record_upstream("open_meteo_forecast", result.is_ok());
        result
    }

    /// Geocode `city` and fetch its current conditions.
    pub async fn city_weather(&self, city: &str) -> Result<CityReport> {
        let place = self.geocode(city).await?;
        let weather = self.current_weather(place.lat, place.lon).await?;
        Ok(CityReport {
            source: "geocoding",
            city: place.name.unwrap_or_else(|| city.to_string()),
            country: place.country,
            lat: place.lat,
            lon: place.lon,
            weather,
        })
    }
}
