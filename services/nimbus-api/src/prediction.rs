//! Hail prediction: forecast, feature vector, remote model.
//!
//! The model takes a flat record of 21 numbers built from a one-day
//! Open-Meteo forecast at the requested point. Values the forecast does not
//! provide are sent as zero.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use sat_common::Clock;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::clients::{ForecastResponse, HailModelClient, HailPrediction, OpenMeteoClient};

/// Forecast values the features are derived from. `None` means the forecast
/// had no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSummary {
    pub precipitation_sum: Option<f64>,
    pub snowfall_sum: Option<f64>,
    pub temperature_2m_max: Option<f64>,
    pub temperature_2m_min: Option<f64>,
    pub weather_code: Option<f64>,
    pub rain_sum: Option<f64>,
    pub precipitation_hours: Option<f64>,
    pub wind_gusts_10m_max: Option<f64>,
    pub wind_direction_10m_dominant: Option<f64>,
    pub shortwave_radiation_sum: Option<f64>,
    pub et0_fao_evapotranspiration: Option<f64>,
    pub dew_point_2m_mean: Option<f64>,
    pub relative_humidity_2m_mean: Option<f64>,
    pub pressure_msl_mean: Option<f64>,
}

impl ForecastSummary {
    /// First value of each daily series and the mean of each hourly one.
    pub fn from_forecast(forecast: &ForecastResponse) -> Self {
        Self {
            precipitation_sum: forecast.daily_first("precipitation_sum"),
            snowfall_sum: forecast.daily_first("snowfall_sum"),
            temperature_2m_max: forecast.daily_first("temperature_2m_max"),
            temperature_2m_min: forecast.daily_first("temperature_2m_min"),
            weather_code: forecast.daily_first("weather_code"),
            rain_sum: forecast.daily_first("rain_sum"),
            precipitation_hours: forecast.daily_first("precipitation_hours"),
            wind_gusts_10m_max: forecast.daily_first("wind_gusts_10m_max"),
            wind_direction_10m_dominant: forecast.daily_first("wind_direction_10m_dominant"),
            shortwave_radiation_sum: forecast.daily_first("shortwave_radiation_sum"),
            et0_fao_evapotranspiration: forecast.daily_first("et0_fao_evapotranspiration"),
            dew_point_2m_mean: forecast.hourly_mean("dew_point_2m"),
            relative_humidity_2m_mean: forecast.hourly_mean("relative_humidity_2m"),
            pressure_msl_mean: forecast.hourly_mean("pressure_msl"),
        }
    }
}

/// Model input. Field names are the model's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HailFeatures {
    #[serde(rename = "PRCP")]
    pub prcp: f64,
    #[serde(rename = "SNWD")]
    pub snwd: f64,
    #[serde(rename = "TAVG")]
    pub tavg: f64,
    #[serde(rename = "TMAX")]
    pub tmax: f64,
    #[serde(rename = "TMIN")]
    pub tmin: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub om_weather_code: f64,
    pub om_rain_sum: f64,
    pub om_snowfall_sum: f64,
    pub om_precipitation_hours: f64,
    pub om_wind_gusts_10m_max: f64,
    pub om_wind_direction_10m_dominant: f64,
    pub om_shortwave_radiation_sum: f64,
    pub om_et0_fao_evapotranspiration: f64,
    pub om_dew_point_2m_mean: f64,
    pub om_relative_humidity_2m_mean: f64,
    pub om_pressure_msl_mean: f64,
    pub mes: u32,
    #[serde(rename = "dia_del_año")]
    pub dia_del_anio: u32,
    pub rango_temp_diario: f64,
}

impl HailFeatures {
    /// Zero-fill missing values. Snow depth (`SNWD`) is approximated by the
    /// snowfall sum, which is all the forecast offers.
    pub fn build(lat: f64, lon: f64, forecast: &ForecastSummary, date: NaiveDate) -> Self {
        let z = |v: Option<f64>| v.unwrap_or(0.0);
        let tmax = z(forecast.temperature_2m_max);
        let tmin = z(forecast.temperature_2m_min);

        Self {
            prcp: z(forecast.precipitation_sum),
            snwd: z(forecast.snowfall_sum),
            tavg: (tmax + tmin) / 2.0,
            tmax,
            tmin,
            latitude: lat,
            longitude: lon,
            om_weather_code: z(forecast.weather_code),
            om_rain_sum: z(forecast.rain_sum),
            om_snowfall_sum: z(forecast.snowfall_sum),
            om_precipitation_hours: z(forecast.precipitation_hours),
            om_wind_gusts_10m_max: z(forecast.wind_gusts_10m_max),
            om_wind_direction_10m_dominant: z(forecast.wind_direction_10m_dominant),
            om_shortwave_radiation_sum: z(forecast.shortwave_radiation_sum),
            om_et0_fao_evapotranspiration: z(forecast.et0_fao_evapotranspiration),
            om_dew_point_2m_mean: z(forecast.dew_point_2m_mean),
            om_relative_humidity_2m_mean: z(forecast.relative_humidity_2m_mean),
            om_pressure_msl_mean: z(forecast.pressure_msl_mean),
            mes: date.month(),
            dia_del_anio: date.ordinal(),
            rango_temp_diario: tmax - tmin,
        }
    }
}

/// Forecast fetch, feature building and model call for one point.
pub struct HailPredictor {
    meteo: OpenMeteoClient,
    model: HailModelClient,
    clock: Arc<dyn Clock>,
}

impl HailPredictor {
    pub fn new(meteo: OpenMeteoClient, model: HailModelClient, clock: Arc<dyn Clock>) -> Self {
        Self { meteo, model, clock }
    }

    #[instrument(skip(self))]
    pub async fn predict(&self, lat: f64, lon: f64) -> Result<HailPrediction> {
        let forecast = self.meteo.hail_forecast(lat, lon).await?;
        let summary = ForecastSummary::from_forecast(&forecast);
        let features = HailFeatures::build(lat, lon, &summary, self.clock.now().date_naive());
        self.model.predict(&features).await
    }
}
