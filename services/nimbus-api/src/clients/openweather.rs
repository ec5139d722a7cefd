//! OpenWeather current conditions by city id.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::read_json;
use crate::metrics;

/// Current conditions for one city, in the shape the frontend expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeather {
    pub ciudad: String,
    pub temperatura: f64,
    pub sensacion_termica: f64,
    pub humedad: f64,
    pub clima: String,
    pub icono: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }

    #[instrument(skip(self))]
    pub async fn current(&self, city_id: u32) -> Result<CityWeather> {
        let result = self.fetch(city_id).await;
        metrics::record_upstream("openweather", result.is_ok());
        result
    }

    async fn fetch(&self, city_id: u32) -> Result<CityWeather> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENWEATHER_API_KEY is not configured"))?;

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("id", city_id.to_string().as_str()),
                ("appid", api_key),
                ("units", "metric"),
                ("lang", "es"),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather")?;

        let parsed: OwCurrentResponse = read_json(res, "OpenWeather").await?;
        let first = parsed
            .weather
            .first()
            .ok_or_else(|| anyhow!("OpenWeather response contained no weather entry"))?;

        Ok(CityWeather {
            ciudad: parsed.name,
            temperatura: parsed.main.temp,
            sensacion_termica: parsed.main.feels_like,
            humedad: parsed.main.humidity,
            clima: first.description.clone(),
            icono: first.icon.clone(),
        })
    }
}
