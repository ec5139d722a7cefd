//! HTTP clients for the external collaborators.
//!
//! Each client owns a `reqwest::Client` with its own timeout and a base URL
//! that tests can point at a mock server.

pub mod hail_model;
pub mod ip_geo;
pub mod news;
pub mod open_meteo;
pub mod openweather;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

pub use hail_model::{HailModelClient, HailPrediction, ALERT_THRESHOLD};
pub use ip_geo::{IpGeoClient, IpLocation};
pub use news::{NewsItem, NewsService};
pub use open_meteo::{CityReport, CurrentWeatherReport, ForecastResponse, GeoPlace, OpenMeteoClient};
pub use openweather::{CityWeather, OpenWeatherClient};

/// Build an HTTP client with a whole-request timeout.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("nimbus-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Read a response body, failing with the status and a body excerpt on
/// non-success codes, and parse it as JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(res: reqwest::Response, what: &str) -> Result<T> {
    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {} response body", what))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{} request failed with status {}: {}",
            what,
            status,
            truncate_body(&body)
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {} JSON", what))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
