//! IP geolocation through ip-api.com.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::read_json;
use crate::metrics;

/// Where an IP address is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpLocation {
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    query: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IpGeoClient {
    http: Client,
    base_url: String,
}

impl IpGeoClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Locate `ip`, or the address the request comes from when `None`.
    #[instrument(skip(self))]
    pub async fn locate(&self, ip: Option<&str>) -> Result<IpLocation> {
        let url = format!("{}{}", self.base_url, ip.unwrap_or(""));
        let result: Result<IpApiResponse> = async {
            let res = self
                .http
                .get(&url)
                .send()
                .await
                .context("Failed to send request to ip-api")?;
            read_json(res, "ip-api").await
        }
        .await;
        metrics::record_upstream("ip_api", result.is_ok());
        let body = result?;

        if body.status.as_deref() != Some("success") {
            return Err(anyhow!(body
                .message
                .unwrap_or_else(|| "ip-api falló al geolocalizar".to_string())));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(IpLocation {
                ip: body.query,
                city: body.city,
                region: body.region_name,
                country: body.country,
                lat,
                lon,
            }),
            _ => Err(anyhow!("ip-api no devolvió coordenadas para la IP")),
        }
    }
}
