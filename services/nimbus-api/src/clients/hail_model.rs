//! Remote hail prediction model.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::read_json;
use crate::metrics;
use crate::prediction::HailFeatures;

/// Probability above which an alert is suggested when the model omits one.
pub const ALERT_THRESHOLD: f64 = 0.56;

/// What the model returns, with the alert filled in if it was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HailPrediction {
    pub probabilidad_granizo: f64,
    pub umbral_recomendado: f64,
    pub alerta_sugerida: String,
}

#[derive(Debug, Deserialize)]
struct ModelResponse {
    probabilidad_granizo: f64,
    umbral_recomendado: Option<f64>,
    alerta_sugerida: Option<String>,
}

impl From<ModelResponse> for HailPrediction {
    fn from(r: ModelResponse) -> Self {
        let threshold = r.umbral_recomendado.unwrap_or(ALERT_THRESHOLD);
        let alert = r.alerta_sugerida.unwrap_or_else(|| {
            if r.probabilidad_granizo > ALERT_THRESHOLD { "Sí" } else { "No" }.to_string()
        });
        Self {
            probabilidad_granizo: r.probabilidad_granizo,
            umbral_recomendado: threshold,
            alerta_sugerida: alert,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HailModelClient {
    http: Client,
    url: String,
}

impl HailModelClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    #[instrument(skip(self, features), fields(lat = features.latitude, lon = features.longitude))]
    pub async fn predict(&self, features: &HailFeatures) -> Result<HailPrediction> {
        let result: Result<ModelResponse> = async {
            let res = self
                .http
                .post(&self.url)
                .json(features)
                .send()
                .await
                .context("Error al contactar el modelo de predicción")?;
            read_json(res, "hail model").await
        }
        .await;
        metrics::record_upstream("hail_model", result.is_ok());

        let prediction = HailPrediction::from(result?);
        info!(
            probability = prediction.probabilidad_granizo,
            alert = %prediction.alerta_sugerida,
            "Hail prediction"
        );
        Ok(prediction)
    }
}
