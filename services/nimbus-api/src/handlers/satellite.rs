//! Satellite image endpoints.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use sat_common::{Band, SatError};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, instrument};

use super::error_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SatelliteQuery {
    pub band: Option<String>,
    pub palette: Option<String>,
    pub refresh: Option<String>,
}

impl SatelliteQuery {
    /// Requested band, or the default band when the parameter is missing,
    /// not a number, or outside 1-16.
    fn band(&self) -> Band {
        self.band
            .as_deref()
            .and_then(|s| s.trim().parse::<u8>().ok())
            .filter(|n| (1..=16).contains(n))
            .map(Band::new)
            .unwrap_or_default()
    }

    fn force_refresh(&self) -> bool {
        matches!(
            self.refresh.as_deref().map(|s| s.trim().to_ascii_lowercase()).as_deref(),
            Some("true") | Some("1") | Some("yes")
        )
    }
}

/// GET /api/satellite-image?band=13&palette=inferno&refresh=false
#[instrument(skip(state))]
pub async fn satellite_image_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SatelliteQuery>,
) -> Response {
    let band = params.band();
    let palette = params.palette.as_deref().unwrap_or("inferno");

    let resolved = match state.satellite.resolve(band, palette, params.force_refresh()).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Satellite image request failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let (image, legend) = match (data_uri(&resolved.image_path).await, data_uri(&resolved.legend_path).await) {
        (Ok(image), Ok(legend)) => (image, legend),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Failed to read cached image");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    Json(json!({
        "image": image,
        "legend": legend,
        "timestamp": resolved.timestamp.to_rfc3339(),
        "cached": resolved.cached,
    }))
    .into_response()
}

/// GET /api/satellite-image/disk-usage
pub async fn disk_usage_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.satellite.disk_usage().await {
        Ok(usage) => Json(json!({
            "total_size_mb": usage.total_size_mb,
            "file_count": usage.file_count,
            "oldest_file": usage.oldest_file,
            "newest_file": usage.newest_file,
        }))
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn data_uri(path: &Path) -> Result<String, SatError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SatError::CacheIo(format!("reading {}: {}", path.display(), e)))?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(refresh: Option<&str>) -> SatelliteQuery {
        SatelliteQuery {
            band: None,
            palette: None,
            refresh: refresh.map(str::to_string),
        }
    }

    fn band_of(raw: &str) -> u8 {
        SatelliteQuery {
            band: Some(raw.to_string()),
            palette: None,
            refresh: None,
        }
        .band()
        .number()
    }

    #[test]
    fn test_refresh_flag() {
        assert!(!query(None).force_refresh());
        assert!(!query(Some("false")).force_refresh());
        assert!(query(Some("true")).force_refresh());
        assert!(query(Some("TRUE")).force_refresh());
        assert!(query(Some("1")).force_refresh());
    }

    #[test]
    fn test_band_parsing_falls_back_to_default() {
        assert_eq!(query(None).band().number(), 13);
        assert_eq!(band_of("2"), 2);
        assert_eq!(band_of(" 8 "), 8);
        assert_eq!(band_of("abc"), 13);
        assert_eq!(band_of("300"), 13);
        assert_eq!(band_of("0"), 13);
        assert_eq!(band_of("17"), 13);
        assert_eq!(band_of("-1"), 13);
    }
}
