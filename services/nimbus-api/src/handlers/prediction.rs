//! Hail prediction endpoint.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, instrument};

use super::weather::CoordsQuery;
use super::{error_response, parse_coord};
use crate::state::AppState;

/// GET /api/main-prediction?lat=..&lon=..
#[instrument(skip(state))]
pub async fn main_prediction_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CoordsQuery>,
) -> Response {
    let (lat, lon) = match (parse_coord(params.lat.as_deref()), parse_coord(params.lon.as_deref())) {
        (Some(Ok(lat)), Some(Ok(lon))) => (lat, lon),
        (None, _) | (_, None) => {
            return error_response(StatusCode::BAD_REQUEST, "Se requieren los parámetros 'lat' y 'lon'")
        }
        (Some(Err(e)), _) | (_, Some(Err(e))) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.hail.predict(lat, lon).await {
        Ok(prediction) => Json(prediction).into_response(),
        Err(e) => {
            error!(error = %e, "Hail prediction failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}
