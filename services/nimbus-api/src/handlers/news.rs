//! News endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::error_response;
use crate::clients::news::{is_category, CATEGORIES, CATEGORY_LIMIT, OVERVIEW_CATEGORIES, OVERVIEW_LIMIT};
use crate::state::AppState;

/// GET /api/noticias/:category
#[instrument(skip(state))]
pub async fn news_by_category_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(category): Path<String>,
) -> Response {
    if !is_category(&category) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Categoría no válida. Use: {}", CATEGORIES.join(", ")),
        );
    }

    let items = state.news.headlines(&category, CATEGORY_LIMIT).await;
    Json(json!({
        "categoria": category,
        "total_noticias": items.len(),
        "noticias": items,
    }))
    .into_response()
}

/// GET /api/noticias - a few headlines from each overview category
pub async fn all_news_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let lists = join_all(
        OVERVIEW_CATEGORIES
            .iter()
            .map(|c| state.news.headlines(c, OVERVIEW_LIMIT)),
    )
    .await;

    let mut all = Map::new();
    for (category, items) in OVERVIEW_CATEGORIES.iter().zip(lists) {
        all.insert(category.to_string(), json!(items));
    }

    Json(json!({
        "total_categorias": OVERVIEW_CATEGORIES.len(),
        "noticias": all,
    }))
}
