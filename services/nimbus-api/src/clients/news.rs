//! News headlines from NewsAPI, cached for a few minutes.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use reqwest::Client;
use sat_common::Clock;
use serde::{Deserialize, Serialize};
use storage::TtlCache;
use tracing::{debug, instrument, warn};
use unicode_normalization::UnicodeNormalization;

use super::read_json;
use crate::metrics;

/// Categories accepted by the single-category route.
pub const CATEGORIES: [&str; 5] = ["general", "deportes", "clima", "politica", "economia"];

/// Categories and per-category limit of the all-news route.
pub const OVERVIEW_CATEGORIES: [&str; 3] = ["general", "deportes", "clima"];
pub const OVERVIEW_LIMIT: usize = 2;
pub const CATEGORY_LIMIT: usize = 3;

const DESCRIPTION_CHARS: usize = 150;
const NO_TITLE: &str = "Sin título";
const NO_DESCRIPTION: &str = "Sin descripción";

/// One formatted headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub titulo: String,
    pub descripcion: String,
    pub fuente: String,
    pub fecha: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source: Option<ArticleSource>,
    pub published_at: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleSource {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

pub fn is_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// Search query sent for a category.
pub fn query_for(category: &str) -> &'static str {
    match category {
        "clima" => "(clima OR meteorología OR granizo) AND (Mendoza OR Argentina)",
        _ => "Argentina",
    }
}

fn normalize(text: &str) -> String {
    text.nfkc().collect()
}

/// Shape an article for the frontend.
pub fn format_article(article: &Article) -> NewsItem {
    let titulo = normalize(article.title.as_deref().unwrap_or(NO_TITLE));

    let descripcion = match article.description.as_deref() {
        Some(d) if !d.is_empty() && d != NO_DESCRIPTION => {
            let head: String = normalize(d).chars().take(DESCRIPTION_CHARS).collect();
            format!("{}...", head)
        }
        _ => NO_DESCRIPTION.to_string(),
    };

    let fuente = article
        .source
        .as_ref()
        .and_then(|s| s.name.clone())
        .unwrap_or_else(|| "Fuente desconocida".to_string());

    let fecha = match article.published_at.as_deref() {
        Some(p) if !p.is_empty() => p.split('T').next().unwrap_or(p).to_string(),
        _ => "Fecha desconocida".to_string(),
    };

    NewsItem {
        titulo,
        descripcion,
        fuente,
        fecha,
        url: article.url.clone().unwrap_or_else(|| "#".to_string()),
    }
}

/// Headlines per category with a short-lived cache in front of NewsAPI.
pub struct NewsService {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    cache: TtlCache<String, Vec<NewsItem>>,
}

impl NewsService {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
            cache: TtlCache::new(64, ttl, clock),
        }
    }

    /// Formatted headlines; upstream failures yield an empty list.
    #[instrument(skip(self))]
    pub async fn headlines(&self, category: &str, limit: usize) -> Vec<NewsItem> {
        let key = format!("{}_{}", category, limit);
        if let Some(items) = self.cache.get(&key).await {
            debug!(key = %key, "News served from cache");
            return items;
        }

        match self.fetch(category, limit).await {
            Ok(articles) => {
                let items: Vec<NewsItem> = articles.iter().map(format_article).collect();
                self.cache.put(key, items.clone()).await;
                items
            }
            Err(e) => {
                warn!(category, error = %e, "NewsAPI request failed");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, category: &str, limit: usize) -> Result<Vec<Article>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("NEWSAPI_KEY is not configured"))?;
        let page_size = limit.min(100).to_string();

        let result: Result<EverythingResponse> = async {
            let res = self
                .http
                .get(&self.base_url)
                .query(&[
                    ("apiKey", api_key),
                    ("q", query_for(category)),
                    ("language", "es"),
                    ("pageSize", page_size.as_str()),
                    ("sortBy", "publishedAt"),
                ])
                .send()
                .await
                .context("Failed to send request to NewsAPI")?;
            read_json(res, "NewsAPI").await
        }
        .await;
        metrics::record_upstream("newsapi", result.is_ok());
        Ok(result?.articles)
    }
}
