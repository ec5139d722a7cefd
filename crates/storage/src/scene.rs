//! Locating the newest GOES scene for a band.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use sat_common::{Band, SatError, SatResult};
use tracing::{debug, info, instrument};

/// One object in a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: Option<i64>,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            last_modified: None,
            size: None,
        }
    }
}

/// Read access to a bucket of scene files.
#[async_trait]
pub trait SceneSource: Send + Sync {
    /// All objects under `prefix`, in the order the store lists them.
    async fn list(&self, prefix: &str) -> SatResult<Vec<ObjectEntry>>;

    /// Write the object at `key` to `dest`, returning the number of bytes.
    async fn download(&self, key: &str, dest: &Path) -> SatResult<u64>;
}

/// A scene found by the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRef {
    pub key: String,
    pub band: Band,
    /// Start of the hour whose listing contained the key.
    pub hour: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Locator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    pub product: String,
    pub lookback_hours: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            product: "ABI-L2-CMIPF".to_string(),
            lookback_hours: 4,
        }
    }
}

/// Listing prefix for the hour containing `t`:
/// `{product}/{year}/{day_of_year:03}/{hour:02}/`.
pub fn hour_prefix(product: &str, t: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{:03}/{:02}/",
        product,
        t.year(),
        t.ordinal(),
        t.hour()
    )
}

/// Walks hourly listings backwards until a key for the band shows up.
pub struct SceneLocator {
    source: Arc<dyn SceneSource>,
    config: LocatorConfig,
}

impl SceneLocator {
    pub fn new(source: Arc<dyn SceneSource>, config: LocatorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn SceneSource> {
        &self.source
    }

    /// Newest key containing `C{band:02}` within the lookback window.
    ///
    /// Hours are tried from the one containing `now` backwards. Within an
    /// hour the listing is scanned from the end, so the latest scan start
    /// wins. Listing failures are returned immediately.
    #[instrument(skip(self), fields(band = band.number()))]
    pub async fn locate(&self, band: Band, now: DateTime<Utc>) -> SatResult<SceneRef> {
        let tag = band.channel_tag();

        for back in 0..self.config.lookback_hours {
            let t = now - Duration::hours(back as i64);
            let prefix = hour_prefix(&self.config.product, t);
            let entries = self.source.list(&prefix).await?;
            debug!(prefix = %prefix, count = entries.len(), "Listed hour");

            if let Some(entry) = entries.iter().rev().find(|e| e.key.contains(&tag)) {
                let hour = t
                    .with_minute(0)
                    .and_then(|h| h.with_second(0))
                    .and_then(|h| h.with_nanosecond(0))
                    .unwrap_or(t);
                info!(key = %entry.key, hours_back = back, "Found scene");
                return Ok(SceneRef {
                    key: entry.key.clone(),
                    band,
                    hour,
                    last_modified: entry.last_modified,
                });
            }
        }

        Err(SatError::NotFound(format!(
            "no {} file for band {} in the last {} hours",
            self.config.product, band, self.config.lookback_hours
        )))
    }
}
