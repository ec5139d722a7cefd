//! Cached satellite image service.
//!
//! [`SatelliteService::resolve`] answers "latest image for this band and
//! palette" from the on-disk cache when a render for the current time bucket
//! exists, and otherwise locates, downloads and renders a fresh scene.
//! Renders of the same key are serialized so concurrent misses produce a
//! single render.

pub mod pipeline;
pub mod sweep_policy;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use netcdf_parser::SceneDecoder;
use renderer::{Palette, RenderSpec};
use sat_common::{Band, Clock, GeoWindow, SatError, SatResult, TimeBucket};
use storage::{
    CacheEntry, CacheKey, DiskUsage, ImageCache, RetentionPolicy, SceneLocator, SceneSource,
};
use tracing::{info, instrument, warn};

use crate::metrics::{self, Timer};
pub use sweep_policy::SweepPolicy;

/// Tunables of the satellite service.
#[derive(Debug, Clone)]
pub struct SatelliteSettings {
    pub window: GeoWindow,
    pub bucket: TimeBucket,
    pub retention: RetentionPolicy,
    pub image_size: usize,
}

impl Default for SatelliteSettings {
    fn default() -> Self {
        Self {
            window: GeoWindow::mendoza(),
            bucket: TimeBucket::default(),
            retention: RetentionPolicy::default(),
            image_size: renderer::DEFAULT_IMAGE_SIZE,
        }
    }
}

/// Result of [`SatelliteService::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub image_path: PathBuf,
    pub legend_path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub cached: bool,
}

impl ResolvedImage {
    fn hit(entry: CacheEntry) -> Self {
        Self {
            image_path: entry.image_path,
            legend_path: entry.legend_path,
            timestamp: entry.created_at,
            cached: true,
        }
    }
}

pub struct SatelliteService {
    locator: SceneLocator,
    decoder: Arc<dyn SceneDecoder>,
    cache: ImageCache,
    clock: Arc<dyn Clock>,
    sweep_policy: Arc<dyn SweepPolicy>,
    settings: SatelliteSettings,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SatelliteService {
    pub fn new(
        locator: SceneLocator,
        decoder: Arc<dyn SceneDecoder>,
        cache: ImageCache,
        clock: Arc<dyn Clock>,
        sweep_policy: Arc<dyn SweepPolicy>,
        settings: SatelliteSettings,
    ) -> Self {
        Self {
            locator,
            decoder,
            cache,
            clock,
            sweep_policy,
            settings,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &SatelliteSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Latest image and legend for `band` in `palette`.
    ///
    /// Unknown palettes render as inferno and share its cache entries.
    #[instrument(skip(self), fields(band = band.number()))]
    pub async fn resolve(&self, band: Band, palette: &str, force_refresh: bool) -> SatResult<ResolvedImage> {
        let now = self.clock.now();
        self.maybe_sweep(now).await;

        let palette = Palette::from_name(palette);
        let key = CacheKey::new(band, palette.name(), self.settings.bucket.floor(now));

        if !force_refresh {
            if let Some(entry) = self.lookup(&key, now).await {
                metrics::record_cache_hit();
                return Ok(ResolvedImage::hit(entry));
            }
        }

        let gate = self.gate(&key);
        let _guard = gate.lock().await;

        // Another request may have finished this render while we waited
        if !force_refresh {
            if let Some(entry) = self.lookup(&key, self.clock.now()).await {
                metrics::record_cache_hit();
                return Ok(ResolvedImage::hit(entry));
            }
        }

        metrics::record_cache_miss();
        let result = self.render(&key, palette, now).await;
        if let Err(ref e) = result {
            metrics::record_render_error(e.kind());
            warn!(key = %key, error = %e, "Satellite render failed");
        }
        result
    }

    /// Summary of the cache directory.
    pub async fn disk_usage(&self) -> SatResult<DiskUsage> {
        let cache = self.cache.clone();
        tokio::task::spawn_blocking(move || cache.disk_usage())
            .await
            .map_err(|e| SatError::CacheIo(format!("disk usage task failed: {}", e)))?
    }

    /// Run the sweep now, regardless of policy.
    pub async fn sweep(&self) -> storage::SweepStats {
        let cache = self.cache.clone();
        let policy = self.settings.retention;
        let now = self.clock.now();
        match tokio::task::spawn_blocking(move || cache.sweep(policy, now)).await {
            Ok(stats) => {
                metrics::record_sweep(stats.deleted(), stats.failed);
                stats
            }
            Err(e) => {
                warn!(error = %e, "Sweep task failed");
                storage::SweepStats::default()
            }
        }
    }

    async fn maybe_sweep(&self, now: DateTime<Utc>) {
        if self.sweep_policy.should_sweep(now) {
            self.sweep().await;
        }
    }

    async fn lookup(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CacheEntry> {
        let cache = self.cache.clone();
        let key = key.clone();
        let max_age = self.settings.bucket.width();
        match tokio::task::spawn_blocking(move || cache.lookup(&key, max_age, now)).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Cache lookup task failed, treating as miss");
                None
            }
        }
    }

    /// Per-key lock. Gates nobody else holds are dropped on the way.
    fn gate(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        inflight.retain(|_, gate| Arc::strong_count(gate) > 1);
        inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn render(&self, key: &CacheKey, palette: Palette, now: DateTime<Utc>) -> SatResult<ResolvedImage> {
        let timer = Timer::start();
        let scene = self.locator.locate(key.band, now).await?;

        let download = tempfile::Builder::new()
            .prefix("goes_")
            .suffix(".nc")
            .tempfile()?;
        let bytes = self
            .locator
            .source()
            .download(&scene.key, download.path())
            .await?;
        info!(key = %scene.key, bytes, "Downloaded scene");

        let decoder = self.decoder.clone();
        let path = download.path().to_path_buf();
        let window = self.settings.window;
        let spec = RenderSpec::new(key.band, palette.name(), self.settings.image_size);
        let rendered = tokio::task::spawn_blocking(move || {
            pipeline::render_scene(decoder.as_ref(), &path, &window, &spec)
        })
        .await
        .map_err(|e| SatError::Processing(format!("render task failed: {}", e)));

        if let Err(e) = download.close() {
            warn!(error = %e, "Failed to remove downloaded scene");
        }
        let pair = rendered??;

        let cache = self.cache.clone();
        let store_key = key.clone();
        let entry = tokio::task::spawn_blocking(move || {
            cache.store(&store_key, &pair.image_png, &pair.legend_png)
        })
        .await
        .map_err(|e| SatError::CacheIo(format!("cache write task failed: {}", e)))??;

        metrics::record_render(timer.elapsed_ms());
        info!(image = %entry.image_path.display(), elapsed_ms = timer.elapsed_ms(), "Rendered satellite image");

        Ok(ResolvedImage {
            image_path: entry.image_path,
            legend_path: entry.legend_path,
            timestamp: now,
            cached: false,
        })
    }
}
