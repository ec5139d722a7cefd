//! Fake scene source and decoder shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netcdf_parser::{AxisEncoding, GoesProjection, GoesScene, NetCdfResult, SceneDecoder};
use projection::Geostationary;
use sat_common::{Clock, GeoWindow, ManualClock, SatResult, TimeBucket};
use storage::scene::hour_prefix;
use storage::{ImageCache, LocatorConfig, ObjectEntry, RetentionPolicy, SceneLocator, SceneSource};

use nimbus_api::satellite::sweep_policy::{Never, SweepPolicy};
use nimbus_api::satellite::{SatelliteService, SatelliteSettings};

/// Lists one band-13 and one band-2 key in the hour containing `hour`.
pub struct FakeSource {
    prefix: String,
    pub lists: AtomicUsize,
    pub downloads: AtomicUsize,
    pub download_delay: StdDuration,
    pub empty: bool,
}

impl FakeSource {
    pub fn new(hour: DateTime<Utc>) -> Self {
        Self {
            prefix: hour_prefix("ABI-L2-CMIPF", hour),
            lists: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            download_delay: StdDuration::ZERO,
            empty: false,
        }
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SceneSource for FakeSource {
    async fn list(&self, prefix: &str) -> SatResult<Vec<ObjectEntry>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.empty || prefix != self.prefix {
            return Ok(Vec::new());
        }
        Ok(vec![
            ObjectEntry::new(format!("{}OR_ABI-L2-CMIPF-M6C02_G19_s1.nc", prefix)),
            ObjectEntry::new(format!("{}OR_ABI-L2-CMIPF-M6C13_G19_s2.nc", prefix)),
        ])
    }

    async fn download(&self, _key: &str, dest: &Path) -> SatResult<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if !self.download_delay.is_zero() {
            tokio::time::sleep(self.download_delay).await;
        }
        tokio::fs::write(dest, b"CDF").await?;
        Ok(3)
    }
}

/// Ignores the file and returns a synthetic brightness-temperature scene
/// covering `window` with some margin.
pub struct FakeDecoder {
    pub window: GeoWindow,
    pub decodes: AtomicUsize,
    pub fail: bool,
}

impl FakeDecoder {
    pub fn new(window: GeoWindow) -> Self {
        Self {
            window,
            decodes: AtomicUsize::new(0),
            fail: false,
        }
    }
}

impl SceneDecoder for FakeDecoder {
    fn decode(&self, _path: &Path) -> NetCdfResult<GoesScene> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(netcdf_parser::NetCdfError::MissingData("CMI".to_string()));
        }
        Ok(scene_around(&self.window, 40))
    }
}

pub fn scene_around(window: &GeoWindow, n: usize) -> GoesScene {
    let projection = GoesProjection::default();
    let geo = Geostationary::from_goes(
        projection.perspective_point_height,
        projection.semi_major_axis,
        projection.semi_minor_axis,
        projection.longitude_origin,
        0.0,
        0.0,
        1.0,
        1.0,
        1,
        1,
    );
    let scans: Vec<(f64, f64)> = window
        .corners()
        .iter()
        .filter_map(|&(lon, lat)| geo.geo_to_scan(lon, lat))
        .collect();
    let x_min = scans.iter().map(|s| s.0).fold(f64::INFINITY, f64::min) - 0.005;
    let x_max = scans.iter().map(|s| s.0).fold(f64::NEG_INFINITY, f64::max) + 0.005;
    let y_min = scans.iter().map(|s| s.1).fold(f64::INFINITY, f64::min) - 0.005;
    let y_max = scans.iter().map(|s| s.1).fold(f64::NEG_INFINITY, f64::max) + 0.005;

    let data = (0..n * n)
        .map(|k| 200.0 + ((k / n) + (k % n)) as f32)
        .collect();

    GoesScene {
        data,
        width: n,
        height: n,
        projection,
        x: AxisEncoding::new((x_max - x_min) / (n - 1) as f64, x_min),
        y: AxisEncoding::new(-(y_max - y_min) / (n - 1) as f64, y_max),
        band_id: Some(13),
        time: None,
    }
}

pub struct Harness {
    pub service: Arc<SatelliteService>,
    pub source: Arc<FakeSource>,
    pub decoder: Arc<FakeDecoder>,
    pub clock: Arc<ManualClock>,
    pub dir: tempfile::TempDir,
}

pub struct Options {
    pub download_delay: StdDuration,
    pub empty_bucket: bool,
    pub fail_decode: bool,
    pub sweep_policy: Arc<dyn SweepPolicy>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            download_delay: StdDuration::ZERO,
            empty_bucket: false,
            fail_decode: false,
            sweep_policy: Arc::new(Never),
        }
    }
}

pub fn harness() -> Harness {
    harness_with(Options::default())
}

/// Build a service over a temp cache directory. The clock starts at the
/// real current time so file modification times line up with it.
pub fn harness_with(options: Options) -> Harness {
    let now = Utc::now();
    let clock = Arc::new(ManualClock::new(now));

    let mut source = FakeSource::new(now);
    source.download_delay = options.download_delay;
    source.empty = options.empty_bucket;
    let source = Arc::new(source);

    let window = GeoWindow::mendoza();
    let mut decoder = FakeDecoder::new(window);
    decoder.fail = options.fail_decode;
    let decoder = Arc::new(decoder);

    let dir = tempfile::tempdir().expect("tempdir");

    let clock_dyn: Arc<dyn Clock> = clock.clone();
    let service = SatelliteService::new(
        SceneLocator::new(source.clone(), LocatorConfig::default()),
        decoder.clone(),
        ImageCache::new(dir.path()),
        clock_dyn,
        options.sweep_policy,
        SatelliteSettings {
            window,
            bucket: TimeBucket::minutes(30),
            retention: RetentionPolicy::default(),
            image_size: 64,
        },
    );

    Harness {
        service: Arc::new(service),
        source,
        decoder,
        clock,
        dir,
    }
}
