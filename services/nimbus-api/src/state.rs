//! Application state and shared resources.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use sat_common::{Clock, SystemClock, TimeBucket};
use storage::{GoesBucket, GoesBucketConfig, ImageCache, LocatorConfig, RetentionPolicy, SceneLocator};
use tracing::info;

use crate::clients::{http_client, HailModelClient, IpGeoClient, NewsService, OpenMeteoClient, OpenWeatherClient};
use crate::config::NimbusConfig;
use crate::prediction::HailPredictor;
use crate::satellite::sweep_policy::Probabilistic;
use crate::satellite::{SatelliteService, SatelliteSettings};

/// Shared application state.
pub struct AppState {
    pub config: NimbusConfig,
    pub satellite: SatelliteService,
    pub openweather: OpenWeatherClient,
    pub meteo: OpenMeteoClient,
    pub ip_geo: IpGeoClient,
    pub news: NewsService,
    pub hail: HailPredictor,
}

impl AppState {
    /// Production wiring: public GOES bucket, build-time decoder, wall clock.
    pub async fn new(config: NimbusConfig) -> Result<Self> {
        let sat = &config.satellite;
        let bucket = GoesBucket::anonymous(GoesBucketConfig {
            bucket: sat.bucket.clone(),
            operation_timeout: sat.s3_timeout,
            ..Default::default()
        })
        .await;
        let locator = SceneLocator::new(
            Arc::new(bucket),
            LocatorConfig {
                product: sat.product.clone(),
                lookback_hours: sat.lookback_hours,
            },
        );

        let cache = ImageCache::new(&sat.cache_dir);
        cache.ensure_dir()?;
        info!(cache_dir = %sat.cache_dir.display(), bucket = %sat.bucket, "Satellite cache ready");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let satellite = SatelliteService::new(
            locator,
            Arc::from(netcdf_parser::default_decoder()),
            cache,
            clock.clone(),
            Arc::new(Probabilistic::new(sat.sweep_probability)),
            satellite_settings(&config),
        );

        Self::with_satellite(config, satellite, clock)
    }

    /// Wire the HTTP collaborators around an existing satellite service.
    pub fn with_satellite(config: NimbusConfig, satellite: SatelliteService, clock: Arc<dyn Clock>) -> Result<Self> {
        let weather_http = http_client(config.weather_timeout)?;
        let hail_http = http_client(config.hail_timeout)?;
        let endpoints = &config.endpoints;

        let openweather = OpenWeatherClient::new(
            weather_http.clone(),
            &endpoints.openweather,
            config.openweather_api_key.clone(),
        );
        let meteo = OpenMeteoClient::new(weather_http.clone(), &endpoints.geocoding, &endpoints.forecast);
        let ip_geo = IpGeoClient::new(weather_http.clone(), &endpoints.ip_api);
        let news = NewsService::new(
            weather_http,
            &endpoints.newsapi,
            config.newsapi_key.clone(),
            Duration::seconds(config.news_ttl_secs),
            clock.clone(),
        );
        let hail = HailPredictor::new(
            meteo.clone(),
            HailModelClient::new(hail_http, &endpoints.hail_model),
            clock,
        );

        Ok(Self {
            config,
            satellite,
            openweather,
            meteo,
            ip_geo,
            news,
            hail,
        })
    }
}

/// Satellite settings derived from the configuration.
pub fn satellite_settings(config: &NimbusConfig) -> SatelliteSettings {
    let sat = &config.satellite;
    SatelliteSettings {
        window: sat.window,
        bucket: TimeBucket::minutes(sat.bucket_minutes),
        retention: RetentionPolicy {
            retention: sat.retention,
            max_age: Duration::hours(sat.max_age_hours),
        },
        image_size: sat.image_size,
    }
}
