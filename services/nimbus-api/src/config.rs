//! Service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use sat_common::GeoWindow;

/// A city with an OpenWeather id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub slug: &'static str,
    pub id: u32,
    pub name: &'static str,
}

/// Cities served by `/api/clima`, in response order.
pub const CITIES: [City; 6] = [
    City { slug: "mendoza", id: 3844421, name: "Mendoza" },
    City { slug: "san_rafael", id: 3836669, name: "San Rafael" },
    City { slug: "tunuyan", id: 3833520, name: "Tunuyán" },
    City { slug: "malargue", id: 3845181, name: "Malargüe" },
    City { slug: "las_heras", id: 3848354, name: "Las Heras" },
    City { slug: "rivadavia", id: 3838759, name: "Rivadavia" },
];

pub fn find_city(slug: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.slug == slug)
}

/// Upstream base URLs. Overridable so tests can point at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub openweather: String,
    pub geocoding: String,
    pub forecast: String,
    pub ip_api: String,
    pub newsapi: String,
    pub hail_model: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openweather: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            geocoding: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast: "https://api.open-meteo.com/v1/forecast".to_string(),
            ip_api: "http://ip-api.com/json/".to_string(),
            newsapi: "https://newsapi.org/v2/everything".to_string(),
            hail_model: "https://nahuelito22-nimbus-ai.hf.space/api/predict".to_string(),
        }
    }
}

/// Satellite pipeline settings.
#[derive(Debug, Clone)]
pub struct SatelliteConfig {
    pub bucket: String,
    pub product: String,
    pub lookback_hours: u32,
    pub cache_dir: PathBuf,
    pub bucket_minutes: i64,
    pub retention: usize,
    pub max_age_hours: i64,
    pub sweep_probability: f64,
    pub image_size: usize,
    pub window: GeoWindow,
    pub s3_timeout: Duration,
}

impl Default for SatelliteConfig {
    fn default() -> Self {
        Self {
            bucket: "noaa-goes19".to_string(),
            product: "ABI-L2-CMIPF".to_string(),
            lookback_hours: 4,
            cache_dir: PathBuf::from("static/images"),
            bucket_minutes: 30,
            retention: 4,
            max_age_hours: 24,
            sweep_probability: 0.1,
            image_size: 512,
            window: GeoWindow::mendoza(),
            s3_timeout: Duration::from_secs(120),
        }
    }
}

impl SatelliteConfig {
    /// Replace out-of-range numeric settings with their defaults.
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        Self {
            lookback_hours: checked("GOES_LOOKBACK_HOURS", self.lookback_hours, defaults.lookback_hours, |v| *v > 0),
            bucket_minutes: checked("SATELLITE_BUCKET_MINUTES", self.bucket_minutes, defaults.bucket_minutes, |v| {
                *v > 0
            }),
            retention: checked("SATELLITE_RETENTION", self.retention, defaults.retention, |v| *v > 0),
            max_age_hours: checked("SATELLITE_MAX_AGE_HOURS", self.max_age_hours, defaults.max_age_hours, |v| {
                *v >= 0
            }),
            sweep_probability: checked(
                "SATELLITE_SWEEP_PROBABILITY",
                self.sweep_probability,
                defaults.sweep_probability,
                |v| (0.0..=1.0).contains(v),
            ),
            image_size: checked("SATELLITE_IMAGE_SIZE", self.image_size, defaults.image_size, |v| *v > 0),
            ..self
        }
    }
}

fn checked<T, F>(name: &str, value: T, default: T, valid: F) -> T
where
    T: std::fmt::Display,
    F: Fn(&T) -> bool,
{
    if valid(&value) {
        value
    } else {
        tracing::warn!(setting = name, value = %value, default = %default, "Out-of-range setting, using default");
        default
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct NimbusConfig {
    pub openweather_api_key: Option<String>,
    pub newsapi_key: Option<String>,
    pub endpoints: Endpoints,
    pub satellite: SatelliteConfig,
    pub weather_timeout: Duration,
    pub hail_timeout: Duration,
    pub news_ttl_secs: i64,
}

impl Default for NimbusConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            newsapi_key: None,
            endpoints: Endpoints::default(),
            satellite: SatelliteConfig::default(),
            weather_timeout: Duration::from_secs(8),
            hail_timeout: Duration::from_secs(20),
            news_ttl_secs: 300,
        }
    }
}

impl NimbusConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// An unparsable `SATELLITE_WINDOW` and out-of-range satellite numbers
    /// (a zero image size, a negative max age) are ignored with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let sat = defaults.satellite;

        let window = match env::var("SATELLITE_WINDOW") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Invalid SATELLITE_WINDOW, using Mendoza");
                sat.window
            }),
            Err(_) => sat.window,
        };

        let satellite = SatelliteConfig {
            bucket: env_string("GOES_BUCKET").unwrap_or(sat.bucket),
            product: env_string("GOES_PRODUCT").unwrap_or(sat.product),
            lookback_hours: env_parse("GOES_LOOKBACK_HOURS").unwrap_or(sat.lookback_hours),
            cache_dir: env_string("SATELLITE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(sat.cache_dir),
            bucket_minutes: env_parse("SATELLITE_BUCKET_MINUTES").unwrap_or(sat.bucket_minutes),
            retention: env_parse("SATELLITE_RETENTION").unwrap_or(sat.retention),
            max_age_hours: env_parse("SATELLITE_MAX_AGE_HOURS").unwrap_or(sat.max_age_hours),
            sweep_probability: env_parse("SATELLITE_SWEEP_PROBABILITY")
                .unwrap_or(sat.sweep_probability),
            image_size: env_parse("SATELLITE_IMAGE_SIZE").unwrap_or(sat.image_size),
            window,
            s3_timeout: env_parse("GOES_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(sat.s3_timeout),
        }
        .validated();

        let mut endpoints = defaults.endpoints;
        if let Some(url) = env_string("HAIL_MODEL_URL") {
            endpoints.hail_model = url;
        }

        Self {
            openweather_api_key: env_string("OPENWEATHER_API_KEY"),
            newsapi_key: env_string("NEWSAPI_KEY"),
            endpoints,
            satellite,
            ..defaults
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.trim().parse().ok())
}
