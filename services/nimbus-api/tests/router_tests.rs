//! Route-level tests: requests go through the axum router with a fake
//! satellite pipeline and mock collaborators.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{harness_with, Harness, Options};
use nimbus_api::api_router;
use nimbus_api::config::NimbusConfig;
use nimbus_api::state::AppState;
use sat_common::Clock;

struct TestApp {
    router: Router,
    source: Arc<common::FakeSource>,
    _dir: tempfile::TempDir,
}

fn app(options: Options, config: NimbusConfig) -> TestApp {
    let Harness {
        service,
        source,
        clock,
        dir,
        ..
    } = harness_with(options);
    let service = Arc::try_unwrap(service)
        .ok()
        .expect("service is not shared yet");
    let clock: Arc<dyn Clock> = clock;
    let state = AppState::with_satellite(config, service, clock).unwrap();

    TestApp {
        router: api_router(Arc::new(state)),
        source,
        _dir: dir,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, body) = get(&app.router, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "message": "Nimbus API is running!"}));
}

#[tokio::test]
async fn test_satellite_image_then_cached() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, first) = get(&app.router, "/api/satellite-image?band=13&palette=inferno").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert!(first["image"].as_str().unwrap().starts_with("data:image/png;base64,iVBOR"));
    assert!(first["legend"].as_str().unwrap().starts_with("data:image/png;base64,"));
    assert!(chrono::DateTime::parse_from_rfc3339(first["timestamp"].as_str().unwrap()).is_ok());

    let (_, second) = get(&app.router, "/api/satellite-image?band=13&palette=inferno").await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["image"], first["image"]);
    assert_eq!(app.source.downloads(), 1);

    let (_, refreshed) = get(&app.router, "/api/satellite-image?band=13&palette=inferno&refresh=true").await;
    assert_eq!(refreshed["cached"], false);
    assert_eq!(app.source.downloads(), 2);
}

#[tokio::test]
async fn test_satellite_defaults_to_band_13() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, body) = get(&app.router, "/api/satellite-image").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    let (_, usage) = get(&app.router, "/api/satellite-image/disk-usage").await;
    assert_eq!(usage["file_count"], 2);
    assert!(usage["newest_file"].as_str().unwrap().contains("band_13_inferno"));
}

#[tokio::test]
async fn test_satellite_malformed_band_uses_default() {
    let app = app(Options::default(), NimbusConfig::default());

    for uri in ["/api/satellite-image?band=abc", "/api/satellite-image?band=300"] {
        let (status, body) = get(&app.router, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(body["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
    }

    let (_, usage) = get(&app.router, "/api/satellite-image/disk-usage").await;
    assert_eq!(usage["file_count"], 2);
    assert!(usage["newest_file"].as_str().unwrap().contains("band_13_inferno"));
    assert_eq!(app.source.downloads(), 1);
}

#[tokio::test]
async fn test_satellite_missing_scene_is_500() {
    let app = app(
        Options {
            empty_bucket: true,
            ..Options::default()
        },
        NimbusConfig::default(),
    );

    let (status, body) = get(&app.router, "/api/satellite-image?band=2").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("No scene found"));
}

#[tokio::test]
async fn test_unknown_news_category() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, body) = get(&app.router, "/api/noticias/farandula").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Categoría no válida. Use: general, deportes, clima, politica, economia"
    );
}

#[tokio::test]
async fn test_news_category() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [
                {"title": "Gol de Godoy Cruz", "source": {"name": "Olé"}},
                {"title": "Clásico mendocino"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let mut config = NimbusConfig::default();
    config.newsapi_key = Some("key".to_string());
    config.endpoints.newsapi = format!("{}/v2/everything", mock_server.uri());
    let app = app(Options::default(), config);

    let (status, body) = get(&app.router, "/api/noticias/deportes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categoria"], "deportes");
    assert_eq!(body["total_noticias"], 2);
    assert_eq!(body["noticias"][1]["fuente"], "Fuente desconocida");
    assert_eq!(body["noticias"][1]["descripcion"], "Sin descripción");
}

#[tokio::test]
async fn test_news_overview_without_key_is_empty() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, body) = get(&app.router, "/api/noticias").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_categorias"], 3);
    assert_eq!(body["noticias"]["general"], json!([]));
    assert_eq!(body["noticias"]["clima"], json!([]));
}

#[tokio::test]
async fn test_prediction_requires_coordinates() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, body) = get(&app.router, "/api/main-prediction?lat=-32.9").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Se requieren los parámetros 'lat' y 'lon'");
}

#[tokio::test]
async fn test_coords_requires_both() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, body) = get(&app.router, "/api/meteo/coords?lon=-68.8").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Debes enviar lat y lon como parámetros");
}

#[tokio::test]
async fn test_unconfigured_city() {
    let app = app(Options::default(), NimbusConfig::default());

    let (status, body) = get(&app.router, "/api/clima/rosario").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Ciudad no configurada"}));
}

#[tokio::test]
async fn test_city_weather_upstream_error_is_200() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&mock_server)
        .await;

    let mut config = NimbusConfig::default();
    config.openweather_api_key = Some("key".to_string());
    config.endpoints.openweather = mock_server.uri();
    let app = app(Options::default(), config);

    let (status, body) = get(&app.router, "/api/clima/mendoza").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("503"));
}
