//! Integration tests for the collaborator clients using wiremock.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nimbus_api::clients::{
    http_client, HailModelClient, IpGeoClient, NewsService, OpenMeteoClient, OpenWeatherClient,
};
use nimbus_api::prediction::HailPredictor;
use sat_common::ManualClock;

fn http() -> reqwest::Client {
    http_client(StdDuration::from_secs(5)).unwrap()
}

fn article(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Tormenta fuerte sobre el Gran Mendoza",
        "source": {"name": "Los Andes"},
        "publishedAt": "2025-03-14T10:30:00Z",
        "url": "https://example.com/nota"
    })
}

#[tokio::test]
async fn test_openweather_current() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("id", "3844421"))
        .and(query_param("appid", "secret"))
        .and(query_param("units", "metric"))
        .and(query_param("lang", "es"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Mendoza",
            "main": {"temp": 24.3, "feels_like": 23.9, "humidity": 31},
            "weather": [{"description": "cielo claro", "icon": "01d"}]
        })))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::new(
        http(),
        format!("{}/weather", mock_server.uri()),
        Some("secret".to_string()),
    );
    let weather = client.current(3844421).await.unwrap();

    assert_eq!(weather.ciudad, "Mendoza");
    assert_eq!(weather.temperatura, 24.3);
    assert_eq!(weather.humedad, 31.0);
    assert_eq!(weather.clima, "cielo claro");
    assert_eq!(weather.icono, "01d");
}

#[tokio::test]
async fn test_openweather_without_key_fails_locally() {
    let mock_server = MockServer::start().await;
    let client = OpenWeatherClient::new(http(), mock_server.uri(), None);

    let err = client.current(3844421).await.unwrap_err();

    assert!(err.to_string().contains("OPENWEATHER_API_KEY"));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_openweather_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::new(http(), mock_server.uri(), Some("bad".to_string()));
    let err = client.current(1).await.unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("401"), "{}", message);
    assert!(message.contains("Invalid API key"), "{}", message);
}

#[tokio::test]
async fn test_city_weather_geocodes_then_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "Córdoba"))
        .and(query_param("count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"latitude": -31.41, "longitude": -64.18, "name": "Córdoba", "country": "Argentina"}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "-31.41"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": -31.4,
            "longitude": -64.2,
            "timezone": "America/Argentina/Cordoba",
            "current_weather": {"temperature": 27.1, "windspeed": 9.0}
        })))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoClient::new(
        http(),
        format!("{}/search", mock_server.uri()),
        format!("{}/forecast", mock_server.uri()),
    );
    let report = client.city_weather("Córdoba").await.unwrap();

    assert_eq!(report.source, "geocoding");
    assert_eq!(report.city, "Córdoba");
    assert_eq!(report.country.as_deref(), Some("Argentina"));
    assert_eq!(report.lat, -31.41);
    assert_eq!(report.weather.current_weather.unwrap()["temperature"], 27.1);
}

#[tokio::test]
async fn test_geocode_no_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoClient::new(http(), mock_server.uri(), mock_server.uri());
    let err = client.geocode("Atlantis").await.unwrap_err();

    assert_eq!(err.to_string(), "Ciudad 'Atlantis' no encontrada");
}

#[tokio::test]
async fn test_ip_geo_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/181.1.2.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "query": "181.1.2.3",
            "city": "Mendoza",
            "regionName": "Mendoza",
            "country": "Argentina",
            "lat": -32.89,
            "lon": -68.83
        })))
        .mount(&mock_server)
        .await;

    let client = IpGeoClient::new(http(), format!("{}/json/", mock_server.uri()));
    let location = client.locate(Some("181.1.2.3")).await.unwrap();

    assert_eq!(location.ip.as_deref(), Some("181.1.2.3"));
    assert_eq!(location.region.as_deref(), Some("Mendoza"));
    assert_eq!(location.lat, -32.89);
}

#[tokio::test]
async fn test_ip_geo_failure_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "private range",
            "query": "10.0.0.1"
        })))
        .mount(&mock_server)
        .await;

    let client = IpGeoClient::new(http(), format!("{}/json/", mock_server.uri()));
    let err = client.locate(Some("10.0.0.1")).await.unwrap_err();
    assert_eq!(err.to_string(), "private range");
}

#[tokio::test]
async fn test_ip_geo_missing_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&mock_server)
        .await;

    let client = IpGeoClient::new(http(), format!("{}/json/", mock_server.uri()));
    let err = client.locate(None).await.unwrap_err();
    assert_eq!(err.to_string(), "ip-api no devolvió coordenadas para la IP");
}

#[tokio::test]
async fn test_news_cached_within_ttl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("apiKey", "news-key"))
        .and(query_param("language", "es"))
        .and(query_param("pageSize", "3"))
        .and(query_param("sortBy", "publishedAt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "articles": [article("Alerta por granizo"), article("Nevadas en alta montaña")]
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()));
    let news = NewsService::new(
        http(),
        format!("{}/v2/everything", mock_server.uri()),
        Some("news-key".to_string()),
        Duration::seconds(300),
        clock.clone(),
    );

    let first = news.headlines("clima", 3).await;
    let second = news.headlines("clima", 3).await;
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(first[0].titulo, "Alerta por granizo");
    assert_eq!(first[0].fuente, "Los Andes");
    assert_eq!(first[0].fecha, "2025-03-14");
    assert!(first[0].descripcion.ends_with("..."));

    clock.advance(Duration::seconds(301));
    news.headlines("clima", 3).await;
    // expect(2) is verified when the server drops
}

#[tokio::test]
async fn test_news_failure_is_empty_and_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let news = NewsService::new(
        http(),
        mock_server.uri(),
        Some("news-key".to_string()),
        Duration::seconds(300),
        clock,
    );

    assert!(news.headlines("general", 2).await.is_empty());
    assert!(news.headlines("general", 2).await.is_empty());
}

#[tokio::test]
async fn test_hail_model_fills_alert() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"probabilidad_granizo": 0.71})))
        .mount(&mock_server)
        .await;

    let meteo_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily": {"temperature_2m_max": [31.0], "temperature_2m_min": [15.0]},
            "hourly": {"pressure_msl": [1008.0, 1010.0]}
        })))
        .mount(&meteo_server)
        .await;

    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 20, 15, 0, 0).unwrap()));
    let predictor = HailPredictor::new(
        OpenMeteoClient::new(http(), meteo_server.uri(), meteo_server.uri()),
        HailModelClient::new(http(), format!("{}/predict", mock_server.uri())),
        clock,
    );
    let prediction = predictor.predict(-32.89, -68.84).await.unwrap();

    assert_eq!(prediction.probabilidad_granizo, 0.71);
    assert_eq!(prediction.umbral_recomendado, 0.56);
    assert_eq!(prediction.alerta_sugerida, "Sí");
}

#[tokio::test]
async fn test_hail_predictor_sends_model_columns() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("forecast_days", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily": {
                "temperature_2m_max": [30.0],
                "temperature_2m_min": [14.0],
                "snowfall_sum": [0.5],
                "precipitation_sum": [12.0]
            },
            "hourly": {"relative_humidity_2m": [40.0, 60.0]}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_partial_json(json!({
            "PRCP": 12.0,
            "SNWD": 0.5,
            "TAVG": 22.0,
            "mes": 3,
            "dia_del_año": 73,
            "om_relative_humidity_2m_mean": 50.0,
            "rango_temp_diario": 16.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "probabilidad_granizo": 0.2,
            "umbral_recomendado": 0.5,
            "alerta_sugerida": "No"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()));
    let predictor = HailPredictor::new(
        OpenMeteoClient::new(http(), mock_server.uri(), format!("{}/forecast", mock_server.uri())),
        HailModelClient::new(http(), format!("{}/predict", mock_server.uri())),
        clock,
    );
    let prediction = predictor.predict(-32.89, -68.84).await.unwrap();

    assert_eq!(prediction.umbral_recomendado, 0.5);
    assert_eq!(prediction.alerta_sugerida, "No");
}
