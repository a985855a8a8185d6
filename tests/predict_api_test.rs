mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use vitals_predictor::{
    api::{build_router, AppState},
    config::{Config, TelemetryConfig},
    ml::{Hyperparameters, ModelType, Trainer, TrainingOptions},
    service::PredictionService,
    telemetry::ThingSpeakClient,
    AppError,
};

const FEED_PATH: &str = "/channels/2574220/feeds.json";

fn telemetry_config(server: &ServerGuard) -> TelemetryConfig {
    TelemetryConfig {
        base_url: server.url(),
        channel_id: "2574220".to_string(),
        api_key: Some("READKEY".to_string()),
        timeout_secs: 5,
        max_retries: 0,
        retry_backoff_ms: 1,
    }
}

fn app(server: &ServerGuard) -> Router {
    let client = ThingSpeakClient::new(&telemetry_config(server)).unwrap();
    let service = PredictionService::new(Arc::new(client), Arc::new(common::HeartRateRule)).unwrap();
    build_router(AppState::new(Arc::new(service)))
}

async fn serve_feed(server: &mut ServerGuard, body: String) -> mockito::Mock {
    server
        .mock("GET", FEED_PATH)
        .match_query(Matcher::UrlEncoded("results".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_predict_resting_reading() {
    let mut server = Server::new_async().await;
    let mock = serve_feed(
        &mut server,
        common::feed_body(json!({
            "field1": 1.0, "field2": 0.5, "field3": 9.8, "field4": 36.6, "field5": 72
        })),
    )
    .await;

    let (status, body) = get(app(&server), "/predict").await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"prediction": 0}));
}

#[tokio::test]
async fn test_predict_accepts_numeric_strings() {
    let mut server = Server::new_async().await;
    serve_feed(
        &mut server,
        common::feed_body(json!({
            "field1": "1.9", "field2": "0.9", "field3": "9.6", "field4": "37.8", "field5": "131"
        })),
    )
    .await;

    let (status, body) = get(app(&server), "/predict").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 1);
}

#[tokio::test]
async fn test_predict_empty_feed() {
    let mut server = Server::new_async().await;
    serve_feed(&mut server, json!({"feeds": []}).to_string()).await;

    let (status, body) = get(app(&server), "/predict").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "MALFORMED_INPUT");
    assert!(body.get("prediction").is_none());
}

#[tokio::test]
async fn test_predict_non_numeric_field() {
    let mut server = Server::new_async().await;
    serve_feed(
        &mut server,
        common::feed_body(json!({
            "field1": 1.0, "field2": 0.5, "field3": 9.8, "field4": "warm", "field5": 72
        })),
    )
    .await;

    let (status, body) = get(app(&server), "/predict").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "CONVERSION_ERROR");
    assert_eq!(body["error"]["status"], 502);
}

#[tokio::test]
async fn test_predict_missing_field() {
    let mut server = Server::new_async().await;
    serve_feed(
        &mut server,
        common::feed_body(json!({
            "field1": 1.0, "field2": 0.5, "field3": 9.8, "field4": 36.6, "field5": null
        })),
    )
    .await;

    let (status, body) = get(app(&server), "/predict").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "MALFORMED_INPUT");
}

#[tokio::test]
async fn test_predict_provider_down() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", FEED_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let (status, body) = get(app(&server), "/predict").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "NETWORK_ERROR");
}

#[tokio::test]
async fn test_predict_provider_timeout() {
    let config = TelemetryConfig {
        base_url: common::silent_provider().await,
        channel_id: "2574220".to_string(),
        api_key: None,
        timeout_secs: 1,
        max_retries: 0,
        retry_backoff_ms: 1,
    };
    let client = ThingSpeakClient::new(&config).unwrap();
    let service = PredictionService::new(Arc::new(client), Arc::new(common::HeartRateRule)).unwrap();
    let app = build_router(AppState::new(Arc::new(service)));

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "TIMEOUT");
    assert_eq!(body["error"]["status"], 504);
}

#[tokio::test]
async fn test_health() {
    let server = Server::new_async().await;

    let (status, body) = get(app(&server), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_only_documented_routes() {
    let server = Server::new_async().await;

    for uri in ["/health/live", "/health/ready"] {
        let response = app(&server)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_model_info_without_metadata() {
    let server = Server::new_async().await;

    let (status, body) = get(app(&server), "/model").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["features"],
        json!(["accelerometer_x", "accelerometer_y", "accelerometer_z", "body_temp", "heart_rate"])
    );
    assert!(body["metadata"].is_null());
}

#[tokio::test]
async fn test_service_from_trained_artifact() {
    let dir = TempDir::new().unwrap();
    let options = TrainingOptions {
        dataset_path: common::write_dataset(dir.path(), 90),
        model_path: dir.path().join("model.bin"),
        algorithm: ModelType::RandomForest,
        hyperparameters: Hyperparameters {
            n_trees: 20,
            ..Hyperparameters::default()
        },
        ..TrainingOptions::default()
    };
    Trainer::new(options.clone()).run().unwrap();

    let mut server = Server::new_async().await;
    serve_feed(
        &mut server,
        common::feed_body(json!({
            "field1": "1.95", "field2": "0.97", "field3": "9.62", "field4": "37.61", "field5": "130.4"
        })),
    )
    .await;

    let mut config = Config::load().unwrap();
    config.telemetry = telemetry_config(&server);
    config.model.path = options.model_path.clone();

    let service = PredictionService::from_config(&config).unwrap();
    let app = build_router(AppState::new(Arc::new(service)));

    let (status, body) = get(app.clone(), "/predict").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 1);

    let (status, body) = get(app, "/model").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["model_type"], "random_forest");
    assert_eq!(body["metadata"]["label_column"], "target");
}

#[test]
fn test_missing_model_fails_startup() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::load().unwrap();
    config.telemetry.channel_id = "2574220".to_string();
    config.model.path = dir.path().join("absent.bin");

    let err = match PredictionService::from_config(&config) {
        Ok(_) => panic!("service started without a model"),
        Err(e) => e,
    };

    assert!(matches!(err, AppError::Initialization(_)), "got {:?}", err);
}
