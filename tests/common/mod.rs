//! Common test utilities: synthetic datasets and telemetry payloads.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const HEADER: &str =
    "accelerometer_x,accelerometer_y,accelerometer_z,body_temp,heart_rate,target";

/// Deterministic resting (0) / active (1) readings.
///
/// Every third row is active: larger acceleration, warmer, faster heart rate.
pub fn activity_csv(n_rows: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');

    for i in 0..n_rows {
        let active = i % 3 == 0;
        let jitter = ((i * 17) % 11) as f64 * 0.03;
        let (accel, temp, heart_rate) = if active {
            (1.8 + jitter, 37.4 + jitter, 128.0 + jitter * 10.0)
        } else {
            (0.1 + jitter, 36.5 + jitter, 68.0 + jitter * 10.0)
        };

        writeln!(
            csv,
            "{:.3},{:.3},{:.3},{:.2},{:.1},{}",
            accel,
            accel * 0.5,
            9.8 - jitter,
            temp,
            heart_rate,
            u8::from(active)
        )
        .unwrap();
    }

    csv
}

/// Write `activity_csv(n_rows)` into `dir` and return its path
pub fn write_dataset(dir: &Path, n_rows: usize) -> PathBuf {
    let path = dir.join("health_data.csv");
    std::fs::write(&path, activity_csv(n_rows)).unwrap();
    path
}

/// Channel feed body with a single entry
pub fn feed_body(entry: serde_json::Value) -> String {
    serde_json::json!({
        "channel": {"id": 2574220, "name": "Wearable", "last_entry_id": 1},
        "feeds": [entry],
    })
    .to_string()
}

/// Flags readings whose heart rate exceeds 100
pub struct HeartRateRule;

impl vitals_predictor::ml::Classifier for HeartRateRule {
    fn predict(&self, features: &ndarray::Array2<f64>) -> vitals_predictor::Result<Vec<i32>> {
        Ok(features
            .rows()
            .into_iter()
            .map(|row| i32::from(row[4] > 100.0))
            .collect())
    }

    fn model_type(&self) -> vitals_predictor::ml::ModelType {
        vitals_predictor::ml::ModelType::DecisionTree
    }

    fn n_features(&self) -> usize {
        vitals_predictor::ml::N_FEATURES
    }
}

/// Base URL of a listener that accepts connections and never answers
pub async fn silent_provider() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}", addr)
}
