use crate::config::Config;
use crate::error::{AppError, Result};
use crate::ml::{Classifier, FeatureVector, ModelArtifact, ModelMetadata, N_FEATURES};
use crate::telemetry::{TelemetrySource, ThingSpeakClient};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Result of one fetch-and-predict cycle
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub prediction: i64,
    pub features: FeatureVector,
    pub entry_id: Option<u64>,
    pub created_at: Option<String>,
}

/// Request-independent state of the predictor.
///
/// Built once at startup and shared read-only between requests.
pub struct PredictionService {
    source: Arc<dyn TelemetrySource>,
    model: Arc<dyn Classifier>,
    metadata: Option<ModelMetadata>,
}

impl PredictionService {
    pub fn new(source: Arc<dyn TelemetrySource>, model: Arc<dyn Classifier>) -> Result<Self> {
        if model.n_features() != N_FEATURES {
            return Err(AppError::Initialization(format!(
                "Model expects {} features, readings provide {}",
                model.n_features(),
                N_FEATURES
            )));
        }

        Ok(Self {
            source,
            model,
            metadata: None,
        })
    }

    /// Attach artifact metadata for the `/model` endpoint
    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Load the artifact and build the telemetry client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let artifact = ModelArtifact::load_checked(&config.model.path)?;
        let metadata = artifact.metadata.clone();
        let client = ThingSpeakClient::new(&config.telemetry)?;

        info!(
            feed_url = %client.feed_url().path(),
            model_type = %metadata.model_type,
            "Prediction service initialized"
        );

        Ok(Self::new(Arc::new(client), Arc::new(artifact))?.with_metadata(metadata))
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// Fetch the latest reading and classify it
    pub async fn predict_latest(&self) -> Result<PredictionOutcome> {
        let started = Instant::now();

        let entry = self.source.latest_reading().await?;
        let features = FeatureVector::from_entry(&entry)?;
        debug!(features = ?features.values(), entry_id = ?entry.entry_id, "Features extracted");

        let label = self.model.predict_one(&features)?;

        info!(
            prediction = label,
            entry_id = ?entry.entry_id,
            model_type = %self.model.model_type(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction served"
        );

        Ok(PredictionOutcome {
            prediction: i64::from(label),
            features,
            entry_id: entry.entry_id,
            created_at: entry.created_at,
        })
    }
}
