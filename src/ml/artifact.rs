use crate::error::{AppError, Result};
use crate::ml::classifier::{check_width, Classifier, TrainedModel};
use crate::ml::features::feature_names;
use crate::ml::models::{ModelMetadata, ModelType};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Fitted model plus the metadata needed to serve it
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    pub model: TrainedModel,
}

impl ModelArtifact {
    pub fn new(metadata: ModelMetadata, model: TrainedModel) -> Self {
        Self { metadata, model }
    }

    /// Write the artifact, replacing any previous file atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        info!(
            path = %path.display(),
            model_type = %self.metadata.model_type,
            "Model artifact saved"
        );
        Ok(())
    }

    /// Read an artifact written by [`ModelArtifact::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            AppError::Initialization(format!(
                "Cannot open model artifact {}: {} (run `vitals-cli train` first)",
                path.display(),
                e
            ))
        })?;

        // Decode from memory so corrupt length prefixes fail instead of allocating
        let artifact: Self = bincode::deserialize(&bytes).map_err(|e| {
            AppError::Initialization(format!(
                "Cannot decode model artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(
            path = %path.display(),
            model_type = %artifact.metadata.model_type,
            trained_at = %artifact.metadata.trained_at,
            accuracy = artifact.metadata.validation_metrics.accuracy,
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    /// Load and verify the artifact matches the compiled feature schema
    pub fn load_checked<P: AsRef<Path>>(path: P) -> Result<Self> {
        let artifact = Self::load(path)?;
        artifact.ensure_schema()?;
        Ok(artifact)
    }

    /// The artifact must have been fitted on the current feature schema
    pub fn ensure_schema(&self) -> Result<()> {
        let expected = feature_names();
        if self.metadata.feature_names != expected {
            return Err(AppError::Initialization(format!(
                "Model was trained on features {:?}, expected {:?}",
                self.metadata.feature_names, expected
            )));
        }
        if self.model.model_type() != self.metadata.model_type {
            return Err(AppError::Initialization(format!(
                "Metadata says {} but artifact holds {}",
                self.metadata.model_type,
                self.model.model_type()
            )));
        }
        Ok(())
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<i32>> {
        check_width(features, self.n_features())?;
        self.model.predict_unchecked(features)
    }

    fn model_type(&self) -> ModelType {
        self.metadata.model_type
    }

    fn n_features(&self) -> usize {
        self.metadata.n_features()
    }
}
