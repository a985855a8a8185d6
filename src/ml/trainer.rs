use crate::config::Config;
use crate::error::Result;
use crate::ml::artifact::ModelArtifact;
use crate::ml::classifier::{Classifier, Hyperparameters, TrainedModel};
use crate::ml::dataset::load_csv;
use crate::ml::models::{ModelMetadata, ModelMetrics, ModelType, TrainingDataset};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Everything the trainer needs for one run
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub dataset_path: PathBuf,
    pub label_column: String,
    pub test_size: f64,
    pub seed: u64,
    pub algorithm: ModelType,
    pub hyperparameters: Hyperparameters,
    pub model_path: PathBuf,
}

impl TrainingOptions {
    pub fn from_config(config: &Config) -> Self {
        let training = &config.training;
        Self {
            dataset_path: training.dataset_path.clone(),
            label_column: training.label_column.clone(),
            test_size: training.test_size,
            seed: training.seed,
            algorithm: training.algorithm,
            hyperparameters: Hyperparameters {
                n_trees: training.n_trees,
                max_depth: training.max_depth,
                seed: training.seed,
            },
            model_path: config.model.path.clone(),
        }
    }
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("health_data.csv"),
            label_column: "target".to_string(),
            test_size: 0.2,
            seed: 42,
            algorithm: ModelType::default(),
            hyperparameters: Hyperparameters::default(),
            model_path: PathBuf::from("model.bin"),
        }
    }
}

/// Fitted artifact together with the rows it was evaluated on
#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub test_set: TrainingDataset,
}

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub model_type: ModelType,
    pub accuracy: f64,
    pub metrics: ModelMetrics,
    pub n_training_samples: usize,
    pub n_test_samples: usize,
    pub model_path: PathBuf,
    pub duration_ms: u128,
}

/// Offline trainer: load, split, fit, evaluate, persist
pub struct Trainer {
    options: TrainingOptions,
}

impl Trainer {
    pub fn new(options: TrainingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    /// Split `dataset`, fit on the training rows and score the held-out rows
    pub fn fit(&self, dataset: &TrainingDataset) -> Result<TrainingOutcome> {
        let opts = &self.options;
        let (train_set, test_set) = dataset.train_test_split(opts.test_size, opts.seed)?;

        info!(
            algorithm = %opts.algorithm,
            train_samples = train_set.n_samples(),
            test_samples = test_set.n_samples(),
            seed = opts.seed,
            "Fitting classifier"
        );

        let model = TrainedModel::fit(opts.algorithm, &opts.hyperparameters, &train_set)?;

        let metadata = ModelMetadata {
            name: format!("{} activity classifier", opts.algorithm),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model_type: opts.algorithm,
            trained_at: chrono::Utc::now(),
            feature_names: dataset.feature_names.clone(),
            label_column: opts.label_column.clone(),
            classes: dataset.classes(),
            n_training_samples: train_set.n_samples(),
            n_test_samples: test_set.n_samples(),
            validation_metrics: ModelMetrics::new(),
            hyperparameters: opts.hyperparameters.describe(opts.algorithm),
        };
        let mut artifact = ModelArtifact::new(metadata, model);

        let predictions = artifact.predict(&test_set.features)?;
        artifact.metadata.validation_metrics = ModelMetrics::evaluate(&test_set.labels, &predictions);

        Ok(TrainingOutcome { artifact, test_set })
    }

    /// Full run against the configured dataset and artifact path
    pub fn run(&self) -> Result<TrainingReport> {
        let started = Instant::now();
        let dataset = load_csv(&self.options.dataset_path, &self.options.label_column)?;

        let outcome = self.fit(&dataset)?;
        outcome.artifact.save(&self.options.model_path)?;

        let metadata = &outcome.artifact.metadata;
        let report = TrainingReport {
            model_type: metadata.model_type,
            accuracy: metadata.validation_metrics.accuracy,
            metrics: metadata.validation_metrics.clone(),
            n_training_samples: metadata.n_training_samples,
            n_test_samples: metadata.n_test_samples,
            model_path: self.options.model_path.clone(),
            duration_ms: started.elapsed().as_millis(),
        };

        info!(
            accuracy = report.accuracy,
            precision = report.metrics.precision,
            recall = report.metrics.recall,
            f1_score = report.metrics.f1_score,
            duration_ms = report.duration_ms as u64,
            "Training completed"
        );
        Ok(report)
    }
}
