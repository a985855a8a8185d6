/// Machine learning module for activity classification
///
/// This module provides:
/// - The feature schema shared by training and serving
/// - CSV dataset loading and a seeded train/test split
/// - Classifiers backed by smartcore (random forest, decision tree, logistic regression)
/// - Held-out evaluation metrics
/// - Model artifact persistence

pub mod artifact;
pub mod classifier;
pub mod dataset;
pub mod features;
pub mod models;
pub mod trainer;

pub use artifact::ModelArtifact;
pub use classifier::{Classifier, Hyperparameters, TrainedModel};
pub use dataset::{load_csv, parse_csv};
pub use features::{feature_names, FeatureSpec, FeatureVector, FEATURE_SCHEMA, N_FEATURES};
pub use models::{ClassMetrics, ModelMetadata, ModelMetrics, ModelType, TrainingDataset};
pub use trainer::{Trainer, TrainingOptions, TrainingOutcome, TrainingReport};
