use crate::error::{AppError, Result};
use ndarray::{Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Labeled dataset held in memory
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features)
    pub features: Array2<f64>,

    /// Class label per row
    pub labels: Vec<i32>,

    /// Column names, in matrix order
    pub feature_names: Vec<String>,
}

impl TrainingDataset {
    pub fn new(features: Array2<f64>, labels: Vec<i32>, feature_names: Vec<String>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(AppError::DataLoading(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if features.ncols() != feature_names.len() {
            return Err(AppError::Schema(format!(
                "{} feature columns but {} names",
                features.ncols(),
                feature_names.len()
            )));
        }

        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Distinct labels, ascending
    pub fn classes(&self) -> Vec<i32> {
        self.labels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Split dataset into train/test sets.
    ///
    /// Rows are shuffled with a generator seeded from `seed`; the first
    /// `ceil(n * test_size)` shuffled rows form the test set.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Self, Self)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(AppError::Validation(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }

        let n_samples = self.n_samples();
        let n_test = (n_samples as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= n_samples {
            return Err(AppError::Validation(format!(
                "cannot split {} samples with test_size {}",
                n_samples, test_size
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));
        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok((self.select(train_idx), self.select(test_idx)))
    }

    fn select(&self, rows: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), rows),
            labels: rows.iter().map(|&i| self.labels[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }
}

/// Model evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Precision (macro average)
    pub precision: f64,

    /// Recall (macro average)
    pub recall: f64,

    /// F1 score (macro average)
    pub f1_score: f64,

    /// Per-class metrics, keyed by `class_<label>`
    pub per_class_metrics: BTreeMap<String, ClassMetrics>,
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            per_class_metrics: BTreeMap::new(),
        }
    }

    /// Compare predictions against ground truth
    pub fn evaluate(y_true: &[i32], y_pred: &[i32]) -> Self {
        let n_samples = y_true.len().min(y_pred.len());
        if n_samples == 0 {
            return Self::new();
        }

        let pairs = || y_true.iter().zip(y_pred.iter());

        let correct = pairs().filter(|(t, p)| t == p).count();
        let accuracy = correct as f64 / n_samples as f64;

        let classes: BTreeSet<i32> = y_true.iter().chain(y_pred.iter()).copied().collect();
        let mut per_class = BTreeMap::new();

        for &class in &classes {
            let tp = pairs().filter(|(t, p)| **t == class && **p == class).count();
            let fp = pairs().filter(|(t, p)| **t != class && **p == class).count();
            let fn_count = pairs().filter(|(t, p)| **t == class && **p != class).count();

            let precision = if tp + fp > 0 {
                tp as f64 / (tp + fp) as f64
            } else {
                0.0
            };

            let recall = if tp + fn_count > 0 {
                tp as f64 / (tp + fn_count) as f64
            } else {
                0.0
            };

            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            let support = y_true.iter().filter(|&&t| t == class).count();

            per_class.insert(
                format!("class_{}", class),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score: f1,
                    support,
                },
            );
        }

        let n_classes = per_class.len() as f64;
        let avg = |f: fn(&ClassMetrics) -> f64| per_class.values().map(f).sum::<f64>() / n_classes;

        Self {
            accuracy,
            precision: avg(|m| m.precision),
            recall: avg(|m| m.recall),
            f1_score: avg(|m| m.f1_score),
            per_class_metrics: per_class,
        }
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model metadata stored alongside the fitted model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Version of the crate that produced the artifact
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Feature columns, in the order the model expects them
    pub feature_names: Vec<String>,

    /// Label column the model was fitted on
    pub label_column: String,

    /// Labels seen during training, ascending
    pub classes: Vec<i32>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of held-out samples
    pub n_test_samples: usize,

    /// Held-out metrics
    pub validation_metrics: ModelMetrics,

    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
}

impl ModelMetadata {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Random forest
    #[default]
    RandomForest,

    /// Single CART decision tree
    DecisionTree,

    /// Logistic regression
    LogisticRegression,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::RandomForest => write!(f, "Random Forest"),
            ModelType::DecisionTree => write!(f, "Decision Tree"),
            ModelType::LogisticRegression => write!(f, "Logistic Regression"),
        }
    }
}

impl std::str::FromStr for ModelType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "random_forest" | "rf" => Ok(ModelType::RandomForest),
            "decision_tree" | "tree" => Ok(ModelType::DecisionTree),
            "logistic_regression" | "logistic" => Ok(ModelType::LogisticRegression),
            other => Err(AppError::Validation(format!("unknown algorithm: {}", other))),
        }
    }
}
