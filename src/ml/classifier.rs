use crate::error::{AppError, Result};
use crate::ml::features::FeatureVector;
use crate::ml::models::{ModelType, TrainingDataset};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};
use std::collections::BTreeMap;

type Matrix = DenseMatrix<f64>;
type Labels = Vec<i32>;

/// Trained classification capability.
///
/// Serving code only depends on this trait, so the underlying algorithm can be
/// swapped without touching request handling.
pub trait Classifier: Send + Sync {
    /// Predict a class label per row
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<i32>>;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Number of columns the model was fitted on
    fn n_features(&self) -> usize;

    /// Predict the class of a single reading
    fn predict_one(&self, features: &FeatureVector) -> Result<i32> {
        self.predict(&features.to_array())?
            .first()
            .copied()
            .ok_or_else(|| AppError::Model("Model returned no prediction".to_string()))
    }
}

/// Hyperparameters shared by the supported algorithms
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperparameters {
    pub n_trees: u16,
    pub max_depth: Option<u16>,
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

impl Hyperparameters {
    /// Values that apply to `model_type`, for the artifact metadata
    pub fn describe(&self, model_type: ModelType) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        match model_type {
            ModelType::RandomForest => {
                params.insert("n_trees".to_string(), self.n_trees.to_string());
                params.insert("seed".to_string(), self.seed.to_string());
            }
            ModelType::DecisionTree => {
                params.insert("criterion".to_string(), "gini".to_string());
            }
            ModelType::LogisticRegression => {}
        }
        if model_type != ModelType::LogisticRegression {
            if let Some(depth) = self.max_depth {
                params.insert("max_depth".to_string(), depth.to_string());
            }
        }
        params
    }
}

/// Fitted smartcore model
#[derive(Serialize, Deserialize)]
pub enum TrainedModel {
    RandomForest(RandomForestClassifier<f64, i32, Matrix, Labels>),
    DecisionTree(DecisionTreeClassifier<f64, i32, Matrix, Labels>),
    LogisticRegression(LogisticRegression<f64, i32, Matrix, Labels>),
}

impl std::fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TrainedModel({})", self.model_type())
    }
}

impl TrainedModel {
    /// Fit `model_type` on every row of `dataset`
    pub fn fit(
        model_type: ModelType,
        params: &Hyperparameters,
        dataset: &TrainingDataset,
    ) -> Result<Self> {
        if dataset.n_samples() == 0 {
            return Err(AppError::Validation(
                "Cannot fit a model on an empty dataset".to_string(),
            ));
        }

        let x = ndarray_to_densematrix(&dataset.features);
        let y: Labels = dataset.labels.clone();

        let model = match model_type {
            ModelType::RandomForest => {
                let mut rf_params = RandomForestClassifierParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_seed(params.seed);
                if let Some(depth) = params.max_depth {
                    rf_params = rf_params.with_max_depth(depth);
                }

                let model = RandomForestClassifier::fit(&x, &y, rf_params).map_err(|e| {
                    AppError::Model(format!("Failed to train random forest: {}", e))
                })?;
                TrainedModel::RandomForest(model)
            }
            ModelType::DecisionTree => {
                let mut tree_params =
                    DecisionTreeClassifierParameters::default().with_criterion(SplitCriterion::Gini);
                if let Some(depth) = params.max_depth {
                    tree_params = tree_params.with_max_depth(depth);
                }

                let model = DecisionTreeClassifier::fit(&x, &y, tree_params).map_err(|e| {
                    AppError::Model(format!("Failed to train decision tree: {}", e))
                })?;
                TrainedModel::DecisionTree(model)
            }
            ModelType::LogisticRegression => {
                let model =
                    LogisticRegression::fit(&x, &y, LogisticRegressionParameters::default())
                        .map_err(|e| {
                            AppError::Model(format!("Failed to train logistic regression: {}", e))
                        })?;
                TrainedModel::LogisticRegression(model)
            }
        };

        Ok(model)
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            TrainedModel::RandomForest(_) => ModelType::RandomForest,
            TrainedModel::DecisionTree(_) => ModelType::DecisionTree,
            TrainedModel::LogisticRegression(_) => ModelType::LogisticRegression,
        }
    }

    /// Predict without checking the column count
    pub fn predict_unchecked(&self, features: &Array2<f64>) -> Result<Vec<i32>> {
        let x = ndarray_to_densematrix(features);
        let predictions = match self {
            TrainedModel::RandomForest(model) => model.predict(&x),
            TrainedModel::DecisionTree(model) => model.predict(&x),
            TrainedModel::LogisticRegression(model) => model.predict(&x),
        }
        .map_err(|e| AppError::Model(format!("Prediction failed: {}", e)))?;

        Ok(predictions)
    }
}

/// Reject matrices whose width differs from what the model was fitted on
pub fn check_width(features: &Array2<f64>, expected: usize) -> Result<()> {
    if features.ncols() != expected {
        return Err(AppError::Validation(format!(
            "Expected {} features, got {}",
            expected,
            features.ncols()
        )));
    }
    Ok(())
}

fn ndarray_to_densematrix(arr: &Array2<f64>) -> Matrix {
    let shape = arr.shape();
    let data: Vec<f64> = arr.iter().copied().collect();
    DenseMatrix::new(shape[0], shape[1], data, false)
}
