//! Activity classification for wearable vital-sign telemetry.
//!
//! An offline [`ml::Trainer`] fits a classifier on a labeled CSV dataset and
//! persists it as a [`ml::ModelArtifact`]. The HTTP service loads that artifact
//! once and, on each `GET /predict`, classifies the latest reading fetched
//! from the telemetry provider.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod ml;
pub mod service;
pub mod telemetry;

pub use error::{AppError, Result};
