use crate::error::{AppError, Result};
use crate::ml::features::feature_names;
use crate::ml::models::TrainingDataset;
use ndarray::Array2;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Load a labeled CSV dataset.
///
/// The file must start with a header row. `label_column` is split off as the
/// class label and every other column, in file order, must match the feature
/// schema exactly.
pub fn load_csv<P: AsRef<Path>>(path: P, label_column: &str) -> Result<TrainingDataset> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        AppError::DataLoading(format!("Cannot read dataset {}: {}", path.display(), e))
    })?;

    let dataset = parse_csv(&contents, label_column)?;

    info!(
        path = %path.display(),
        samples = dataset.n_samples(),
        features = dataset.n_features(),
        classes = ?dataset.classes(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Parse CSV text already in memory
pub fn parse_csv(contents: &str, label_column: &str) -> Result<TrainingDataset> {
    // Spreadsheet exports often prefix a UTF-8 byte order mark
    let mut lines = contents
        .trim_start_matches('\u{feff}')
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| AppError::DataLoading("Dataset is empty".to_string()))?;
    let header = split_record(header_line);

    let label_idx = header
        .iter()
        .position(|name| name == label_column)
        .ok_or_else(|| {
            AppError::Schema(format!(
                "Label column '{}' not found in header {:?}",
                label_column, header
            ))
        })?;

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != label_idx)
        .map(|(_, name)| name.clone())
        .collect();

    let expected = feature_names();
    if columns != expected {
        return Err(AppError::Schema(format!(
            "Feature columns {:?} do not match expected {:?}",
            columns, expected
        )));
    }

    let n_features = columns.len();
    let mut values: Vec<f64> = Vec::new();
    let mut labels: Vec<i32> = Vec::new();

    for (line_no, line) in lines {
        let record = split_record(line);
        if record.len() != header.len() {
            return Err(AppError::DataLoading(format!(
                "Line {}: expected {} fields, found {}",
                line_no,
                header.len(),
                record.len()
            )));
        }

        for (idx, cell) in record.iter().enumerate() {
            let value = cell.parse::<f64>().map_err(|_| {
                AppError::DataLoading(format!(
                    "Line {}: column '{}' is not numeric: {:?}",
                    line_no, header[idx], cell
                ))
            })?;

            if idx == label_idx {
                labels.push(parse_label(value).ok_or_else(|| {
                    AppError::DataLoading(format!(
                        "Line {}: label {:?} is not an integer class",
                        line_no, cell
                    ))
                })?);
            } else {
                values.push(value);
            }
        }
    }

    if labels.is_empty() {
        return Err(AppError::DataLoading(
            "Dataset has a header but no rows".to_string(),
        ));
    }

    debug!(rows = labels.len(), "Parsed dataset rows");

    let features = Array2::from_shape_vec((labels.len(), n_features), values)
        .map_err(|e| AppError::DataLoading(format!("Failed to build feature matrix: {}", e)))?;

    TrainingDataset::new(features, labels, columns)
}

/// Split one CSV line, trimming cells and stripping surrounding quotes
fn split_record(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| {
            let cell = cell.trim();
            cell.strip_prefix('"')
                .and_then(|c| c.strip_suffix('"'))
                .unwrap_or(cell)
                .trim()
                .to_string()
        })
        .collect()
}

fn parse_label(value: f64) -> Option<i32> {
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}
