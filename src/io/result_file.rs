//! Read/write result JSON files.
//!
//! Result JSON is the portable representation of a finished analysis:
//! inputs (outcome, predictors, covariates), the per-subset fit-statistic
//! table, and the three dominance statistics. The schema is defined by
//! `domain::DominanceResult`; rendering tables from it is a downstream
//! concern.

use std::fs::File;
use std::path::Path;

use crate::domain::DominanceResult;
use crate::error::DominanceError;

/// Write a result JSON file.
pub fn write_result_json(path: &Path, result: &DominanceResult) -> Result<(), DominanceError> {
    let file = File::create(path).map_err(|e| {
        DominanceError::Io(format!(
            "Failed to create result JSON '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, result)
        .map_err(|e| DominanceError::Io(format!("Failed to write result JSON: {e}")))
}

/// Read a result JSON file.
pub fn read_result_json(path: &Path) -> Result<DominanceResult, DominanceError> {
    let file = File::open(path).map_err(|e| {
        DominanceError::Io(format!(
            "Failed to open result JSON '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::from_reader(file)
        .map_err(|e| DominanceError::Io(format!("Invalid result JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::Dataset;
    use crate::domain::{DominanceOptions, Predictor};
    use crate::dominance::analysis::dominance;

    #[test]
    fn result_json_round_trips() {
        let data = Dataset::from_columns([
            ("y", vec![1.0, 2.0, 3.5, 4.0, 5.2, 6.1, 7.3, 8.0]),
            ("a", vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]),
            ("b", vec![1.0, 0.0, 2.0, 1.0, 3.0, 2.0, 4.0, 3.0]),
        ])
        .unwrap();
        let predictors = vec![Predictor::single("a"), Predictor::single("b")];
        let result = dominance(&data, "y", &predictors, &DominanceOptions::default()).unwrap();

        let path = std::env::temp_dir().join("dominance_result_roundtrip.json");
        write_result_json(&path, &result).unwrap();
        let restored = read_result_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(result, restored);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_result_json(Path::new("/nonexistent/result.json")).unwrap_err();
        assert!(matches!(err, DominanceError::Io(_)));
    }
}
