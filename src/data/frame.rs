//! Column-oriented in-memory dataset.
//!
//! The analysis is an in-process library call, so this is the input
//! boundary: named `f64` columns of equal length, with `NaN` standing for a
//! missing value. Rows with a missing value in any column the analysis
//! touches (outcome, predictor members, covariates, weights) are dropped
//! before fitting (complete-case analysis).

use serde::{Deserialize, Serialize};

use crate::error::DominanceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Column {
    name: String,
    values: Vec<f64>,
}

/// A named collection of equal-length `f64` columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from `(name, values)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, DominanceError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut data = Self::new();
        for (name, values) in columns {
            data.push_column(name, values)?;
        }
        Ok(data)
    }

    /// Append a column. Fails on a duplicate name or a length mismatch with
    /// the columns already present.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), DominanceError> {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(DominanceError::InvalidData(format!(
                "Duplicate column '{name}'."
            )));
        }
        if let Some(first) = self.columns.first() {
            if values.len() != first.values.len() {
                return Err(DominanceError::InvalidData(format!(
                    "Column '{name}' has {} rows, expected {}.",
                    values.len(),
                    first.values.len()
                )));
            }
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Row mask that is `true` where every named column (and the optional
    /// extra vector, e.g. weights) holds a non-missing value.
    ///
    /// Fails with `UnknownIdentifier` on the first name that is not a column.
    pub fn complete_case_mask(
        &self,
        names: &[&str],
        extra: Option<&[f64]>,
    ) -> Result<Vec<bool>, DominanceError> {
        let mut mask = vec![true; self.nrows()];
        for &name in names {
            let col = self.column(name).ok_or_else(|| {
                DominanceError::UnknownIdentifier(format!(
                    "Column '{name}' not found in the dataset."
                ))
            })?;
            for (keep, v) in mask.iter_mut().zip(col) {
                *keep &= v.is_finite();
            }
        }
        if let Some(extra) = extra {
            for (keep, v) in mask.iter_mut().zip(extra) {
                *keep &= v.is_finite();
            }
        }
        Ok(mask)
    }

    /// Copy of one column with the mask applied.
    pub fn filtered_column(&self, name: &str, mask: &[bool]) -> Option<Vec<f64>> {
        let col = self.column(name)?;
        Some(apply_mask(col, mask))
    }
}

/// Keep the values whose mask entry is `true`.
pub fn apply_mask(values: &[f64], mask: &[bool]) -> Vec<f64> {
    values
        .iter()
        .zip(mask)
        .filter_map(|(&v, &keep)| keep.then_some(v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_column_rejects_length_mismatch_and_duplicates() {
        let mut data = Dataset::new();
        data.push_column("a", vec![1.0, 2.0]).unwrap();

        let err = data.push_column("b", vec![1.0]).unwrap_err();
        assert!(matches!(err, DominanceError::InvalidData(_)));

        let err = data.push_column("a", vec![3.0, 4.0]).unwrap_err();
        assert!(matches!(err, DominanceError::InvalidData(_)));
    }

    #[test]
    fn complete_case_mask_drops_nan_rows() {
        let data = Dataset::from_columns([
            ("y", vec![1.0, f64::NAN, 3.0, 4.0]),
            ("x", vec![1.0, 2.0, f64::NAN, 4.0]),
        ])
        .unwrap();

        let mask = data.complete_case_mask(&["y", "x"], None).unwrap();
        assert_eq!(mask, [true, false, false, true]);

        let weights = [1.0, 1.0, 1.0, f64::NAN];
        let mask = data.complete_case_mask(&["y", "x"], Some(&weights)).unwrap();
        assert_eq!(mask, [true, false, false, false]);

        assert_eq!(data.filtered_column("y", &mask).unwrap(), [1.0]);
    }

    #[test]
    fn complete_case_mask_reports_unknown_columns() {
        let data = Dataset::from_columns([("y", vec![1.0])]).unwrap();
        let err = data.complete_case_mask(&["nope"], None).unwrap_err();
        assert!(matches!(err, DominanceError::UnknownIdentifier(_)));
    }
}
