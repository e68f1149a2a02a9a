//! Subset enumeration and the fit-statistic table.
//!
//! The table is an arena of immutable subset records addressed by a stable
//! integer id, with a side index from the canonical term key to the id. The
//! canonical key of a subset is its flattened member list (predictor sets
//! expand to their member columns), deduplicated and sorted, so two subsets
//! are the same row exactly when their flattened member sets are equal,
//! regardless of declaration order.

use std::collections::HashMap;

use crate::domain::Predictor;
use crate::error::DominanceError;

/// Hard ceiling on predictor units. The powerset is exponential by nature;
/// beyond this the table alone would hold tens of millions of rows.
pub const MAX_UNITS: usize = 25;

/// One enumerated subset and (after the fitting stage) its statistic.
///
/// `cardinality` counts predictor units, not flattened member columns; a
/// two-variable set still contributes 1.
#[derive(Debug, Clone)]
pub struct SubsetRecord {
    pub id: usize,
    /// Ascending indices into the predictor-unit list.
    pub units: Vec<usize>,
    pub cardinality: usize,
    /// Canonical flattened term key.
    pub key: Vec<String>,
    /// Unset until the fitting stage completes.
    pub fit_stat: Option<f64>,
}

impl SubsetRecord {
    pub fn contains_unit(&self, unit: usize) -> bool {
        self.units.binary_search(&unit).is_ok()
    }
}

/// Every non-empty combination of `nvars` unit indices.
///
/// Enumeration order is the ascending bitmask order, which is stable and
/// reproducible for a given `nvars`; progress counters key on it.
pub fn enumerate_unit_sets(nvars: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::with_capacity((1usize << nvars) - 1);
    for mask in 1usize..(1 << nvars) {
        let units: Vec<usize> = (0..nvars).filter(|&j| mask & (1 << j) != 0).collect();
        out.push(units);
    }
    out
}

/// Canonical term key of a unit selection: flattened member names,
/// deduplicated and sorted.
pub fn canonical_key(predictors: &[Predictor], units: &[usize]) -> Vec<String> {
    let mut key: Vec<String> = units
        .iter()
        .flat_map(|&u| predictors[u].member_names().iter().cloned())
        .collect();
    key.sort();
    key.dedup();
    key
}

/// The fit-statistic table: one record per non-empty subset, plus a key
/// index for the contribution lookups. The covariates-only baseline is kept
/// by the caller, not as a row.
#[derive(Debug, Clone)]
pub struct SubsetTable {
    records: Vec<SubsetRecord>,
    index: HashMap<Vec<String>, usize>,
}

impl SubsetTable {
    /// Enumerate and key every subset of the given predictor units.
    ///
    /// Fails when two distinct subsets canonicalize to the same key (input
    /// validation rejects the overlapping predictors that could cause this,
    /// so a collision here means the caller skipped validation) or when the
    /// unit count exceeds [`MAX_UNITS`].
    pub fn build(predictors: &[Predictor]) -> Result<Self, DominanceError> {
        let nvars = predictors.len();
        if nvars == 0 {
            return Err(DominanceError::InvalidData(
                "At least one predictor is required.".to_string(),
            ));
        }
        if nvars > MAX_UNITS {
            return Err(DominanceError::InvalidData(format!(
                "{nvars} predictor units would require 2^{nvars} - 1 subset models; the limit is {MAX_UNITS} units."
            )));
        }

        let unit_sets = enumerate_unit_sets(nvars);
        let mut records = Vec::with_capacity(unit_sets.len());
        let mut index = HashMap::with_capacity(unit_sets.len());

        for (id, units) in unit_sets.into_iter().enumerate() {
            let key = canonical_key(predictors, &units);
            if index.insert(key.clone(), id).is_some() {
                return Err(DominanceError::InvalidData(format!(
                    "Two predictor subsets share the flattened term set [{}].",
                    key.join(", ")
                )));
            }
            records.push(SubsetRecord {
                id,
                cardinality: units.len(),
                units,
                key,
                fit_stat: None,
            });
        }

        Ok(Self { records, index })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SubsetRecord] {
        &self.records
    }

    /// Arena id of the subset with exactly this canonical key.
    pub fn lookup(&self, key: &[String]) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn fit_stat(&self, id: usize) -> Option<f64> {
        self.records.get(id).and_then(|r| r.fit_stat)
    }

    /// Store the fitting stage's output, aligned with enumeration order.
    pub fn set_fit_stats(&mut self, stats: Vec<f64>) -> Result<(), DominanceError> {
        if stats.len() != self.records.len() {
            return Err(DominanceError::InvalidData(format!(
                "Expected {} fit statistics, got {}.",
                self.records.len(),
                stats.len()
            )));
        }
        for (record, stat) in self.records.iter_mut().zip(stats) {
            record.fit_stat = Some(stat);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singles(names: &[&str]) -> Vec<Predictor> {
        names.iter().map(|&n| Predictor::single(n)).collect()
    }

    #[test]
    fn enumeration_covers_the_powerset() {
        for nvars in 1..=5 {
            let sets = enumerate_unit_sets(nvars);
            assert_eq!(sets.len(), (1 << nvars) - 1);
        }
        // Stable order: singletons first by index within each mask prefix.
        let sets = enumerate_unit_sets(3);
        assert_eq!(sets[0], [0]);
        assert_eq!(sets[1], [1]);
        assert_eq!(sets[2], [0, 1]);
        assert_eq!(sets[6], [0, 1, 2]);
    }

    #[test]
    fn table_has_unique_keys_and_unit_cardinality() {
        let predictors = vec![
            Predictor::single("am"),
            Predictor::single("cyl"),
            Predictor::set(["carb", "wt"]),
        ];
        let table = SubsetTable::build(&predictors).unwrap();
        assert_eq!(table.len(), 7);

        // The set counts as one unit even though it spans two columns.
        let full = table
            .records()
            .iter()
            .find(|r| r.cardinality == 3)
            .unwrap();
        assert_eq!(full.key, ["am", "carb", "cyl", "wt"]);
    }

    #[test]
    fn canonical_key_is_order_independent() {
        let a = vec![Predictor::set(["b", "a"]), Predictor::single("c")];
        let b = vec![Predictor::single("c"), Predictor::set(["a", "b"])];
        assert_eq!(canonical_key(&a, &[0, 1]), canonical_key(&b, &[0, 1]));
        assert_eq!(canonical_key(&a, &[0, 1]), ["a", "b", "c"]);
    }

    #[test]
    fn lookup_finds_rows_by_flattened_members() {
        let predictors = vec![Predictor::set(["b", "a"]), Predictor::single("c")];
        let table = SubsetTable::build(&predictors).unwrap();

        let key = vec!["a".to_string(), "b".to_string()];
        let id = table.lookup(&key).unwrap();
        assert_eq!(table.records()[id].units, [0]);
        assert!(table.lookup(&["a".to_string()]).is_none());
    }

    #[test]
    fn overlapping_units_collide() {
        // "a" appears both alone and inside the set: two subsets flatten to {a}.
        let predictors = vec![Predictor::single("a"), Predictor::set(["a"])];
        let err = SubsetTable::build(&predictors).unwrap_err();
        assert!(matches!(err, DominanceError::InvalidData(_)));
    }

    #[test]
    fn set_fit_stats_requires_full_coverage() {
        let mut table = SubsetTable::build(&singles(&["a", "b"])).unwrap();
        assert!(table.set_fit_stats(vec![0.1]).is_err());
        table.set_fit_stats(vec![0.1, 0.2, 0.3]).unwrap();
        assert_eq!(table.fit_stat(2), Some(0.3));
    }
}
