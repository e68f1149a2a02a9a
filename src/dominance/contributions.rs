//! Marginal-contribution bookkeeping.
//!
//! For every subset S and every predictor unit p not in S, the marginal
//! contribution of p at S is `fit(S ∪ {p}) - fit(S)`, where the union is
//! located by its canonical flattened key. A lookup can miss: adding a unit
//! whose members are already represented through set overlap canonicalizes
//! back onto S itself. Such cells stay undefined rather than erroring; the
//! aggregation passes skip them.

use crate::domain::Predictor;
use crate::dominance::subsets::{SubsetTable, canonical_key};

/// Per-unit marginal contributions across the whole table.
///
/// `at_subset[id][p]` is the contribution of unit p at the subset with
/// arena id `id`; `None` for units already in the subset and for undefined
/// lookups. `at_baseline[p]` is the contribution over the covariates-only
/// baseline.
#[derive(Debug, Clone)]
pub struct ContributionTable {
    pub at_baseline: Vec<Option<f64>>,
    pub at_subset: Vec<Vec<Option<f64>>>,
}

/// Derive all marginal contributions from a fully fitted table.
///
/// `null_stat` is the covariates-only baseline statistic.
pub fn compute_contributions(
    table: &SubsetTable,
    predictors: &[Predictor],
    null_stat: f64,
) -> ContributionTable {
    let nvars = predictors.len();

    let at_baseline: Vec<Option<f64>> = (0..nvars)
        .map(|p| {
            let key = canonical_key(predictors, &[p]);
            table
                .lookup(&key)
                .and_then(|id| table.fit_stat(id))
                .map(|stat| stat - null_stat)
        })
        .collect();

    let at_subset: Vec<Vec<Option<f64>>> = table
        .records()
        .iter()
        .map(|record| {
            (0..nvars)
                .map(|p| {
                    if record.contains_unit(p) {
                        return None;
                    }
                    let mut units = record.units.clone();
                    units.push(p);
                    let key = canonical_key(predictors, &units);
                    let id = table.lookup(&key)?;
                    if id == record.id {
                        // p is already represented through set-membership
                        // overlap; no contribution cell.
                        return None;
                    }
                    let base = record.fit_stat?;
                    Some(table.fit_stat(id)? - base)
                })
                .collect()
        })
        .collect();

    ContributionTable {
        at_baseline,
        at_subset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn contributions_are_stat_differences() {
        let predictors = vec![Predictor::single("a"), Predictor::single("b")];
        let mut table = SubsetTable::build(&predictors).unwrap();
        // Rows in enumeration order: {a}, {b}, {a,b}.
        table.set_fit_stats(vec![0.3, 0.5, 0.6]).unwrap();

        let contribs = compute_contributions(&table, &predictors, 0.0);

        assert_abs_diff_eq!(contribs.at_baseline[0].unwrap(), 0.3);
        assert_abs_diff_eq!(contribs.at_baseline[1].unwrap(), 0.5);

        // At {a}: adding b gives 0.6 - 0.3; a itself has no cell.
        assert!(contribs.at_subset[0][0].is_none());
        assert_abs_diff_eq!(contribs.at_subset[0][1].unwrap(), 0.3);
        // At {b}: adding a gives 0.6 - 0.5.
        assert_abs_diff_eq!(contribs.at_subset[1][0].unwrap(), 0.1);
        // The full subset has no cells at all.
        assert!(contribs.at_subset[2].iter().all(Option::is_none));
    }

    #[test]
    fn baseline_is_relative_to_the_null_stat() {
        let predictors = vec![Predictor::single("a")];
        let mut table = SubsetTable::build(&predictors).unwrap();
        table.set_fit_stats(vec![0.7]).unwrap();

        let contribs = compute_contributions(&table, &predictors, 0.2);
        assert_abs_diff_eq!(contribs.at_baseline[0].unwrap(), 0.5);
    }
}
