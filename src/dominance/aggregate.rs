//! Dominance aggregation.
//!
//! Reduces the per-subset marginal contributions into the three dominance
//! statistics:
//!
//! - conditional: average contribution of each unit within each subset
//!   cardinality (level 0 is the contribution over the baseline)
//! - general: mean of a unit's conditional row, plus standardized shares
//!   and a strict ordinal ranking
//! - complete: pairwise comparison of contributions across all matched
//!   subsets, in both the strict (±1/0) and the proportion-in-[0,1] variants

use crate::dominance::contributions::ContributionTable;
use crate::dominance::subsets::SubsetTable;

/// Conditional dominance matrix: row p, column k is the mean marginal
/// contribution of unit p over all subsets of cardinality k that do not
/// contain it, undefined cells ignored. Column 0 has a single cell: the
/// direct contribution over the covariates-only baseline.
pub fn conditional_dominance(
    table: &SubsetTable,
    contribs: &ContributionTable,
    nvars: usize,
) -> Vec<Vec<f64>> {
    (0..nvars)
        .map(|p| {
            (0..nvars)
                .map(|level| {
                    let mut sum = 0.0;
                    let mut count = 0usize;
                    if level == 0 {
                        if let Some(v) = contribs.at_baseline[p] {
                            sum += v;
                            count += 1;
                        }
                    } else {
                        for record in table.records() {
                            if record.cardinality != level || record.contains_unit(p) {
                                continue;
                            }
                            if let Some(v) = contribs.at_subset[record.id][p] {
                                sum += v;
                                count += 1;
                            }
                        }
                    }
                    if count > 0 { sum / count as f64 } else { 0.0 }
                })
                .collect()
        })
        .collect()
}

/// General dominance: the mean of each unit's conditional row.
pub fn general_dominance(conditional: &[Vec<f64>]) -> Vec<f64> {
    conditional
        .iter()
        .map(|row| row.iter().sum::<f64>() / row.len() as f64)
        .collect()
}

/// Standardized shares: each value divided by the total (shares sum to 1).
pub fn standardized_dominance(general: &[f64]) -> Vec<f64> {
    let total: f64 = general.iter().sum();
    general.iter().map(|&v| v / total).collect()
}

/// 1-based ordinal ranks, descending by value.
///
/// A strict total order: ties are broken by input position, so ranks are
/// always a permutation of `1..=n` and deterministic for a fixed input
/// order.
pub fn ordinal_ranks_desc(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

    let mut ranks = vec![0; values.len()];
    for (position, &idx) in order.iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

/// Complete dominance in both variants.
///
/// For each ordered pair (i, j) the matched subsets are the baseline plus
/// every subset containing neither unit, restricted to subsets where both
/// contributions are defined.
///
/// Returns `(strict, proportion)`:
/// - strict: +1 when i's contribution exceeds j's in every matched subset,
///   −1 for the reverse, 0 otherwise (antisymmetric, diagonal 0)
/// - proportion: fraction of matched subsets where i's contribution strictly
///   exceeds j's (diagonal 0; no forced symmetry)
pub fn complete_dominance(
    table: &SubsetTable,
    contribs: &ContributionTable,
    nvars: usize,
) -> (Vec<Vec<i8>>, Vec<Vec<f64>>) {
    let mut strict = vec![vec![0i8; nvars]; nvars];
    let mut proportion = vec![vec![0.0f64; nvars]; nvars];

    for i in 0..nvars {
        for j in (i + 1)..nvars {
            let mut matched = 0usize;
            let mut i_wins = 0usize;
            let mut j_wins = 0usize;

            let mut tally = |ci: Option<f64>, cj: Option<f64>| {
                if let (Some(ci), Some(cj)) = (ci, cj) {
                    matched += 1;
                    if ci > cj {
                        i_wins += 1;
                    } else if cj > ci {
                        j_wins += 1;
                    }
                }
            };

            tally(contribs.at_baseline[i], contribs.at_baseline[j]);
            for record in table.records() {
                if record.contains_unit(i) || record.contains_unit(j) {
                    continue;
                }
                tally(contribs.at_subset[record.id][i], contribs.at_subset[record.id][j]);
            }

            if matched > 0 {
                if i_wins == matched {
                    strict[i][j] = 1;
                    strict[j][i] = -1;
                } else if j_wins == matched {
                    strict[i][j] = -1;
                    strict[j][i] = 1;
                }
                proportion[i][j] = i_wins as f64 / matched as f64;
                proportion[j][i] = j_wins as f64 / matched as f64;
            }
        }
    }

    (strict, proportion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Predictor;
    use crate::dominance::contributions::compute_contributions;
    use approx::assert_abs_diff_eq;

    /// Two-unit table with hand-picked statistics:
    /// fit({a}) = 0.3, fit({b}) = 0.5, fit({a,b}) = 0.6, null = 0.
    fn fixture() -> (SubsetTable, ContributionTable, Vec<Predictor>) {
        let predictors = vec![Predictor::single("a"), Predictor::single("b")];
        let mut table = SubsetTable::build(&predictors).unwrap();
        table.set_fit_stats(vec![0.3, 0.5, 0.6]).unwrap();
        let contribs = compute_contributions(&table, &predictors, 0.0);
        (table, contribs, predictors)
    }

    #[test]
    fn conditional_levels_match_hand_computation() {
        let (table, contribs, _) = fixture();
        let conditional = conditional_dominance(&table, &contribs, 2);

        // a: level 0 = 0.3; level 1 = fit({a,b}) - fit({b}) = 0.1.
        assert_abs_diff_eq!(conditional[0][0], 0.3);
        assert_abs_diff_eq!(conditional[0][1], 0.1);
        // b: level 0 = 0.5; level 1 = 0.3.
        assert_abs_diff_eq!(conditional[1][0], 0.5);
        assert_abs_diff_eq!(conditional[1][1], 0.3);
    }

    #[test]
    fn general_is_the_row_mean_and_shares_sum_to_one() {
        let (table, contribs, _) = fixture();
        let conditional = conditional_dominance(&table, &contribs, 2);
        let general = general_dominance(&conditional);

        assert_abs_diff_eq!(general[0], 0.2);
        assert_abs_diff_eq!(general[1], 0.4);
        // The generals sum to the full-model statistic.
        assert_abs_diff_eq!(general.iter().sum::<f64>(), 0.6);

        let standardized = standardized_dominance(&general);
        assert_abs_diff_eq!(standardized.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(standardized[1], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn strict_complete_dominance_is_antisymmetric() {
        let (table, contribs, _) = fixture();
        let (strict, proportion) = complete_dominance(&table, &contribs, 2);

        // b beats a both at the baseline (0.5 > 0.3) and as the second
        // entry (0.3 > 0.1).
        assert_eq!(strict[1][0], 1);
        assert_eq!(strict[0][1], -1);
        assert_abs_diff_eq!(proportion[1][0], 1.0);
        assert_abs_diff_eq!(proportion[0][1], 0.0);
    }

    #[test]
    fn mixed_wins_leave_strict_at_zero() {
        // fit({a}) = 0.5, fit({b}) = 0.3 but b adds more on top of a:
        // fit({a,b}) = 0.9 -> contributions at singles: b@{a} = 0.4, a@{b} = 0.6.
        // Baseline: a wins (0.5 > 0.3). Matched set is only the baseline for
        // a 2-unit run, so craft 3 units to mix wins.
        let predictors = vec![
            Predictor::single("a"),
            Predictor::single("b"),
            Predictor::single("c"),
        ];
        let mut table = SubsetTable::build(&predictors).unwrap();
        // Order: {a} {b} {ab} {c} {ac} {bc} {abc}
        table
            .set_fit_stats(vec![0.5, 0.3, 0.9, 0.1, 0.55, 0.75, 0.95])
            .unwrap();
        let contribs = compute_contributions(&table, &predictors, 0.0);
        let (strict, proportion) = complete_dominance(&table, &contribs, 3);

        // a vs b: baseline a wins (0.5 > 0.3); at {c} b wins
        // (0.75 - 0.1 = 0.65 > 0.55 - 0.1 = 0.45). Mixed -> 0.
        assert_eq!(strict[0][1], 0);
        assert_eq!(strict[1][0], 0);
        assert_abs_diff_eq!(proportion[0][1], 0.5);
        assert_abs_diff_eq!(proportion[1][0], 0.5);
    }

    #[test]
    fn ordinal_ranks_break_ties_by_input_order() {
        assert_eq!(ordinal_ranks_desc(&[0.2, 0.5, 0.3]), [3, 1, 2]);
        assert_eq!(ordinal_ranks_desc(&[0.4, 0.4, 0.1]), [1, 2, 3]);
        assert_eq!(ordinal_ranks_desc(&[0.1]), [1]);
    }
}
