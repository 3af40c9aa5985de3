//! Column (condition) scoring.
//!
//! For each cluster the score of a condition is the variance of the
//! cluster's rows in that condition, normalised by the mean expression
//! level (an index of dispersion):
//!
//! ```text
//! score(c) = mean((x - mean_c)^2) / (|mean_c| + 0.01)
//! ```
//!
//! The result is conditions x clusters, so it does not share the genes x
//! clusters shape of the row-level functions and is not fed to the same
//! combiner.

use std::collections::HashSet;
use std::sync::Arc;

use ferroclust_common::config::ScoringConfig;
use ferroclust_common::error::Result;
use ferroclust_common::matrix::{DataMatrix, ScoreMatrix};
use ferroclust_common::membership::Membership;
use ferroclust_common::stats::quantile;

use crate::function::{IterationContext, LeafFunction, ScoringFunction, ScoringStrategy};
use crate::schedule::Schedule;

pub const COLUMN_FUNCTION_ID: &str = "column";

/// Quantile of in-cluster scores used for clusters too small to score.
const SUBSTITUTION_QUANTILE: f64 = 0.95;
const DISPERSION_OFFSET: f64 = 0.01;

pub struct ColumnScoring {
    matrix: Arc<DataMatrix>,
}

impl ColumnScoring {
    pub fn new(matrix: Arc<DataMatrix>) -> Self {
        Self { matrix }
    }

    /// Wrap into a leaf with the configured column schedule and no scaling.
    pub fn into_function(self, config: &ScoringConfig) -> Result<ScoringFunction> {
        let schedule = Schedule::try_from(config.schedules.column)?;
        Ok(LeafFunction::new(COLUMN_FUNCTION_ID, Box::new(self), schedule, None).into())
    }
}

impl ScoringStrategy for ColumnScoring {
    fn do_compute(
        &mut self,
        ctx: &IterationContext<'_>,
        _reference: Option<&ScoreMatrix>,
    ) -> Result<ScoreMatrix> {
        compute_column_scores(ctx.membership, &self.matrix)
    }
}

/// Conditions x clusters scores for every cluster of `membership`.
///
/// Clusters with at most one row get a substitution value: the 0.95 quantile
/// of the scores that scored clusters assign to their own conditions.
pub fn compute_column_scores(membership: &dyn Membership, matrix: &DataMatrix) -> Result<ScoreMatrix> {
    let num_clusters = membership.num_clusters();

    let mut cluster_scores: Vec<Option<Vec<f64>>> = Vec::with_capacity(num_clusters);
    for cluster in 1..=num_clusters {
        let rows = membership.rows_for_cluster(cluster);
        let submatrix = matrix.submatrix_by_name(Some(rows.as_slice()), None)?;
        if submatrix.num_rows() > 1 {
            cluster_scores.push(Some(compute_column_scores_submatrix(&submatrix)));
        } else {
            cluster_scores.push(None);
        }
    }

    let substitution = if cluster_scores.iter().any(Option::is_none) {
        substitution_value(membership, matrix, &cluster_scores)
    } else {
        0.0
    };

    let mut result = DataMatrix::for_clusters(matrix.column_names().to_vec(), num_clusters);
    for (index, scores) in cluster_scores.iter().enumerate() {
        for condition in 0..matrix.num_columns() {
            let value = match scores {
                Some(scores) => scores[condition],
                None => substitution,
            };
            result.set(condition, index, value);
        }
    }
    result.fix_extreme_values();
    Ok(result)
}

fn substitution_value(
    membership: &dyn Membership,
    matrix: &DataMatrix,
    cluster_scores: &[Option<Vec<f64>>],
) -> f64 {
    let mut in_cluster = Vec::new();
    for (index, scores) in cluster_scores.iter().enumerate() {
        let Some(scores) = scores else { continue };
        let columns: HashSet<String> = membership.columns_for_cluster(index + 1).into_iter().collect();
        for (condition, score) in scores.iter().enumerate() {
            if columns.contains(matrix.column_name(condition)) {
                in_cluster.push(*score);
            }
        }
    }
    quantile(&in_cluster, SUBSTITUTION_QUANTILE)
}

/// One dispersion score per column of `matrix`.
pub fn compute_column_scores_submatrix(matrix: &DataMatrix) -> Vec<f64> {
    let means = matrix.column_means();
    means
        .iter()
        .enumerate()
        .map(|(column, &mean)| {
            let (sum, count) = (0..matrix.num_rows())
                .map(|row| matrix.get(row, column))
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, n), v| (s + (v - mean).powi(2), n + 1));
            let variance = if count == 0 { f64::NAN } else { sum / count as f64 };
            variance / (mean.abs() + DISPERSION_OFFSET)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferroclust_common::membership::ClusterMembership;

    fn expression() -> DataMatrix {
        DataMatrix::from_rows(
            vec!["G1".into(), "G2".into(), "G3".into()],
            vec!["c1".into(), "c2".into()],
            vec![vec![1.0, 2.0], vec![3.0, 2.0], vec![5.0, 8.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_submatrix_dispersion() {
        let sub = expression()
            .submatrix_by_name(Some(&["G1".to_string(), "G2".to_string()][..]), None)
            .unwrap();
        let scores = compute_column_scores_submatrix(&sub);
        // c1: mean 2, variance 1 -> 1 / 2.01; c2: no spread
        assert!((scores[0] - 1.0 / 2.01).abs() < 1e-12);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_small_cluster_gets_substitution() {
        let membership = ClusterMembership::new(2)
            .with_row(1, "G1")
            .with_row(1, "G2")
            .with_column(1, "c1")
            .with_row(2, "G3");
        let result = compute_column_scores(&membership, &expression()).unwrap();

        assert_eq!(result.row_names(), &["c1", "c2"]);
        assert_eq!(result.column_names(), &["1", "2"]);
        assert!((result.get(0, 0) - 1.0 / 2.01).abs() < 1e-12);
        // only c1 belongs to cluster 1, so the quantile is over one value
        assert!((result.get(0, 1) - 1.0 / 2.01).abs() < 1e-12);
        assert!((result.get(1, 1) - 1.0 / 2.01).abs() < 1e-12);
    }

    #[test]
    fn test_into_function_has_zero_weight() {
        let f = ColumnScoring::new(Arc::new(expression()))
            .into_function(&ScoringConfig::default())
            .unwrap();
        assert_eq!(f.id(), COLUMN_FUNCTION_ID);
        assert_eq!(f.scaling(100), 0.0);
    }

    #[test]
    fn test_unknown_member_is_error() {
        let membership = ClusterMembership::new(1).with_row(1, "NOPE");
        assert!(compute_column_scores(&membership, &expression()).is_err());
    }
}
