//! Composite scoring function.
//!
//! A `ScoringCombiner` runs its children in list order and merges their
//! matrices into one weighted sum:
//!
//! ```text
//! S = Σ M_i × w_i        (w_i = scaling of the child that produced M_i)
//! ```
//!
//! The first matrix produced in an iteration becomes the reference matrix
//! handed to every later child, unless the caller supplied one. The anchor is
//! positional: if the first child has nothing to contribute in an iteration,
//! the next child that does becomes the anchor for that iteration.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use ferroclust_common::checkpoint::{scoped_key, CheckpointStore};
use ferroclust_common::config::ScoringConfig;
use ferroclust_common::error::{FerroclustError, Result};
use ferroclust_common::matrix::ScoreMatrix;
use ferroclust_common::membership::Membership;
use ferroclust_common::stats::trim_mean;
use tracing::{debug, info};

use crate::function::{IterationContext, ScoringFunction};
use crate::quantile::quantile_normalize_scores;
use crate::run_log::RunLog;
use crate::scaling::ScalingFunction;

/// Fraction trimmed from each tail for the sub-result diagnostic.
const SUBRESULT_TRIM: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default)]
pub struct CombinerOptions {
    pub quantile_normalize: bool,
    pub log_subresults: bool,
}

impl From<&ScoringConfig> for CombinerOptions {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            quantile_normalize: config.quantile_normalize,
            log_subresults: config.log_subresults,
        }
    }
}

pub struct ScoringCombiner {
    id: String,
    children: Vec<ScoringFunction>,
    scaling: Option<ScalingFunction>,
    options: CombinerOptions,
}

impl ScoringCombiner {
    /// Child ids must be unique: they key the checkpoint entries.
    pub fn new(
        id: &str,
        children: Vec<ScoringFunction>,
        scaling: Option<ScalingFunction>,
        options: CombinerOptions,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for child in &children {
            if !seen.insert(child.id()) {
                return Err(FerroclustError::Config(format!(
                    "combiner '{id}' has more than one child named '{}'",
                    child.id()
                )));
            }
        }
        Ok(Self {
            id: id.to_string(),
            children,
            scaling,
            options,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn children(&self) -> &[ScoringFunction] {
        &self.children
    }

    pub fn child(&self, id: &str) -> Option<&ScoringFunction> {
        self.children.iter().find(|c| c.id() == id)
    }

    pub fn scaling(&self, iteration: u32) -> f64 {
        self.scaling.map_or(0.0, |s| s.at(iteration))
    }

    pub fn compute(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<Option<Arc<ScoreMatrix>>> {
        self.compute_children(ctx, reference, false)
    }

    /// Force every child to recompute, ignoring schedules.
    pub fn compute_force(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<Option<Arc<ScoreMatrix>>> {
        self.compute_children(ctx, reference, true)
    }

    fn compute_children(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
        force: bool,
    ) -> Result<Option<Arc<ScoreMatrix>>> {
        let mut matrices: Vec<Arc<ScoreMatrix>> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();

        for child in &mut self.children {
            let anchor = match reference {
                Some(_) => None,
                None => matrices.first().cloned(),
            };
            let child_reference = reference.or(anchor.as_deref());

            let matrix = if force {
                child.compute_force(ctx, child_reference)?
            } else {
                child.compute(ctx, child_reference)?
            };

            if let Some(matrix) = matrix {
                weights.push(child.scaling(ctx.iteration));
                if self.options.log_subresults {
                    info!(
                        "function '{}', trim mean score: {}",
                        child.id(),
                        in_cluster_trim_mean(&matrix, ctx.membership)
                    );
                }
                matrices.push(matrix);
            }
        }

        self.combine(&matrices, &weights)
    }

    fn combine(&self, matrices: &[Arc<ScoreMatrix>], weights: &[f64]) -> Result<Option<Arc<ScoreMatrix>>> {
        if matrices.is_empty() {
            return Ok(None);
        }

        let normalized;
        let inputs: Vec<&ScoreMatrix> = if matrices.len() > 1 && self.options.quantile_normalize {
            let start = Instant::now();
            let refs: Vec<&ScoreMatrix> = matrices.iter().map(|m| m.as_ref()).collect();
            normalized = quantile_normalize_scores(&refs, weights)?;
            debug!("quantile normalize in {:.3} s.", start.elapsed().as_secs_f64());
            normalized.iter().collect()
        } else {
            matrices.iter().map(|m| m.as_ref()).collect()
        };

        let start = Instant::now();
        let mut combined = inputs[0].scaled(weights[0]);
        for (matrix, weight) in inputs.iter().zip(weights).skip(1) {
            combined.add_scaled(matrix, *weight)?;
        }
        debug!("combined score in {:.3} s.", start.elapsed().as_secs_f64());
        Ok(Some(Arc::new(combined)))
    }

    pub(crate) fn store_scoped(&self, scope: &str, store: &mut dyn CheckpointStore) -> Result<()> {
        let own_scope = scoped_key(scope, &self.id);
        for child in &self.children {
            child.store_scoped(&own_scope, store)?;
        }
        Ok(())
    }

    pub(crate) fn restore_scoped(&mut self, scope: &str, store: &dyn CheckpointStore) -> Result<()> {
        let own_scope = scoped_key(scope, &self.id);
        for child in &mut self.children {
            child.restore_scoped(&own_scope, store)?;
        }
        Ok(())
    }

    /// Run logs of every child, in child order.
    pub fn run_logs(&self) -> Vec<&RunLog> {
        self.children.iter().flat_map(|c| c.run_logs()).collect()
    }
}

/// Trimmed mean of the scores of genes within their own cluster.
pub fn in_cluster_trim_mean(matrix: &ScoreMatrix, membership: &dyn Membership) -> f64 {
    let mut scores = Vec::new();
    for cluster in 1..=matrix.num_columns() {
        let rows: HashSet<String> = membership.rows_for_cluster(cluster).into_iter().collect();
        for row in 0..matrix.num_rows() {
            if rows.contains(matrix.row_name(row)) {
                scores.push(matrix.get(row, cluster - 1));
            }
        }
    }
    trim_mean(&scores, SUBRESULT_TRIM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::LeafFunction;
    use crate::schedule::Schedule;
    use crate::testing::{constant_matrix, CountingStrategy};
    use ferroclust_common::checkpoint::MemoryCheckpointStore;
    use ferroclust_common::membership::ClusterMembership;
    use pretty_assertions::assert_eq;

    fn leaf_with(id: &str, matrix: ScoreMatrix, schedule: Schedule, weight: f64) -> (ScoringFunction, CountingStrategy) {
        let strategy = CountingStrategy::new(matrix);
        let handle = strategy.clone();
        let leaf = LeafFunction::new(id, Box::new(strategy), schedule, Some(ScalingFunction::Constant(weight)));
        (leaf.into(), handle)
    }

    fn matrix(values: Vec<f64>) -> ScoreMatrix {
        constant_matrix(&["A", "B"], 2, 0.0).with_values(values).unwrap()
    }

    fn plain() -> CombinerOptions {
        CombinerOptions { quantile_normalize: false, log_subresults: false }
    }

    #[test]
    fn test_weighted_sum_without_normalisation() {
        let m1 = matrix(vec![1.0, 2.0, 3.0, 4.0]);
        let m2 = matrix(vec![10.0, -20.0, 30.0, -40.0]);
        let (c1, _) = leaf_with("m1", m1.clone(), Schedule::every_iteration(), 0.3);
        let (c2, _) = leaf_with("m2", m2.clone(), Schedule::every_iteration(), 0.7);
        let mut combiner = ScoringCombiner::new("combiner", vec![c1, c2], None, plain()).unwrap();

        let membership = ClusterMembership::new(2);
        let result = combiner
            .compute(&IterationContext::new(1, &membership), None)
            .unwrap()
            .unwrap();

        for i in 0..4 {
            let expected = m1.values()[i] * 0.3 + m2.values()[i] * 0.7;
            assert!((result.values()[i] - expected).abs() < 1e-12);
        }
        assert_eq!(result.row_names(), m1.row_names());
    }

    #[test]
    fn test_no_matrices_yields_none() {
        let (c1, _) = leaf_with("late", matrix(vec![0.0; 4]), Schedule::new(10, 1).unwrap(), 1.0);
        let mut combiner = ScoringCombiner::new("combiner", vec![c1], None, plain()).unwrap();
        let membership = ClusterMembership::new(2);
        let result = combiner.compute(&IterationContext::new(1, &membership), None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_first_matrix_becomes_reference() {
        let m1 = matrix(vec![1.0; 4]);
        let (c1, _) = leaf_with("first", m1.clone(), Schedule::every_iteration(), 1.0);
        let (c2, h2) = leaf_with("second", matrix(vec![2.0; 4]), Schedule::every_iteration(), 1.0);
        let (c3, h3) = leaf_with("third", matrix(vec![3.0; 4]), Schedule::every_iteration(), 1.0);
        let mut combiner = ScoringCombiner::new("combiner", vec![c1, c2, c3], None, plain()).unwrap();

        let membership = ClusterMembership::new(2);
        combiner.compute(&IterationContext::new(1, &membership), None).unwrap();
        assert_eq!(h2.last_reference(), Some(m1.clone()));
        assert_eq!(h3.last_reference(), Some(m1));
    }

    #[test]
    fn test_anchor_shifts_when_first_child_is_silent() {
        let (c1, h1) = leaf_with("silent", matrix(vec![1.0; 4]), Schedule::new(5, 1).unwrap(), 1.0);
        let m2 = matrix(vec![2.0; 4]);
        let (c2, h2) = leaf_with("second", m2.clone(), Schedule::every_iteration(), 1.0);
        let (c3, h3) = leaf_with("third", matrix(vec![3.0; 4]), Schedule::every_iteration(), 1.0);
        let mut combiner = ScoringCombiner::new("combiner", vec![c1, c2, c3], None, plain()).unwrap();

        let membership = ClusterMembership::new(2);
        combiner.compute(&IterationContext::new(1, &membership), None).unwrap();
        assert_eq!(h1.calls(), 0);
        assert_eq!(h2.last_reference(), None);
        assert_eq!(h3.last_reference(), Some(m2));
    }

    #[test]
    fn test_caller_reference_wins() {
        let (c1, h1) = leaf_with("first", matrix(vec![1.0; 4]), Schedule::every_iteration(), 1.0);
        let (c2, h2) = leaf_with("second", matrix(vec![2.0; 4]), Schedule::every_iteration(), 1.0);
        let mut combiner = ScoringCombiner::new("combiner", vec![c1, c2], None, plain()).unwrap();

        let membership = ClusterMembership::new(2);
        let explicit = matrix(vec![7.0; 4]);
        combiner
            .compute(&IterationContext::new(1, &membership), Some(&explicit))
            .unwrap();
        assert_eq!(h1.last_reference(), Some(explicit.clone()));
        assert_eq!(h2.last_reference(), Some(explicit));
    }

    #[test]
    fn test_weights_follow_contributing_children() {
        // the silent first child must not shift the weights of the others
        let (c1, _) = leaf_with("silent", matrix(vec![100.0; 4]), Schedule::new(5, 1).unwrap(), 10.0);
        let (c2, _) = leaf_with("second", matrix(vec![1.0; 4]), Schedule::every_iteration(), 2.0);
        let mut combiner = ScoringCombiner::new("combiner", vec![c1, c2], None, plain()).unwrap();

        let membership = ClusterMembership::new(2);
        let result = combiner
            .compute(&IterationContext::new(1, &membership), None)
            .unwrap()
            .unwrap();
        assert_eq!(result.values(), &[2.0; 4]);
    }

    #[test]
    fn test_quantile_normalisation_applied() {
        let (c1, _) = leaf_with("a", matrix(vec![1.0, 2.0, 3.0, 4.0]), Schedule::every_iteration(), 1.0);
        let (c2, _) = leaf_with("b", matrix(vec![40.0, 30.0, 20.0, 10.0]), Schedule::every_iteration(), 1.0);
        let options = CombinerOptions { quantile_normalize: true, log_subresults: true };
        let mut combiner = ScoringCombiner::new("combiner", vec![c1, c2], None, options).unwrap();

        let membership = ClusterMembership::new(2).with_row(1, "A").with_row(2, "B");
        let result = combiner
            .compute(&IterationContext::new(1, &membership), None)
            .unwrap()
            .unwrap();
        // [5.5, 11, 16.5, 22] + reversed
        assert_eq!(result.values(), &[27.5, 27.5, 27.5, 27.5]);
    }

    #[test]
    fn test_single_matrix_is_not_normalised() {
        let (c1, _) = leaf_with("a", matrix(vec![1.0, 2.0, 3.0, 4.0]), Schedule::every_iteration(), 2.0);
        let options = CombinerOptions { quantile_normalize: true, log_subresults: false };
        let mut combiner = ScoringCombiner::new("combiner", vec![c1], None, options).unwrap();
        let membership = ClusterMembership::new(2);
        let result = combiner
            .compute(&IterationContext::new(1, &membership), None)
            .unwrap()
            .unwrap();
        assert_eq!(result.values(), &[2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_compute_force_reaches_children() {
        let (c1, h1) = leaf_with("sparse", matrix(vec![1.0; 4]), Schedule::new(1, 7).unwrap(), 1.0);
        let mut combiner = ScoringCombiner::new("combiner", vec![c1], None, plain()).unwrap();
        let membership = ClusterMembership::new(2);

        combiner.compute(&IterationContext::new(3, &membership), None).unwrap();
        assert_eq!(h1.calls(), 0);
        combiner.compute_force(&IterationContext::new(3, &membership), None).unwrap();
        assert_eq!(h1.calls(), 1);
    }

    #[test]
    fn test_duplicate_child_ids_rejected() {
        let (c1, _) = leaf_with("same", matrix(vec![0.0; 4]), Schedule::every_iteration(), 1.0);
        let (c2, _) = leaf_with("same", matrix(vec![0.0; 4]), Schedule::every_iteration(), 1.0);
        let err = ScoringCombiner::new("combiner", vec![c1, c2], None, plain());
        assert!(matches!(err, Err(FerroclustError::Config(_))));
    }

    #[test]
    fn test_run_logs_concatenate_in_child_order() {
        let (c1, _) = leaf_with("first", matrix(vec![0.0; 4]), Schedule::every_iteration(), 0.1);
        let (c2, _) = leaf_with("second", matrix(vec![0.0; 4]), Schedule::new(2, 1).unwrap(), 0.2);
        let inner = ScoringCombiner::new("inner", vec![c2], None, plain()).unwrap();
        let mut outer =
            ScoringCombiner::new("outer", vec![c1, inner.into()], Some(ScalingFunction::Constant(1.0)), plain())
                .unwrap();

        let membership = ClusterMembership::new(2);
        outer.compute(&IterationContext::new(1, &membership), None).unwrap();

        let logs = outer.run_logs();
        assert_eq!(logs.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(logs[0].entries().collect::<Vec<_>>(), vec![(true, 0.1)]);
        assert_eq!(logs[1].entries().collect::<Vec<_>>(), vec![(false, 0.2)]);
        assert_eq!(outer.scaling(1), 1.0);
    }

    #[test]
    fn test_nested_checkpoint_keys_and_reordered_restore() {
        let membership = ClusterMembership::new(2);
        let (a, _) = leaf_with("a", matrix(vec![1.0; 4]), Schedule::every_iteration(), 1.0);
        let (b, _) = leaf_with("b", matrix(vec![2.0; 4]), Schedule::every_iteration(), 1.0);
        let inner = ScoringCombiner::new("inner", vec![b], None, plain()).unwrap();
        let mut combiner: ScoringFunction =
            ScoringCombiner::new("root", vec![a, inner.into()], None, plain()).unwrap().into();
        combiner.compute(&IterationContext::new(1, &membership), None).unwrap();

        let mut store = MemoryCheckpointStore::new();
        combiner.store_checkpoint(&mut store).unwrap();
        assert_eq!(store.keys(), vec!["root/a/last_result", "root/inner/b/last_result"]);

        // same tree, children listed in the opposite order
        let (a2, _) = leaf_with("a", matrix(vec![0.0; 4]), Schedule::every_iteration(), 1.0);
        let (b2, _) = leaf_with("b", matrix(vec![0.0; 4]), Schedule::every_iteration(), 1.0);
        let inner2 = ScoringCombiner::new("inner", vec![b2], None, plain()).unwrap();
        let mut restored = ScoringCombiner::new("root", vec![inner2.into(), a2], None, plain()).unwrap();
        restored.restore_scoped("", &store).unwrap();

        let a_result = restored.child("a").and_then(|c| c.last_result()).unwrap();
        assert_eq!(a_result.values(), &[1.0; 4]);
        let ScoringFunction::Composite(inner) = restored.child("inner").unwrap() else {
            panic!("inner should be a composite");
        };
        let b_result = inner.child("b").and_then(|c| c.last_result()).unwrap();
        assert_eq!(b_result.values(), &[2.0; 4]);
    }

    #[test]
    fn test_in_cluster_trim_mean() {
        let m = matrix(vec![1.0, 100.0, 100.0, 3.0]);
        let membership = ClusterMembership::new(2).with_row(1, "A").with_row(2, "B");
        assert!((in_cluster_trim_mean(&m, &membership) - 2.0).abs() < 1e-12);
    }
}
