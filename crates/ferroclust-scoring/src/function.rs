//! The scoring function capability.
//!
//! Every scoring strategy and the combiner itself are driven through
//! [`ScoringFunction`], a tagged union of a leaf (one strategy with its own
//! schedule, scaling and cache) and a composite ([`ScoringCombiner`]).
//!
//! A leaf recomputes only when its schedule is active. Otherwise it hands out
//! the matrix it cached last time, or `None` if it never computed. Every call
//! appends one entry to its [`RunLog`].

use std::sync::Arc;

use ferroclust_common::checkpoint::{scoped_key, CheckpointStore};
use ferroclust_common::config::ScoringConfig;
use ferroclust_common::error::{FerroclustError, Result};
use ferroclust_common::matrix::ScoreMatrix;
use ferroclust_common::membership::Membership;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combiner::ScoringCombiner;
use crate::run_log::RunLog;
use crate::scaling::ScalingFunction;
use crate::schedule::Schedule;

const LAST_RESULT_KEY: &str = "last_result";

pub const ROW_FUNCTION_ID: &str = "row";
pub const MOTIF_FUNCTION_ID: &str = "motif";

/// State passed unchanged to every `compute` call of one iteration.
#[derive(Clone, Copy)]
pub struct IterationContext<'a> {
    /// 1-based iteration number
    pub iteration: u32,
    pub membership: &'a dyn Membership,
}

impl<'a> IterationContext<'a> {
    pub fn new(iteration: u32, membership: &'a dyn Membership) -> Self {
        Self { iteration, membership }
    }
}

/// Strategy-specific computation of a leaf scoring function.
pub trait ScoringStrategy: Send {
    /// Produce a fresh score matrix. `reference` is the first matrix another
    /// function produced in this iteration, if any; strategies may use it to
    /// bring their scores onto the same range.
    fn do_compute(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<ScoreMatrix>;

    /// Persist internal caches beyond the last result. Default: nothing.
    fn store_checkpoint(&self, _scope: &str, _store: &mut dyn CheckpointStore) -> Result<()> {
        Ok(())
    }

    /// Restore what `store_checkpoint` wrote. Default: nothing.
    fn restore_checkpoint(&mut self, _scope: &str, _store: &dyn CheckpointStore) -> Result<()> {
        Ok(())
    }
}

// ── Cached Result ─────────────────────────────────────────────────────────────

/// The last matrix a leaf computed, and in which iteration.
#[derive(Debug, Clone, Default)]
pub struct CachedResult {
    value: Option<Arc<ScoreMatrix>>,
    computed_in: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct CachedResultSnapshot {
    computed_in: Option<u32>,
    matrix: ScoreMatrix,
}

impl CachedResult {
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<Arc<ScoreMatrix>> {
        self.value.clone()
    }

    pub fn computed_in(&self) -> Option<u32> {
        self.computed_in
    }

    fn replace(&mut self, matrix: ScoreMatrix, iteration: u32) {
        self.value = Some(Arc::new(matrix));
        self.computed_in = Some(iteration);
    }

    fn to_snapshot(&self) -> Result<Option<serde_json::Value>> {
        match &self.value {
            Some(matrix) => {
                let snapshot = CachedResultSnapshot {
                    computed_in: self.computed_in,
                    matrix: ScoreMatrix::clone(matrix),
                };
                Ok(Some(serde_json::to_value(snapshot)?))
            }
            None => Ok(None),
        }
    }

    fn from_snapshot(value: &serde_json::Value) -> Result<Self> {
        let snapshot: CachedResultSnapshot = serde_json::from_value(value.clone())
            .map_err(|e| FerroclustError::Checkpoint(format!("cannot decode last result: {e}")))?;
        Ok(Self {
            value: Some(Arc::new(snapshot.matrix)),
            computed_in: snapshot.computed_in,
        })
    }
}

// ── Leaf ──────────────────────────────────────────────────────────────────────

/// One scoring strategy together with its schedule, weight and cache.
pub struct LeafFunction {
    id: String,
    strategy: Box<dyn ScoringStrategy>,
    schedule: Schedule,
    scaling: Option<ScalingFunction>,
    cache: CachedResult,
    run_log: RunLog,
}

impl LeafFunction {
    pub fn new(
        id: &str,
        strategy: Box<dyn ScoringStrategy>,
        schedule: Schedule,
        scaling: Option<ScalingFunction>,
    ) -> Self {
        Self {
            id: id.to_string(),
            strategy,
            schedule,
            scaling,
            cache: CachedResult::default(),
            run_log: RunLog::new(id),
        }
    }

    /// Expression row scoring with the configured row schedule and constant
    /// `row_weight`.
    pub fn row(strategy: Box<dyn ScoringStrategy>, config: &ScoringConfig) -> Result<Self> {
        let schedule = Schedule::try_from(config.schedules.row)?;
        let scaling = ScalingFunction::row_from_config(config);
        Ok(Self::new(ROW_FUNCTION_ID, strategy, schedule, Some(scaling)))
    }

    /// Motif scoring with the configured motif schedule and ramp.
    pub fn motif(strategy: Box<dyn ScoringStrategy>, config: &ScoringConfig) -> Result<Self> {
        let schedule = Schedule::try_from(config.schedules.motif)?;
        let scaling = ScalingFunction::motif_from_config(config);
        Ok(Self::new(MOTIF_FUNCTION_ID, strategy, schedule, Some(scaling)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn last_result(&self) -> &CachedResult {
        &self.cache
    }

    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }

    /// Configured weight, or 0.0 without a scaling function.
    pub fn scaling(&self, iteration: u32) -> f64 {
        self.scaling.map_or(0.0, |s| s.at(iteration))
    }

    pub fn compute(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<Option<Arc<ScoreMatrix>>> {
        let active = self.schedule.is_active(ctx.iteration);
        let outcome = if active {
            self.recompute(ctx, reference)
        } else {
            debug!(
                "'{}' inactive in iteration {}, reusing result from {:?}",
                self.id,
                ctx.iteration,
                self.cache.computed_in()
            );
            Ok(())
        };
        // every call is audited, including failed recomputes
        self.run_log.log(active, self.scaling(ctx.iteration));
        outcome?;
        Ok(self.cache.get())
    }

    /// Recompute regardless of the schedule.
    pub fn compute_force(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<Option<Arc<ScoreMatrix>>> {
        let outcome = self.recompute(ctx, reference);
        self.run_log
            .log(self.schedule.is_active(ctx.iteration), self.scaling(ctx.iteration));
        outcome?;
        Ok(self.cache.get())
    }

    fn recompute(&mut self, ctx: &IterationContext<'_>, reference: Option<&ScoreMatrix>) -> Result<()> {
        debug!("'{}' computing in iteration {}", self.id, ctx.iteration);
        let matrix = self.strategy.do_compute(ctx, reference)?;
        self.cache.replace(matrix, ctx.iteration);
        Ok(())
    }

    fn store_scoped(&self, scope: &str, store: &mut dyn CheckpointStore) -> Result<()> {
        let own_scope = scoped_key(scope, &self.id);
        if let Some(snapshot) = self.cache.to_snapshot()? {
            store.put(&scoped_key(&own_scope, LAST_RESULT_KEY), snapshot);
        }
        self.strategy.store_checkpoint(&own_scope, store)
    }

    fn restore_scoped(&mut self, scope: &str, store: &dyn CheckpointStore) -> Result<()> {
        let own_scope = scoped_key(scope, &self.id);
        if let Some(value) = store.get(&scoped_key(&own_scope, LAST_RESULT_KEY)) {
            self.cache = CachedResult::from_snapshot(value)?;
        }
        self.strategy.restore_checkpoint(&own_scope, store)
    }
}

// ── Capability ────────────────────────────────────────────────────────────────

/// Uniform contract over leaf strategies and composites.
pub enum ScoringFunction {
    Leaf(LeafFunction),
    Composite(ScoringCombiner),
}

impl ScoringFunction {
    /// Stable identity, used to scope checkpoint keys.
    pub fn id(&self) -> &str {
        match self {
            Self::Leaf(leaf) => leaf.id(),
            Self::Composite(combiner) => combiner.id(),
        }
    }

    /// Compute if scheduled, otherwise return the cached matrix. `None` means
    /// the function has nothing to contribute yet.
    pub fn compute(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<Option<Arc<ScoreMatrix>>> {
        match self {
            Self::Leaf(leaf) => leaf.compute(ctx, reference),
            Self::Composite(combiner) => combiner.compute(ctx, reference),
        }
    }

    /// Like [`compute`](Self::compute) but bypasses every schedule.
    pub fn compute_force(
        &mut self,
        ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<Option<Arc<ScoreMatrix>>> {
        match self {
            Self::Leaf(leaf) => leaf.compute_force(ctx, reference),
            Self::Composite(combiner) => combiner.compute_force(ctx, reference),
        }
    }

    pub fn scaling(&self, iteration: u32) -> f64 {
        match self {
            Self::Leaf(leaf) => leaf.scaling(iteration),
            Self::Composite(combiner) => combiner.scaling(iteration),
        }
    }

    pub fn store_checkpoint(&self, store: &mut dyn CheckpointStore) -> Result<()> {
        self.store_scoped("", store)?;
        info!("Stored checkpoint for '{}' ({} keys in store)", self.id(), store.keys().len());
        Ok(())
    }

    pub fn restore_checkpoint(&mut self, store: &dyn CheckpointStore) -> Result<()> {
        self.restore_scoped("", store)?;
        info!("Restored checkpoint for '{}'", self.id());
        Ok(())
    }

    pub(crate) fn store_scoped(&self, scope: &str, store: &mut dyn CheckpointStore) -> Result<()> {
        match self {
            Self::Leaf(leaf) => leaf.store_scoped(scope, store),
            Self::Composite(combiner) => combiner.store_scoped(scope, store),
        }
    }

    pub(crate) fn restore_scoped(&mut self, scope: &str, store: &dyn CheckpointStore) -> Result<()> {
        match self {
            Self::Leaf(leaf) => leaf.restore_scoped(scope, store),
            Self::Composite(combiner) => combiner.restore_scoped(scope, store),
        }
    }

    /// Run logs of this function, or of every nested leaf for a composite.
    pub fn run_logs(&self) -> Vec<&RunLog> {
        match self {
            Self::Leaf(leaf) => vec![leaf.run_log()],
            Self::Composite(combiner) => combiner.run_logs(),
        }
    }

    /// Last cached result of a leaf; composites keep no cache of their own.
    pub fn last_result(&self) -> Option<Arc<ScoreMatrix>> {
        match self {
            Self::Leaf(leaf) => leaf.last_result().get(),
            Self::Composite(_) => None,
        }
    }
}

impl From<LeafFunction> for ScoringFunction {
    fn from(leaf: LeafFunction) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<ScoringCombiner> for ScoringFunction {
    fn from(combiner: ScoringCombiner) -> Self {
        Self::Composite(combiner)
    }
}
