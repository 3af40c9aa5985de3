//! Iteration loop over the scoring tree.
//!
//! The driver keeps the input membership fixed; it exists to exercise the
//! scoring layer end to end, not to refine clusters.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ferroclust_common::checkpoint::JsonFileCheckpointStore;
use ferroclust_common::config::ScoringConfig;
use ferroclust_common::matrix::{DataMatrix, ScoreMatrix};
use ferroclust_common::membership::ClusterMembership;
use ferroclust_network::Organism;
use ferroclust_scoring::column::ColumnScoring;
use ferroclust_scoring::network::NetworkScoring;
use ferroclust_scoring::{CombinerOptions, IterationContext, RunLog, ScoringCombiner, ScoringFunction};
use serde::Serialize;
use tracing::{debug, info};

/// Root id of the row-level scoring tree.
pub const COMBINED_FUNCTION_ID: &str = "combined";

pub struct Driver {
    config: ScoringConfig,
    membership: ClusterMembership,
    combined: ScoringFunction,
    columns: ScoringFunction,
    checkpoint: Option<JsonFileCheckpointStore>,
    first_iteration: u32,
}

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub first_iteration: u32,
    pub last_iteration: u32,
    pub run_logs: Vec<&'a RunLog>,
    pub row_scores: Option<ScoreMatrix>,
    pub column_scores: Option<ScoreMatrix>,
}

impl Driver {
    pub fn new(
        config: ScoringConfig,
        matrix: DataMatrix,
        membership: ClusterMembership,
        organism: Arc<dyn Organism>,
    ) -> anyhow::Result<Self> {
        let matrix = Arc::new(matrix);
        let network = NetworkScoring::new(organism, matrix.clone(), config.blend.network)
            .into_function(&config)?;
        let combined = ScoringCombiner::new(
            COMBINED_FUNCTION_ID,
            vec![network],
            None,
            CombinerOptions::from(&config),
        )?
        .into();
        let columns = ColumnScoring::new(matrix).into_function(&config)?;

        Ok(Self {
            config,
            membership,
            combined,
            columns,
            checkpoint: None,
            first_iteration: 1,
        })
    }

    /// Write checkpoints to `path`. With `resume`, restore the functions from
    /// the file and continue after its recorded iteration.
    pub fn with_checkpoint(mut self, path: PathBuf, resume: bool) -> anyhow::Result<Self> {
        let store = JsonFileCheckpointStore::load(&path)
            .with_context(|| format!("opening checkpoint {}", path.display()))?;
        if resume {
            self.combined.restore_checkpoint(&store)?;
            self.columns.restore_checkpoint(&store)?;
            if let Some(iteration) = store.iteration() {
                self.first_iteration = iteration + 1;
                info!("Resuming after iteration {}", iteration);
            }
        }
        self.checkpoint = Some(store);
        Ok(self)
    }

    pub fn first_iteration(&self) -> u32 {
        self.first_iteration
    }

    /// Run the remaining iterations. The final one recomputes every function.
    pub fn run(&mut self) -> anyhow::Result<RunSummary<'_>> {
        let last = self.config.num_iterations;
        let mut row_scores = None;
        let mut column_scores = None;

        for iteration in self.first_iteration..=last {
            let ctx = IterationContext::new(iteration, &self.membership);
            if iteration == last {
                row_scores = self.combined.compute_force(&ctx, None)?;
                column_scores = self.columns.compute_force(&ctx, None)?;
            } else {
                row_scores = self.combined.compute(&ctx, None)?;
                column_scores = self.columns.compute(&ctx, None)?;
            }
            debug!("iteration {} done", iteration);

            let interval = self.config.checkpoint_interval;
            if interval > 0 && (iteration % interval == 0 || iteration == last) {
                self.store_checkpoint(iteration)?;
            }
        }

        let mut run_logs = self.combined.run_logs();
        run_logs.extend(self.columns.run_logs());
        Ok(RunSummary {
            first_iteration: self.first_iteration,
            last_iteration: last,
            run_logs,
            row_scores: row_scores.map(|m| m.as_ref().clone()),
            column_scores: column_scores.map(|m| m.as_ref().clone()),
        })
    }

    fn store_checkpoint(&mut self, iteration: u32) -> anyhow::Result<()> {
        let Some(store) = self.checkpoint.as_mut() else {
            return Ok(());
        };
        self.combined.store_checkpoint(&mut *store)?;
        self.columns.store_checkpoint(&mut *store)?;
        store.set_iteration(iteration);
        store.save()?;
        Ok(())
    }
}
