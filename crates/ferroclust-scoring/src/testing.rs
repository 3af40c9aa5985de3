//! Test strategies shared by the unit tests of this crate.

use std::sync::{Arc, Mutex};

use ferroclust_common::error::Result;
use ferroclust_common::matrix::ScoreMatrix;

use crate::function::{IterationContext, ScoringStrategy};

pub fn constant_matrix(genes: &[&str], num_clusters: usize, value: f64) -> ScoreMatrix {
    let rows = genes.iter().map(|g| g.to_string()).collect();
    let base = ScoreMatrix::for_clusters(rows, num_clusters);
    let values = vec![value; base.values().len()];
    base.with_values(values).unwrap()
}

#[derive(Default)]
struct CallRecord {
    calls: usize,
    last_reference: Option<ScoreMatrix>,
}

/// Returns a fixed matrix and records how it was called. Clones share state.
#[derive(Clone)]
pub struct CountingStrategy {
    matrix: ScoreMatrix,
    record: Arc<Mutex<CallRecord>>,
}

impl CountingStrategy {
    pub fn new(matrix: ScoreMatrix) -> Self {
        Self {
            matrix,
            record: Arc::new(Mutex::new(CallRecord::default())),
        }
    }

    pub fn calls(&self) -> usize {
        self.record.lock().unwrap().calls
    }

    pub fn last_reference(&self) -> Option<ScoreMatrix> {
        self.record.lock().unwrap().last_reference.clone()
    }
}

impl ScoringStrategy for CountingStrategy {
    fn do_compute(
        &mut self,
        _ctx: &IterationContext<'_>,
        reference: Option<&ScoreMatrix>,
    ) -> Result<ScoreMatrix> {
        let mut record = self.record.lock().unwrap();
        record.calls += 1;
        record.last_reference = reference.cloned();
        Ok(self.matrix.clone())
    }
}
