//! ferroclust-scoring — Iterative multi-evidence cluster scoring.
//!
//! Scoring functions run on their own schedules, are blended with
//! iteration-dependent weights, and are merged by a `ScoringCombiner`
//! into one genes x clusters matrix per iteration.

pub mod schedule;
pub mod scaling;
pub mod run_log;
pub mod function;
pub mod quantile;
pub mod combiner;
pub mod network;
pub mod column;

#[cfg(test)]
mod testing;

pub use combiner::{CombinerOptions, ScoringCombiner};
pub use function::{CachedResult, IterationContext, LeafFunction, ScoringFunction, ScoringStrategy};
pub use run_log::RunLog;
pub use scaling::ScalingFunction;
pub use schedule::Schedule;
