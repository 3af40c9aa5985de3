//! ferroclust-common — Shared types, errors, and providers used across all ferroclust crates.

pub mod error;
pub mod config;
pub mod matrix;
pub mod membership;
pub mod checkpoint;
pub mod stats;
pub mod logging;

// Re-export commonly used types
pub use config::{ScoringConfig, ScheduleConfig};
pub use error::{FerroclustError, Result};
pub use matrix::{DataMatrix, ScoreMatrix};
pub use membership::{ClusterMembership, Membership};
pub use checkpoint::{CheckpointStore, JsonFileCheckpointStore, MemoryCheckpointStore};
