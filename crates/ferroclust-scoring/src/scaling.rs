//! Blend weights as a function of the iteration number.
//!
//! Side evidence (motifs, networks) is phased in linearly over the first
//! `ramp_fraction` of the run, then held at a plateau.

use ferroclust_common::config::ScoringConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalingFunction {
    /// Same weight in every iteration.
    Constant(f64),
    /// `plateau * (iteration - 1) / (steps - 1)` up to `steps`, `plateau` after.
    Ramp { steps: u32, plateau: f64 },
}

impl ScalingFunction {
    /// Ramp over `round(fraction * num_iterations)` steps.
    pub fn ramp(num_iterations: u32, fraction: f64, plateau: f64) -> Self {
        let steps = (fraction * f64::from(num_iterations)).round() as u32;
        Self::Ramp { steps, plateau }
    }

    /// Motif weight: reaches 1.0 after three quarters of the run.
    pub fn motif_ramp(num_iterations: u32) -> Self {
        Self::ramp(num_iterations, 0.75, 1.0)
    }

    /// Network weight: same shape as the motif ramp, capped at 0.5.
    pub fn network_ramp(num_iterations: u32) -> Self {
        Self::ramp(num_iterations, 0.75, 0.5)
    }

    /// Constant weight of the expression row scores.
    pub fn row_from_config(config: &ScoringConfig) -> Self {
        Self::Constant(config.row_weight)
    }

    pub fn motif_from_config(config: &ScoringConfig) -> Self {
        Self::ramp(config.num_iterations, config.ramp_fraction, config.scaling.motif_plateau)
    }

    pub fn network_from_config(config: &ScoringConfig) -> Self {
        Self::ramp(config.num_iterations, config.ramp_fraction, config.scaling.network_plateau)
    }

    pub fn at(&self, iteration: u32) -> f64 {
        match *self {
            Self::Constant(weight) => weight,
            Self::Ramp { steps, plateau } => {
                // a ramp of one step or less has no slope to climb
                if iteration > steps || steps <= 1 {
                    plateau
                } else {
                    plateau / f64::from(steps - 1) * (f64::from(iteration) - 1.0)
                }
            }
        }
    }
}
