//! Run configuration for the scoring engine.
//!
//! Every tunable literal of the scoring layer (iteration count, schedule
//! start/period pairs, ramp plateaus, blend weights) lives in this table.
//! Values are loaded from TOML, YAML or JSON and validated once at setup.

use serde::{Deserialize, Serialize};

use crate::error::{FerroclustError, Result};

/// Complete scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Total number of iterations of the run (`N` in the ramp formulas)
    #[serde(default = "default_num_iterations")]
    pub num_iterations: u32,

    /// Jointly quantile-normalise child matrices before combining them
    #[serde(default = "default_true")]
    pub quantile_normalize: bool,

    /// Log the trimmed mean of in-cluster scores for every child
    #[serde(default)]
    pub log_subresults: bool,

    /// Constant weight of the expression row scores
    #[serde(default = "default_row_weight")]
    pub row_weight: f64,

    /// Fraction of the run over which side evidence is phased in
    #[serde(default = "default_ramp_fraction")]
    pub ramp_fraction: f64,

    /// Per-function activation schedules
    #[serde(default)]
    pub schedules: SchedulesConfig,

    /// Ramp plateaus
    #[serde(default)]
    pub scaling: ScalingConfig,

    /// Fixed blend weights used inside individual strategies
    #[serde(default)]
    pub blend: BlendConfig,

    /// Store a checkpoint every k iterations (0 disables checkpoints)
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u32,
}

fn default_num_iterations() -> u32 { 2000 }
fn default_true() -> bool { true }
fn default_row_weight() -> f64 { 6.0 }
fn default_ramp_fraction() -> f64 { 0.75 }
fn default_checkpoint_interval() -> u32 { 100 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            num_iterations: default_num_iterations(),
            quantile_normalize: true,
            log_subresults: false,
            row_weight: default_row_weight(),
            ramp_fraction: default_ramp_fraction(),
            schedules: SchedulesConfig::default(),
            scaling: ScalingConfig::default(),
            blend: BlendConfig::default(),
            checkpoint_interval: default_checkpoint_interval(),
        }
    }
}

// ── Schedules ─────────────────────────────────────────────────────────────────

/// `(start, period)` pair of an activation schedule.
///
/// `period` is signed so that a negative value in a config file is
/// representable and rejected by validation instead of by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub start: u32,
    pub period: i64,
}

impl ScheduleConfig {
    pub const fn new(start: u32, period: i64) -> Self {
        Self { start, period }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulesConfig {
    /// Expression variance scoring
    #[serde(default = "default_row_schedule")]
    pub row: ScheduleConfig,

    #[serde(default = "default_column_schedule")]
    pub column: ScheduleConfig,

    #[serde(default = "default_motif_schedule")]
    pub motif: ScheduleConfig,

    #[serde(default = "default_network_schedule")]
    pub network: ScheduleConfig,
}

fn default_row_schedule() -> ScheduleConfig { ScheduleConfig::new(1, 1) }
fn default_column_schedule() -> ScheduleConfig { ScheduleConfig::new(1, 5) }
fn default_motif_schedule() -> ScheduleConfig { ScheduleConfig::new(601, 3) }
fn default_network_schedule() -> ScheduleConfig { ScheduleConfig::new(1, 7) }

impl Default for SchedulesConfig {
    fn default() -> Self {
        Self {
            row: default_row_schedule(),
            column: default_column_schedule(),
            motif: default_motif_schedule(),
            network: default_network_schedule(),
        }
    }
}

impl SchedulesConfig {
    fn named(&self) -> [(&'static str, ScheduleConfig); 4] {
        [
            ("row", self.row),
            ("column", self.column),
            ("motif", self.motif),
            ("network", self.network),
        ]
    }
}

// ── Scaling / Blend ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingConfig {
    #[serde(default = "default_motif_plateau")]
    pub motif_plateau: f64,

    #[serde(default = "default_network_plateau")]
    pub network_plateau: f64,
}

fn default_motif_plateau() -> f64 { 1.0 }
fn default_network_plateau() -> f64 { 0.5 }

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            motif_plateau: default_motif_plateau(),
            network_plateau: default_network_plateau(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendConfig {
    /// Weight of each network's contribution inside network scoring
    #[serde(default = "default_blend")]
    pub network: f64,

    /// Weight of each sequence type's contribution inside motif scoring
    #[serde(default = "default_blend")]
    pub motif: f64,
}

fn default_blend() -> f64 { 0.5 }

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            network: default_blend(),
            motif: default_blend(),
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl ScoringConfig {
    /// Load from a TOML file
    pub fn from_toml(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_yaml(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_json(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.num_iterations == 0 {
            return Err(FerroclustError::Config(
                "num_iterations must be positive".to_string(),
            ));
        }
        if !(self.ramp_fraction > 0.0 && self.ramp_fraction <= 1.0) {
            return Err(FerroclustError::Config(format!(
                "ramp_fraction must lie in (0, 1], got {}",
                self.ramp_fraction
            )));
        }
        for (name, schedule) in self.schedules.named() {
            if schedule.period <= 0 {
                return Err(FerroclustError::Config(format!(
                    "schedule '{name}' has non-positive period {}",
                    schedule.period
                )));
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
