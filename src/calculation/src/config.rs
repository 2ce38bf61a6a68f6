//! Simulator configuration.
//!
//! Keys follow the upper-case names used by the training scripts
//! (`MAX_EPISODES`, `DELTA_TIME`, ...). The six core keys are required;
//! the rest fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::reward::RewardShaping;

/// Default RK4 sub-steps per control interval.
pub const DEFAULT_SUBSTEPS: usize = 10;

/// Default bearing limit between A and a relocated B (degrees).
pub const DEFAULT_THRESHOLD_ANGLE_DEG: f64 = 10.0;

/// Default cap on relocation rejection sampling.
pub const DEFAULT_MAX_RELOCATION_ATTEMPTS: usize = 10_000;

/// Episode, integration and relocation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Episode budget; sizes the episode and target histories.
    #[serde(rename = "MAX_EPISODES")]
    pub max_episodes: usize,

    /// Per-episode step cap; sizes the trajectory log.
    #[serde(rename = "MAX_STEPS")]
    pub max_steps: usize,

    /// Control interval ΔT (s).
    #[serde(rename = "DELTA_TIME")]
    pub delta_time: f64,

    /// Episodes between target relocations.
    #[serde(rename = "POINTB_CHANGE")]
    pub pointb_change: usize,

    /// Standard deviation of the Gaussian action disturbance (rad).
    #[serde(rename = "ACTION_SIGMA")]
    pub action_sigma: f64,

    /// Far bound of the relocated target's x coordinate.
    #[serde(rename = "XB")]
    pub xb: f64,

    /// Seed of the per-instance random generator.
    #[serde(rename = "SEED", default)]
    pub seed: u64,

    /// RK4 sub-steps per control interval.
    #[serde(rename = "SUBSTEPS", default = "default_substeps")]
    pub substeps: usize,

    /// Largest bearing from A, off horizontal, a relocated B may have (degrees).
    #[serde(rename = "THRESHOLD_ANGLE_DEG", default = "default_threshold_angle_deg")]
    pub threshold_angle_deg: f64,

    /// Candidates drawn before relocation gives up.
    #[serde(rename = "MAX_RELOCATION_ATTEMPTS", default = "default_max_relocation_attempts")]
    pub max_relocation_attempts: usize,

    /// Reward shaping used by `step`.
    #[serde(rename = "REWARD", default)]
    pub reward: RewardShaping,
}

fn default_substeps() -> usize {
    DEFAULT_SUBSTEPS
}

fn default_threshold_angle_deg() -> f64 {
    DEFAULT_THRESHOLD_ANGLE_DEG
}

fn default_max_relocation_attempts() -> usize {
    DEFAULT_MAX_RELOCATION_ATTEMPTS
}

impl SimConfig {
    /// Config with the given core options and defaults for everything else.
    pub fn new(
        max_episodes: usize,
        max_steps: usize,
        delta_time: f64,
        pointb_change: usize,
        action_sigma: f64,
        xb: f64,
    ) -> Self {
        Self {
            max_episodes,
            max_steps,
            delta_time,
            pointb_change,
            action_sigma,
            xb,
            seed: 0,
            substeps: DEFAULT_SUBSTEPS,
            threshold_angle_deg: DEFAULT_THRESHOLD_ANGLE_DEG,
            max_relocation_attempts: DEFAULT_MAX_RELOCATION_ATTEMPTS,
            reward: RewardShaping::default(),
        }
    }

    /// Same config with another seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(json).map_err(|e| parse_error(&e))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SimError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Check every option is usable.
    pub fn validate(&self) -> SimResult<()> {
        if self.max_episodes == 0 {
            return Err(SimError::config("MAX_EPISODES", "must be at least 1"));
        }
        if self.max_steps == 0 {
            return Err(SimError::config("MAX_STEPS", "must be at least 1"));
        }
        if !(self.delta_time.is_finite() && self.delta_time > 0.0) {
            return Err(SimError::config(
                "DELTA_TIME",
                format!("must be a positive number, got {}", self.delta_time),
            ));
        }
        if self.pointb_change == 0 {
            return Err(SimError::config("POINTB_CHANGE", "must be at least 1"));
        }
        if !(self.action_sigma.is_finite() && self.action_sigma >= 0.0) {
            return Err(SimError::config(
                "ACTION_SIGMA",
                format!("must be a non-negative number, got {}", self.action_sigma),
            ));
        }
        if !self.xb.is_finite() {
            return Err(SimError::config("XB", "must be finite"));
        }
        if self.substeps == 0 {
            return Err(SimError::config("SUBSTEPS", "must be at least 1"));
        }
        if !(self.threshold_angle_deg > 0.0 && self.threshold_angle_deg <= 90.0) {
            return Err(SimError::config(
                "THRESHOLD_ANGLE_DEG",
                format!("must be in (0, 90], got {}", self.threshold_angle_deg),
            ));
        }
        if self.max_relocation_attempts == 0 {
            return Err(SimError::config("MAX_RELOCATION_ATTEMPTS", "must be at least 1"));
        }
        Ok(())
    }

    /// Number of target points the history must hold, the initial one included.
    pub fn target_history_len(&self) -> usize {
        self.max_episodes / self.pointb_change + 1
    }

    /// Time grid `i·ΔT` for `i` in `0..=MAX_STEPS`.
    pub fn time_grid(&self) -> Vec<f64> {
        (0..=self.max_steps).map(|i| i as f64 * self.delta_time).collect()
    }
}

/// Map a serde error onto the config error, naming the missing key.
fn parse_error(e: &serde_json::Error) -> SimError {
    let msg = e.to_string();
    if let Some(rest) = msg.strip_prefix("missing field `") {
        if let Some(end) = rest.find('`') {
            return SimError::config(&rest[..end], "required option is missing");
        }
    }
    SimError::Parse { source: msg }
}
