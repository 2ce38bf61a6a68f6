//! Per-episode trajectory recording and summary metrics.
//!
//! Every control step appends one [`EpisodeRecord`]. The log is cleared when
//! the episode is reset, and is bounded by `MAX_STEPS` so that it always fits
//! the pre-sized export buffers.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::reward::TerminationCause;

/// Variables tracked for every step, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackedVariable {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
    /// Horizontal velocity.
    U,
    /// Vertical velocity.
    V,
    /// Applied action (degrees).
    Actions,
    /// Step reward.
    Rewards,
}

impl TrackedVariable {
    /// Every variable, in export order.
    pub const ALL: [TrackedVariable; 6] = [
        TrackedVariable::X,
        TrackedVariable::Y,
        TrackedVariable::U,
        TrackedVariable::V,
        TrackedVariable::Actions,
        TrackedVariable::Rewards,
    ];

    /// Name used for the exported file.
    pub fn name(&self) -> &'static str {
        match self {
            TrackedVariable::X => "x",
            TrackedVariable::Y => "y",
            TrackedVariable::U => "u",
            TrackedVariable::V => "v",
            TrackedVariable::Actions => "actions",
            TrackedVariable::Rewards => "rewards",
        }
    }

    /// Row of the variable in the export tables.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// One control step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Horizontal position after the step (m).
    pub x: f64,
    /// Vertical position after the step (m).
    pub y: f64,
    /// Horizontal velocity after the step (m/s).
    pub u: f64,
    /// Vertical velocity after the step (m/s).
    pub v: f64,
    /// Applied (noisy) action in degrees.
    pub action_deg: f64,
    /// Reward of the step.
    pub reward: f64,
}

impl EpisodeRecord {
    /// Value of one tracked variable.
    pub fn get(&self, var: TrackedVariable) -> f64 {
        match var {
            TrackedVariable::X => self.x,
            TrackedVariable::Y => self.y,
            TrackedVariable::U => self.u,
            TrackedVariable::V => self.v,
            TrackedVariable::Actions => self.action_deg,
            TrackedVariable::Rewards => self.reward,
        }
    }
}

/// Ordered step records of the current episode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpisodeLog {
    records: Vec<EpisodeRecord>,
    capacity: usize,
}

impl EpisodeLog {
    /// Empty log holding at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record; fails once `capacity` records are stored.
    pub fn push(&mut self, record: EpisodeRecord) -> SimResult<()> {
        if self.records.len() >= self.capacity {
            return Err(SimError::StepOverflow {
                step: self.records.len() + 1,
                max: self.capacity,
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Drop every record, keeping the capacity.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of steps logged.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` before the first step.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` when no further step fits.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Largest number of records, `MAX_STEPS`.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records in step order.
    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&EpisodeRecord> {
        self.records.last()
    }

    /// Values of one variable across the episode.
    pub fn column(&self, var: TrackedVariable) -> Vec<f64> {
        self.records.iter().map(|r| r.get(var)).collect()
    }

    /// Sum of the step rewards.
    pub fn total_reward(&self) -> f64 {
        self.records.iter().map(|r| r.reward).sum()
    }

    /// Path length flown from `start` through every logged position.
    pub fn path_length(&self, start: (f64, f64)) -> f64 {
        let mut prev = start;
        let mut length = 0.0;
        for r in &self.records {
            length += ((r.x - prev.0).powi(2) + (r.y - prev.1).powi(2)).sqrt();
            prev = (r.x, r.y);
        }
        length
    }
}

/// Summary of a finished (or truncated) episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// 1-based episode number.
    pub episode: usize,
    /// Steps taken.
    pub steps: usize,
    /// Sum of the step rewards.
    pub total_reward: f64,
    /// Range to B after the last step.
    pub final_rho: f64,
    /// Distance flown from A.
    pub path_length: f64,
    /// `None` when the episode hit the step cap without terminating.
    pub cause: Option<TerminationCause>,
}
