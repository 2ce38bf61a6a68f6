//! Reward shaping and episode termination.
//!
//! Both are pure functions of the transition between two goal-relative
//! states; they never touch the simulator.

use std::f64::consts;

use serde::{Deserialize, Serialize};

use crate::polar::{PolarFrame, PolarState};

/// Relative range below which the plate has reached the target.
pub const ARRIVAL_TOLERANCE: f64 = 1e-3;

/// Absolute bearing around B beyond which the episode is abandoned.
pub const MAX_BEARING: f64 = consts::FRAC_PI_2;

/// Scale applied to the range change.
pub const RANGE_GAIN: f64 = 10_000.0;

/// Available reward shapings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardShaping {
    /// `-10000·Δrho - 1`: reach the goal through the shortest path.
    #[default]
    ShortestPath,
    /// `-10000·Δrho`: reach the goal, no time pressure.
    GoToGoal,
    /// `-Δrho - Δ|theta|`: reach the goal along the A→B line.
    AlongLine,
}

impl RewardShaping {
    /// Reward for the transition `old -> new`. The action is accepted for
    /// shapings that penalise control effort; none of the current ones do.
    pub fn reward(&self, old: &PolarState, _action: f64, new: &PolarState) -> f64 {
        let delta_rho = new.rho - old.rho;

        match self {
            RewardShaping::ShortestPath => -RANGE_GAIN * delta_rho - 1.0,
            RewardShaping::GoToGoal => -RANGE_GAIN * delta_rho,
            RewardShaping::AlongLine => {
                let delta_abs_theta = new.theta.abs() - old.theta.abs();
                -delta_rho - delta_abs_theta
            }
        }
    }
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    /// Range to B fell below [`ARRIVAL_TOLERANCE`] of the A–B distance.
    Arrived,
    /// Absolute bearing around B reached [`MAX_BEARING`].
    BearingExceeded,
}

/// Check whether `state` ends the episode.
///
/// Arrival is tested first so a plate that reaches B is never reported as
/// having drifted off bearing.
pub fn check_termination(state: &PolarState, frame: &PolarFrame) -> Option<TerminationCause> {
    if (state.rho / frame.rho_ab()).abs() <= ARRIVAL_TOLERANCE {
        Some(TerminationCause::Arrived)
    } else if frame.absolute_bearing(state).abs() >= MAX_BEARING {
        Some(TerminationCause::BearingExceeded)
    } else {
        None
    }
}

/// `true` when `state` ends the episode.
pub fn is_done(state: &PolarState, frame: &PolarFrame) -> bool {
    check_termination(state, frame).is_some()
}
