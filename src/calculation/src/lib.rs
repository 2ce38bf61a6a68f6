//! Falling flat plate simulator for reinforcement-learning control.
//!
//! This library provides:
//! - A goal-relative polar frame and its exact inverse
//! - The simplified induced-flow force law of the plate
//! - Fixed-step RK4 integration over one control interval
//! - Reward shaping and termination checks
//! - A Gym-style episode controller with periodic target relocation
//!
//! # Example
//!
//! ```no_run
//! use flatplate_calc::{FlatPlateEnv, SimConfig};
//!
//! let config = SimConfig::new(100, 500, 0.01, 10, 0.01, -20.0);
//! let mut env = FlatPlateEnv::new([0.0, 0.0, 0.0, 0.0], [-10.0, -1.0], config)?;
//! let mut state = env.reset(None)?;
//! loop {
//!     let action = -0.5 * state.theta;
//!     let step = env.step(action)?;
//!     state = step.state;
//!     if step.done || env.log().is_full() {
//!         break;
//!     }
//! }
//! # Ok::<(), flatplate_calc::SimError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::tabs_in_doc_comments)]

pub mod aerodynamics;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod ode;
pub mod polar;
pub mod reward;
pub mod trajectory;
pub mod vector;

// Re-export key types and functions for easy use
pub use aerodynamics::{fold_induced_angle, FlatPlateModel};
pub use config::SimConfig;
pub use constants::PhysicalConstants;
pub use environment::{FlatPlateEnv, Phase, StepResult, ACTION_LIMIT, ACTION_SIZE, STATE_SIZE};
pub use error::{SimError, SimResult};
pub use ode::{OdeSystem, RK4Integrator};
pub use polar::{CartesianState, PolarFrame, PolarState};
pub use reward::{RewardShaping, TerminationCause};
pub use trajectory::{EpisodeLog, EpisodeRecord, EpisodeSummary, TrackedVariable};
pub use vector::Vec2;
