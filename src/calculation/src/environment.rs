//! Episode controller for the flat plate simulator.
//!
//! Owns everything that persists across steps and episodes: the current
//! goal-relative state, the target point B and its polar frame, the episode
//! and step counters, the trajectory log and the random generator.
//!
//! - `reset(state)` -> initial observation (relocates B every
//!   `POINTB_CHANGE` episodes)
//! - `step(action)` -> (observation, reward, done)
//!
//! One instance per rollout worker; nothing is shared between instances, and
//! all randomness comes from the instance's own seeded generator.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aerodynamics::FlatPlateModel;
use crate::config::SimConfig;
use crate::constants::PhysicalConstants;
use crate::error::{SimError, SimResult};
use crate::ode::RK4Integrator;
use crate::polar::{CartesianState, PolarFrame, PolarState};
use crate::reward::{check_termination, TerminationCause};
use crate::trajectory::{EpisodeLog, EpisodeRecord, EpisodeSummary};
use crate::vector::Vec2;

/// Size of the observation vector.
pub const STATE_SIZE: usize = 4;

/// Size of the action vector.
pub const ACTION_SIZE: usize = 1;

/// Largest induced pitch command a policy should emit (rad).
pub const ACTION_LIMIT: f64 = 15.0 * std::f64::consts::PI / 180.0;

/// Lifecycle of the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Freshly reset, no step taken yet.
    Ready,
    /// At least one step taken, not terminated.
    Running,
    /// Terminated; only `reset` is accepted.
    Done,
}

/// Result of a single environment step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Goal-relative state after the step.
    pub state: PolarState,
    /// Reward of the transition.
    pub reward: f64,
    /// Whether the episode terminated.
    pub done: bool,
    /// Termination cause if done.
    pub cause: Option<TerminationCause>,
}

/// Falling flat plate environment.
#[derive(Debug, Clone)]
pub struct FlatPlateEnv {
    config: SimConfig,
    model: FlatPlateModel,
    integrator: RK4Integrator,
    /// Cartesian state at A, the start of every episode.
    initial: CartesianState,
    frame: PolarFrame,
    /// Half-height of the band B is relocated within, |yA − yB| at construction.
    vertical_offset: f64,
    state: PolarState,
    phase: Phase,
    episode: usize,
    steps: usize,
    relocations: usize,
    log: EpisodeLog,
    target_history: Vec<Vec2>,
    action_noise: Normal<f64>,
    rng: ChaCha8Rng,
}

impl FlatPlateEnv {
    /// Create a simulator starting at `initial = [xA, yA, uA, vA]` and
    /// heading for `final_position = [xB, yB]`.
    pub fn new(initial: [f64; 4], final_position: [f64; 2], config: SimConfig) -> SimResult<Self> {
        Self::with_constants(initial, final_position, config, PhysicalConstants::default())
    }

    /// Same as [`FlatPlateEnv::new`] with a custom plate.
    pub fn with_constants(
        initial: [f64; 4],
        final_position: [f64; 2],
        config: SimConfig,
        constants: PhysicalConstants,
    ) -> SimResult<Self> {
        config.validate()?;

        if initial.iter().chain(final_position.iter()).any(|v| !v.is_finite()) {
            return Err(SimError::config(
                "initial_conditions",
                "start and target coordinates must be finite",
            ));
        }

        let initial = CartesianState::from_array(&initial);
        let a = initial.position();
        let b = Vec2::from_array(&final_position);
        if a.distance(&b) == 0.0 {
            return Err(SimError::config(
                "final_position",
                "target point B must differ from start point A",
            ));
        }

        let vertical_offset = (a.y - b.y).abs();
        relocation_bounds(a, config.xb, vertical_offset)?;

        let action_noise = Normal::new(0.0, config.action_sigma)
            .map_err(|e| SimError::config("ACTION_SIGMA", e.to_string()))?;

        let frame = PolarFrame::new(a, b);
        let mut target_history = Vec::with_capacity(config.target_history_len());
        target_history.push(b);

        Ok(Self {
            model: FlatPlateModel::new(constants),
            integrator: RK4Integrator::new(config.substeps),
            vertical_offset,
            state: frame.to_polar(&initial),
            phase: Phase::Ready,
            episode: 0,
            steps: 0,
            relocations: 0,
            log: EpisodeLog::with_capacity(config.max_steps),
            target_history,
            action_noise,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            initial,
            frame,
            config,
        })
    }

    /// Reseed the random generator.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Start a new episode.
    ///
    /// Without an explicit state the plate is put back at A, expressed in
    /// the frame of the current B. When the new episode number is a multiple
    /// of `POINTB_CHANGE`, B is relocated first so the returned state is
    /// already relative to the new target.
    pub fn reset(&mut self, state: Option<PolarState>) -> SimResult<PolarState> {
        let next_episode = self.episode + 1;
        if next_episode > self.config.max_episodes {
            return Err(SimError::EpisodeOverflow {
                episode: next_episode,
                max: self.config.max_episodes,
            });
        }

        if next_episode % self.config.pointb_change == 0 {
            self.relocate_target()?;
        }

        self.state = state.unwrap_or_else(|| self.frame.to_polar(&self.initial));
        self.episode = next_episode;
        self.steps = 0;
        self.phase = Phase::Ready;
        self.log.clear();

        debug!(episode = self.episode, rho = self.state.rho, theta = self.state.theta, "episode reset");

        Ok(self.state)
    }

    /// Advance the plate by one control interval under `action` (rad).
    ///
    /// Gaussian noise of standard deviation `ACTION_SIGMA` is added to the
    /// action, which is then held constant over the whole interval.
    pub fn step(&mut self, action: f64) -> SimResult<StepResult> {
        if self.phase == Phase::Done {
            return Err(SimError::EpisodeDone);
        }
        if self.steps >= self.config.max_steps {
            return Err(SimError::StepOverflow {
                step: self.steps + 1,
                max: self.config.max_steps,
            });
        }

        let applied = action + self.action_noise.sample(&mut self.rng);

        let old_state = self.state;
        let old_cartesian = self.frame.to_cartesian(&old_state);
        let new_cartesian = CartesianState::from_array(&self.integrator.advance(
            &self.model.with_action(applied),
            &old_cartesian.to_array(),
            0.0,
            self.config.delta_time,
        ));
        let new_state = self.frame.to_polar(&new_cartesian);

        let reward = self.config.reward.reward(&old_state, action, &new_state);
        let cause = check_termination(&new_state, &self.frame);

        self.log.push(EpisodeRecord {
            x: new_cartesian.x,
            y: new_cartesian.y,
            u: new_cartesian.u,
            v: new_cartesian.v,
            action_deg: applied.to_degrees(),
            reward,
        })?;

        self.state = new_state;
        self.steps += 1;
        self.phase = if cause.is_some() { Phase::Done } else { Phase::Running };

        if let Some(cause) = cause {
            debug!(
                episode = self.episode,
                steps = self.steps,
                rho = new_state.rho,
                ?cause,
                "episode terminated"
            );
        }

        Ok(StepResult {
            state: new_state,
            reward,
            done: cause.is_some(),
            cause,
        })
    }

    /// Draw a new target point B and rebuild the polar frame around it.
    ///
    /// x is drawn between xA and `XB`, y within the construction-time
    /// vertical offset of yA. Candidates whose bearing from A is more than
    /// `THRESHOLD_ANGLE_DEG` off horizontal are rejected; after `MAX_RELOCATION_ATTEMPTS`
    /// rejections the configuration is reported as infeasible and the
    /// current target is left untouched.
    pub fn relocate_target(&mut self) -> SimResult<Vec2> {
        if self.target_history.len() >= self.config.target_history_len() {
            return Err(SimError::HistoryOverflow {
                what: "target",
                index: self.target_history.len(),
                capacity: self.config.target_history_len(),
            });
        }

        let a = self.initial.position();
        let threshold = self.config.threshold_angle_deg.to_radians();
        let ((x_lo, x_hi), (y_lo, y_hi)) = relocation_bounds(a, self.config.xb, self.vertical_offset)?;

        for attempt in 1..=self.config.max_relocation_attempts {
            let b = Vec2::new(self.rng.random_range(x_lo..=x_hi), self.rng.random_range(y_lo..=y_hi));
            let bearing = (b.y - a.y).abs().atan2((b.x - a.x).abs());

            if bearing <= threshold && b.distance(&a) > 0.0 {
                self.frame = PolarFrame::new(a, b);
                self.relocations += 1;
                self.target_history.push(b);

                info!(
                    relocation = self.relocations,
                    attempts = attempt,
                    bearing_deg = bearing.to_degrees(),
                    xb = b.x,
                    yb = b.y,
                    "target point relocated"
                );
                return Ok(b);
            }
        }

        warn!(
            attempts = self.config.max_relocation_attempts,
            x_lo, x_hi, y_lo, y_hi, "target relocation exhausted"
        );
        Err(SimError::RelocationExhausted {
            attempts: self.config.max_relocation_attempts,
            threshold_deg: self.config.threshold_angle_deg,
        })
    }

    /// Summary of the current episode so far.
    pub fn summary(&self) -> EpisodeSummary {
        EpisodeSummary {
            episode: self.episode,
            steps: self.steps,
            total_reward: self.log.total_reward(),
            final_rho: self.state.rho,
            path_length: self.log.path_length((self.initial.x, self.initial.y)),
            cause: if self.phase == Phase::Done {
                check_termination(&self.state, &self.frame)
            } else {
                None
            },
        }
    }

    /// Current goal-relative state.
    pub fn state(&self) -> PolarState {
        self.state
    }

    /// Current state in absolute coordinates.
    pub fn cartesian_state(&self) -> CartesianState {
        self.frame.to_cartesian(&self.state)
    }

    /// Cartesian state at A.
    pub fn initial_state(&self) -> CartesianState {
        self.initial
    }

    /// Polar frame around the current target.
    pub fn frame(&self) -> &PolarFrame {
        &self.frame
    }

    /// Current target point B.
    pub fn target(&self) -> Vec2 {
        self.frame.target()
    }

    /// Reference bearing of A seen from B.
    pub fn phi_a(&self) -> f64 {
        self.frame.phi_a()
    }

    /// Distance between A and B.
    pub fn rho_ab(&self) -> f64 {
        self.frame.rho_ab()
    }

    /// Lifecycle of the current episode.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `true` once the current episode terminated.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Number of episodes started so far.
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Steps taken in the current episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Target relocations performed so far.
    pub fn relocations(&self) -> usize {
        self.relocations
    }

    /// Step records of the current episode.
    pub fn log(&self) -> &EpisodeLog {
        &self.log
    }

    /// Every target point used so far, indexed by relocation count.
    pub fn target_history(&self) -> &[Vec2] {
        &self.target_history
    }

    /// Configuration the simulator runs with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Physical constants of the simulated plate.
    pub fn constants(&self) -> &PhysicalConstants {
        self.model.constants()
    }

    /// Admissible action range `(low, high)` in radians.
    pub fn action_bounds(&self) -> (f64, f64) {
        (-ACTION_LIMIT, ACTION_LIMIT)
    }
}

/// Sampling box for relocated targets: x between xA and `XB`, y within
/// `vertical_offset` of yA.
///
/// Both spans must stay representable, or uniform sampling has no finite
/// scale to draw with.
fn relocation_bounds(a: Vec2, xb: f64, vertical_offset: f64) -> SimResult<((f64, f64), (f64, f64))> {
    let x = (a.x.min(xb), a.x.max(xb));
    let y = (a.y - vertical_offset, a.y + vertical_offset);

    let representable = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && (2.0 * (hi - lo)).is_finite();
    if !representable(x) {
        return Err(SimError::config(
            "XB",
            format!("relocation range [{}, {}] is too wide to sample", x.0, x.1),
        ));
    }
    if !representable(y) {
        return Err(SimError::config(
            "final_position",
            format!("relocation band [{}, {}] is too wide to sample", y.0, y.1),
        ));
    }
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn falling_config() -> SimConfig {
        SimConfig::new(10, 50, 0.01, 100, 0.0, -20.0)
    }

    /// A at the origin, B far to the left so the episode does not end early.
    fn gliding_env(config: SimConfig) -> FlatPlateEnv {
        FlatPlateEnv::new([0.0, 0.0, 0.0, 0.0], [-100.0, -1.0], config).unwrap()
    }

    #[test]
    fn test_initial_state_in_polar_frame() {
        let env = gliding_env(falling_config());
        let expected = env.frame().to_polar(&env.initial_state());
        assert_eq!(env.state(), expected);
        assert_eq!(env.phase(), Phase::Ready);
        assert_eq!(env.episode(), 0);
        assert_eq!(env.target_history(), &[Vec2::new(-100.0, -1.0)]);
    }

    #[test]
    fn test_free_fall_step() {
        let mut env = FlatPlateEnv::new([0.0, 0.0, 0.0, 0.0], [0.0, -10.0], falling_config()).unwrap();
        env.reset(None).unwrap();
        let result = env.step(0.0).unwrap();

        let c = env.cartesian_state();
        assert!(c.v < 0.0);
        assert!(c.y < 0.0);
        assert_abs_diff_eq!(c.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.u, 0.0, epsilon = 1e-12);
        assert_eq!(result.state, env.state());
        assert!(result.state.rho < 10.0);
        assert_eq!(env.log().len(), 1);
        assert_eq!(env.log().last().unwrap().action_deg, 0.0);
    }

    #[test]
    fn test_reward_matches_range_change() {
        let mut env = gliding_env(falling_config());
        let before = env.reset(None).unwrap();
        let result = env.step(0.05).unwrap();
        assert_abs_diff_eq!(result.reward, -10_000.0 * (result.state.rho - before.rho) - 1.0, epsilon = 1e-9);
        assert!(!result.done);
        assert_eq!(env.phase(), Phase::Running);
    }

    #[test]
    fn test_reset_restores_start() {
        let mut env = gliding_env(falling_config());
        let initial = env.reset(None).unwrap();
        for _ in 0..5 {
            env.step(0.1).unwrap();
        }
        assert!(env.state() != initial);

        let state = env.reset(None).unwrap();
        assert_eq!(state, env.frame().to_polar(&env.initial_state()));
        assert_eq!(env.steps(), 0);
        assert!(env.log().is_empty());
        assert_eq!(env.episode(), 2);
    }

    #[test]
    fn test_reset_with_explicit_state() {
        let mut env = gliding_env(falling_config());
        let custom = PolarState::new(50.0, 0.02, -1.0, 0.0);
        assert_eq!(env.reset(Some(custom)).unwrap(), custom);
        assert_eq!(env.state(), custom);
    }

    #[test]
    fn test_arrival_then_done() {
        let mut env = gliding_env(falling_config());
        // 1 cm from B with rho_ab ≈ 100 m
        env.reset(Some(PolarState::new(0.01, 0.0, 0.0, 0.0))).unwrap();
        let result = env.step(0.0).unwrap();
        assert!(result.done);
        assert_eq!(result.cause, Some(TerminationCause::Arrived));
        assert_eq!(env.summary().cause, Some(TerminationCause::Arrived));
        assert_eq!(env.step(0.0), Err(SimError::EpisodeDone));

        env.reset(None).unwrap();
        assert_eq!(env.phase(), Phase::Ready);
        assert!(env.step(0.0).is_ok());
    }

    #[test]
    fn test_step_overflow() {
        let config = SimConfig { max_steps: 3, ..falling_config() };
        let mut env = gliding_env(config);
        env.reset(None).unwrap();
        for _ in 0..3 {
            env.step(0.0).unwrap();
        }
        assert_eq!(env.step(0.0), Err(SimError::StepOverflow { step: 4, max: 3 }));
    }

    #[test]
    fn test_episode_overflow() {
        let config = SimConfig { max_episodes: 2, ..falling_config() };
        let mut env = gliding_env(config);
        env.reset(None).unwrap();
        env.reset(None).unwrap();
        assert_eq!(env.reset(None), Err(SimError::EpisodeOverflow { episode: 3, max: 2 }));
    }

    #[test]
    fn test_relocation_invariants() {
        let config = SimConfig {
            max_episodes: 30,
            pointb_change: 1,
            xb: -20.0,
            ..falling_config()
        }
        .with_seed(3);
        let mut env = FlatPlateEnv::new([0.0, 0.0, 0.0, 0.0], [-10.0, -1.0], config).unwrap();
        let threshold = 10.0_f64.to_radians();

        for episode in 1..=30 {
            let state = env.reset(None).unwrap();
            let b = env.target();
            let a = env.initial_state().position();

            assert_eq!(env.relocations(), episode);
            assert_eq!(env.target_history().len(), episode + 1);
            assert_eq!(env.target_history()[episode], b);
            assert_eq!(env.phi_a(), a.sub(&b).bearing());
            assert_eq!(env.rho_ab(), a.sub(&b).magnitude());
            assert!((b.y - a.y).abs().atan2((b.x - a.x).abs()) <= threshold);
            assert!(b.x >= -20.0 && b.x <= 0.0);
            assert!(b.y >= -1.0 && b.y <= 1.0);
            assert_eq!(state, env.frame().to_polar(&env.initial_state()));
        }
    }

    #[test]
    fn test_relocation_period() {
        let config = SimConfig { pointb_change: 3, ..falling_config() };
        let mut env = gliding_env(config);
        let original = env.target();
        env.reset(None).unwrap();
        env.reset(None).unwrap();
        assert_eq!(env.target(), original);
        env.reset(None).unwrap();
        assert_eq!(env.relocations(), 1);
        assert!(env.target() != original);
    }

    #[test]
    fn test_infeasible_relocation() {
        // B straight below A and XB = xA: every candidate is vertical
        let config = SimConfig {
            pointb_change: 1,
            xb: 0.0,
            max_relocation_attempts: 50,
            ..falling_config()
        };
        let mut env = FlatPlateEnv::new([0.0, 0.0, 0.0, 0.0], [0.0, -10.0], config).unwrap();
        let before = *env.frame();
        assert!(matches!(
            env.reset(None),
            Err(SimError::RelocationExhausted { attempts: 50, .. })
        ));
        assert_eq!(*env.frame(), before);
        assert_eq!(env.episode(), 0);
    }

    #[test]
    fn test_unsampleable_relocation_range() {
        let config = SimConfig {
            pointb_change: 1,
            xb: 1e308,
            ..falling_config()
        };
        match FlatPlateEnv::new([-1e308, 0.0, 0.0, 0.0], [-1e308 + 1e300, -1.0], config) {
            Err(SimError::Config { field, .. }) => assert_eq!(field, "XB"),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }

        match FlatPlateEnv::new([0.0, 1e308, 0.0, 0.0], [-1.0, -1e308], falling_config()) {
            Err(SimError::Config { field, .. }) => assert_eq!(field, "final_position"),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }

        let config = SimConfig {
            pointb_change: 1,
            xb: -1e6,
            ..falling_config()
        };
        let mut env = FlatPlateEnv::new([0.0, 0.0, 0.0, 0.0], [-10.0, -1.0], config).unwrap();
        env.reset(None).unwrap();
        assert!(env.target().x >= -1e6 && env.target().x <= 0.0);
    }

    #[test]
    fn test_noise_is_seeded() {
        let config = SimConfig { action_sigma: 0.05, ..falling_config() };
        let run = |seed: u64| {
            let mut env = gliding_env(config.clone().with_seed(seed));
            env.reset(None).unwrap();
            for _ in 0..10 {
                env.step(0.0).unwrap();
            }
            env.log().clone()
        };

        let first = run(1);
        assert_eq!(first, run(1));
        assert!(first != run(2));
        assert!(first.records().iter().any(|r| r.action_deg != 0.0));
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            FlatPlateEnv::new([1.0, 1.0, 0.0, 0.0], [1.0, 1.0], falling_config()),
            Err(SimError::Config { .. })
        ));
        let bad = SimConfig { max_steps: 0, ..falling_config() };
        assert!(FlatPlateEnv::new([0.0, 0.0, 0.0, 0.0], [-1.0, 0.0], bad).is_err());
    }

    #[test]
    fn test_action_bounds() {
        let env = gliding_env(falling_config());
        let (lo, hi) = env.action_bounds();
        assert_abs_diff_eq!(hi, 15.0_f64.to_radians(), epsilon = 1e-15);
        assert_eq!(lo, -hi);
    }
}
