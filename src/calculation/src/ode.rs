//! Fixed-step ODE solver for the plate's translational dynamics.
//!
//! The simulator only ever integrates over one control interval at a time,
//! with the control held constant, so a classic RK4 with a configurable
//! number of sub-steps per interval is enough. The same right-hand side is
//! sampled in the same order every call, so results are deterministic.

/// Trait representing an ODE system: dy/dt = f(t, y)
pub trait OdeSystem {
    /// The state type, `[x, y, u, v]` for the plate.
    type State: StateAddMul + Copy;

    /// Compute the right-hand side of the ODE system
    fn rhs(&self, t: f64, state: &Self::State) -> Self::State;
}

/// Trait for adding states with different weights.
pub trait StateAddMul {
    /// `self + scalar * other`
    fn add_mul(&self, other: &Self, scalar: f64) -> Self;
}

/// Planar position + velocity.
impl StateAddMul for [f64; 4] {
    #[inline(always)]
    fn add_mul(&self, other: &Self, scalar: f64) -> Self {
        [
            self[0] + other[0] * scalar,
            self[1] + other[1] * scalar,
            self[2] + other[2] * scalar,
            self[3] + other[3] * scalar,
        ]
    }
}

/// State for RK4 integration: x, y, u, v
pub type RK4State = [f64; 4];

/// Single RK4 step.
#[inline(always)]
pub fn rk4_step<S: OdeSystem>(system: &S, t: f64, state: &S::State, h: f64) -> S::State {
    let h2 = 0.5 * h;

    let k1 = system.rhs(t, state);
    let k2 = system.rhs(t + h2, &state.add_mul(&k1, h2));
    let k3 = system.rhs(t + h2, &state.add_mul(&k2, h2));
    let k4 = system.rhs(t + h, &state.add_mul(&k3, h));

    // y_new = y + h/6 * (k1 + 2*k2 + 2*k3 + k4)
    let sum = k1.add_mul(&k2, 2.0).add_mul(&k3, 2.0).add_mul(&k4, 1.0);
    state.add_mul(&sum, h / 6.0)
}

/// Fixed-step RK4 integrator with sub-stepping between evaluation points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RK4Integrator {
    /// RK4 steps between two evaluation points.
    pub substeps: usize,
}

impl RK4Integrator {
    /// Integrator with at least one sub-step.
    pub fn new(substeps: usize) -> Self {
        Self {
            substeps: substeps.max(1),
        }
    }

    /// Advance `state0` from `t0` to `t1`.
    pub fn advance<S: OdeSystem>(&self, system: &S, state0: &S::State, t0: f64, t1: f64) -> S::State {
        let h = (t1 - t0) / self.substeps as f64;
        let mut state = *state0;
        let mut t = t0;

        for _ in 0..self.substeps {
            state = rk4_step(system, t, &state, h);
            t += h;
        }

        state
    }

    /// Integrate over `t_eval`, returning the state at every evaluation point.
    /// The first entry is `state0` itself.
    pub fn integrate<S: OdeSystem>(&self, system: &S, t_eval: &[f64], state0: &S::State) -> Vec<S::State> {
        let mut states = Vec::with_capacity(t_eval.len());
        let mut state = *state0;
        states.push(state);

        for w in t_eval.windows(2) {
            state = self.advance(system, &state, w[0], w[1]);
            states.push(state);
        }

        states
    }
}

impl Default for RK4Integrator {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Simple harmonic oscillator in x, uniform acceleration in y
    struct Oscillator {
        k: f64,
        a: f64,
    }

    impl OdeSystem for Oscillator {
        type State = [f64; 4];

        fn rhs(&self, _t: f64, s: &[f64; 4]) -> [f64; 4] {
            [s[2], s[3], -self.k * s[0], self.a]
        }
    }

    #[test]
    fn test_rk4_step_constant_acceleration_is_exact() {
        let system = Oscillator { k: 0.0, a: -9.806 };
        let state1 = rk4_step(&system, 0.0, &[0.0, 0.0, 1.0, 0.0], 0.5);
        assert_relative_eq!(state1[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(state1[1], -0.5 * 9.806 * 0.25, epsilon = 1e-12);
        assert_relative_eq!(state1[3], -9.806 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_advance_harmonic_oscillator() {
        let system = Oscillator { k: 1.0, a: 0.0 };
        let integrator = RK4Integrator::new(100);
        let end = integrator.advance(&system, &[1.0, 0.0, 0.0, 0.0], 0.0, 1.0);
        assert_relative_eq!(end[0], 1.0_f64.cos(), epsilon = 1e-9);
        assert_relative_eq!(end[2], -(1.0_f64.sin()), epsilon = 1e-9);
    }

    #[test]
    fn test_integrate_trajectory() {
        let system = Oscillator { k: 1.0, a: 0.0 };
        let t_eval: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
        let trajectory = RK4Integrator::default().integrate(&system, &t_eval, &[1.0, 0.0, 0.0, 0.0]);

        assert_eq!(trajectory.len(), t_eval.len());
        assert_eq!(trajectory[0][0], 1.0);
        assert!(trajectory[0][0] != trajectory[5][0]);
    }

    #[test]
    fn test_zero_substeps_clamped() {
        assert_eq!(RK4Integrator::new(0).substeps, 1);
    }
}
