//! Simplified aerodynamic force law for the falling flat plate.
//!
//! The plate feels gravity plus a lift-like term proportional to the squared
//! speed and to the sum of the commanded induced pitch and the induced flow
//! angle. Drag is not modelled and the horizontal acceleration is
//! `drag / m = 0`.
//!
//! # Model
//!
//! ```text
//! dx/dt = u
//! dy/dt = v
//! du/dt = drag / m
//! dv/dt = g + mr · V² · (alpha + fold(atan2(v, u)))
//! ```

use std::f64::consts;

use crate::constants::PhysicalConstants;
use crate::ode::{OdeSystem, RK4Integrator, RK4State};
use crate::polar::CartesianState;

/// Fold the velocity angle `atan2(v, u)` into the induced flow angle.
///
/// Domain: (−π, π]. For `alpha` in [0, π] the result is `alpha − π`, in
/// [−π, 0]; for `alpha` in (−π, 0) it is `alpha + π`, in (0, π). This is
/// the bearing of the oncoming flow `(−u, −v)`, except that `alpha = 0`
/// maps to −π instead of π.
///
/// Do not replace with `atan2(-v, -u)`: the two differ at `alpha = 0`.
#[inline(always)]
pub fn fold_induced_angle(alpha: f64) -> f64 {
    if (0.0..=consts::PI).contains(&alpha) {
        -(consts::PI - alpha.abs())
    } else {
        consts::PI - alpha.abs()
    }
}

/// Induced flow angle of a velocity vector.
#[inline(always)]
pub fn induced_angle(u: f64, v: f64) -> f64 {
    fold_induced_angle(v.atan2(u))
}

/// Flat plate ODE system with the control held constant.
///
/// `alpha` is sampled once per control step and stays fixed for every
/// evaluation of the right-hand side within that step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatPlateModel {
    constants: PhysicalConstants,
    mass: f64,
    mr: f64,
    /// Held induced pitch command (rad).
    pub alpha: f64,
}

impl FlatPlateModel {
    /// Model for `constants` with no pitch command.
    pub fn new(constants: PhysicalConstants) -> Self {
        Self {
            mass: constants.mass(),
            mr: constants.mr(),
            constants,
            alpha: 0.0,
        }
    }

    /// Copy of this model holding `alpha` for the next integration interval.
    pub fn with_action(&self, alpha: f64) -> Self {
        Self { alpha, ..*self }
    }

    /// Plate the model was built for.
    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    /// Compute the state derivative `[dx/dt, dy/dt, du/dt, dv/dt]`.
    #[inline(always)]
    pub fn rhs_internal(&self, state: &RK4State) -> RK4State {
        let [_x, _y, u, v] = *state;

        let speed_sq = u * u + v * v;
        let alpha_induced = induced_angle(u, v);

        let dudt = self.constants.drag / self.mass;
        let dvdt = self.constants.g + self.mr * speed_sq * (self.alpha + alpha_induced);

        [u, v, dudt, dvdt]
    }

    /// Derivative of a Cartesian plate state.
    pub fn derivative(&self, c: &CartesianState) -> CartesianState {
        CartesianState::from_array(&self.rhs_internal(&c.to_array()))
    }

    /// Simulate a trajectory at the given evaluation times.
    pub fn simulate(&self, integrator: &RK4Integrator, t_eval: &[f64], state0: &CartesianState) -> Vec<CartesianState> {
        integrator
            .integrate(self, t_eval, &state0.to_array())
            .iter()
            .map(CartesianState::from_array)
            .collect()
    }
}

impl OdeSystem for FlatPlateModel {
    type State = RK4State;

    fn rhs(&self, _t: f64, state: &Self::State) -> Self::State {
        self.rhs_internal(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fold_upper_half() {
        assert_relative_eq!(fold_induced_angle(0.0), -consts::PI);
        assert_relative_eq!(fold_induced_angle(consts::FRAC_PI_2), -consts::FRAC_PI_2);
        assert_relative_eq!(fold_induced_angle(consts::PI), 0.0);
    }

    #[test]
    fn test_fold_lower_half() {
        assert_relative_eq!(fold_induced_angle(-consts::FRAC_PI_2), consts::FRAC_PI_2);
        assert_relative_eq!(fold_induced_angle(-0.25), consts::PI - 0.25);
    }

    #[test]
    fn test_fold_matches_oncoming_flow_bearing() {
        for &(u, v) in &[(1.0_f64, 2.0_f64), (-3.0, 0.5), (0.2, -1.0), (-1.0, -1.0)] {
            let oncoming = (-v).atan2(-u);
            assert_relative_eq!(induced_angle(u, v), oncoming, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rhs_at_rest_is_free_fall() {
        let model = FlatPlateModel::new(PhysicalConstants::default());
        let deriv = model.rhs_internal(&[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(deriv, [0.0, 0.0, 0.0, -9.806]);
    }

    #[test]
    fn test_rhs_lift_term() {
        let model = FlatPlateModel::new(PhysicalConstants::default()).with_action(0.1);
        let (u, v) = (0.0, -2.0);
        let deriv = model.rhs_internal(&[0.0, 0.0, u, v]);

        let expected = -9.806 + model.constants().mr() * 4.0 * (0.1 + consts::FRAC_PI_2);
        assert_eq!(deriv[0], u);
        assert_eq!(deriv[1], v);
        assert_eq!(deriv[2], 0.0);
        assert_relative_eq!(deriv[3], expected, epsilon = 1e-9);
    }

    #[test]
    fn test_simulation_falls_straight_down() {
        let model = FlatPlateModel::new(PhysicalConstants::default());
        let t_eval: Vec<f64> = (0..=10).map(|i| i as f64 * 0.01).collect();
        let trajectory = model.simulate(&RK4Integrator::default(), &t_eval, &CartesianState::default());

        assert_eq!(trajectory.len(), t_eval.len());
        let last = trajectory[trajectory.len() - 1];
        assert_eq!(last.x, 0.0);
        assert_eq!(last.u, 0.0);
        assert!(last.v < 0.0);
        assert!(last.y < 0.0);
    }
}
