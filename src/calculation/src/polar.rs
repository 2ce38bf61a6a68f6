//! Goal-relative polar frame.
//!
//! The plate is observed by its range `rho` to the target point B and by
//! `theta`, the offset of its bearing around B from the fixed reference
//! bearing `phi_a` of the start point A seen from B. Velocities are rotated
//! into the local (radial, tangential) basis at the plate's bearing.

use std::f64::consts;

use serde::{Deserialize, Serialize};

use crate::vector::Vec2;

/// Absolute plate state: centroid position (x, y) and velocity (u, v).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianState {
    /// Horizontal position (m).
    pub x: f64,
    /// Vertical position (m), up positive.
    pub y: f64,
    /// Horizontal velocity (m/s).
    pub u: f64,
    /// Vertical velocity (m/s).
    pub v: f64,
}

impl CartesianState {
    /// State from position and velocity.
    pub const fn new(x: f64, y: f64, u: f64, v: f64) -> Self {
        Self { x, y, u, v }
    }

    /// Position (x, y).
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Velocity (u, v).
    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.u, self.v)
    }

    /// Layout used by the integrator: `[x, y, u, v]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.u, self.v]
    }

    /// Inverse of [`CartesianState::to_array`].
    pub fn from_array(arr: &[f64; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }
}

/// Goal-relative state observed by the agent: `[rho, theta, rho_dot, theta_dot]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolarState {
    /// Range to B.
    pub rho: f64,
    /// Bearing offset from `phi_a`, in (−π, π].
    pub theta: f64,
    /// Radial velocity, positive away from B.
    pub rho_dot: f64,
    /// Tangential velocity, positive counter-clockwise.
    pub theta_dot: f64,
}

impl PolarState {
    /// State from range, bearing offset and their rates.
    pub const fn new(rho: f64, theta: f64, rho_dot: f64, theta_dot: f64) -> Self {
        Self {
            rho,
            theta,
            rho_dot,
            theta_dot,
        }
    }

    /// Observation vector `[rho, theta, rho_dot, theta_dot]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.rho, self.theta, self.rho_dot, self.theta_dot]
    }

    /// Inverse of [`PolarState::to_array`].
    pub fn from_array(arr: &[f64; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }
}

/// Target point B together with the reference bearing it induces.
///
/// `phi_a` and `rho_ab` are derived from B and the start point A; the only
/// way to change B is [`PolarFrame::new`], so the three never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarFrame {
    b: Vec2,
    phi_a: f64,
    rho_ab: f64,
}

impl PolarFrame {
    /// Frame centred at `b`, with reference bearing `atan2(A − B)`.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        let ba = a.sub(&b);
        Self {
            b,
            phi_a: ba.bearing(),
            rho_ab: ba.magnitude(),
        }
    }

    /// Target point B.
    pub fn target(&self) -> Vec2 {
        self.b
    }

    /// Reference bearing of A seen from B.
    pub fn phi_a(&self) -> f64 {
        self.phi_a
    }

    /// Distance between A and B.
    pub fn rho_ab(&self) -> f64 {
        self.rho_ab
    }

    /// Absolute Cartesian state to goal-relative polar state.
    ///
    /// At `rho == 0` the bearing is undefined; the plate is then placed on
    /// the reference line (`theta = 0`) so the result stays finite and the
    /// inverse transform still returns B exactly.
    pub fn to_polar(&self, c: &CartesianState) -> PolarState {
        let bp = c.position().sub(&self.b);
        let rho = bp.magnitude();
        let phi_p = if rho == 0.0 { self.phi_a } else { bp.bearing() };
        let theta = wrap_angle(phi_p - self.phi_a);

        // velocity into the (rho, theta) basis
        let vel = c.velocity().rotate(-phi_p);

        PolarState::new(rho, theta, vel.x, vel.y)
    }

    /// Goal-relative polar state back to absolute Cartesian state.
    pub fn to_cartesian(&self, p: &PolarState) -> CartesianState {
        let phi_p = p.theta + self.phi_a;
        let pos = self.b.add(&Vec2::from_polar(p.rho, phi_p));
        let vel = Vec2::new(p.rho_dot, p.theta_dot).rotate(phi_p);

        CartesianState::new(pos.x, pos.y, vel.x, vel.y)
    }

    /// Absolute bearing of the plate around B, `theta + phi_a` in (−π, π].
    pub fn absolute_bearing(&self, p: &PolarState) -> f64 {
        wrap_angle(p.theta + self.phi_a)
    }
}

/// Wrap an angle into (−π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + consts::PI).rem_euclid(2.0 * consts::PI) - consts::PI;
    if wrapped == -consts::PI { consts::PI } else { wrapped }
}
