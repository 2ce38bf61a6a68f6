//! Planar vector operations for the flat plate's position and velocity.

use serde::{Deserialize, Serialize};

/// 2D vector in the vertical plane of flight (x right, y up).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// Creates a new vector.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Vector of length `r` pointing along bearing `phi` (radians from +x).
    #[inline(always)]
    pub fn from_polar(r: f64, phi: f64) -> Self {
        Self::new(r * phi.cos(), r * phi.sin())
    }

    /// Magnitude (length) of the vector.
    #[inline(always)]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Squared magnitude (avoids sqrt, cheaper for comparisons).
    #[inline(always)]
    pub fn magnitude_sq(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Bearing of the vector, `atan2(y, x)`, in (−π, π].
    #[inline(always)]
    pub fn bearing(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Element-wise addition.
    #[inline(always)]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Element-wise subtraction.
    #[inline(always)]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Scalar multiplication.
    #[inline(always)]
    pub fn mul(&self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }

    /// Rotate counter-clockwise by `phi`.
    #[inline(always)]
    pub fn rotate(&self, phi: f64) -> Self {
        let (s, c) = phi.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Distance to another vector.
    pub fn distance(&self, other: &Self) -> f64 {
        self.sub(other).magnitude()
    }

    /// Convert to array.
    pub fn to_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Convert from array.
    pub fn from_array(arr: &[f64; 2]) -> Self {
        Self::new(arr[0], arr[1])
    }
}
