//! Physical constants of the falling flat plate.
//!
//! The plate is a thin rectangle of paper-like density falling through air.
//! Only the lift-like induced-flow term acts on it; drag is held at zero.

use serde::{Deserialize, Serialize};

/// Geometry, mass and environment of the plate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Gravitational acceleration (m/s²), negative because y points up.
    pub g: f64,

    /// Air density (kg/m³)
    pub rho_air: f64,

    /// Plate chord (m)
    pub chord: f64,

    /// Plate length (m)
    pub length: f64,

    /// Plate thickness (m)
    pub thickness: f64,

    /// Plate material density (kg/m³)
    /// Paper of 500 g/m² over a 1 cm thickness gives 1.0.
    pub rho_plate: f64,

    /// Constant drag force (N). Zero in this model.
    pub drag: f64,
}

impl PhysicalConstants {
    /// Create the reference plate: 0.1 m chord, 1 m span, 1 cm thick.
    pub const fn new() -> Self {
        Self {
            g: -9.806,
            rho_air: 1.18415,
            chord: 0.1,
            length: 1.0,
            thickness: 0.01,
            rho_plate: 0.5 * 2.0,
            drag: 0.0,
        }
    }

    /// Planform area S = chord · length (m²).
    #[inline(always)]
    pub fn area(&self) -> f64 {
        self.chord * self.length
    }

    /// Plate mass (kg).
    #[inline(always)]
    pub fn mass(&self) -> f64 {
        self.rho_plate * self.length * self.chord * self.thickness
    }

    /// Lift coefficient mr = ρ_air · S · π / m.
    #[inline(always)]
    pub fn mr(&self) -> f64 {
        self.rho_air * self.area() * std::f64::consts::PI / self.mass()
    }

    /// Get a summary of constants as a hash map for reporting.
    pub fn summary(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();
        map.insert("g (m/s²)".to_string(), format!("{:.4}", self.g));
        map.insert("ρ_air (kg/m³)".to_string(), format!("{:.5}", self.rho_air));
        map.insert("chord (m)".to_string(), format!("{:.3}", self.chord));
        map.insert("length (m)".to_string(), format!("{:.3}", self.length));
        map.insert("thickness (m)".to_string(), format!("{:.3}", self.thickness));
        map.insert("mass (kg)".to_string(), format!("{:.6}", self.mass()));
        map.insert("mr (1/m)".to_string(), format!("{:.3}", self.mr()));
        map
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::new()
    }
}
