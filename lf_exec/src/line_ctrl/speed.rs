//! Forward speed modulation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Slows the robot down as the tracking error grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedModulator {
    /// Speed reduction per unit of absolute error.
    ///
    /// Units: millimeters/second per reflectance percent
    pub damping: f64,

    /// Floor below which the forward speed is never reduced.
    ///
    /// Units: millimeters/second
    pub min_speed: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SpeedModulator {
    fn default() -> Self {
        Self {
            damping: 0.8,
            min_speed: 50.0
        }
    }
}

impl SpeedModulator {
    /// Forward speed for the given base speed and tracking error.
    pub fn adjust_speed(&self, base_speed: f64, error: f64) -> f64 {
        (base_speed - error.abs() * self.damping).max(self.min_speed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_adjust_speed() {
        let m = SpeedModulator::default();

        assert_eq!(m.adjust_speed(150.0, 0.0), 150.0);
        assert_eq!(m.adjust_speed(150.0, 10.0), 142.0);
        assert_eq!(m.adjust_speed(150.0, -10.0), 142.0);

        // Clamped to the floor
        assert_eq!(m.adjust_speed(150.0, 200.0), 50.0);
    }
}
