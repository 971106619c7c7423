//! Sharp curve detection
//!
//! When the sensor sees fully black or fully white the line is bending faster
//! than the PID law can follow, so a fixed override command is issued
//! instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::eqpt::DriveCommand;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveDetector {
    /// Margin added to the extreme thresholds.
    pub margin: f64,

    /// Fraction of the base speed used during an override.
    pub override_speed_factor: f64,

    /// Magnitude of the override turn rate.
    ///
    /// Units: degrees/second
    pub override_turn_rate: f64,

    /// Clear the PID integral on every override cycle.
    pub reset_integral_on_override: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveKind {
    None,
    SharpLeft,
    SharpRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for CurveDetector {
    fn default() -> Self {
        Self {
            margin: 5.0,
            override_speed_factor: 0.5,
            override_turn_rate: 200.0,
            reset_integral_on_override: true
        }
    }
}

impl CurveDetector {
    /// Classify a reading against the calibrated extreme thresholds.
    ///
    /// The black side is checked first, so if the thresholds overlap a dark
    /// reading is a left curve.
    pub fn classify(
        &self,
        reflection: f64,
        black_thresh: f64,
        white_thresh: f64
    ) -> CurveKind {
        if reflection < black_thresh + self.margin {
            CurveKind::SharpLeft
        }
        else if reflection > white_thresh - self.margin {
            CurveKind::SharpRight
        }
        else {
            CurveKind::None
        }
    }

    /// Range of readings left to the control law between the two override
    /// bands, or `None` if the bands meet.
    pub fn tracking_band(&self, black_thresh: f64, white_thresh: f64)
        -> Option<(f64, f64)>
    {
        let low = black_thresh + self.margin;
        let high = white_thresh - self.margin;

        if high > low {
            Some((low, high))
        }
        else {
            None
        }
    }

    /// The override demand for the given curve, or `None` if no override is
    /// needed.
    pub fn override_command(&self, kind: CurveKind, base_speed: f64)
        -> Option<DriveCommand>
    {
        let speed = base_speed * self.override_speed_factor;

        match kind {
            CurveKind::None => None,
            CurveKind::SharpLeft => Some(
                DriveCommand::new(speed, -self.override_turn_rate)
            ),
            CurveKind::SharpRight => Some(
                DriveCommand::new(speed, self.override_turn_rate)
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tracking_band() {
        let d = CurveDetector::default();

        assert_eq!(d.tracking_band(20.0, 80.0), Some((25.0, 75.0)));
        assert_eq!(d.tracking_band(50.0, 60.0), None);
        assert_eq!(d.tracking_band(50.0, 55.0), None);
    }

    #[test]
    fn test_classify() {
        let d = CurveDetector::default();

        assert_eq!(d.classify(20.0 - 10.0, 20.0, 80.0), CurveKind::SharpLeft);
        assert_eq!(d.classify(80.0 + 10.0, 20.0, 80.0), CurveKind::SharpRight);
        assert_eq!(d.classify(50.0, 20.0, 80.0), CurveKind::None);

        // Boundaries are exclusive
        assert_eq!(d.classify(25.0, 20.0, 80.0), CurveKind::None);
        assert_eq!(d.classify(75.0, 20.0, 80.0), CurveKind::None);
    }

    #[test]
    fn test_override_command() {
        let d = CurveDetector::default();

        assert_eq!(d.override_command(CurveKind::None, 150.0), None);
        assert_eq!(
            d.override_command(CurveKind::SharpLeft, 150.0),
            Some(DriveCommand::new(75.0, -200.0))
        );
        assert_eq!(
            d.override_command(CurveKind::SharpRight, 150.0),
            Some(DriveCommand::new(75.0, 200.0))
        );
    }
}
