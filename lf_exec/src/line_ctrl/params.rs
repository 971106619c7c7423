//! Line control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{ControlGains, CurveDetector, OscillationParams, SpeedModulator};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for line control
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Params {
    /// The control law used while tracking
    pub law: ControlLaw,

    /// Forward speed on a straight line
    ///
    /// Units: millimeters/second
    pub base_speed: f64,

    /// Turn rate magnitude of the bang-bang law
    ///
    /// Units: degrees/second
    pub bang_bang_turn_rate: f64,

    /// PID gains
    pub gains: ControlGains,

    /// Symmetric limit on the PID integral. If not given the integral is
    /// unbounded.
    pub integral_limit: Option<f64>,

    /// Symmetric limit on the PID turn rate demand.
    ///
    /// Units: degrees/second
    pub max_turn_rate: Option<f64>,

    /// Oscillation damping, disabled if not given
    pub oscillation: Option<OscillationParams>,

    /// Speed modulation
    pub speed: SpeedModulator,

    /// Sharp curve detection and override
    pub curve: CurveDetector,

    /// Half width of the band around the target, as a fraction of the
    /// distance between the extreme thresholds, within which the line is
    /// considered centred under the sensor.
    pub gray_zone_ratio: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlLaw {
    /// PID feedback with speed modulation and sharp curve overrides
    Pid,

    /// Fixed turn towards the line edge depending only on the side of the
    /// threshold the reading is on
    BangBang,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            law: ControlLaw::Pid,
            base_speed: 150.0,
            bang_bang_turn_rate: 100.0,
            gains: ControlGains::default(),
            integral_limit: Some(100.0),
            max_turn_rate: Some(250.0),
            oscillation: Some(OscillationParams::default()),
            speed: SpeedModulator::default(),
            curve: CurveDetector::default(),
            gray_zone_ratio: 0.3
        }
    }
}
