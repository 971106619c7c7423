//! # Equipment interfaces
//!
//! The control software does not talk to the motor and sensor drivers
//! directly. Instead it consumes the capability traits in this module, which
//! are implemented by the hardware drivers, by the simulation in [`sim`], and
//! by the scripted rigs used in testing.
//!
//! Units follow the drive base convention:
//! - speed: millimeters/second, negative is reverse,
//! - turn rate: degrees/second, positive is a right (clockwise) turn,
//! - angles: degrees, positive is a right (clockwise) turn,
//! - reflectance: percent, 0 (black) to 100 (white).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A single reflectance (colour) sensor pointing at the ground.
pub trait ReflectanceSensor {
    /// Read the reflectance of the surface under the sensor.
    ///
    /// Must be callable at 200 Hz or faster.
    fn read(&mut self) -> Result<f64, EqptError>;
}

/// The differential drive motors.
pub trait Motors {
    /// Drive at the given forward speed while turning at the given rate.
    ///
    /// Returns immediately, the demand holds until the next call.
    fn drive(&mut self, speed: f64, turn_rate: f64) -> Result<(), EqptError>;

    /// Rotate in place by the given relative angle, blocking until the turn
    /// is complete.
    fn turn(&mut self, angle_deg: f64) -> Result<(), EqptError>;

    /// Stop both motors.
    fn stop(&mut self) -> Result<(), EqptError>;
}

/// Operator interface: buttons, display and speaker.
pub trait Hmi {
    /// Give the operator an audible or visual cue. Has no effect on control.
    fn signal(&mut self, signal: Signal);

    /// Returns `true` if the operator has pressed the confirm button since
    /// the last call.
    fn confirm_pressed(&mut self) -> Result<bool, EqptError>;

    /// Returns `true` if the operator has requested the run to stop.
    fn stop_requested(&mut self) -> Result<bool, EqptError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single drive demand, produced once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    /// Forward speed
    ///
    /// Units: millimeters/second
    pub speed: f64,

    /// Differential turn rate, positive turns right.
    ///
    /// Units: degrees/second
    pub turn_rate: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Operator cues issued through [`Hmi::signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Place the sensor over the white surface and confirm
    CalibWhite,
    /// White value has been recorded
    WhiteRecorded,
    /// Place the sensor over the black line and confirm
    CalibBlack,
    /// Black value has been recorded
    BlackRecorded,
    /// Calibration complete, waiting for the start confirmation
    Ready,
    /// Line following has started
    Start,
    /// The line has been lost and a search is in progress
    Searching,
    /// The line was found again by the search
    LineFound,
    /// The search failed to find the line
    LineNotFound,
    /// The run has ended
    Finished,
}

/// Errors raised by equipment drivers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EqptError {
    #[error("Reflectance sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Motor fault: {0}")]
    MotorFault(String),

    #[error("Operator interface unavailable: {0}")]
    HmiUnavailable(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCommand {
    pub fn new(speed: f64, turn_rate: f64) -> Self {
        Self { speed, turn_rate }
    }

    /// Mix the command into `(left, right)` wheel demands using
    /// `left = speed + turn/2, right = speed - turn/2`.
    ///
    /// Positive turn rates turn right, so the left wheel runs faster.
    pub fn wheel_speeds(&self) -> (f64, f64) {
        (
            self.speed + self.turn_rate / 2.0,
            self.speed - self.turn_rate / 2.0
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wheel_speeds() {
        assert_eq!(DriveCommand::new(100.0, 0.0).wheel_speeds(), (100.0, 100.0));

        // Right turn speeds up the left wheel
        let (l, r) = DriveCommand::new(100.0, 40.0).wheel_speeds();
        assert_eq!((l, r), (120.0, 80.0));

        // Mean of the wheels is always the forward speed
        let (l, r) = DriveCommand::new(-50.0, -30.0).wheel_speeds();
        assert_eq!((l + r) / 2.0, -50.0);
    }
}
