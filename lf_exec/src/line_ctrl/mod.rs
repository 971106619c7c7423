//! # Line control module
//!
//! Line control converts each reflectance reading into a drive command which
//! keeps the sensor on the edge of the line.
//!
//! The target reflectance sits halfway between the calibrated white and black
//! values, so when the sensor is exactly over the edge half of its spot sees
//! the line. A reading lighter than the target means the robot has drifted
//! off the line and must turn right, a darker reading means it has drifted
//! onto the line and must turn left. The error is passed through a PID
//! controller to get the turn rate, and the forward speed is reduced as the
//! error grows so the robot slows down into bends.
//!
//! Readings close to either calibrated extreme mean the line is bending too
//! sharply for the PID law to follow, in which case a fixed override command
//! is issued for that cycle instead.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod curve;
pub mod error_model;
pub mod params;
pub mod pid;
pub mod speed;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use curve::*;
pub use error_model::compute_error;
pub use params::{ControlLaw, Params};
pub use pid::{ControlGains, OscillationParams, PidController, PidState};
pub use speed::SpeedModulator;
pub use state::*;
