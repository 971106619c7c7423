//! # Line follower library.
//!
//! This library holds the line following controller so that it can be used
//! by the executable, the integration tests and the benchmarks.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Calibration - derives the tracking target from the white and black extremes
pub mod calib;

/// Control loop - sequences the cycles and owns the tracking state machine
pub mod ctrl_loop;

/// Equipment - the sensor, motor and operator interfaces, plus the simulation
pub mod eqpt;

/// Line control - converts a reflectance reading into a drive command
pub mod line_ctrl;

/// Line search - sweeps for the line after it has been lost
pub mod line_search;

/// Executable parameters
pub mod params;
