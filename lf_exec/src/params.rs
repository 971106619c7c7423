//! # Line Follower Executable Parameters
//!
//! This module provides the parameters for the line follower executable,
//! loaded from `params/line_follower.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use serde::{Serialize, Deserialize};

use crate::{calib, ctrl_loop, line_ctrl, line_search::LineSearcher};
use util::{logger::LogParams, time::{duration_from_secs, InvalidDuration}};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LfExecParams {

    /// Log levels
    pub log: LogParams,

    /// Sensor calibration
    pub calib: calib::CalibParams,

    /// Control law, speed and sharp curve parameters
    pub line_ctrl: line_ctrl::Params,

    /// Recovery sweep
    pub line_search: LineSearcher,

    /// Cycle timing and loss detection
    pub ctrl_loop: ctrl_loop::Params,

    /// Number of readings taken in sensor test mode
    pub sensor_test_samples: usize,

    /// Period between readings in sensor test mode
    ///
    /// Units: seconds
    pub sensor_test_period_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for LfExecParams {
    fn default() -> Self {
        Self {
            log: LogParams::default(),
            calib: calib::CalibParams::default(),
            line_ctrl: line_ctrl::Params::default(),
            line_search: LineSearcher::default(),
            ctrl_loop: ctrl_loop::Params::default(),
            sensor_test_samples: 100,
            sensor_test_period_s: 0.1
        }
    }
}

impl LfExecParams {
    /// Period between readings in sensor test mode.
    pub fn sensor_test_period(&self) -> Result<Duration, InvalidDuration> {
        duration_from_secs(self.sensor_test_period_s)
    }
}
