//! Line control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{trace, warn};
use serde::Serialize;

use super::*;
use crate::{calib::CalibrationResult, eqpt::DriveCommand};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct LineCtrl {
    params: Params,

    calib: CalibrationResult,

    /// Controller used by the PID law
    pid: PidController,

    /// The side of the sensor the line was last seen on
    last_side: LineSide,

    report: StatusReport,
}

/// The status report of a single cycle.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Tracking error of the cycle's reading
    pub error: f64,

    /// PID integral after the cycle
    pub integral: f64,

    /// Sharp curve detected on this cycle
    pub curve: Option<CurveKind>,

    /// Side of the sensor the line is on
    pub line_side: LineSide,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Where the line was last seen relative to the sensor, expressed as the
/// direction in which the robot must turn to follow it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum LineSide {
    Unknown,
    Left,
    Centre,
    Right,
}

#[derive(Debug, thiserror::Error)]
pub enum LineCtrlError {
    #[error("Base speed must be positive and finite, got {0}")]
    InvalidBaseSpeed(f64),

    #[error("PID gains must be finite, got {0:?}")]
    InvalidGains(ControlGains),

    #[error("Oscillation history size must be at least 2")]
    InvalidHistorySize,

    #[error("Reflectance reading is not a number")]
    NonFiniteReading,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LineSide {
    fn default() -> Self {
        LineSide::Unknown
    }
}

impl State for LineCtrl {
    type InitData = (Params, CalibrationResult);
    type InitError = LineCtrlError;

    type InputData = f64;
    type OutputData = DriveCommand;
    type StatusReport = StatusReport;
    type ProcError = LineCtrlError;

    /// Initialise the LineCtrl module from the parameters and the result of
    /// the calibration.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        let (params, calib) = init_data;

        if !(params.base_speed.is_finite() && params.base_speed > 0.0) {
            return Err(LineCtrlError::InvalidBaseSpeed(params.base_speed))
        }

        let g = params.gains;
        if !(g.kp.is_finite() && g.ki.is_finite() && g.kd.is_finite()) {
            return Err(LineCtrlError::InvalidGains(g))
        }

        if let Some(o) = params.oscillation {
            if o.history_size < 2 {
                return Err(LineCtrlError::InvalidHistorySize)
            }
        }

        if params.law == ControlLaw::Pid {
            let band = params.curve.tracking_band(
                calib.black_thresh, 
                calib.white_thresh
            );
            if band.is_none() {
                warn!(
                    "Calibrated range {:.1} to {:.1} is too narrow for the \
                    curve margin of {:.1}, every cycle will be an override", 
                    calib.black_thresh, calib.white_thresh, params.curve.margin
                );
            }
        }

        let pid = PidController::new(params.gains)
            .with_integral_limit(params.integral_limit)
            .with_max_turn_rate(params.max_turn_rate)
            .with_oscillation_damping(params.oscillation);

        Ok(Self {
            params,
            calib,
            pid,
            last_side: LineSide::Unknown,
            report: StatusReport::default()
        })
    }

    /// Process a single reflectance reading into a drive command.
    fn proc(&mut self, reflection: &f64)
        -> Result<(DriveCommand, StatusReport), LineCtrlError>
    {
        let reflection = *reflection;
        if !reflection.is_finite() {
            return Err(LineCtrlError::NonFiniteReading)
        }

        self.report = StatusReport::default();

        let error = compute_error(reflection, self.calib.target_value);
        self.report.error = error;

        let cmd = match self.params.law {
            ControlLaw::Pid => self.law_pid(reflection, error),
            ControlLaw::BangBang => self.law_bang_bang(reflection)
        };

        self.report.integral = self.pid.state().integral;
        self.report.line_side = self.last_side;

        trace!(
            "r: {:.1}, e: {:.2}, i: {:.2}, cmd: ({:.1}, {:.1})",
            reflection, error, self.report.integral, cmd.speed, cmd.turn_rate
        );

        Ok((cmd, self.report))
    }
}

impl LineCtrl {
    /// PID law with speed modulation and sharp curve overrides.
    fn law_pid(&mut self, reflection: f64, error: f64) -> DriveCommand {
        let kind = self.params.curve.classify(
            reflection, 
            self.calib.black_thresh, 
            self.calib.white_thresh
        );

        if let Some(cmd) = self.params.curve.override_command(
            kind, 
            self.params.base_speed
        ) {
            if self.params.curve.reset_integral_on_override {
                self.pid.reset_integral();
            }

            self.report.curve = Some(kind);
            self.last_side = match kind {
                CurveKind::SharpLeft => LineSide::Left,
                _ => LineSide::Right
            };

            return cmd
        }

        let turn_rate = self.pid.update(error);
        let speed = self.params.speed.adjust_speed(
            self.params.base_speed, 
            error
        );
        self.last_side = self.classify_side(reflection);

        DriveCommand::new(speed, turn_rate)
    }

    /// On/off law turning towards the edge at a fixed rate.
    fn law_bang_bang(&mut self, reflection: f64) -> DriveCommand {
        self.last_side = self.classify_side(reflection);

        let turn = self.params.bang_bang_turn_rate;
        if reflection < self.calib.threshold {
            DriveCommand::new(self.params.base_speed, -turn)
        }
        else {
            DriveCommand::new(self.params.base_speed, turn)
        }
    }

    /// Work out which side of the sensor the line is on.
    pub fn classify_side(&self, reflection: f64) -> LineSide {
        let gray_zone = self.params.gray_zone_ratio 
            * (self.calib.white_thresh - self.calib.black_thresh);

        if (reflection - self.calib.target_value).abs() < gray_zone {
            LineSide::Centre
        }
        else if reflection < self.calib.target_value {
            LineSide::Left
        }
        else {
            LineSide::Right
        }
    }

    /// Clear the controller state, used when the line is reacquired.
    pub fn reset(&mut self) {
        self.pid.reset();
        self.last_side = LineSide::Unknown;
    }

    pub fn last_side(&self) -> LineSide {
        self.last_side
    }

    /// Record where the line is after it was found by other means than the
    /// control law.
    pub fn set_last_side(&mut self, side: LineSide) {
        self.last_side = side;
    }

    pub fn pid_state(&self) -> &PidState {
        self.pid.state()
    }

    /// Readings handled by the PID law rather than a curve override.
    pub fn tracking_band(&self) -> Option<(f64, f64)> {
        self.params.curve.tracking_band(
            self.calib.black_thresh, 
            self.calib.white_thresh
        )
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn calib(&self) -> &CalibrationResult {
        &self.calib
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
