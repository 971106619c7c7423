//! # Control loop module
//!
//! The control loop sequences one cycle of line following at a time and owns
//! the state machine deciding what each cycle does:
//!
//! ```text
//!              sharp curve                      line found
//!   Tracking <-------------> SharpCurveOverride <----------+
//!      |                            |                      |
//!      +------ line lost -----------+-----> Searching -----+
//!                                               |
//!                                               v  line not found
//!                                            Stopped
//! ```
//!
//! `Stopped` is terminal and can also be reached from any other state when
//! the operator requests a stop.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::{
    eqpt::EqptError,
    line_ctrl::{CurveKind, LineCtrlError}
};
use util::{archive::ArchiveError, time::InvalidDuration};

pub use params::{Pacing, Params};
pub use state::CtrlLoop;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Flag and counter for a line loss episode.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct LineLostState {
    /// Set once the loss has persisted long enough to start a search
    pub lost: bool,

    /// Number of consecutive readings above the loss threshold
    pub count: u32,
}

/// Summary of a complete run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    /// Number of cycles executed
    pub cycles: u64,

    /// Time from the first to the last cycle
    ///
    /// Units: seconds
    pub elapsed_s: f64,

    /// Number of line searches performed
    pub searches: u32,

    /// Number of sharp curve override cycles
    pub overrides: u64,

    /// Number of cycles which took longer than the cycle period
    pub overruns: u64,

    /// PID integral at the end of the run
    pub final_integral: f64,

    /// Tracking error of the last reading
    pub final_error: f64,

    /// Why the run stopped, `None` if it has not stopped
    pub stop_cause: Option<StopCause>,
}

/// One row of the per-cycle archive.
#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    pub cycle: u64,
    pub time_s: f64,
    pub reflection: Option<f64>,
    pub error: Option<f64>,
    pub speed: Option<f64>,
    pub turn_rate: Option<f64>,
    pub integral: f64,
    pub lost_count: u32,
    pub state: String,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The states of the control loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum LoopState {
    /// Following the line with the control law
    Tracking,

    /// A fixed override command was issued for a sharp curve this cycle
    SharpCurveOverride(CurveKind),

    /// The line is lost, the next cycle sweeps for it
    Searching,

    /// Terminal, no further commands are issued
    Stopped(StopCause),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum StopCause {
    /// The operator requested a stop
    Operator,

    /// The search failed to find the line
    LineLost,
}

#[derive(Debug, thiserror::Error)]
pub enum CtrlLoopError {
    #[error("Cycle period must be positive and finite, got {0} s")]
    InvalidCyclePeriod(f64),

    #[error("Invalid line search settle time: {0}")]
    InvalidSettleTime(#[from] InvalidDuration),

    #[error("Equipment error: {0}")]
    Eqpt(#[from] EqptError),

    #[error("Line control error: {0}")]
    LineCtrl(#[from] LineCtrlError),

    #[error("Could not archive cycle data: {0}")]
    Archive(#[from] ArchiveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LineLostState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl LoopState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, LoopState::Stopped(_))
    }
}
