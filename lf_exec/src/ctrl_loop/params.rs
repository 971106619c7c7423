//! Control loop parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control loop
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Params {
    /// Target period of one cycle
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// How the cycle period is held
    pub pacing: Pacing,

    /// Readings this far above the white threshold count towards a loss
    pub loss_margin: f64,

    /// Number of consecutive lost readings tolerated before searching
    pub lost_cycles_limit: u32,

    /// Archive every cycle to the session
    pub archive: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Sleep for whatever is left of the period after processing
    FixedPeriod,

    /// Sleep for the whole period after processing
    FixedDelay,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.005,
            pacing: Pacing::FixedPeriod,
            loss_margin: 5.0,
            lost_cycles_limit: 5,
            archive: true
        }
    }
}
