//! # PID controller
//!
//! The control law is provided in two forms:
//! - [`update`], a pure function taking the controller state in and handing
//!   the new state back, which is the law in its basic unbounded form,
//! - [`PidController`], which owns the state and adds the integral clamp,
//!   the output clamp and oscillation damping on top of the same law.
//!
//! The law is discrete and assumes a uniform cycle period, so neither the
//! integral nor the derivative is scaled by time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use util::maths::{clamp_sym, count_sign_changes};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// PID gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlGains {
    /// Proportional gain
    pub kp: f64,

    /// Integral gain
    pub ki: f64,

    /// Derivative gain
    pub kd: f64,
}

/// The state carried between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    /// Sum of all errors since the last reset
    pub integral: f64,

    /// Error passed in on the previous cycle
    pub last_error: f64,
}

/// Oscillation damping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillationParams {
    /// Number of past errors inspected.
    pub history_size: usize,

    /// Fraction of the history which must change sign before the integral
    /// is halved.
    pub oscillation_ratio: f64,
}

/// A PID controller owning its state.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: ControlGains,

    state: PidState,

    /// Symmetric limit on the integral
    integral_limit: Option<f64>,

    /// Symmetric limit on the output
    max_turn_rate: Option<f64>,

    /// Oscillation damping settings and recent error history
    oscillation: Option<(OscillationParams, VecDeque<f64>)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ControlGains {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 0.02,
            kd: 0.8
        }
    }
}

impl ControlGains {
    /// Combine the three terms into a single output.
    pub fn output(&self, error: f64, integral: f64, derivative: f64) -> f64 {
        self.kp * error + self.ki * integral + self.kd * derivative
    }
}

impl Default for OscillationParams {
    fn default() -> Self {
        Self {
            history_size: 10,
            oscillation_ratio: 0.6
        }
    }
}

impl PidController {
    /// Create a new controller with the given gains and no limits.
    pub fn new(gains: ControlGains) -> Self {
        Self {
            gains,
            state: PidState::default(),
            integral_limit: None,
            max_turn_rate: None,
            oscillation: None
        }
    }

    /// Limit the magnitude of the integral.
    pub fn with_integral_limit(mut self, limit: Option<f64>) -> Self {
        self.integral_limit = limit;
        self
    }

    /// Limit the magnitude of the output.
    pub fn with_max_turn_rate(mut self, limit: Option<f64>) -> Self {
        self.max_turn_rate = limit;
        self
    }

    /// Halve the integral whenever the recent errors oscillate.
    pub fn with_oscillation_damping(
        mut self, 
        params: Option<OscillationParams>
    ) -> Self {
        self.oscillation = params.map(|p| {
            let history = VecDeque::with_capacity(p.history_size);
            (p, history)
        });
        self
    }

    /// Get the turn rate demand for the given error.
    pub fn update(&mut self, error: f64) -> f64 {
        let mut integral = clamp_sym(
            self.state.integral + error, 
            self.integral_limit
        );

        if let Some((params, history)) = self.oscillation.as_mut() {
            history.push_back(error);
            while history.len() > params.history_size {
                history.pop_front();
            }

            let limit = params.oscillation_ratio * params.history_size as f64;
            if history.len() == params.history_size 
                && count_sign_changes(history.iter().copied()) as f64 > limit
            {
                debug!("Oscillation detected, halving integral");
                integral *= 0.5;
            }
        }

        let derivative = error - self.state.last_error;
        let out = self.gains.output(error, integral, derivative);

        self.state = PidState {
            integral,
            last_error: error
        };

        clamp_sym(out, self.max_turn_rate)
    }

    /// Clear the integral and the previous error.
    pub fn reset(&mut self) {
        self.state = PidState::default();
        if let Some((_, history)) = self.oscillation.as_mut() {
            history.clear();
        }
    }

    /// Clear only the integral.
    pub fn reset_integral(&mut self) {
        self.state.integral = 0.0;
    }

    pub fn state(&self) -> &PidState {
        &self.state
    }

    pub fn gains(&self) -> &ControlGains {
        &self.gains
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// The PID law in its basic form.
///
/// Returns the turn rate demand and the state to pass in on the next cycle.
pub fn update(error: f64, gains: &ControlGains, state: PidState) 
    -> (f64, PidState) 
{
    let integral = state.integral + error;
    let derivative = error - state.last_error;

    (
        gains.output(error, integral, derivative),
        PidState {
            integral,
            last_error: error
        }
    )
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
