//! Shared test equipment

use std::{collections::VecDeque, thread, time::Duration};

use lf_lib::{
    calib::{CalibParams, CalibrationResult},
    ctrl_loop::{self, CtrlLoop},
    eqpt::{EqptError, Hmi, Motors, ReflectanceSensor, Signal},
    line_ctrl::{self, LineCtrl},
    line_search::LineSearcher,
};
use util::module::State;

/// Something the rig was asked to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Drive(f64, f64),
    Turn(f64),
    Stop,
    Signal(Signal),
}

/// Replays a fixed sequence of readings and records every command.
pub struct ScriptedRig {
    readings: VecDeque<f64>,
    pub events: Vec<Event>,
    pub reads: usize,

    /// Raise the stop request on this poll, counting from 1
    stop_on_poll: Option<usize>,
    polls: usize,

    /// Time taken by every read
    read_delay: Option<Duration>,

    /// Time taken by every in place turn
    turn_delay: Option<Duration>,
}

#[allow(dead_code)]
impl ScriptedRig {
    pub fn new(readings: &[f64]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
            events: vec![],
            reads: 0,
            stop_on_poll: None,
            polls: 0,
            read_delay: None,
            turn_delay: None
        }
    }

    pub fn with_stop_on_poll(mut self, poll: usize) -> Self {
        self.stop_on_poll = Some(poll);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn with_turn_delay(mut self, delay: Duration) -> Self {
        self.turn_delay = Some(delay);
        self
    }

    pub fn push_readings(&mut self, readings: &[f64]) {
        self.readings.extend(readings.iter().copied());
    }

    pub fn remaining(&self) -> usize {
        self.readings.len()
    }

    pub fn turns(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Turn(a) => Some(*a),
                _ => None
            })
            .collect()
    }

    pub fn drives(&self) -> Vec<(f64, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Drive(s, t) => Some((*s, *t)),
                _ => None
            })
            .collect()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Signal(s) => Some(*s),
                _ => None
            })
            .collect()
    }

    pub fn last_event(&self) -> Option<Event> {
        self.events.last().copied()
    }
}

impl ReflectanceSensor for ScriptedRig {
    fn read(&mut self) -> Result<f64, EqptError> {
        self.reads += 1;
        if let Some(d) = self.read_delay {
            thread::sleep(d);
        }
        self.readings
            .pop_front()
            .ok_or_else(|| EqptError::SensorUnavailable("script exhausted".into()))
    }
}

impl Motors for ScriptedRig {
    fn drive(&mut self, speed: f64, turn_rate: f64) -> Result<(), EqptError> {
        self.events.push(Event::Drive(speed, turn_rate));
        Ok(())
    }

    fn turn(&mut self, angle_deg: f64) -> Result<(), EqptError> {
        self.events.push(Event::Turn(angle_deg));
        if let Some(d) = self.turn_delay {
            thread::sleep(d);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EqptError> {
        self.events.push(Event::Stop);
        Ok(())
    }
}

impl Hmi for ScriptedRig {
    fn signal(&mut self, signal: Signal) {
        self.events.push(Event::Signal(signal));
    }

    fn confirm_pressed(&mut self) -> Result<bool, EqptError> {
        Ok(true)
    }

    fn stop_requested(&mut self) -> Result<bool, EqptError> {
        self.polls += 1;
        Ok(self.stop_on_poll == Some(self.polls))
    }
}

/// Calibration giving thresholds of 20 and 80 around a target of 50.
pub fn calib() -> CalibrationResult {
    CalibrationResult::from_extremes(85.0, 15.0, &CalibParams::default())
        .unwrap()
}

/// Calibration parameters with no waiting.
#[allow(dead_code)]
pub fn quick_calib_params() -> CalibParams {
    CalibParams {
        poll_period_s: 0.0,
        settle_s: 0.0,
        ..Default::default()
    }
}

/// Search parameters with no settle time.
pub fn quick_searcher() -> LineSearcher {
    LineSearcher {
        settle_s: 0.0,
        ..Default::default()
    }
}

/// Loop parameters with the given cycle period and no archive.
pub fn loop_params(cycle_period_s: f64) -> ctrl_loop::Params {
    ctrl_loop::Params {
        cycle_period_s,
        archive: false,
        ..Default::default()
    }
}

/// A loop with the reference parameters, a fast cycle and no search delay.
pub fn make_loop(line_ctrl_params: line_ctrl::Params) -> CtrlLoop {
    make_loop_with(line_ctrl_params, quick_searcher(), loop_params(0.001))
}

#[allow(dead_code)]
pub fn make_loop_with(
    line_ctrl_params: line_ctrl::Params,
    searcher: LineSearcher,
    params: ctrl_loop::Params
) -> CtrlLoop {
    let line_ctrl = LineCtrl::init((line_ctrl_params, calib())).unwrap();

    CtrlLoop::new(params, line_ctrl, searcher).unwrap()
}
