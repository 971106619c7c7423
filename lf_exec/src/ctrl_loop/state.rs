//! Control loop state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    thread,
    time::{Duration, Instant}
};

use log::{debug, info, warn};

use super::*;
use crate::{
    eqpt::{Hmi, Motors, ReflectanceSensor, Signal},
    line_ctrl::LineCtrl,
    line_search::LineSearcher,
};
use util::{
    archive::Archiver, 
    module::State, 
    time::{cycle_remainder, duration_from_secs}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct CtrlLoop {
    params: Params,

    /// Cycle period
    period: Duration,

    /// Executing state
    state: LoopState,

    /// Per-cycle line controller
    line_ctrl: LineCtrl,

    searcher: LineSearcher,

    lost: LineLostState,

    report: RunReport,

    /// Instant of the first cycle
    start: Option<Instant>,

    archiver: Option<Archiver>,
}

/// Data gathered during one cycle for the archive.
#[derive(Default)]
struct CycleData {
    reflection: Option<f64>,
    error: Option<f64>,
    cmd: Option<(f64, f64)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlLoop {
    /// Create a new loop in the `Tracking` state.
    pub fn new(
        params: Params, 
        line_ctrl: LineCtrl, 
        searcher: LineSearcher
    ) -> Result<Self, CtrlLoopError> {
        let period = match duration_from_secs(params.cycle_period_s) {
            Ok(p) if p > Duration::from_secs(0) => p,
            _ => return Err(
                CtrlLoopError::InvalidCyclePeriod(params.cycle_period_s)
            )
        };
        searcher.validate()?;

        Ok(Self {
            params,
            period,
            state: LoopState::Tracking,
            line_ctrl,
            searcher,
            lost: LineLostState::default(),
            report: RunReport::default(),
            start: None,
            archiver: None
        })
    }

    /// Record every cycle into the given archive.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Run the loop until it stops, holding the cycle period.
    ///
    /// On error the motors are left as they were; the caller is responsible
    /// for stopping them.
    pub fn run<H>(&mut self, hw: &mut H) -> Result<RunReport, CtrlLoopError>
    where
        H: ReflectanceSensor + Motors + Hmi
    {
        let period = self.period;

        info!("Beginning control loop, cycle period {:?}", period);
        hw.signal(Signal::Start);

        while !self.state.is_stopped() {
            let cycle_start_instant = Instant::now();
            let searching = self.state == LoopState::Searching;

            self.step(hw)?;

            // ---- CYCLE MANAGEMENT ----

            if self.state.is_stopped() {
                break
            }

            match self.params.pacing {
                Pacing::FixedPeriod => {
                    match cycle_remainder(period, cycle_start_instant.elapsed()) {
                        Ok(d) => thread::sleep(d),
                        // Search cycles block on the turns, only count
                        // overruns of the other cycles
                        Err(overrun) if !searching => {
                            warn!(
                                "Cycle overran by {:.06} s", 
                                overrun.as_secs_f64()
                            );
                            self.report.overruns += 1;
                        },
                        Err(_) => ()
                    }
                },
                Pacing::FixedDelay => thread::sleep(period)
            }
        }

        hw.signal(Signal::Finished);
        self.finish();

        Ok(self.report.clone())
    }

    /// Execute a single control cycle, returning the state the loop is in at
    /// the end of it.
    pub fn step<H>(&mut self, hw: &mut H) -> Result<LoopState, CtrlLoopError>
    where
        H: ReflectanceSensor + Motors + Hmi
    {
        if self.state.is_stopped() {
            return Ok(self.state)
        }

        if self.start.is_none() {
            self.start = Some(Instant::now());
        }
        self.report.cycles += 1;

        let mut data = CycleData::default();

        if hw.stop_requested()? {
            info!("Stop requested by the operator");
            hw.stop()?;
            self.set_state(LoopState::Stopped(StopCause::Operator));
        }
        else {
            match self.state {
                LoopState::Searching => self.mode_searching(hw)?,
                LoopState::Tracking 
                | LoopState::SharpCurveOverride(_) => {
                    self.mode_tracking(hw, &mut data)?
                },
                LoopState::Stopped(_) => ()
            }
        }

        self.archive(&data)?;

        Ok(self.state)
    }

    /// Line is lost, sweep for it.
    fn mode_searching<H>(&mut self, hw: &mut H) -> Result<(), CtrlLoopError>
    where
        H: ReflectanceSensor + Motors + Hmi
    {
        self.report.searches += 1;
        hw.signal(Signal::Searching);

        let found = self.searcher.search(
            hw, 
            self.line_ctrl.calib().target_value, 
            self.line_ctrl.last_side()
        )?;

        match found {
            Some(side) => {
                hw.signal(Signal::LineFound);
                self.line_ctrl.reset();
                self.line_ctrl.set_last_side(side);
                self.lost.clear();
                self.set_state(LoopState::Tracking);
            },
            None => {
                hw.signal(Signal::LineNotFound);
                hw.stop()?;
                self.set_state(LoopState::Stopped(StopCause::LineLost));
            }
        }

        Ok(())
    }

    /// Follow the line with the control law.
    fn mode_tracking<H>(
        &mut self, 
        hw: &mut H, 
        data: &mut CycleData
    ) -> Result<(), CtrlLoopError>
    where
        H: ReflectanceSensor + Motors + Hmi
    {
        let reflection = hw.read()?;
        data.reflection = Some(reflection);

        // Loss detection
        let loss_thresh = self.line_ctrl.calib().white_thresh 
            + self.params.loss_margin;
        if reflection > loss_thresh {
            self.lost.count += 1;
            debug!("Lost reading {} ({:.1})", self.lost.count, reflection);
        }
        else {
            self.lost.clear();
        }

        if self.lost.count > self.params.lost_cycles_limit {
            warn!(
                "Line lost for {} consecutive cycles, searching", 
                self.lost.count
            );
            self.lost.lost = true;
            hw.stop()?;
            self.set_state(LoopState::Searching);
            return Ok(())
        }

        // Control law
        let (cmd, status) = self.line_ctrl.proc(&reflection)?;
        hw.drive(cmd.speed, cmd.turn_rate)?;

        data.error = Some(status.error);
        data.cmd = Some((cmd.speed, cmd.turn_rate));
        self.report.final_error = status.error;

        match status.curve {
            Some(kind) => {
                self.report.overrides += 1;
                self.set_state(LoopState::SharpCurveOverride(kind));
            },
            None => self.set_state(LoopState::Tracking)
        }

        Ok(())
    }

    fn set_state(&mut self, state: LoopState) {
        if state == self.state {
            return
        }

        match state {
            LoopState::SharpCurveOverride(_) => debug!("{:?}", state),
            LoopState::Tracking if self.state != LoopState::Searching => {
                debug!("{:?}", state)
            },
            _ => info!("{:?} -> {:?}", self.state, state)
        }

        if let LoopState::Stopped(cause) = state {
            self.report.stop_cause = Some(cause);
        }

        self.state = state;
    }

    fn archive(&mut self, data: &CycleData) -> Result<(), CtrlLoopError> {
        let arch = match self.archiver.as_mut() {
            Some(a) => a,
            None => return Ok(())
        };

        let record = CycleRecord {
            cycle: self.report.cycles,
            time_s: self.start.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0),
            reflection: data.reflection,
            error: data.error,
            speed: data.cmd.map(|c| c.0),
            turn_rate: data.cmd.map(|c| c.1),
            integral: self.line_ctrl.pid_state().integral,
            lost_count: self.lost.count,
            state: format!("{:?}", self.state)
        };

        arch.serialise(&record)?;

        if self.state.is_stopped() {
            arch.flush()?;
        }

        Ok(())
    }

    /// Fill in the end of run fields of the report and log it.
    fn finish(&mut self) {
        self.report.elapsed_s = self.start
            .map(|s| s.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.report.final_integral = self.line_ctrl.pid_state().integral;

        info!("Run complete after {} cycles", self.report.cycles);
        info!("    Elapsed:        {:.2} s", self.report.elapsed_s);
        info!("    Searches:       {}", self.report.searches);
        info!("    Overrides:      {}", self.report.overrides);
        info!("    Overruns:       {}", self.report.overruns);
        info!("    Final integral: {:.2}", self.report.final_integral);
        info!("    Final error:    {:.2}", self.report.final_error);
        info!("    Stop cause:     {:?}", self.report.stop_cause);
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn lost_state(&self) -> &LineLostState {
        &self.lost
    }

    pub fn line_ctrl(&self) -> &LineCtrl {
        &self.line_ctrl
    }

    /// The report so far. End of run fields are only filled in by `run`.
    pub fn report(&self) -> &RunReport {
        &self.report
    }
}
