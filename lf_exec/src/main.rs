//! Main line follower executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Calibrate the sensor against the white surface and the black line
//!     - Wait for the operator to start the run
//!     - Main loop, each cycle:
//!         - Poll the operator stop request
//!         - Read the reflectance sensor
//!         - Line loss detection, sweeping for the line if it is lost
//!         - Sharp curve detection or the control law
//!         - Motor demand
//!     - Save the calibration and the run report into the session
//!
//! Passing `sensor-test` as the only argument runs the sensor test mode
//! instead of the main loop, which calibrates and then periodically reports
//! the surface under the sensor.
//!
//! The executable drives the simulated robot configured in `params/sim.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, error, info, warn};
use std::env;
use std::thread;

// Internal
use lf_lib::{
    calib::{self, CalibrationResult},
    ctrl_loop::CtrlLoop,
    eqpt::{Hmi, Motors, ReflectanceSensor, sim::{SimParams, SimRobot}},
    line_ctrl::LineCtrl,
    params::LfExecParams,
};
use util::{
    archive::Archiver,
    logger::logger_init,
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the executable has been asked to do.
#[derive(Debug, Copy, Clone)]
enum RunMode {
    LineFollow,
    SensorTest,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "lf_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // ---- PARSE ARGUMENTS ----

    let args: Vec<String> = env::args().collect();

    let mode = match args.len() {
        1 => RunMode::LineFollow,
        2 if args[1] == "sensor-test" => RunMode::SensorTest,
        2 => return Err(eyre!(
            "Unknown argument \"{}\", expected \"sensor-test\"", args[1]
        )),
        n => return Err(eyre!(
            "Expected either zero or one argument, found {}", n - 1
        ))
    };

    // ---- LOAD PARAMETERS ----

    let params: LfExecParams = util::params::load(
        "line_follower.toml"
    ).wrap_err("Could not load line follower params")?;

    let sim_params: SimParams = util::params::load(
        "sim.toml"
    ).wrap_err("Could not load simulation params")?;

    // Initialise logger
    logger_init(&params.log, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Line Follower Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}, mode {:?}", args, mode);

    info!("Exec parameters loaded");

    // ---- INITIALISE EQUIPMENT ----

    let mut robot = SimRobot::new(sim_params, params.ctrl_loop.cycle_period_s);
    info!("Simulated robot initialised");

    // ---- CALIBRATION ----

    let calib = calib::calibrate(&mut robot, &params.calib)
        .wrap_err("Calibration failed")?;

    if let Err(e) = session.save("calibration.json", &calib) {
        warn!("Could not save the calibration: {}", e);
    }

    // ---- EXECUTION ----

    let result = match mode {
        RunMode::LineFollow => line_follow(&mut robot, &params, calib, &session),
        RunMode::SensorTest => sensor_test(&mut robot, &params, &calib)
    };

    // Stop the motors whatever the outcome
    if let Err(e) = robot.stop() {
        error!("Could not stop the motors: {}", e);
    }

    result?;

    info!("End of execution");

    Ok(())
}

/// Run the line following loop until it stops.
fn line_follow<H>(
    hw: &mut H,
    params: &LfExecParams,
    calib: CalibrationResult,
    session: &Session
) -> Result<(), Report>
where
    H: ReflectanceSensor + Motors + Hmi
{
    info!("Initialising modules...");

    let line_ctrl = LineCtrl::init((params.line_ctrl.clone(), calib))
        .wrap_err("Failed to initialise LineCtrl")?;
    info!("LineCtrl init complete");

    let mut ctrl_loop = CtrlLoop::new(
        params.ctrl_loop.clone(), 
        line_ctrl, 
        params.line_search.clone()
    ).wrap_err("Failed to initialise the control loop")?;

    if params.ctrl_loop.archive {
        let arch = Archiver::from_path(session, "ctrl_loop.csv")
            .wrap_err("Failed to create the control loop archive")?;
        ctrl_loop = ctrl_loop.with_archiver(arch);
    }
    info!("Control loop init complete");

    info!("Module initialisation complete\n");

    // ---- WAIT FOR START ----

    info!("Place the robot on the line edge and confirm to start");
    calib::wait_for_confirm(hw, &params.calib)
        .wrap_err("Failed waiting for the start confirmation")?;

    // ---- MAIN LOOP ----

    let report = ctrl_loop.run(hw).wrap_err("Control loop failed")?;

    session.save("run_report.json", &report)
        .wrap_err("Could not save the run report")?;

    Ok(())
}

/// Periodically read and classify the surface under the sensor.
fn sensor_test<H>(
    hw: &mut H,
    params: &LfExecParams,
    calib: &CalibrationResult
) -> Result<(), Report>
where
    H: ReflectanceSensor + Hmi
{
    info!(
        "Sensor test: {} samples every {:.2} s", 
        params.sensor_test_samples,
        params.sensor_test_period_s
    );

    let period = params.sensor_test_period()
        .wrap_err("Invalid sensor test period")?;

    for i in 0..params.sensor_test_samples {
        if hw.stop_requested().wrap_err("Could not poll the stop request")? {
            info!("Sensor test stopped by the operator");
            break
        }

        let reflection = hw.read().wrap_err("Could not read the sensor")?;
        info!(
            "[{:03}] reflection {:5.1}: {:?}", 
            i, 
            reflection, 
            calib.classify_surface(reflection)
        );

        thread::sleep(period);
    }

    Ok(())
}
