//! # Simulated robot
//!
//! A kinematic differential drive robot on a flat white surface with a
//! circular black line drawn on it. The reflectance sensor sits ahead of the
//! axle, and the reflectance it sees ramps linearly from black at the edge
//! of the line to white over `edge_blur_mm`, approximating the finite spot
//! size of a real sensor. The line can be interrupted over an arc by a patch
//! lighter than the surface, such as a strip of glossy tape, which reads
//! above the calibrated white and so makes the controller lose the line.
//!
//! Simulated time only advances when the robot moves, by one cycle period
//! per `drive` call and by the time needed to rotate during a `turn`, so
//! runs are deterministic regardless of host load.
//!
//! The operator interface is automated: calibration signals teleport the
//! robot so the sensor is over white, over black and finally on the outer
//! edge of the line facing clockwise, every confirmation is given
//! immediately, and a stop is requested once `max_run_s` of simulated time
//! has passed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{EqptError, Hmi, Motors, ReflectanceSensor, Signal};
use util::maths::{rem_euclid, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated world, loaded from `params/sim.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Radius of the centre of the line
    ///
    /// Units: millimeters
    pub line_radius_mm: f64,

    /// Width of the line
    ///
    /// Units: millimeters
    pub line_width_mm: f64,

    /// Distance over which the reflectance ramps from black to white
    ///
    /// Units: millimeters
    pub edge_blur_mm: f64,

    /// Reflectance of the surface
    pub white_value: f64,

    /// Reflectance of the line
    pub black_value: f64,

    /// Distance of the sensor ahead of the axle
    ///
    /// Units: millimeters
    pub sensor_offset_mm: f64,

    /// Rotation rate used for in-place turns
    ///
    /// Units: degrees/second
    pub turn_rate_deg_s: f64,

    /// Simulated time after which the operator requests a stop
    ///
    /// Units: seconds
    pub max_run_s: f64,

    /// Angle at which the line is interrupted, clockwise from the X axis
    ///
    /// Units: degrees
    pub gap_start_deg: f64,

    /// Length of the interruption, zero for an unbroken line
    ///
    /// Units: degrees
    pub gap_length_deg: f64,

    /// Reflectance of the patch interrupting the line
    pub gap_value: f64,
}

/// Robot pose in the world frame, whose origin is the centre of the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimPose {
    /// Position of the axle centre
    ///
    /// Units: millimeters
    pub position_mm: Vector2<f64>,

    /// Heading, counter-clockwise from the X axis
    ///
    /// Units: radians
    pub heading_rad: f64,
}

pub struct SimRobot {
    params: SimParams,

    pose: SimPose,

    /// Integration step of `drive`
    ///
    /// Units: seconds
    step_s: f64,

    /// Simulated time
    ///
    /// Units: seconds
    time_s: f64,

    /// Last command passed to `drive`, `(speed, turn_rate)`
    last_cmd: (f64, f64),

    /// Distance travelled by the axle
    ///
    /// Units: millimeters
    odometer_mm: f64,

    signals: Vec<Signal>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            line_radius_mm: 500.0,
            line_width_mm: 20.0,
            edge_blur_mm: 6.0,
            white_value: 85.0,
            black_value: 10.0,
            sensor_offset_mm: 40.0,
            turn_rate_deg_s: 180.0,
            max_run_s: 30.0,
            gap_start_deg: 90.0,
            gap_length_deg: 0.0,
            gap_value: 95.0
        }
    }
}

impl SimPose {
    /// Unit vector pointing forwards.
    pub fn forward(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }
}

impl SimRobot {
    /// Create a new robot at the start pose, which has the sensor on the
    /// outer edge of the line, facing clockwise.
    pub fn new(params: SimParams, step_s: f64) -> Self {
        let mut sim = Self {
            params,
            pose: SimPose {
                position_mm: Vector2::zeros(),
                heading_rad: 0.0
            },
            step_s,
            time_s: 0.0,
            last_cmd: (0.0, 0.0),
            odometer_mm: 0.0,
            signals: vec![]
        };
        sim.place_sensor(sim.start_radius());
        sim
    }

    /// Radius of the point on the outer edge which reads halfway between
    /// black and white.
    fn start_radius(&self) -> f64 {
        self.params.line_radius_mm 
            + self.params.line_width_mm / 2.0 
            + self.params.edge_blur_mm / 2.0
    }

    /// Teleport the robot so that the sensor is at `radius` on the positive
    /// X axis and the robot faces clockwise.
    fn place_sensor(&mut self, radius: f64) {
        let heading_rad = -std::f64::consts::FRAC_PI_2;
        let sensor = Vector2::new(radius, 0.0);
        let forward = Vector2::new(heading_rad.cos(), heading_rad.sin());

        self.pose = SimPose {
            position_mm: sensor - forward * self.params.sensor_offset_mm,
            heading_rad
        };
    }

    /// Position of the sensor in the world frame.
    pub fn sensor_position(&self) -> Vector2<f64> {
        self.pose.position_mm + self.pose.forward() * self.params.sensor_offset_mm
    }

    /// Distance from the sensor to the nearest edge of the line, zero when
    /// the sensor is over the line.
    pub fn distance_to_line(&self) -> f64 {
        let radius = self.sensor_position().norm();
        ((radius - self.params.line_radius_mm).abs() 
            - self.params.line_width_mm / 2.0).max(0.0)
    }

    /// Whether the sensor is over the patch interrupting the line.
    pub fn in_gap(&self) -> bool {
        let p = &self.params;
        if p.gap_length_deg <= 0.0 {
            return false
        }

        let sensor = self.sensor_position();
        let angle_deg = rem_euclid(
            -sensor[1].atan2(sensor[0]).to_degrees(), 
            360.0
        );

        rem_euclid(angle_deg - p.gap_start_deg, 360.0) < p.gap_length_deg
    }

    /// The reflectance at the sensor's current position.
    pub fn reflectance(&self) -> f64 {
        let p = &self.params;
        if self.in_gap() {
            return p.gap_value
        }

        let frac = if p.edge_blur_mm > 0.0 {
            (self.distance_to_line() / p.edge_blur_mm).min(1.0)
        }
        else if self.distance_to_line() > 0.0 {
            1.0
        }
        else {
            0.0
        };

        p.black_value + (p.white_value - p.black_value) * frac
    }

    pub fn pose(&self) -> &SimPose {
        &self.pose
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn odometer_mm(&self) -> f64 {
        self.odometer_mm
    }

    pub fn last_cmd(&self) -> (f64, f64) {
        self.last_cmd
    }

    /// All signals given so far.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }
}

impl ReflectanceSensor for SimRobot {
    fn read(&mut self) -> Result<f64, EqptError> {
        Ok(self.reflectance())
    }
}

impl Motors for SimRobot {
    fn drive(&mut self, speed: f64, turn_rate: f64) -> Result<(), EqptError> {
        if !(speed.is_finite() && turn_rate.is_finite()) {
            return Err(EqptError::MotorFault(format!(
                "Non-finite demand ({}, {})", speed, turn_rate
            )))
        }

        self.last_cmd = (speed, turn_rate);

        // Integrate along the arc using the midpoint heading. Positive turn
        // rates turn clockwise.
        let dt = self.step_s;
        let dh = -turn_rate.to_radians() * dt;
        let mid = self.pose.heading_rad + dh / 2.0;

        self.pose.position_mm += Vector2::new(mid.cos(), mid.sin()) * speed * dt;
        self.pose.heading_rad = wrap_pi(self.pose.heading_rad + dh);
        self.odometer_mm += speed.abs() * dt;
        self.time_s += dt;

        trace!(
            "Sim pose: ({:.1}, {:.1}) {:.1} deg", 
            self.pose.position_mm[0], 
            self.pose.position_mm[1], 
            self.pose.heading_rad.to_degrees()
        );

        Ok(())
    }

    fn turn(&mut self, angle_deg: f64) -> Result<(), EqptError> {
        if !angle_deg.is_finite() {
            return Err(EqptError::MotorFault(
                format!("Non-finite turn angle {}", angle_deg)
            ))
        }

        self.last_cmd = (0.0, 0.0);
        self.pose.heading_rad = wrap_pi(
            self.pose.heading_rad - angle_deg.to_radians()
        );

        if self.params.turn_rate_deg_s > 0.0 {
            self.time_s += angle_deg.abs() / self.params.turn_rate_deg_s;
        }

        Ok(())
    }

    fn stop(&mut self) -> Result<(), EqptError> {
        self.last_cmd = (0.0, 0.0);
        Ok(())
    }
}

impl Hmi for SimRobot {
    fn signal(&mut self, signal: Signal) {
        match signal {
            Signal::CalibWhite => {
                let r = self.params.line_radius_mm 
                    + self.params.line_width_mm 
                    + 10.0 * self.params.edge_blur_mm.max(1.0);
                self.place_sensor(r);
            },
            Signal::CalibBlack => self.place_sensor(self.params.line_radius_mm),
            Signal::Ready => {
                let r = self.start_radius();
                self.place_sensor(r);
                self.time_s = 0.0;
                self.odometer_mm = 0.0;
            },
            _ => ()
        }

        self.signals.push(signal);
    }

    fn confirm_pressed(&mut self) -> Result<bool, EqptError> {
        Ok(true)
    }

    fn stop_requested(&mut self) -> Result<bool, EqptError> {
        Ok(self.time_s >= self.params.max_run_s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_start_pose_reads_midpoint() {
        let sim = SimRobot::new(SimParams::default(), 0.005);

        assert!((sim.sensor_position()[0] - 513.0).abs() < 1e-9);
        assert!((sim.reflectance() - 47.5).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_placement() {
        let mut sim = SimRobot::new(SimParams::default(), 0.005);

        sim.signal(Signal::CalibWhite);
        assert_eq!(sim.read().unwrap(), 85.0);

        sim.signal(Signal::CalibBlack);
        assert_eq!(sim.read().unwrap(), 10.0);
    }

    #[test]
    fn test_gap() {
        let params = SimParams {
            gap_start_deg: 90.0,
            gap_length_deg: 10.0,
            ..Default::default()
        };
        let mut sim = SimRobot::new(params, 0.005);
        assert!(!sim.in_gap());

        // A quarter turn clockwise about the centre of the line puts the
        // sensor at the start of the gap, on the negative Y axis
        sim.pose = SimPose {
            position_mm: Vector2::new(-40.0, -510.0),
            heading_rad: 0.0
        };
        assert!((sim.sensor_position() - Vector2::new(0.0, -510.0)).norm() < 1e-9);
        assert!(sim.in_gap());
        assert_eq!(sim.read().unwrap(), 95.0);

        // Just before the gap the line is still there
        sim.pose.position_mm[0] = -35.0;
        assert!(!sim.in_gap());
        assert!(sim.read().unwrap() < 85.0);
    }

    #[test]
    fn test_drive_and_turn() {
        let mut sim = SimRobot::new(SimParams::default(), 0.1);
        let start = *sim.pose();

        // Straight ahead (down the Y axis) for one step
        sim.drive(100.0, 0.0).unwrap();
        let moved = sim.pose().position_mm - start.position_mm;
        assert!((moved[1] + 10.0).abs() < 1e-9);
        assert!(moved[0].abs() < 1e-9);

        // A right turn while facing -Y heads towards -X
        sim.turn(90.0).unwrap();
        assert!((sim.pose().forward()[0] + 1.0).abs() < 1e-9);
        assert!((sim.time_s() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_stop_request() {
        let params = SimParams {
            max_run_s: 0.02,
            ..Default::default()
        };
        let mut sim = SimRobot::new(params, 0.01);

        assert!(!sim.stop_requested().unwrap());
        sim.drive(50.0, 0.0).unwrap();
        sim.drive(50.0, 0.0).unwrap();
        assert!(sim.stop_requested().unwrap());
    }
}
