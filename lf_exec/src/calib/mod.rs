//! # Calibration module
//!
//! Samples the reflectance of the white surface and of the black line under
//! operator guidance, and derives the thresholds used by the rest of the
//! controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;

use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::eqpt::{EqptError, Hmi, ReflectanceSensor, Signal};
use util::time::{duration_from_secs, InvalidDuration};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibParams {
    /// Number of consecutive readings averaged into each extreme.
    pub num_samples: usize,

    /// Period at which live readings are logged while waiting for the
    /// operator.
    ///
    /// Units: seconds
    pub poll_period_s: f64,

    /// Time waited after recording the white value.
    ///
    /// Units: seconds
    pub settle_s: f64,

    /// Margin inside each extreme used for the curve and loss thresholds.
    pub extreme_margin: f64,

    /// Offset added to the threshold to give the tracking target.
    pub target_offset: f64,
}

/// The output of a successful calibration.
///
/// Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Reflectance over the white surface
    pub white_value: f64,

    /// Reflectance over the black line
    pub black_value: f64,

    /// Midpoint between the extremes
    pub threshold: f64,

    /// Reflectance the controller tracks
    pub target_value: f64,

    /// Readings below this are considered fully black
    pub black_thresh: f64,

    /// Readings above this are considered fully white
    pub white_thresh: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Coarse surface classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    Black,
    Gray,
    White,
}

#[derive(Debug, thiserror::Error)]
pub enum CalibError {
    #[error(
        "White reading ({white}) is not lighter than black reading ({black}), \
        check the sensor placement"
    )]
    DegenerateRange { white: f64, black: f64 },

    #[error("Sensor reading {0} is outside the valid range [0, 100]")]
    ReadingOutOfRange(f64),

    #[error("Number of calibration samples must be at least 1")]
    NoSamples,

    #[error("Invalid calibration wait time: {0}")]
    InvalidDuration(#[from] InvalidDuration),

    #[error("Equipment error during calibration: {0}")]
    Eqpt(#[from] EqptError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for CalibParams {
    fn default() -> Self {
        Self {
            num_samples: 1,
            poll_period_s: 0.05,
            settle_s: 0.5,
            extreme_margin: 5.0,
            target_offset: 0.0,
        }
    }
}

impl CalibrationResult {
    /// Build the result from the two measured extremes.
    pub fn from_extremes(
        white_value: f64,
        black_value: f64,
        params: &CalibParams
    ) -> Result<Self, CalibError> {
        for v in [white_value, black_value].iter() {
            if !(0.0..=100.0).contains(v) {
                return Err(CalibError::ReadingOutOfRange(*v))
            }
        }

        if white_value <= black_value {
            return Err(CalibError::DegenerateRange {
                white: white_value,
                black: black_value
            })
        }

        let threshold = (white_value + black_value) / 2.0;

        Ok(Self {
            white_value,
            black_value,
            threshold,
            target_value: threshold + params.target_offset,
            black_thresh: black_value + params.extreme_margin,
            white_thresh: white_value - params.extreme_margin,
        })
    }

    /// Classify a reading against the calibrated thresholds.
    pub fn classify_surface(&self, reflection: f64) -> Surface {
        if reflection < self.black_thresh {
            Surface::Black
        }
        else if reflection > self.white_thresh {
            Surface::White
        }
        else {
            Surface::Gray
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Run the interactive calibration sequence.
///
/// The operator is asked to place the sensor over white, then over black,
/// confirming each placement through the HMI.
pub fn calibrate<H>(hw: &mut H, params: &CalibParams)
    -> Result<CalibrationResult, CalibError>
where
    H: ReflectanceSensor + Hmi
{
    if params.num_samples == 0 {
        return Err(CalibError::NoSamples)
    }
    let settle = duration_from_secs(params.settle_s)?;

    info!("Place the sensor over the white surface and confirm");
    hw.signal(Signal::CalibWhite);
    wait_for_confirm(hw, params)?;
    let white_value = sample(hw, params.num_samples)?;
    info!("White value: {:.1}", white_value);
    hw.signal(Signal::WhiteRecorded);

    thread::sleep(settle);

    info!("Place the sensor over the black line and confirm");
    hw.signal(Signal::CalibBlack);
    wait_for_confirm(hw, params)?;
    let black_value = sample(hw, params.num_samples)?;
    info!("Black value: {:.1}", black_value);
    hw.signal(Signal::BlackRecorded);

    let result = CalibrationResult::from_extremes(
        white_value, 
        black_value, 
        params
    )?;

    info!(
        "Calibration complete: threshold {:.1}, target {:.1}, black threshold \
        {:.1}, white threshold {:.1}",
        result.threshold,
        result.target_value,
        result.black_thresh,
        result.white_thresh
    );
    hw.signal(Signal::Ready);

    Ok(result)
}

/// Block until the operator confirms, logging live readings meanwhile.
pub fn wait_for_confirm<H>(hw: &mut H, params: &CalibParams)
    -> Result<(), CalibError>
where
    H: ReflectanceSensor + Hmi
{
    let poll_period = duration_from_secs(params.poll_period_s)?;

    while !hw.confirm_pressed()? {
        trace!("Live reflection: {:.1}", hw.read()?);
        thread::sleep(poll_period);
    }

    Ok(())
}

/// Average `num_samples` consecutive readings, rejecting invalid ones.
fn sample<S: ReflectanceSensor>(sensor: &mut S, num_samples: usize)
    -> Result<f64, CalibError>
{
    let mut sum = 0.0;

    for _ in 0..num_samples {
        let r = sensor.read()?;
        if !(0.0..=100.0).contains(&r) {
            return Err(CalibError::ReadingOutOfRange(r))
        }
        sum += r;
    }

    Ok(sum / num_samples as f64)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;

    /// Sensor which replays readings and confirms every request.
    struct Bench {
        readings: VecDeque<f64>,
        signals: Vec<Signal>,
    }

    impl ReflectanceSensor for Bench {
        fn read(&mut self) -> Result<f64, EqptError> {
            self.readings
                .pop_front()
                .ok_or_else(|| EqptError::SensorUnavailable("empty".into()))
        }
    }

    impl Hmi for Bench {
        fn signal(&mut self, signal: Signal) {
            self.signals.push(signal);
        }

        fn confirm_pressed(&mut self) -> Result<bool, EqptError> {
            Ok(true)
        }

        fn stop_requested(&mut self) -> Result<bool, EqptError> {
            Ok(false)
        }
    }

    fn quick_params() -> CalibParams {
        CalibParams {
            poll_period_s: 0.0,
            settle_s: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_calibrate() {
        let mut bench = Bench {
            readings: vec![85.0, 15.0].into(),
            signals: vec![]
        };

        let res = calibrate(&mut bench, &quick_params()).unwrap();

        assert_eq!(res.white_value, 85.0);
        assert_eq!(res.black_value, 15.0);
        assert_eq!(res.threshold, 50.0);
        assert_eq!(res.target_value, 50.0);
        assert_eq!(res.black_thresh, 20.0);
        assert_eq!(res.white_thresh, 80.0);

        assert_eq!(
            bench.signals,
            vec![
                Signal::CalibWhite,
                Signal::WhiteRecorded,
                Signal::CalibBlack,
                Signal::BlackRecorded,
                Signal::Ready
            ]
        );
    }

    #[test]
    fn test_calibrate_averaging() {
        let mut bench = Bench {
            readings: vec![80.0, 90.0, 10.0, 20.0].into(),
            signals: vec![]
        };
        let params = CalibParams {
            num_samples: 2,
            target_offset: 2.0,
            ..quick_params()
        };

        let res = calibrate(&mut bench, &params).unwrap();

        assert_eq!(res.white_value, 85.0);
        assert_eq!(res.black_value, 15.0);
        assert_eq!(res.target_value, 52.0);
    }

    #[test]
    fn test_calibrate_degenerate() {
        let mut bench = Bench {
            readings: vec![40.0, 40.0].into(),
            signals: vec![]
        };

        match calibrate(&mut bench, &quick_params()) {
            Err(CalibError::DegenerateRange { .. }) => (),
            r => panic!("Expected DegenerateRange, got {:?}", r)
        }

        // No ready signal on failure
        assert!(!bench.signals.contains(&Signal::Ready));
    }

    #[test]
    fn test_calibrate_errors() {
        let mut bench = Bench {
            readings: vec![120.0].into(),
            signals: vec![]
        };
        assert!(matches!(
            calibrate(&mut bench, &quick_params()),
            Err(CalibError::ReadingOutOfRange(_))
        ));

        let mut bench = Bench {
            readings: VecDeque::new(),
            signals: vec![]
        };
        assert!(matches!(
            calibrate(&mut bench, &quick_params()),
            Err(CalibError::Eqpt(EqptError::SensorUnavailable(_)))
        ));
    }

    #[test]
    fn test_calibrate_invalid_wait() {
        let mut bench = Bench {
            readings: vec![85.0, 15.0].into(),
            signals: vec![]
        };

        // Rejected before the operator is asked for anything
        let params = CalibParams {
            settle_s: f64::INFINITY,
            ..quick_params()
        };
        assert!(matches!(
            calibrate(&mut bench, &params),
            Err(CalibError::InvalidDuration(_))
        ));
        assert!(bench.signals.is_empty());

        let params = CalibParams {
            poll_period_s: -1.0,
            ..quick_params()
        };
        assert!(matches!(
            wait_for_confirm(&mut bench, &params),
            Err(CalibError::InvalidDuration(InvalidDuration(p))) if p == -1.0
        ));
    }

    #[test]
    fn test_classify_surface() {
        let res = CalibrationResult::from_extremes(
            85.0, 15.0, &CalibParams::default()
        ).unwrap();

        assert_eq!(res.classify_surface(10.0), Surface::Black);
        assert_eq!(res.classify_surface(50.0), Surface::Gray);
        assert_eq!(res.classify_surface(83.0), Surface::White);
    }
}
