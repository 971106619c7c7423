//! # Line search
//!
//! When the line is lost the robot rotates in place through a widening sweep,
//! alternating sides, sampling the sensor after each turn. Each angle is
//! relative to the heading reached by the previous turn, so the reference
//! sweep `[30, -60, 90, -120, 150]` visits headings of +30, -30, +60, -60
//! and +90 degrees from where the line was lost.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{thread, time::Duration};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    eqpt::{EqptError, Motors, ReflectanceSensor},
    line_ctrl::LineSide
};
use util::time::{duration_from_secs, InvalidDuration};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSearcher {
    /// Relative turn angles of the sweep, in order
    ///
    /// Units: degrees, positive right
    pub sweep_angles_deg: Vec<f64>,

    /// Wait after an unsuccessful sample before the next turn
    ///
    /// Units: seconds
    pub settle_s: f64,

    /// Pick the direction of the first turn from the last line side. The
    /// sweep opens with a right turn after `Left` and with a left turn
    /// otherwise, mirroring the configured angles when needed.
    pub prefer_last_side: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LineSearcher {
    fn default() -> Self {
        Self {
            sweep_angles_deg: vec![30.0, -60.0, 90.0, -120.0, 150.0],
            settle_s: 0.05,
            prefer_last_side: false
        }
    }
}

impl LineSearcher {
    /// Sweep for the line.
    ///
    /// Returns the new line side as soon as a sample is darker than
    /// `target_value`, or `None` if the sweep is exhausted without finding
    /// the line. The side is `Left` when the successful turn went right and
    /// `Right` otherwise. The robot is left at the heading where the search
    /// ended.
    pub fn search<H>(
        &self,
        hw: &mut H,
        target_value: f64,
        last_side: LineSide
    ) -> Result<Option<LineSide>, EqptError>
    where
        H: ReflectanceSensor + Motors
    {
        let sign = self.sweep_sign(last_side);
        let settle = duration_from_secs(self.settle_s)
            .unwrap_or(Duration::ZERO);

        info!("Searching for line, last seen {:?}", last_side);

        for (i, angle) in self.sweep_angles_deg.iter().enumerate() {
            let angle = sign * angle;
            hw.turn(angle)?;

            let reflection = hw.read()?;
            debug!(
                "Sweep {}/{}: turned {:.0} deg, reflection {:.1}", 
                i + 1, self.sweep_angles_deg.len(), angle, reflection
            );

            if reflection < target_value {
                let side = if angle > 0.0 {
                    LineSide::Left
                }
                else {
                    LineSide::Right
                };
                info!("Line found after {} turns, now {:?}", i + 1, side);
                return Ok(Some(side))
            }

            thread::sleep(settle);
        }

        warn!("Line not found after the full sweep");
        Ok(None)
    }

    /// Check that the settle time can be slept on.
    pub fn validate(&self) -> Result<(), InvalidDuration> {
        duration_from_secs(self.settle_s).map(|_| ())
    }

    /// Sign applied to every angle of the sweep.
    fn sweep_sign(&self, last_side: LineSide) -> f64 {
        if !self.prefer_last_side {
            return 1.0
        }

        let first_right = self.sweep_angles_deg
            .first()
            .map(|a| *a > 0.0)
            .unwrap_or(true);

        if first_right == (last_side == LineSide::Left) {
            1.0
        }
        else {
            -1.0
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Rig returning a fixed reading for each turn.
    struct Rig {
        readings: Vec<f64>,
        turns: Vec<f64>,
    }

    impl ReflectanceSensor for Rig {
        fn read(&mut self) -> Result<f64, EqptError> {
            Ok(self.readings[self.turns.len() - 1])
        }
    }

    impl Motors for Rig {
        fn drive(&mut self, _: f64, _: f64) -> Result<(), EqptError> {
            Ok(())
        }

        fn turn(&mut self, angle_deg: f64) -> Result<(), EqptError> {
            self.turns.push(angle_deg);
            Ok(())
        }

        fn stop(&mut self) -> Result<(), EqptError> {
            Ok(())
        }
    }

    fn searcher() -> LineSearcher {
        LineSearcher {
            settle_s: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_found_on_third_turn() {
        let mut rig = Rig {
            readings: vec![90.0, 88.0, 40.0, 90.0, 90.0],
            turns: vec![]
        };

        // Found on a right turn, so the line is now on the left
        assert_eq!(
            searcher().search(&mut rig, 50.0, LineSide::Unknown).unwrap(),
            Some(LineSide::Left)
        );
        assert_eq!(rig.turns, vec![30.0, -60.0, 90.0]);
    }

    #[test]
    fn test_found_on_left_turn() {
        let mut rig = Rig {
            readings: vec![90.0, 20.0],
            turns: vec![]
        };

        assert_eq!(
            searcher().search(&mut rig, 50.0, LineSide::Unknown).unwrap(),
            Some(LineSide::Right)
        );
    }

    #[test]
    fn test_not_found() {
        let mut rig = Rig {
            readings: vec![90.0; 5],
            turns: vec![]
        };

        // Equal to the target is not dark enough
        rig.readings[4] = 50.0;

        assert_eq!(
            searcher().search(&mut rig, 50.0, LineSide::Unknown).unwrap(), 
            None
        );
        assert_eq!(rig.turns, vec![30.0, -60.0, 90.0, -120.0, 150.0]);
    }

    #[test]
    fn test_prefer_last_side() {
        let s = LineSearcher {
            prefer_last_side: true,
            ..searcher()
        };

        let first_turns = |side: LineSide| {
            let mut rig = Rig {
                readings: vec![90.0, 10.0],
                turns: vec![]
            };
            let found = s.search(&mut rig, 50.0, side).unwrap();
            (rig.turns, found)
        };

        // Left opens with a right turn, everything else with a left turn
        assert_eq!(
            first_turns(LineSide::Left), 
            (vec![30.0, -60.0], Some(LineSide::Right))
        );
        for side in [LineSide::Right, LineSide::Centre, LineSide::Unknown].iter() {
            assert_eq!(
                first_turns(*side), 
                (vec![-30.0, 60.0], Some(LineSide::Left))
            );
        }

        // A sweep configured to open to the left is mirrored the same way
        let s = LineSearcher {
            sweep_angles_deg: vec![-45.0, 90.0],
            ..s
        };
        let mut rig = Rig {
            readings: vec![10.0],
            turns: vec![]
        };
        s.search(&mut rig, 50.0, LineSide::Left).unwrap();
        assert_eq!(rig.turns, vec![45.0]);

        // Without the option the side is ignored
        let mut rig = Rig {
            readings: vec![10.0],
            turns: vec![]
        };
        searcher().search(&mut rig, 50.0, LineSide::Left).unwrap();
        assert_eq!(rig.turns, vec![30.0]);
    }

    #[test]
    fn test_validate() {
        assert!(searcher().validate().is_ok());

        let s = LineSearcher {
            settle_s: f64::INFINITY,
            ..searcher()
        };
        assert_eq!(s.validate(), Err(InvalidDuration(f64::INFINITY)));
    }
}
