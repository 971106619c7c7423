//! Tracking error calculation

/// Signed tracking error of a reflectance reading.
///
/// Positive when the surface is lighter than the target, meaning the sensor
/// has drifted off the line onto the white side, which the controller
/// corrects with a positive (rightward) turn rate.
pub fn compute_error(reflection: f64, target: f64) -> f64 {
    reflection - target
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compute_error() {
        assert_eq!(compute_error(50.0, 50.0), 0.0);
        assert_eq!(compute_error(60.0, 50.0), 10.0);
        assert_eq!(compute_error(35.5, 50.0), -14.5);
    }
}
