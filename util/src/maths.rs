//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the symmetric range `[-limit, limit]`.
///
/// If `limit` is `None` the value is returned unchanged.
pub fn clamp_sym<T>(value: T, limit: Option<T>) -> T
where
    T: Float
{
    match limit {
        Some(l) => value.max(-l.abs()).min(l.abs()),
        None => value
    }
}

/// Count the number of sign changes between consecutive values.
///
/// Zero is treated as having no sign, so passing through zero is not counted.
pub fn count_sign_changes<T>(values: impl IntoIterator<Item = T>) -> usize
where
    T: Float
{
    let zero = T::zero();
    let mut prev: Option<T> = None;
    let mut changes = 0;

    for v in values {
        if let Some(p) = prev {
            if p * v < zero {
                changes += 1;
            }
        }
        prev = Some(v);
    }

    changes
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in radians into the range `[-pi, pi)`.
pub fn wrap_pi<T>(value: T) -> T
where
    T: Float
{
    let pi_t = T::from(std::f64::consts::PI).unwrap();
    let tau_t = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(value + pi_t, tau_t) - pi_t
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_clamp_sym() {
        assert_eq!(clamp_sym(150.0, Some(100.0)), 100.0);
        assert_eq!(clamp_sym(-150.0, Some(100.0)), -100.0);
        assert_eq!(clamp_sym(42.0, Some(100.0)), 42.0);
        assert_eq!(clamp_sym(1e9, None), 1e9);
    }

    #[test]
    fn test_count_sign_changes() {
        assert_eq!(count_sign_changes(vec![1.0, -1.0, 1.0, -1.0]), 3);
        assert_eq!(count_sign_changes(vec![1.0, 2.0, 3.0]), 0);
        assert_eq!(count_sign_changes(vec![1.0, 0.0, -1.0]), 0);
        assert_eq!(count_sign_changes(Vec::<f64>::new()), 0);
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(3.0 * PI / 2.0) - (-PI / 2.0)).abs() < 1e-12);
        assert!((wrap_pi(-3.0 * PI / 2.0) - (PI / 2.0)).abs() < 1e-12);
        assert!((wrap_pi(0.25) - 0.25).abs() < 1e-12);
    }
}
