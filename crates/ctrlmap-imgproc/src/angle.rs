use std::f64::consts::PI;

/// Fold an angle in radians into a fraction of a full turn in `[0, 1)`.
///
/// `rem_euclid` rounds tiny negative quotients up to exactly `1.0`, which is
/// the same direction as `0.0`.
pub(crate) fn turn_fraction(radians: f64) -> f64 {
    let turn = (radians / (2.0 * PI)).rem_euclid(1.0);
    if turn >= 1.0 {
        0.0
    } else {
        turn
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::turn_fraction;

    #[test]
    fn test_turn_fraction() {
        assert_relative_eq!(turn_fraction(0.0), 0.0);
        assert_relative_eq!(turn_fraction(PI), 0.5);
        assert_relative_eq!(turn_fraction(-PI / 2.0), 0.75);
        assert_relative_eq!(turn_fraction(2.0 * PI), 0.0);
        assert_relative_eq!(turn_fraction(5.0 * PI / 2.0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_turn_fraction_tiny_negative_wraps_to_zero() {
        assert_eq!((-1e-17f64).rem_euclid(1.0), 1.0);
        assert_eq!(turn_fraction(-1e-17), 0.0);
        assert_eq!(turn_fraction(-f64::MIN_POSITIVE), 0.0);
    }
}
