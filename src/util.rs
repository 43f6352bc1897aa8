/// Asserts that a numerical value is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```should_panic
/// # use flappy_rl::assert_interval;
/// let value = 2.0;
/// assert_interval!(value, 0.0, 1.0);
/// ```
/// This will panic with the message "Invalid value for \`value\`. Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}`. Must be in the interval [{}, {}].",
            stringify!($var),
            $a,
            $b,
        );
    };
}

/// Check that a value is in the interval `[a,b]`, producing a configuration error naming it if not
pub(crate) fn check_interval(name: &str, value: f32, a: f32, b: f32) -> crate::Result<()> {
    (value >= a && value <= b).then_some(()).ok_or_else(|| {
        crate::Error::config(format!(
            "`{name}` is {value}, must be in the interval [{a}, {b}]"
        ))
    })
}

/// Arithmetic mean of a slice of scores, `0.0` when empty
pub fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_interval_functional() {
        assert!(check_interval("alpha", 0.5, 0.0, 1.0).is_ok());
        assert!(check_interval("alpha", 1.0, 0.0, 1.0).is_ok());
        assert!(check_interval("alpha", 1.5, 0.0, 1.0).is_err());
        assert!(check_interval("alpha", f32::NAN, 0.0, 1.0).is_err(), "NaN rejected");
    }

    #[test]
    fn mean_functional() {
        assert_eq!(mean(&[]), 0.0, "empty mean is zero");
        assert_eq!(mean(&[1, 2, 3, 6]), 3.0);
    }

    #[test]
    #[should_panic(expected = "Invalid value for `value`")]
    fn assert_interval_panics() {
        let value = 2.0;
        assert_interval!(value, 0.0, 1.0);
    }
}
