//! Soft and hard thresholding of coefficient arrays.

use crate::Error;

// ======================================================================
// FUNCTIONS - PUBLIC

/// Soft thresholding: shrinks every coefficient toward zero by
/// `threshold`, `c'[i] = sign(c[i]) * max(|c[i]| - threshold, 0)`.
///
/// Returns a new array; `threshold` must be non-negative.
pub fn soft_threshold(coefficients: &[f64], threshold: f64) -> Result<Vec<f64>, Error> {
    validate_threshold(threshold)?;
    Ok(coefficients
        .iter()
        .map(|&c| c.signum() * (c.abs() - threshold).max(0.0))
        .collect())
}

/// Hard thresholding: zeroes every coefficient whose magnitude does not
/// exceed `threshold`, `c'[i] = c[i]` if `|c[i]| > threshold` else `0`.
///
/// Returns a new array; `threshold` must be non-negative.
pub fn hard_threshold(coefficients: &[f64], threshold: f64) -> Result<Vec<f64>, Error> {
    validate_threshold(threshold)?;
    Ok(coefficients
        .iter()
        .map(|&c| if c.abs() > threshold { c } else { 0.0 })
        .collect())
}

// ======================================================================
// FUNCTIONS - PRIVATE

fn validate_threshold(threshold: f64) -> Result<(), Error> {
    // Also rejects NaN.
    if !(threshold >= 0.0) {
        return Err(Error::NegativeThreshold { threshold });
    }
    Ok(())
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threshold_is_the_identity() {
        let coefficients = vec![1.5, -2.25, 0.0, 0.75, -0.0];
        assert_eq!(soft_threshold(&coefficients, 0.0).unwrap(), coefficients);
        assert_eq!(hard_threshold(&coefficients, 0.0).unwrap(), coefficients);
    }

    #[test]
    fn soft_shrinks_toward_zero() {
        let out = soft_threshold(&[3.0, -3.0, 0.5, -0.5], 1.0).unwrap();
        assert_eq!(out, vec![2.0, -2.0, 0.0, 0.0]);
    }

    #[test]
    fn hard_keeps_or_kills() {
        let out = hard_threshold(&[3.0, -3.0, 1.0, -0.5], 1.0).unwrap();
        assert_eq!(out, vec![3.0, -3.0, 0.0, 0.0]);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        assert_eq!(
            soft_threshold(&[1.0], -0.1).err(),
            Some(Error::NegativeThreshold { threshold: -0.1 })
        );
        assert_eq!(
            hard_threshold(&[1.0], f64::NAN).err().map(|e| matches!(
                e,
                Error::NegativeThreshold { .. }
            )),
            Some(true)
        );
    }
}
