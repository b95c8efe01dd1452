//! Arithmetic mean over a non-empty sequence of readings.

use crate::types::EmptyInput;

/// Average a sequence of temperature readings.
///
/// Pure and deterministic. NaN and infinity propagate per IEEE-754; the
/// upstream payloads never carry them, so no special handling is done here.
///
/// # Errors
///
/// Returns [`EmptyInput`] when `values` is empty.
pub fn average(values: &[f64]) -> Result<f64, EmptyInput> {
    if values.is_empty() {
        return Err(EmptyInput);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_average_to_themselves() {
        for n in 1..=5 {
            let values = vec![21.5; n];
            assert_eq!(average(&values).unwrap(), 21.5);
        }
    }

    #[test]
    fn averages_mixed_values() {
        assert_eq!(average(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert_eq!(average(&[-10.0, 10.0]).unwrap(), 0.0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(average(&[]), Err(EmptyInput));
    }
}
