//! Range validation
//!
//! Pure checks shared by series bounds (`min < max`) and measurement values
//! (`min <= value <= max`, inclusive). Every input must be finite; a
//! non-finite input fails with `NotANumber` before any comparison runs.

use thiserror::Error;

/// Why a number was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("{field} is not a number: {input}")]
    NotANumber { field: &'static str, input: String },

    #[error("Invalid range: min ({min}) must be less than max ({max})")]
    InvalidRange { min: f64, max: f64 },

    #[error("Value {value} is outside the allowed range ({min} - {max}) for this series.")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

/// Reject NaN and infinities
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, RangeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RangeError::NotANumber {
            field,
            input: value.to_string(),
        })
    }
}

/// Parse user-entered text as a finite number
pub fn parse_number(field: &'static str, input: &str) -> Result<f64, RangeError> {
    let trimmed = input.trim();
    let not_a_number = || RangeError::NotANumber {
        field,
        input: input.to_string(),
    };

    let value: f64 = trimmed.parse().map_err(|_| not_a_number())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(not_a_number())
    }
}

/// Check a series' bound pair: both finite and `min < max`
pub fn validate_bounds(min: f64, max: f64) -> Result<(), RangeError> {
    ensure_finite("min_value", min)?;
    ensure_finite("max_value", max)?;

    if min < max {
        Ok(())
    } else {
        Err(RangeError::InvalidRange { min, max })
    }
}

/// Check a value against inclusive bounds
pub fn validate(value: f64, min: f64, max: f64) -> Result<(), RangeError> {
    ensure_finite("value", value)?;
    ensure_finite("min_value", min)?;
    ensure_finite("max_value", max)?;

    if min <= value && value <= max {
        Ok(())
    } else {
        Err(RangeError::OutOfRange { value, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate(-20.0, -20.0, 50.0).is_ok());
        assert!(validate(50.0, -20.0, 50.0).is_ok());
        assert!(validate(0.0, -20.0, 50.0).is_ok());
        assert!(validate(50.0001, -20.0, 50.0).is_err());
    }

    #[test]
    fn test_out_of_range_message_echoes_value_and_bounds() {
        let err = validate(60.0, -20.0, 50.0).unwrap_err();
        assert_eq!(
            err,
            RangeError::OutOfRange {
                value: 60.0,
                min: -20.0,
                max: 50.0
            }
        );
        assert_eq!(
            err.to_string(),
            "Value 60 is outside the allowed range (-20 - 50) for this series."
        );
    }

    #[test]
    fn test_not_a_number_runs_before_comparison() {
        let err = validate(f64::NAN, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, RangeError::NotANumber { field: "value", .. }));

        let err = validate(0.5, f64::NEG_INFINITY, 1.0).unwrap_err();
        assert!(matches!(err, RangeError::NotANumber { field: "min_value", .. }));
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds(0.0, 100.0).is_ok());
        assert_eq!(
            validate_bounds(10.0, 5.0),
            Err(RangeError::InvalidRange {
                min: 10.0,
                max: 5.0
            })
        );
        assert!(matches!(
            validate_bounds(5.0, 5.0),
            Err(RangeError::InvalidRange { .. })
        ));
        assert!(matches!(
            validate_bounds(f64::NAN, 5.0),
            Err(RangeError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("value", " 12.5 "), Ok(12.5));
        assert_eq!(parse_number("value", "-3"), Ok(-3.0));
        assert!(matches!(
            parse_number("value", "abc"),
            Err(RangeError::NotANumber { field: "value", .. })
        ));
        assert!(parse_number("value", "inf").is_err());
        assert!(parse_number("value", "NaN").is_err());
        assert!(parse_number("value", "").is_err());
    }
}
