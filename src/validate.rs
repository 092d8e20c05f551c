//! Input validation helpers.
//!
//! Standardizes validation across the crate using `!is_finite()` to reject
//! NaN, +Inf, and -Inf uniformly.

use chrono::NaiveDate;

use crate::error::VolMarkError;

/// Validate that a value is strictly positive and finite (rejects NaN, Inf, zero, negatives).
pub(crate) fn validate_positive(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(VolMarkError::InvalidInput {
            message: format!("{name} must be positive and finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate that a value is finite (rejects NaN and Inf; allows zero and negatives).
pub(crate) fn validate_finite(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() {
        return Err(VolMarkError::InvalidInput {
            message: format!("{name} must be finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate that `date` lies strictly after `value_date`.
pub(crate) fn validate_after(
    date: NaiveDate,
    value_date: NaiveDate,
    name: &str,
) -> crate::error::Result<NaiveDate> {
    if date <= value_date {
        return Err(VolMarkError::InvalidInput {
            message: format!("{name} {date} must be after {value_date}"),
        });
    }
    Ok(date)
}
