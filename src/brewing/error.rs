//! Calculator error types
//!
//! Hard failures surface as [`CalcError`]; results that are mathematically valid but
//! physically suspicious come back as an [`Estimate`] carrying a [`Degenerate`] flag.

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the brewing calculators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// A required value is missing, non-numeric, or physically out of range
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A denominator collapsed to zero
    #[error("Division by zero: {0}")]
    DivideByZero(&'static str),
}

impl CalcError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for calculator operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Why a returned value should be shown with a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degenerate {
    /// Final gravity above original gravity
    NegativeAbv,
    /// Grain bill contributes no color at all
    ZeroColor,
    /// Beer already holds at least the requested CO2
    AlreadyCarbonated,
}

impl Degenerate {
    pub fn message(&self) -> &'static str {
        match self {
            Degenerate::NegativeAbv => "final gravity is higher than original gravity",
            Degenerate::ZeroColor => "grain bill has no color contribution",
            Degenerate::AlreadyCarbonated => "beer already holds the requested CO2 volumes",
        }
    }
}

/// A computed value plus an optional degenerate-result flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degenerate: Option<Degenerate>,
}

impl Estimate {
    pub fn ok(value: f64) -> Self {
        Self {
            value,
            degenerate: None,
        }
    }

    pub fn flagged(value: f64, reason: Degenerate) -> Self {
        Self {
            value,
            degenerate: Some(reason),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate.is_some()
    }
}

/// Reject NaN and infinities before they reach a formula
pub(crate) fn require_finite(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::invalid(field, "must be a finite number"))
    }
}

/// Require a strictly positive value
pub(crate) fn require_positive(field: &str, value: f64) -> CalcResult<f64> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(CalcError::invalid(field, format!("must be greater than 0 (got {})", value)))
    }
}

/// Require a value of zero or more
pub(crate) fn require_non_negative(field: &str, value: f64) -> CalcResult<f64> {
    require_finite(field, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::invalid(field, format!("must not be negative (got {})", value)))
    }
}

/// Validate a batch size used as a divisor: zero is a division error, negative is bad input
pub(crate) fn require_batch_size(value: f64) -> CalcResult<f64> {
    require_finite("batch_size_liters", value)?;
    if value == 0.0 {
        return Err(CalcError::DivideByZero("batch_size_liters is 0"));
    }
    if value < 0.0 {
        return Err(CalcError::invalid(
            "batch_size_liters",
            format!("must be greater than 0 (got {})", value),
        ));
    }
    Ok(value)
}
