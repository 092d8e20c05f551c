//! Error types for the volmark library.
//!
//! Every fallible operation returns `Result<T, VolMarkError>` rather than
//! panicking. Oracle failures are usually not returned as `Err` at component
//! boundaries: components degrade to a fallback value and carry the error
//! alongside it (see [`Degraded`]).

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, VolMarkError>;

/// Errors raised while marking surfaces or stripping carry.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum VolMarkError {
    /// Input data is invalid (unparseable date, non-numeric schedule value,
    /// maturity on or before the value date, non-positive spot).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Required data is absent (no schedule, no surface, no fitted curve).
    #[error("missing data: {message}")]
    MissingData { message: String },

    /// An external collaborator failed or timed out.
    #[error("{oracle} oracle failed: {message}")]
    OracleFailure {
        /// Collaborator that failed (e.g., "vol", "forward", "calendar").
        oracle: &'static str,
        message: String,
    },

    /// Numerical computation produced a non-finite value.
    #[error("numerical error: {message}")]
    NumericalError { message: String },
}

impl VolMarkError {
    /// Shorthand for an [`OracleFailure`](VolMarkError::OracleFailure).
    pub fn oracle(oracle: &'static str, message: impl Into<String>) -> Self {
        Self::OracleFailure {
            oracle,
            message: message.into(),
        }
    }

    /// Whether this error came from an external collaborator.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(self, Self::OracleFailure { .. })
    }
}

/// A value that may have been produced by a fallback path.
///
/// `failure` is `Some` when an oracle failed and `value` is the defined
/// fallback (zero-filled grid, `None` forward, skipped carry point).
#[derive(Debug, Clone, PartialEq)]
pub struct Degraded<T> {
    pub value: T,
    pub failure: Option<VolMarkError>,
}

impl<T> Degraded<T> {
    /// A value computed without any fallback.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            failure: None,
        }
    }

    /// A fallback value together with the failure that forced it.
    pub fn fallback(value: T, failure: VolMarkError) -> Self {
        Self {
            value,
            failure: Some(failure),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
