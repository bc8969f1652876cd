//! Error types for structured error handling.
//!
//! This module provides:
//! - `NumericError`: Errors from arbitrary-precision numeric operations

use thiserror::Error;

/// Categorised numeric backend errors.
///
/// Provides structured error handling for value construction and
/// arithmetic with descriptive context for each failure mode.
///
/// # Variants
/// - `InvalidLiteral`: Literal could not be parsed into a value
/// - `DivisionByZero`: Division by an exact zero
/// - `DomainError`: Elementary function applied outside its domain
/// - `PrecisionUnderflow`: Requested precision outside the supported range
///
/// # Examples
/// ```
/// use stochast_core::types::NumericError;
///
/// let err = NumericError::DivisionByZero;
/// assert_eq!(format!("{}", err), "division by an exact zero");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    /// Literal could not be parsed into a numeric value.
    #[error("invalid numeric literal {literal:?}: {reason}")]
    InvalidLiteral {
        /// The offending literal, as supplied by the caller.
        literal: String,
        /// Provider-reported parse failure.
        reason: String,
    },

    /// Division by an exact zero.
    #[error("division by an exact zero")]
    DivisionByZero,

    /// Elementary function applied outside its documented domain.
    #[error("domain error: {function}({argument}) is undefined")]
    DomainError {
        /// Name of the elementary function (e.g. `"ln"`, `"sqrt"`).
        function: &'static str,
        /// Decimal rendering of the out-of-domain argument.
        argument: String,
    },

    /// Requested working precision outside the supported range.
    #[error("requested precision {requested} outside supported range [{min}, {max}] digits")]
    PrecisionUnderflow {
        /// Requested decimal digits.
        requested: u32,
        /// Minimum supported decimal digits.
        min: u32,
        /// Maximum supported decimal digits.
        max: u32,
    },
}
