//! Reference provider: pure-Rust decimal big-floats via `dashu-float`.
//!
//! All operations round results to an explicit decimal digit count so
//! that the mixed-precision rule (round to the lower working precision)
//! is enforced in one place, [`crate::backend::Real`].

use dashu_float::ops::SquareRoot;
use dashu_float::DBig;

use crate::types::NumericError;

/// Rounds `value` to `digits` significant decimal digits.
#[inline]
pub(crate) fn clamp(value: DBig, digits: u32) -> DBig {
    value.with_precision(digits as usize).value()
}

/// Parses a decimal literal at the given working precision.
pub(crate) fn parse(literal: &str, digits: u32) -> Result<DBig, NumericError> {
    let value = literal
        .parse::<DBig>()
        .map_err(|e| NumericError::InvalidLiteral {
            literal: literal.to_string(),
            reason: e.to_string(),
        })?;
    Ok(clamp(value, digits))
}

/// Constructs a value from a signed integer at the given precision.
#[inline]
pub(crate) fn from_i64(value: i64, digits: u32) -> DBig {
    clamp(DBig::from(value), digits)
}

#[inline]
pub(crate) fn is_zero(value: &DBig) -> bool {
    *value == DBig::ZERO
}

#[inline]
pub(crate) fn add(lhs: &DBig, rhs: &DBig, digits: u32) -> DBig {
    clamp(lhs + rhs, digits)
}

#[inline]
pub(crate) fn sub(lhs: &DBig, rhs: &DBig, digits: u32) -> DBig {
    clamp(lhs - rhs, digits)
}

#[inline]
pub(crate) fn mul(lhs: &DBig, rhs: &DBig, digits: u32) -> DBig {
    clamp(lhs * rhs, digits)
}

/// Divides two values. The caller has already excluded a zero divisor.
#[inline]
pub(crate) fn div(lhs: &DBig, rhs: &DBig, digits: u32) -> DBig {
    // Pad the operands first: dashu derives the quotient precision from
    // its inputs, and integer-constructed operands carry unlimited
    // precision which would make exact division run forever.
    let lhs = lhs.clone().with_precision(digits as usize).value();
    let rhs = rhs.clone().with_precision(digits as usize).value();
    clamp(lhs / rhs, digits)
}

#[inline]
pub(crate) fn neg(value: &DBig) -> DBig {
    -value.clone()
}

#[inline]
pub(crate) fn abs(value: &DBig) -> DBig {
    if *value < DBig::ZERO {
        -value.clone()
    } else {
        value.clone()
    }
}

/// Natural exponential. Total over the reals.
#[inline]
pub(crate) fn exp(value: &DBig, digits: u32) -> DBig {
    clamp(value.clone().with_precision(digits as usize).value().exp(), digits)
}

/// Natural logarithm. The caller has already checked `value > 0`.
#[inline]
pub(crate) fn ln(value: &DBig, digits: u32) -> DBig {
    clamp(value.clone().with_precision(digits as usize).value().ln(), digits)
}

/// Square root. The caller has already checked `value >= 0`.
#[inline]
pub(crate) fn sqrt(value: &DBig, digits: u32) -> DBig {
    clamp(value.clone().with_precision(digits as usize).value().sqrt(), digits)
}

#[inline]
pub(crate) fn cmp(lhs: &DBig, rhs: &DBig) -> std::cmp::Ordering {
    lhs.cmp(rhs)
}

#[inline]
pub(crate) fn to_f64(value: &DBig) -> f64 {
    value.to_f64().value()
}

#[inline]
pub(crate) fn to_decimal_string(value: &DBig) -> String {
    value.to_string()
}
