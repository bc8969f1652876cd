//! Accelerated provider: GMP/MPFR big-floats via `rug`.
//!
//! MPFR works in binary precision; the conversion from the configured
//! decimal digit count adds a small guard so decimal round-trips at the
//! configured precision are preserved.

use rug::Float;

use crate::types::NumericError;

/// Binary guard bits on top of the decimal-to-binary conversion.
const GUARD_BITS: u32 = 8;

/// Converts decimal digits to MPFR binary precision.
#[inline]
pub(crate) fn digits_to_bits(digits: u32) -> u32 {
    // log2(10) = 3.3219...
    (digits as f64 * std::f64::consts::LOG2_10).ceil() as u32 + GUARD_BITS
}

/// Rounds `value` to the binary precision implied by `digits`.
#[inline]
pub(crate) fn clamp(value: Float, digits: u32) -> Float {
    let mut value = value;
    value.set_prec(digits_to_bits(digits));
    value
}

/// Parses a decimal literal at the given working precision.
pub(crate) fn parse(literal: &str, digits: u32) -> Result<Float, NumericError> {
    let incomplete = Float::parse(literal).map_err(|e| NumericError::InvalidLiteral {
        literal: literal.to_string(),
        reason: e.to_string(),
    })?;
    let value = Float::with_val(digits_to_bits(digits), incomplete);
    if !value.is_finite() {
        return Err(NumericError::InvalidLiteral {
            literal: literal.to_string(),
            reason: "not a finite value".to_string(),
        });
    }
    Ok(value)
}

#[inline]
pub(crate) fn from_i64(value: i64, digits: u32) -> Float {
    Float::with_val(digits_to_bits(digits), value)
}

#[inline]
pub(crate) fn is_zero(value: &Float) -> bool {
    value.is_zero()
}

#[inline]
pub(crate) fn add(lhs: &Float, rhs: &Float, digits: u32) -> Float {
    Float::with_val(digits_to_bits(digits), lhs + rhs)
}

#[inline]
pub(crate) fn sub(lhs: &Float, rhs: &Float, digits: u32) -> Float {
    Float::with_val(digits_to_bits(digits), lhs - rhs)
}

#[inline]
pub(crate) fn mul(lhs: &Float, rhs: &Float, digits: u32) -> Float {
    Float::with_val(digits_to_bits(digits), lhs * rhs)
}

/// Divides two values. The caller has already excluded a zero divisor.
#[inline]
pub(crate) fn div(lhs: &Float, rhs: &Float, digits: u32) -> Float {
    Float::with_val(digits_to_bits(digits), lhs / rhs)
}

#[inline]
pub(crate) fn neg(value: &Float) -> Float {
    Float::with_val(value.prec(), -value)
}

#[inline]
pub(crate) fn abs(value: &Float) -> Float {
    value.clone().abs()
}

/// Natural exponential. Total over the reals.
#[inline]
pub(crate) fn exp(value: &Float, digits: u32) -> Float {
    clamp(value.clone(), digits).exp()
}

/// Natural logarithm. The caller has already checked `value > 0`.
#[inline]
pub(crate) fn ln(value: &Float, digits: u32) -> Float {
    clamp(value.clone(), digits).ln()
}

/// Square root. The caller has already checked `value >= 0`.
#[inline]
pub(crate) fn sqrt(value: &Float, digits: u32) -> Float {
    clamp(value.clone(), digits).sqrt()
}

/// Total comparison. Our checked construction surface excludes NaN, so
/// incomparable operands cannot arise.
#[inline]
pub(crate) fn cmp(lhs: &Float, rhs: &Float) -> std::cmp::Ordering {
    lhs.partial_cmp(rhs).unwrap_or(std::cmp::Ordering::Equal)
}

#[inline]
pub(crate) fn to_f64(value: &Float) -> f64 {
    value.to_f64()
}

pub(crate) fn to_decimal_string(value: &Float, digits: u32) -> String {
    let rendered = value.to_string_radix(10, Some(digits as usize));
    // MPFR renders trailing zeros up to the requested digit count;
    // normalise them away so round-trips compare cleanly.
    if rendered.contains('.') && !rendered.contains('e') && !rendered.contains('E') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered
    }
}
