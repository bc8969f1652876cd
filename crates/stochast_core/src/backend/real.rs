//! The arbitrary-precision real value type.
//!
//! [`Real`] wraps the active provider's big-float type behind a uniform
//! surface: construction from integers, decimal strings and native
//! floats, checked arithmetic, total comparison, and the elementary
//! functions the distribution families are built on.
//!
//! # Precision model
//!
//! Every value carries the decimal digit count it was constructed with.
//! Arithmetic between two values rounds the result to the *lower* of the
//! two working precisions; the configured precision floor is never
//! silently truncated below that.

use std::cmp::Ordering;
use std::fmt;

use dashu_float::DBig;

use super::config::current_config;
use super::reference;
use crate::types::NumericError;

#[cfg(feature = "accelerated")]
use super::accelerated;
#[cfg(feature = "accelerated")]
use super::config::BackendKind;

/// Provider-specific value representation.
#[derive(Clone, Debug)]
enum Repr {
    /// `dashu-float` decimal big-float.
    Reference(DBig),
    /// `rug` (MPFR) binary big-float.
    #[cfg(feature = "accelerated")]
    Accelerated(rug::Float),
}

/// An arbitrary-precision real number.
///
/// Values are immutable; every operation produces a new value. The
/// provider is chosen by the process-wide configuration at construction
/// time and is an implementation detail: callers must never branch on
/// it.
///
/// # Examples
/// ```
/// use stochast_core::backend::Real;
///
/// let a = Real::parse("2.5").unwrap();
/// let b = Real::from_i64(4);
/// let sum = &a + &b;
/// assert_eq!(sum.to_decimal_string(), "6.5");
/// ```
#[derive(Clone, Debug)]
pub struct Real {
    repr: Repr,
    digits: u32,
}

impl Real {
    /// Constructs a value from a signed integer at the configured
    /// working precision.
    pub fn from_i64(value: i64) -> Self {
        let digits = current_config().digits();
        Self::from_i64_at(value, digits)
    }

    /// Constructs an integer value at an explicit precision.
    ///
    /// Used internally by the special-function kernels, which work at
    /// guard precision above the configured floor.
    pub fn from_i64_at(value: i64, digits: u32) -> Self {
        let config = current_config();
        let repr = match config.backend() {
            #[cfg(feature = "accelerated")]
            BackendKind::Accelerated => Repr::Accelerated(accelerated::from_i64(value, digits)),
            _ => Repr::Reference(reference::from_i64(value, digits)),
        };
        Self { repr, digits }
    }

    /// Constructs a value from a native float.
    ///
    /// The float's shortest round-trip decimal rendering is parsed at
    /// the configured precision, so `0.1_f64` becomes the decimal `0.1`
    /// rather than its binary expansion.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::InvalidLiteral`] for NaN or infinite
    /// input.
    pub fn from_f64(value: f64) -> Result<Self, NumericError> {
        if !value.is_finite() {
            return Err(NumericError::InvalidLiteral {
                literal: value.to_string(),
                reason: "not a finite value".to_string(),
            });
        }
        Self::parse(&value.to_string())
    }

    /// Parses a decimal literal at the configured working precision.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::InvalidLiteral`] if the literal is
    /// malformed.
    pub fn parse(literal: &str) -> Result<Self, NumericError> {
        let config = current_config();
        let digits = config.digits();
        let repr = match config.backend() {
            #[cfg(feature = "accelerated")]
            BackendKind::Accelerated => {
                Repr::Accelerated(accelerated::parse(literal, digits)?)
            }
            _ => Repr::Reference(reference::parse(literal, digits)?),
        };
        Ok(Self { repr, digits })
    }

    /// The additive identity at the configured precision.
    #[inline]
    pub fn zero() -> Self {
        Self::from_i64(0)
    }

    /// The multiplicative identity at the configured precision.
    #[inline]
    pub fn one() -> Self {
        Self::from_i64(1)
    }

    /// Returns the working precision this value was constructed with,
    /// in decimal digits.
    #[inline]
    pub fn precision_digits(&self) -> u32 {
        self.digits
    }

    /// Re-rounds (or pads) this value to an explicit precision.
    ///
    /// Padding cannot recover digits already rounded away; it only
    /// raises the working precision of subsequent arithmetic.
    pub fn with_precision_digits(&self, digits: u32) -> Self {
        let repr = match &self.repr {
            Repr::Reference(v) => Repr::Reference(reference::clamp(v.clone(), digits)),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => Repr::Accelerated(accelerated::clamp(v.clone(), digits)),
        };
        Self { repr, digits }
    }

    /// True if this value is an exact zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        match &self.repr {
            Repr::Reference(v) => reference::is_zero(v),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => accelerated::is_zero(v),
        }
    }

    /// True if this value is strictly negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.cmp_value(&Self::from_i64_at(0, self.digits)) == Ordering::Less
    }

    /// True if this value is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.cmp_value(&Self::from_i64_at(0, self.digits)) == Ordering::Greater
    }

    /// Total comparison by numeric value.
    ///
    /// Providers cannot produce NaN through the checked construction
    /// surface, so the ordering is total.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (&self.repr, &other.repr) {
            (Repr::Reference(a), Repr::Reference(b)) => reference::cmp(a, b),
            #[cfg(feature = "accelerated")]
            (Repr::Accelerated(a), Repr::Accelerated(b)) => accelerated::cmp(a, b),
            #[cfg(feature = "accelerated")]
            _ => {
                let coerced = other.coerce_like(self);
                self.cmp_value(&coerced)
            }
        }
    }

    /// Checked division.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::DivisionByZero`] if `divisor` is an exact
    /// zero.
    pub fn try_div(&self, divisor: &Self) -> Result<Self, NumericError> {
        if divisor.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        let digits = self.digits.min(divisor.digits);
        let repr = match (&self.repr, &divisor.repr) {
            (Repr::Reference(a), Repr::Reference(b)) => {
                Repr::Reference(reference::div(a, b, digits))
            }
            #[cfg(feature = "accelerated")]
            (Repr::Accelerated(a), Repr::Accelerated(b)) => {
                Repr::Accelerated(accelerated::div(a, b, digits))
            }
            #[cfg(feature = "accelerated")]
            _ => {
                let coerced = divisor.coerce_like(self);
                return self.try_div(&coerced);
            }
        };
        Ok(Self { repr, digits })
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        let repr = match &self.repr {
            Repr::Reference(v) => Repr::Reference(reference::abs(v)),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => Repr::Accelerated(accelerated::abs(v)),
        };
        Self {
            repr,
            digits: self.digits,
        }
    }

    /// Natural exponential. Total over the reals.
    pub fn exp(&self) -> Self {
        let repr = match &self.repr {
            Repr::Reference(v) => Repr::Reference(reference::exp(v, self.digits)),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => Repr::Accelerated(accelerated::exp(v, self.digits)),
        };
        Self {
            repr,
            digits: self.digits,
        }
    }

    /// Natural logarithm.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::DomainError`] unless `self > 0`.
    pub fn ln(&self) -> Result<Self, NumericError> {
        if !self.is_positive() {
            return Err(NumericError::DomainError {
                function: "ln",
                argument: self.to_decimal_string(),
            });
        }
        let repr = match &self.repr {
            Repr::Reference(v) => Repr::Reference(reference::ln(v, self.digits)),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => Repr::Accelerated(accelerated::ln(v, self.digits)),
        };
        Ok(Self {
            repr,
            digits: self.digits,
        })
    }

    /// Square root.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::DomainError`] if `self < 0`.
    pub fn sqrt(&self) -> Result<Self, NumericError> {
        if self.is_negative() {
            return Err(NumericError::DomainError {
                function: "sqrt",
                argument: self.to_decimal_string(),
            });
        }
        let repr = match &self.repr {
            Repr::Reference(v) => Repr::Reference(reference::sqrt(v, self.digits)),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => Repr::Accelerated(accelerated::sqrt(v, self.digits)),
        };
        Ok(Self {
            repr,
            digits: self.digits,
        })
    }

    /// Integer power by binary exponentiation.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::DivisionByZero`] for `0^n` with `n < 0`.
    pub fn powi(&self, exponent: i64) -> Result<Self, NumericError> {
        if exponent < 0 {
            let positive = self.powi(-exponent)?;
            return Self::from_i64_at(1, self.digits).try_div(&positive);
        }
        let mut result = Self::from_i64_at(1, self.digits);
        let mut base = self.clone();
        let mut n = exponent as u64;
        while n > 0 {
            if n & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            n >>= 1;
        }
        Ok(result)
    }

    /// Largest integer not greater than this value.
    ///
    /// The integer part is extracted through `f64`, which is exact for
    /// magnitudes below 2^52; the discrete supports this is used for
    /// (counts, trials) stay far below that.
    pub fn floor(&self) -> Self {
        let approx = self.to_f64();
        if approx.abs() >= 2f64.powi(52) {
            return self.clone();
        }
        let mut candidate = Self::from_i64_at(approx.floor() as i64, self.digits);
        // Correct the f64 rounding at the integer boundary.
        if candidate.cmp_value(self) == Ordering::Greater {
            candidate = &candidate - &Self::from_i64_at(1, self.digits);
        } else {
            let next = &candidate + &Self::from_i64_at(1, self.digits);
            if next.cmp_value(self) != Ordering::Greater {
                candidate = next;
            }
        }
        candidate
    }

    /// True if this value is an exact integer.
    pub fn is_integer(&self) -> bool {
        self.floor().cmp_value(self) == Ordering::Equal
    }

    /// Nearest `f64` approximation.
    pub fn to_f64(&self) -> f64 {
        match &self.repr {
            Repr::Reference(v) => reference::to_f64(v),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => accelerated::to_f64(v),
        }
    }

    /// Decimal rendering at this value's working precision.
    pub fn to_decimal_string(&self) -> String {
        match &self.repr {
            Repr::Reference(v) => reference::to_decimal_string(v),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => accelerated::to_decimal_string(v, self.digits),
        }
    }

    /// Re-expresses `self` in the provider of `target`.
    ///
    /// Only reachable when values constructed under different provider
    /// configurations meet in one expression; the round-trip goes
    /// through the decimal rendering at this value's own precision.
    #[cfg(feature = "accelerated")]
    fn coerce_like(&self, target: &Self) -> Self {
        let digits = self.digits;
        let literal = self.to_decimal_string();
        let repr = match &target.repr {
            Repr::Reference(_) => Repr::Reference(
                reference::parse(&literal, digits).unwrap_or_else(|_| reference::from_i64(0, digits)),
            ),
            Repr::Accelerated(_) => Repr::Accelerated(
                accelerated::parse(&literal, digits)
                    .unwrap_or_else(|_| accelerated::from_i64(0, digits)),
            ),
        };
        Self { repr, digits }
    }

    fn binary_op(
        &self,
        rhs: &Self,
        op_ref: fn(&DBig, &DBig, u32) -> DBig,
        #[cfg(feature = "accelerated")] op_acc: fn(&rug::Float, &rug::Float, u32) -> rug::Float,
    ) -> Self {
        let digits = self.digits.min(rhs.digits);
        let repr = match (&self.repr, &rhs.repr) {
            (Repr::Reference(a), Repr::Reference(b)) => Repr::Reference(op_ref(a, b, digits)),
            #[cfg(feature = "accelerated")]
            (Repr::Accelerated(a), Repr::Accelerated(b)) => Repr::Accelerated(op_acc(a, b, digits)),
            #[cfg(feature = "accelerated")]
            _ => {
                let coerced = rhs.coerce_like(self);
                return self.binary_op(&coerced, op_ref, op_acc);
            }
        };
        Self { repr, digits }
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_value(other) == Ordering::Equal
    }
}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_value(other))
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op_ref:path, $op_acc:path) => {
        impl std::ops::$trait for &Real {
            type Output = Real;

            #[cfg(feature = "accelerated")]
            fn $method(self, rhs: &Real) -> Real {
                self.binary_op(rhs, $op_ref, $op_acc)
            }

            #[cfg(not(feature = "accelerated"))]
            fn $method(self, rhs: &Real) -> Real {
                self.binary_op(rhs, $op_ref)
            }
        }

        impl std::ops::$trait for Real {
            type Output = Real;

            fn $method(self, rhs: Real) -> Real {
                std::ops::$trait::$method(&self, &rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, reference::add, accelerated::add);
impl_binary_op!(Sub, sub, reference::sub, accelerated::sub);
impl_binary_op!(Mul, mul, reference::mul, accelerated::mul);

impl std::ops::Neg for &Real {
    type Output = Real;

    fn neg(self) -> Real {
        let repr = match &self.repr {
            Repr::Reference(v) => Repr::Reference(reference::neg(v)),
            #[cfg(feature = "accelerated")]
            Repr::Accelerated(v) => Repr::Accelerated(accelerated::neg(v)),
        };
        Real {
            repr,
            digits: self.digits,
        }
    }
}

impl std::ops::Neg for Real {
    type Output = Real;

    fn neg(self) -> Real {
        -&self
    }
}
