//! Special functions over [`Real`], used by the distribution families.
//!
//! Everything here is expressed in backend arithmetic so results inherit
//! the working precision of their arguments. Tail regions use continued
//! fractions or asymptotic forms instead of naive series to avoid
//! catastrophic cancellation.

use std::sync::Mutex;

use crate::backend::Real;
use crate::types::NumericError;

/// Guard digits added on top of an argument's working precision for
/// internal computation.
const GUARD_DIGITS: u32 = 10;

/// Iteration cap for series and continued-fraction loops. Hit only on
/// precision/argument combinations far outside the supported range; the
/// loops return the best estimate obtained so far.
const MAX_ITERATIONS: usize = 100_000;

/// Cache of the most recently computed pi, keyed by digit count.
static PI_CACHE: Mutex<Option<(u32, Real)>> = Mutex::new(None);

/// `10^-digits`, the absolute tolerance at a given precision.
fn pow10_neg(digits: u32) -> Result<Real, NumericError> {
    Real::from_i64_at(10, digits + 2).powi(-(digits as i64))
}

/// The circle constant at the given decimal precision.
///
/// Computed by the Gauss-Legendre AGM iteration, which doubles the
/// number of correct digits per step, and cached per precision.
///
/// # Errors
///
/// Propagates backend failures from the iteration; cannot fail for any
/// supported precision.
pub fn pi(digits: u32) -> Result<Real, NumericError> {
    {
        let cache = PI_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((cached_digits, value)) = cache.as_ref() {
            if *cached_digits == digits {
                return Ok(value.clone());
            }
        }
    }

    let work = digits + GUARD_DIGITS;
    let one = Real::from_i64_at(1, work);
    let two = Real::from_i64_at(2, work);
    let four = Real::from_i64_at(4, work);

    let mut a = one.clone();
    let mut b = one.try_div(&two.sqrt()?)?;
    let mut t = one.try_div(&four)?;
    let mut p = one.clone();
    let tol = pow10_neg(work)?;

    for _ in 0..64 {
        let a_next = (&a + &b).try_div(&two)?;
        b = (&a * &b).sqrt()?;
        let d = &a - &a_next;
        t = &t - &(&p * &(&d * &d));
        p = &p * &two;
        a = a_next;
        if (&a - &b).abs() < tol {
            break;
        }
    }

    let s = &a + &b;
    let value = (&s * &s)
        .try_div(&(&four * &t))?
        .with_precision_digits(digits);

    let mut cache = PI_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    *cache = Some((digits, value.clone()));
    Ok(value)
}

/// The error function.
///
/// Uses the Maclaurin series for small arguments (with cancellation
/// guard digits proportional to `x^2`) and the asymptotic continued
/// fraction for `erfc` in the tail, where the series would cancel
/// catastrophically.
///
/// # Errors
///
/// Propagates backend failures; total over the reals in exact
/// arithmetic.
pub fn erf(x: &Real) -> Result<Real, NumericError> {
    let digits = x.precision_digits();
    if x.is_zero() {
        return Ok(Real::from_i64_at(0, digits));
    }

    let xa = x.abs();
    let xf = xa.to_f64();
    let tail_threshold = 8.0_f64.max((digits as f64).sqrt());

    let magnitude = if xf < tail_threshold {
        erf_series(&xa)?
    } else {
        let one = Real::from_i64_at(1, digits + GUARD_DIGITS);
        (&one - &erfc_tail(&xa)?).with_precision_digits(digits)
    };

    if x.is_negative() {
        Ok(-&magnitude)
    } else {
        Ok(magnitude)
    }
}

/// The complementary error function `1 - erf(x)`.
///
/// Tail-stable: for large positive arguments the result is computed
/// directly from the asymptotic continued fraction, preserving relative
/// accuracy where `1 - erf(x)` would lose every digit.
///
/// # Errors
///
/// Propagates backend failures; total over the reals in exact
/// arithmetic.
pub fn erfc(x: &Real) -> Result<Real, NumericError> {
    let digits = x.precision_digits();
    let xf = x.to_f64();
    let tail_threshold = 8.0_f64.max((digits as f64).sqrt());

    if xf >= tail_threshold {
        return erfc_tail(&x.abs());
    }
    let one = Real::from_i64_at(1, digits + GUARD_DIGITS);
    Ok((&one - &erf(x)?).with_precision_digits(digits))
}

/// Maclaurin series for `erf` on the non-tail region, `x >= 0`.
fn erf_series(x: &Real) -> Result<Real, NumericError> {
    let digits = x.precision_digits();
    let xf = x.to_f64();
    // The partial sums reach ~e^{x^2} before cancelling down to O(1).
    let cancellation = (0.45 * xf * xf).ceil() as u32;
    let work = digits + GUARD_DIGITS + cancellation;

    let x = x.with_precision_digits(work);
    let x_sq = &x * &x;
    let tol = pow10_neg(work)?;

    let mut term = x.clone();
    let mut sum = Real::from_i64_at(0, work);
    for n in 0..MAX_ITERATIONS {
        let denom = Real::from_i64_at(2 * n as i64 + 1, work);
        let contribution = term.try_div(&denom)?;
        sum = if n % 2 == 0 {
            &sum + &contribution
        } else {
            &sum - &contribution
        };
        if contribution.abs() < tol {
            break;
        }
        // term_{n+1} = term_n * x^2 / (n + 1)
        term = (&term * &x_sq).try_div(&Real::from_i64_at(n as i64 + 1, work))?;
    }

    // erf(x) = 2/sqrt(pi) * sum
    let two = Real::from_i64_at(2, work);
    let sqrt_pi = pi(work)?.sqrt()?;
    let scaled = (&two * &sum).try_div(&sqrt_pi)?;
    Ok(scaled.with_precision_digits(digits))
}

/// Asymptotic continued fraction for `erfc`, `x` large and positive:
///
/// `erfc(x) = exp(-x^2) / (sqrt(pi) * (x + (1/2)/(x + 1/(x + (3/2)/(x + ...)))))`
///
/// evaluated with the modified Lentz algorithm.
fn erfc_tail(x: &Real) -> Result<Real, NumericError> {
    let digits = x.precision_digits();
    let work = digits + GUARD_DIGITS;

    let x = x.with_precision_digits(work);
    let two = Real::from_i64_at(2, work);
    let tol = pow10_neg(work)?;
    let one = Real::from_i64_at(1, work);

    // Modified Lentz on f = x + a1/(x + a2/(x + ...)), a_n = n/2.
    let mut f = x.clone();
    let mut c = x.clone();
    let mut d = Real::from_i64_at(0, work);
    for n in 1..=MAX_ITERATIONS {
        let a_n = Real::from_i64_at(n as i64, work).try_div(&two)?;
        d = one.try_div(&(&x + &(&a_n * &d)))?;
        c = &x + &a_n.try_div(&c)?;
        let factor = &c * &d;
        f = &f * &factor;
        if (&factor - &one).abs() < tol {
            break;
        }
    }

    let x_sq = &x * &x;
    let gauss = (-&x_sq).exp();
    let sqrt_pi = pi(work)?.sqrt()?;
    let value = gauss.try_div(&(&sqrt_pi * &f))?;
    Ok(value.with_precision_digits(digits))
}

/// Natural logarithm of the gamma function, `x > 0`.
///
/// Spouge's series: the term count grows linearly with the requested
/// precision, and the summation runs with doubled guard digits because
/// the coefficients alternate in sign.
///
/// # Errors
///
/// Returns [`NumericError::DomainError`] unless `x > 0`.
pub fn ln_gamma(x: &Real) -> Result<Real, NumericError> {
    if !x.is_positive() {
        return Err(NumericError::DomainError {
            function: "ln_gamma",
            argument: x.to_decimal_string(),
        });
    }

    let digits = x.precision_digits();
    let work = 2 * digits + 2 * GUARD_DIGITS;
    // Spouge parameter: relative error ~ (2*pi)^{-(a+1/2)}.
    let a = (digits as f64 * 1.2655).ceil() as i64 + 2;

    let z = x.with_precision_digits(work);
    let one = Real::from_i64_at(1, work);
    let two = Real::from_i64_at(2, work);
    let half = one.try_div(&two)?;

    let two_pi = &two * &pi(work)?;

    // S = sqrt(2*pi) + sum_k c_k / (z + k)
    let mut sum = two_pi.sqrt()?;
    // c_k = (-1)^{k-1} / (k-1)! * (a-k)^{k-1/2} * e^{a-k}
    let mut factorial = one.clone();
    for k in 1..a {
        let a_minus_k = Real::from_i64_at(a - k, work);
        let exponent = &Real::from_i64_at(k, work) - &half;
        // (a-k)^{k-1/2} = exp((k-1/2) * ln(a-k))
        let power = (&exponent * &a_minus_k.ln()?).exp();
        let c_k = (&power * &a_minus_k.exp()).try_div(&factorial)?;
        let term = c_k.try_div(&(&z + &Real::from_i64_at(k - 1, work)))?;
        sum = if k % 2 == 1 { &sum + &term } else { &sum - &term };
        factorial = &factorial * &Real::from_i64_at(k, work);
    }

    // ln Gamma(z) = (z - 1/2) ln(z + a - 1) - (z + a - 1) + ln(S)
    // from Gamma(z) = (z+a-1)^{z-1/2} e^{-(z+a-1)} S with shifted argument.
    let shifted = &(&z + &Real::from_i64_at(a, work)) - &one;
    let value = &(&(&(&z - &half) * &shifted.ln()?) - &shifted) + &sum.ln()?;
    Ok(value.with_precision_digits(digits))
}

/// The gamma function, `x > 0`.
///
/// # Errors
///
/// Returns [`NumericError::DomainError`] unless `x > 0`.
pub fn gamma(x: &Real) -> Result<Real, NumericError> {
    Ok(ln_gamma(x)?.exp())
}

/// `ln(n!)` as a [`Real`] at the given precision.
///
/// # Errors
///
/// Propagates backend failures; total for any `n`.
pub fn ln_factorial(n: u64, digits: u32) -> Result<Real, NumericError> {
    if n < 2 {
        return Ok(Real::from_i64_at(0, digits));
    }
    ln_gamma(&Real::from_i64_at(n as i64 + 1, digits))
}
