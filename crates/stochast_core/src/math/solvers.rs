//! Root refinement for inverse-CDF evaluation.
//!
//! Distribution families seed an inversion with a fast `f64`
//! approximation, then sharpen it here with Newton steps in backend
//! arithmetic. Newton doubles the number of correct digits per step, so
//! the iteration cap stays small even at high working precision.

use crate::backend::Real;
use crate::types::NumericError;

/// Iteration cap for Newton refinement. Acts as a hard cap: on
/// exhaustion the best estimate so far is returned.
const MAX_NEWTON_STEPS: usize = 48;

/// Refines a root of `f` starting from `x0` using Newton's method with
/// the analytic derivative `f_prime`.
///
/// Convergence target is `|f(x)| < 10^-digits`. A vanishing derivative
/// or a failed step ends the iteration early with the current best
/// estimate; refinement is best-effort by design, since the seed is
/// already a valid (lower-precision) answer.
///
/// # Errors
///
/// Propagates failures of `f` itself at the starting point; never fails
/// on non-convergence.
pub fn newton_refine<F, D>(
    f: F,
    f_prime: D,
    x0: Real,
    digits: u32,
) -> Result<Real, NumericError>
where
    F: Fn(&Real) -> Result<Real, NumericError>,
    D: Fn(&Real) -> Result<Real, NumericError>,
{
    let tolerance = Real::from_i64_at(10, digits + 2).powi(-(digits as i64))?;
    let mut x = x0.with_precision_digits(digits + 4);

    let mut residual = f(&x)?;
    for _ in 0..MAX_NEWTON_STEPS {
        if residual.abs() < tolerance {
            break;
        }
        let slope = match f_prime(&x) {
            Ok(s) if !s.is_zero() => s,
            // Flat or failed derivative: the seed is the best we have.
            _ => break,
        };
        let step = match residual.try_div(&slope) {
            Ok(step) => step,
            Err(_) => break,
        };
        let next = &x - &step;
        let next_residual = match f(&next) {
            Ok(r) => r,
            Err(_) => break,
        };
        x = next;
        residual = next_residual;
    }

    Ok(x.with_precision_digits(digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_refines_square_root() {
        // Solve x^2 - 2 = 0 from a rough seed.
        let f = |x: &Real| Ok(&(x * x) - &Real::from_i64(2));
        let f_prime = |x: &Real| Ok(&Real::from_i64(2) * x);
        let root = newton_refine(f, f_prime, Real::parse("1.4").unwrap(), 30).unwrap();
        let check = &(&root * &root) - &Real::from_i64(2);
        assert!(check.abs().to_f64() < 1e-28);
    }

    #[test]
    fn test_exact_seed_returned_unchanged() {
        let f = |x: &Real| Ok(&(x * x) - &Real::from_i64(4));
        let f_prime = |x: &Real| Ok(&Real::from_i64(2) * x);
        let root = newton_refine(f, f_prime, Real::from_i64(2), 30).unwrap();
        assert_relative_eq!(root.to_f64(), 2.0);
    }

    #[test]
    fn test_zero_derivative_keeps_seed() {
        let f = |_: &Real| Ok(Real::one());
        let f_prime = |_: &Real| Ok(Real::zero());
        let root = newton_refine(f, f_prime, Real::from_i64(7), 20).unwrap();
        assert_relative_eq!(root.to_f64(), 7.0);
    }
}
