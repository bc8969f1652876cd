//! Adaptive numeric integration over [`Real`] intervals.
//!
//! Used by the evaluation engine when no closed form exists but the
//! densities involved are known. The subdivision depth is a hard cap:
//! when it is reached the integrator returns the best estimate obtained
//! so far together with its error bound, rather than failing.

use crate::backend::Real;
use crate::types::NumericError;

/// Default relative tolerance for the adaptive rule.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Default maximum subdivision depth.
pub const DEFAULT_MAX_DEPTH: u32 = 24;

/// Configuration for the adaptive Simpson integrator.
///
/// # Examples
/// ```
/// use stochast_core::math::QuadratureConfig;
///
/// let config = QuadratureConfig::new()
///     .with_tolerance(1e-10)
///     .with_max_depth(20);
/// assert_eq!(config.max_depth(), 20);
/// ```
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadratureConfig {
    tolerance: f64,
    max_depth: u32,
}

impl QuadratureConfig {
    /// Creates the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relative tolerance driving subdivision.
    #[inline]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum subdivision depth (a hard cap).
    #[inline]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the relative tolerance.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the maximum subdivision depth.
    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Integral estimate with its error bound.
#[derive(Clone, Debug)]
pub struct QuadratureResult {
    /// The integral estimate.
    pub value: Real,
    /// Accumulated error bound from the Richardson term of the rule.
    pub error_bound: Real,
}

/// Integrates `f` over `[a, b]` with the adaptive Simpson rule.
///
/// # Errors
///
/// Propagates the first failure of the integrand; subdivision-limit
/// exhaustion is not an error (the best estimate is returned with a
/// correspondingly larger error bound).
pub fn integrate<F>(
    f: F,
    a: &Real,
    b: &Real,
    config: &QuadratureConfig,
) -> Result<QuadratureResult, NumericError>
where
    F: Fn(&Real) -> Result<Real, NumericError>,
{
    let two = Real::from_i64(2);
    let fa = f(a)?;
    let fb = f(b)?;
    let m = (a + b).try_div(&two)?;
    let fm = f(&m)?;
    let whole = simpson(a, b, &fa, &fm, &fb)?;

    // Absolute tolerance scaled by the coarse estimate.
    let scale = &Real::one() + &whole.abs();
    let tol = &Real::from_f64(config.tolerance)? * &scale;

    let mut ctx = Context {
        f: &f,
        two,
        fifteen: Real::from_i64(15),
    };
    ctx.adaptive(a, b, &fa, &fm, &fb, &whole, &tol, config.max_depth)
}

struct Context<'a, F> {
    f: &'a F,
    two: Real,
    fifteen: Real,
}

impl<F> Context<'_, F>
where
    F: Fn(&Real) -> Result<Real, NumericError>,
{
    #[allow(clippy::too_many_arguments)]
    fn adaptive(
        &mut self,
        a: &Real,
        b: &Real,
        fa: &Real,
        fm: &Real,
        fb: &Real,
        whole: &Real,
        tol: &Real,
        depth: u32,
    ) -> Result<QuadratureResult, NumericError> {
        let m = (a + b).try_div(&self.two)?;
        let lm = (a + &m).try_div(&self.two)?;
        let rm = (&m + b).try_div(&self.two)?;
        let flm = (self.f)(&lm)?;
        let frm = (self.f)(&rm)?;

        let left = simpson(a, &m, fa, &flm, fm)?;
        let right = simpson(&m, b, fm, &frm, fb)?;
        let refined = &left + &right;
        let delta = &refined - whole;
        let richardson = delta.try_div(&self.fifteen)?;

        if depth == 0 || richardson.abs() <= *tol {
            return Ok(QuadratureResult {
                value: &refined + &richardson,
                error_bound: richardson.abs(),
            });
        }

        let half_tol = tol.try_div(&self.two)?;
        let l = self.adaptive(a, &m, fa, &flm, fm, &left, &half_tol, depth - 1)?;
        let r = self.adaptive(&m, b, fm, &frm, fb, &right, &half_tol, depth - 1)?;
        Ok(QuadratureResult {
            value: &l.value + &r.value,
            error_bound: &l.error_bound + &r.error_bound,
        })
    }
}

/// Simpson's rule on `[a, b]` with precomputed endpoint and midpoint
/// evaluations.
fn simpson(a: &Real, b: &Real, fa: &Real, fm: &Real, fb: &Real) -> Result<Real, NumericError> {
    let four = Real::from_i64(4);
    let six = Real::from_i64(6);
    let width = b - a;
    let weighted = &(fa + &(&four * fm)) + fb;
    (&width * &weighted).try_div(&six)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integrates_polynomial_exactly() {
        // Simpson is exact for cubics: int_0^1 x^3 dx = 1/4.
        let f = |x: &Real| x.powi(3);
        let result = integrate(f, &Real::zero(), &Real::one(), &QuadratureConfig::new()).unwrap();
        assert_relative_eq!(result.value.to_f64(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_integrates_exponential() {
        // int_0^1 e^x dx = e - 1
        let f = |x: &Real| Ok(x.exp());
        let result = integrate(f, &Real::zero(), &Real::one(), &QuadratureConfig::new()).unwrap();
        assert_relative_eq!(
            result.value.to_f64(),
            std::f64::consts::E - 1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_error_bound_reported() {
        let f = |x: &Real| Ok(x.exp());
        let result = integrate(f, &Real::zero(), &Real::one(), &QuadratureConfig::new()).unwrap();
        assert!(result.error_bound.to_f64() < 1e-9);
    }

    #[test]
    fn test_depth_cap_returns_best_estimate() {
        let config = QuadratureConfig::new().with_max_depth(2).with_tolerance(1e-30);
        let f = |x: &Real| Ok(x.exp());
        // The cap is a hard cap, never an error.
        let result = integrate(f, &Real::zero(), &Real::one(), &config).unwrap();
        assert_relative_eq!(
            result.value.to_f64(),
            std::f64::consts::E - 1.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_integrand_failure_propagates() {
        let f = |x: &Real| x.ln();
        let a = Real::from_i64(-1);
        assert!(integrate(f, &a, &Real::one(), &QuadratureConfig::new()).is_err());
    }
}
