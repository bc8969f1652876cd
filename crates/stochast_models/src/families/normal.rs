//! Normal (Gaussian) family.

use num_traits::Float;
use rand::RngCore;
use rand_distr::Distribution as _;
use stochast_core::math::special::{erfc, pi};
use stochast_core::math::solvers::newton_refine;
use stochast_core::{NumericError, Real};

use super::{sampler_error, working_digits, Family, FamilyKind};
use crate::error::RegistryError;
use crate::params::{Constraint, ParamSpec};
use crate::support::Support;

static SPECS: [ParamSpec; 2] = [
    ParamSpec::new("mu", Constraint::Real),
    ParamSpec::new("sigma", Constraint::Positive),
];

/// The normal family `Normal(mu, sigma)`, parameterised by mean and
/// standard deviation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normal;

impl Normal {
    /// Standardises `x` to `(x - mu) / sigma`.
    fn standardise(params: &[Real], x: &Real) -> Result<Real, NumericError> {
        (x - &params[0]).try_div(&params[1])
    }
}

impl Family for Normal {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn kind(&self) -> FamilyKind {
        FamilyKind::Continuous
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &SPECS
    }

    fn support(&self, _params: &[Real]) -> Support {
        Support::real_line()
    }

    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok(params[0].clone())
    }

    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok(&params[1] * &params[1])
    }

    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        let digits = working_digits(params);
        let z = Self::standardise(params, x)?;
        let two = Real::from_i64(2);
        let exponent = -(&z * &z).try_div(&two)?;
        let tau = (&two * &pi(digits)?).sqrt()?;
        let scale = &params[1] * &tau;
        Ok(exponent.exp().try_div(&scale)?)
    }

    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        let digits = working_digits(params);
        let z = Self::standardise(params, x)?;
        let sqrt_two = Real::from_i64_at(2, digits).sqrt()?;
        let arg = (-&z).try_div(&sqrt_two)?;
        Ok(erfc(&arg)?.try_div(&Real::from_i64(2))?)
    }

    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError> {
        if !p.is_positive() || p.cmp_value(&Real::one()) != std::cmp::Ordering::Less {
            return Err(RegistryError::Numeric(NumericError::DomainError {
                function: "inverse_cdf",
                argument: p.to_decimal_string(),
            }));
        }
        let digits = working_digits(params).min(p.precision_digits());
        let seed = standard_quantile_seed(p.to_f64());
        let z0 = Real::from_f64(seed)?;
        let objective = |z: &Real| -> Result<Real, NumericError> {
            let sqrt_two = Real::from_i64_at(2, digits + 4).sqrt()?;
            let arg = (-z).try_div(&sqrt_two)?;
            let cdf = erfc(&arg)?.try_div(&Real::from_i64(2))?;
            Ok(&cdf - p)
        };
        let slope = |z: &Real| -> Result<Real, NumericError> {
            let two = Real::from_i64(2);
            let exponent = -(z * z).try_div(&two)?;
            let tau = (&two * &pi(digits + 4)?).sqrt()?;
            exponent.exp().try_div(&tau)
        };
        let z = newton_refine(objective, slope, z0, digits)?;
        Ok(&params[0] + &(&params[1] * &z))
    }

    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let sampler = rand_distr::Normal::new(params[0].to_f64(), params[1].to_f64())
            .map_err(|e| sampler_error(self.name(), e))?;
        Ok(Real::from_f64(sampler.sample(rng))?)
    }
}

/// Acklam's rational approximation to the standard normal quantile.
///
/// Accurate to roughly 1.15e-9 over the open unit interval; used only
/// as the Newton seed, so machine precision is sufficient.
fn standard_quantile_seed<T: Float>(p: T) -> T {
    let one = T::one();
    let half = T::from(0.5).unwrap();
    let neg_two = T::from(-2.0).unwrap();

    // Acklam coefficient tables
    let a: [T; 6] = [
        T::from(-3.969683028665376e+01).unwrap(),
        T::from(2.209460984245205e+02).unwrap(),
        T::from(-2.759285104469687e+02).unwrap(),
        T::from(1.383577518672690e+02).unwrap(),
        T::from(-3.066479806614716e+01).unwrap(),
        T::from(2.506628277459239e+00).unwrap(),
    ];
    let b: [T; 5] = [
        T::from(-5.447609879822406e+01).unwrap(),
        T::from(1.615858368580409e+02).unwrap(),
        T::from(-1.556989798598866e+02).unwrap(),
        T::from(6.680131188771972e+01).unwrap(),
        T::from(-1.328068155288572e+01).unwrap(),
    ];
    let c: [T; 6] = [
        T::from(-7.784894002430293e-03).unwrap(),
        T::from(-3.223964580411365e-01).unwrap(),
        T::from(-2.400758277161838e+00).unwrap(),
        T::from(-2.549732539343734e+00).unwrap(),
        T::from(4.374664141464968e+00).unwrap(),
        T::from(2.938163982698783e+00).unwrap(),
    ];
    let d: [T; 4] = [
        T::from(7.784695709041462e-03).unwrap(),
        T::from(3.224671290700398e-01).unwrap(),
        T::from(2.445134137142996e+00).unwrap(),
        T::from(3.754408661907416e+00).unwrap(),
    ];
    let p_low = T::from(0.02425).unwrap();
    let p = p
        .max(T::min_positive_value())
        .min(one - T::epsilon());

    if p < p_low {
        let q = (neg_two * p.ln()).sqrt();
        (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + one)
    } else if p <= one - p_low {
        let q = p - half;
        let r = q * q;
        (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
            / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + one)
    } else {
        let q = (neg_two * (one - p).ln()).sqrt();
        -(((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + one)
    }
}
