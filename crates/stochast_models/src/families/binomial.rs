//! Binomial family.

use rand::RngCore;
use rand_distr::Distribution as _;
use stochast_core::math::special::ln_factorial;
use stochast_core::{NumericError, Real};

use super::{sampler_error, validate_against_specs, working_digits, Family, FamilyKind};
use crate::error::RegistryError;
use crate::params::{Constraint, ParamSpec};
use crate::support::Support;

static SPECS: [ParamSpec; 2] = [
    ParamSpec::new("n", Constraint::NonNegativeInteger),
    ParamSpec::new("p", Constraint::UnitInterval),
];

/// Guard digits absorbing cancellation in the log-binomial
/// coefficient.
const COEFFICIENT_GUARD: u32 = 10;

/// Largest trial count accepted; keeps the trial count exactly
/// representable when narrowed for sampling.
const MAX_TRIALS: f64 = 9_007_199_254_740_992.0;

/// The binomial family `Binomial(n, p)`: the number of successes in
/// `n` independent Bernoulli trials with success probability `p`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binomial;

impl Binomial {
    fn trials(params: &[Real]) -> u64 {
        params[0].to_f64() as u64
    }

    /// Log-space mass `ln C(n, k) + k ln p + (n - k) ln(1 - p)` for
    /// interior success probabilities.
    fn ln_pmf(n: u64, k: u64, p: &Real, digits: u32) -> Result<Real, NumericError> {
        let work = digits + COEFFICIENT_GUARD;
        let ln_coeff = &(&ln_factorial(n, work)? - &ln_factorial(k, work)?)
            - &ln_factorial(n - k, work)?;
        let p_w = p.with_precision_digits(work);
        let q_w = &Real::from_i64_at(1, work) - &p_w;
        let successes = &Real::from_i64_at(k as i64, work) * &p_w.ln()?;
        let failures = &Real::from_i64_at((n - k) as i64, work) * &q_w.ln()?;
        Ok(&(&ln_coeff + &successes) + &failures)
    }

    fn pmf_at(params: &[Real], n: u64, k: u64, digits: u32) -> Result<Real, RegistryError> {
        let p = &params[1];
        if p.is_zero() {
            return Ok(if k == 0 { Real::one() } else { Real::zero() });
        }
        if p.cmp_value(&Real::one()) == std::cmp::Ordering::Equal {
            return Ok(if k == n { Real::one() } else { Real::zero() });
        }
        let ln_mass = Self::ln_pmf(n, k, p, digits)?;
        Ok(ln_mass.exp().with_precision_digits(digits))
    }
}

impl Family for Binomial {
    fn name(&self) -> &'static str {
        "binomial"
    }

    fn kind(&self) -> FamilyKind {
        FamilyKind::Discrete
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &SPECS
    }

    fn validate(&self, params: &[Real]) -> Result<(), RegistryError> {
        validate_against_specs(self.name(), &SPECS, params)?;
        if params[0].to_f64() > MAX_TRIALS {
            return Err(RegistryError::InvalidParameter {
                family: self.name().to_string(),
                parameter: "n".to_string(),
                constraint: "must not exceed 2^53 trials".to_string(),
            });
        }
        Ok(())
    }

    fn support(&self, params: &[Real]) -> Support {
        Support::integer_range(Real::zero(), params[0].clone())
    }

    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok(&params[0] * &params[1])
    }

    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError> {
        let q = &Real::one() - &params[1];
        Ok(&(&params[0] * &params[1]) * &q)
    }

    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        if !x.is_integer() || x.is_negative() || params[0].cmp_value(x) == std::cmp::Ordering::Less
        {
            return Ok(Real::zero());
        }
        let digits = working_digits(params);
        let n = Self::trials(params);
        let k = x.to_f64() as u64;
        Self::pmf_at(params, n, k, digits)
    }

    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        if x.is_negative() {
            return Ok(Real::zero());
        }
        if params[0].cmp_value(x) != std::cmp::Ordering::Greater {
            return Ok(Real::one());
        }
        let digits = working_digits(params);
        let n = Self::trials(params);
        let top = x.floor().to_f64() as u64;
        let mut total = Real::from_i64_at(0, digits + COEFFICIENT_GUARD);
        for k in 0..=top {
            total = &total + &Self::pmf_at(params, n, k, digits + COEFFICIENT_GUARD)?;
        }
        Ok(total.with_precision_digits(digits))
    }

    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError> {
        if p.is_negative() || p.cmp_value(&Real::one()) == std::cmp::Ordering::Greater {
            return Err(RegistryError::Numeric(NumericError::DomainError {
                function: "inverse_cdf",
                argument: p.to_decimal_string(),
            }));
        }
        let digits = working_digits(params);
        let n = Self::trials(params);
        let mut cumulative = Real::from_i64_at(0, digits + COEFFICIENT_GUARD);
        for k in 0..=n {
            cumulative = &cumulative + &Self::pmf_at(params, n, k, digits + COEFFICIENT_GUARD)?;
            if cumulative.cmp_value(p) != std::cmp::Ordering::Less {
                return Ok(Real::from_i64_at(k as i64, digits));
            }
        }
        Ok(params[0].clone())
    }

    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let sampler = rand_distr::Binomial::new(Self::trials(params), params[1].to_f64())
            .map_err(|e| sampler_error(self.name(), e))?;
        Ok(Real::from_f64(sampler.sample(rng) as f64)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fair_ten() -> Vec<Real> {
        vec![Real::from_i64(10), Real::parse("0.5").unwrap()]
    }

    #[test]
    fn test_pmf_central_term() {
        // C(10, 5) / 2^10 = 252 / 1024
        let pmf = Binomial.pdf(&fair_ten(), &Real::from_i64(5)).unwrap();
        assert_relative_eq!(pmf.to_f64(), 252.0 / 1024.0, max_relative = 1e-14);
    }

    #[test]
    fn test_pmf_off_support() {
        assert!(Binomial.pdf(&fair_ten(), &Real::from_i64(11)).unwrap().is_zero());
        assert!(Binomial.pdf(&fair_ten(), &Real::from_i64(-1)).unwrap().is_zero());
        let half = Real::parse("2.5").unwrap();
        assert!(Binomial.pdf(&fair_ten(), &half).unwrap().is_zero());
    }

    #[test]
    fn test_degenerate_success_probability() {
        let certain = vec![Real::from_i64(4), Real::one()];
        assert_eq!(Binomial.pdf(&certain, &Real::from_i64(4)).unwrap(), Real::one());
        assert!(Binomial.pdf(&certain, &Real::from_i64(3)).unwrap().is_zero());
    }

    #[test]
    fn test_cdf_accumulates() {
        let cdf = Binomial.cdf(&fair_ten(), &Real::from_i64(5)).unwrap();
        assert_relative_eq!(cdf.to_f64(), 0.623046875, max_relative = 1e-13);
        assert_eq!(Binomial.cdf(&fair_ten(), &Real::from_i64(10)).unwrap(), Real::one());
    }

    #[test]
    fn test_inverse_cdf_median() {
        let q = Binomial
            .inverse_cdf(&fair_ten(), &Real::parse("0.5").unwrap())
            .unwrap();
        assert_eq!(q, Real::from_i64(5));
    }

    #[test]
    fn test_moments() {
        let var = Binomial.variance(&fair_ten()).unwrap();
        assert_relative_eq!(var.to_f64(), 2.5, max_relative = 1e-14);
        let mean = Binomial.mean(&fair_ten()).unwrap();
        assert_relative_eq!(mean.to_f64(), 5.0, max_relative = 1e-15);
    }
}
