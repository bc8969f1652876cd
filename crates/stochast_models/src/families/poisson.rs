//! Poisson family.

use rand::RngCore;
use rand_distr::Distribution as _;
use stochast_core::math::special::ln_factorial;
use stochast_core::{NumericError, Real};

use super::{sampler_error, working_digits, Family, FamilyKind};
use crate::error::RegistryError;
use crate::params::{Constraint, ParamSpec};
use crate::support::Support;

static SPECS: [ParamSpec; 1] = [ParamSpec::new("rate", Constraint::Positive)];

/// Guard digits for the log-space mass evaluation.
const MASS_GUARD: u32 = 10;

/// Hard cap on quantile walks; beyond this the last lattice point
/// reached is returned.
const MAX_QUANTILE_STEPS: u64 = 10_000_000;

/// The Poisson family `Poisson(rate)`: counts of events arriving at a
/// constant rate, with mass on the non-negative integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Poisson;

impl Poisson {
    /// `exp(-rate + k ln rate - ln k!)` evaluated in log space.
    fn pmf_at(rate: &Real, k: u64, digits: u32) -> Result<Real, NumericError> {
        let work = digits + MASS_GUARD;
        let rate_w = rate.with_precision_digits(work);
        let ln_rate = rate_w.ln()?;
        let ln_mass = &(&(&Real::from_i64_at(k as i64, work) * &ln_rate) - &rate_w)
            - &ln_factorial(k, work)?;
        Ok(ln_mass.exp().with_precision_digits(digits))
    }
}

impl Family for Poisson {
    fn name(&self) -> &'static str {
        "poisson"
    }

    fn kind(&self) -> FamilyKind {
        FamilyKind::Discrete
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &SPECS
    }

    fn support(&self, _params: &[Real]) -> Support {
        Support::integers_from(Real::zero())
    }

    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok(params[0].clone())
    }

    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok(params[0].clone())
    }

    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        if !x.is_integer() || x.is_negative() {
            return Ok(Real::zero());
        }
        let digits = working_digits(params);
        Ok(Self::pmf_at(&params[0], x.to_f64() as u64, digits)?)
    }

    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        if x.is_negative() {
            return Ok(Real::zero());
        }
        let digits = working_digits(params);
        let top = x.floor().to_f64() as u64;
        let mut total = Real::from_i64_at(0, digits + MASS_GUARD);
        for k in 0..=top {
            total = &total + &Self::pmf_at(&params[0], k, digits + MASS_GUARD)?;
        }
        Ok(total.with_precision_digits(digits))
    }

    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError> {
        if p.is_negative() || p.cmp_value(&Real::one()) != std::cmp::Ordering::Less {
            return Err(RegistryError::Numeric(NumericError::DomainError {
                function: "inverse_cdf",
                argument: p.to_decimal_string(),
            }));
        }
        let digits = working_digits(params);
        let mut cumulative = Real::from_i64_at(0, digits + MASS_GUARD);
        let mut k = 0u64;
        loop {
            cumulative = &cumulative + &Self::pmf_at(&params[0], k, digits + MASS_GUARD)?;
            if cumulative.cmp_value(p) != std::cmp::Ordering::Less || k >= MAX_QUANTILE_STEPS {
                return Ok(Real::from_i64_at(k as i64, digits));
            }
            k += 1;
        }
    }

    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let sampler = rand_distr::Poisson::new(params[0].to_f64())
            .map_err(|e| sampler_error(self.name(), e))?;
        let v: f64 = sampler.sample(rng);
        Ok(Real::from_f64(v)?)
    }
}
