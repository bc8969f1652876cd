//! Exponential family.

use rand::RngCore;
use rand_distr::Distribution as _;
use stochast_core::{NumericError, Real};

use super::{sampler_error, Family, FamilyKind};
use crate::error::RegistryError;
use crate::params::{Constraint, ParamSpec};
use crate::support::Support;

static SPECS: [ParamSpec; 1] = [ParamSpec::new("rate", Constraint::Positive)];

/// The exponential family `Exponential(rate)` with density
/// `rate * exp(-rate * x)` on the non-negative half line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exponential;

impl Family for Exponential {
    fn name(&self) -> &'static str {
        "exponential"
    }

    fn kind(&self) -> FamilyKind {
        FamilyKind::Continuous
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &SPECS
    }

    fn support(&self, _params: &[Real]) -> Support {
        Support::half_line(Real::zero())
    }

    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok(Real::one().try_div(&params[0])?)
    }

    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError> {
        let rate_sq = &params[0] * &params[0];
        Ok(Real::one().try_div(&rate_sq)?)
    }

    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        if x.is_negative() {
            return Ok(Real::zero());
        }
        let exponent = -(&params[0] * x);
        Ok(&params[0] * &exponent.exp())
    }

    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        if x.is_negative() {
            return Ok(Real::zero());
        }
        let exponent = -(&params[0] * x);
        Ok(&Real::one() - &exponent.exp())
    }

    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError> {
        if p.is_negative() || p.cmp_value(&Real::one()) != std::cmp::Ordering::Less {
            return Err(RegistryError::Numeric(NumericError::DomainError {
                function: "inverse_cdf",
                argument: p.to_decimal_string(),
            }));
        }
        let survivor = &Real::one() - p;
        Ok((-&survivor.ln()?).try_div(&params[0])?)
    }

    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let sampler = rand_distr::Exp::new(params[0].to_f64())
            .map_err(|e| sampler_error(self.name(), e))?;
        Ok(Real::from_f64(sampler.sample(rng))?)
    }
}
