//! Bernoulli family.

use rand::RngCore;
use rand_distr::Distribution as _;
use stochast_core::{NumericError, Real};

use super::{sampler_error, Family, FamilyKind};
use crate::error::RegistryError;
use crate::params::{Constraint, ParamSpec};
use crate::support::Support;

static SPECS: [ParamSpec; 1] = [ParamSpec::new("p", Constraint::UnitInterval)];

/// The Bernoulli family `Bernoulli(p)`: mass `1 - p` at zero and `p`
/// at one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bernoulli;

impl Family for Bernoulli {
    fn name(&self) -> &'static str {
        "bernoulli"
    }

    fn kind(&self) -> FamilyKind {
        FamilyKind::Discrete
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &SPECS
    }

    fn support(&self, _params: &[Real]) -> Support {
        Support::integer_range(Real::zero(), Real::one())
    }

    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok(params[0].clone())
    }

    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError> {
        let q = &Real::one() - &params[0];
        Ok(&params[0] * &q)
    }

    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        if x.is_zero() {
            Ok(&Real::one() - &params[0])
        } else if x.cmp_value(&Real::one()) == std::cmp::Ordering::Equal {
            Ok(params[0].clone())
        } else {
            Ok(Real::zero())
        }
    }

    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        use std::cmp::Ordering::Less;
        if x.is_negative() {
            Ok(Real::zero())
        } else if x.cmp_value(&Real::one()) == Less {
            Ok(&Real::one() - &params[0])
        } else {
            Ok(Real::one())
        }
    }

    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError> {
        if p.is_negative() || p.cmp_value(&Real::one()) == std::cmp::Ordering::Greater {
            return Err(RegistryError::Numeric(NumericError::DomainError {
                function: "inverse_cdf",
                argument: p.to_decimal_string(),
            }));
        }
        let q = &Real::one() - &params[0];
        if p.cmp_value(&q) != std::cmp::Ordering::Greater {
            Ok(Real::zero())
        } else {
            Ok(Real::one())
        }
    }

    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let sampler = rand_distr::Bernoulli::new(params[0].to_f64())
            .map_err(|e| sampler_error(self.name(), e))?;
        Ok(Real::from_i64(i64::from(sampler.sample(rng))))
    }
}
