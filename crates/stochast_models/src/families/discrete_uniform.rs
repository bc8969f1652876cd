//! Discrete uniform family.

use rand::{Rng, RngCore};
use stochast_core::{NumericError, Real};

use super::{validate_against_specs, Family, FamilyKind};
use crate::error::RegistryError;
use crate::params::{Constraint, ParamSpec};
use crate::support::Support;

static SPECS: [ParamSpec; 2] = [
    ParamSpec::new("lower", Constraint::Integer),
    ParamSpec::new("upper", Constraint::Integer),
];

/// The discrete uniform family `DiscreteUniform(lower, upper)`: equal
/// mass on each integer in `[lower, upper]`. A fair die is
/// `DiscreteUniform(1, 6)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscreteUniform;

impl DiscreteUniform {
    /// Number of lattice points, `upper - lower + 1`.
    fn count(params: &[Real]) -> Real {
        &(&params[1] - &params[0]) + &Real::one()
    }
}

impl Family for DiscreteUniform {
    fn name(&self) -> &'static str {
        "discrete_uniform"
    }

    fn kind(&self) -> FamilyKind {
        FamilyKind::Discrete
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &SPECS
    }

    fn validate(&self, params: &[Real]) -> Result<(), RegistryError> {
        validate_against_specs(self.name(), &SPECS, params)?;
        if params[1].cmp_value(&params[0]) == std::cmp::Ordering::Less {
            return Err(RegistryError::InvalidParameter {
                family: self.name().to_string(),
                parameter: "upper".to_string(),
                constraint: "must not be less than lower".to_string(),
            });
        }
        Ok(())
    }

    fn support(&self, params: &[Real]) -> Support {
        Support::integer_range(params[0].clone(), params[1].clone())
    }

    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok((&params[0] + &params[1]).try_div(&Real::from_i64(2))?)
    }

    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError> {
        // (count^2 - 1) / 12
        let count = Self::count(params);
        let span = &(&count * &count) - &Real::one();
        Ok(span.try_div(&Real::from_i64(12))?)
    }

    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        use std::cmp::Ordering::Less;
        if !x.is_integer()
            || x.cmp_value(&params[0]) == Less
            || params[1].cmp_value(x) == Less
        {
            return Ok(Real::zero());
        }
        Ok(Real::one().try_div(&Self::count(params))?)
    }

    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        use std::cmp::Ordering::Less;
        if x.cmp_value(&params[0]) == Less {
            return Ok(Real::zero());
        }
        if params[1].cmp_value(x) != std::cmp::Ordering::Greater {
            return Ok(Real::one());
        }
        let reached = &(&x.floor() - &params[0]) + &Real::one();
        Ok(reached.try_div(&Self::count(params))?)
    }

    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError> {
        if p.is_negative() || p.cmp_value(&Real::one()) == std::cmp::Ordering::Greater {
            return Err(RegistryError::Numeric(NumericError::DomainError {
                function: "inverse_cdf",
                argument: p.to_decimal_string(),
            }));
        }
        // Smallest k with (k - lower + 1) / count >= p, clamped to the
        // support: k = lower + ceil(p * count) - 1.
        let scaled = p * &Self::count(params);
        let offset = &(-&(-&scaled).floor()) - &Real::one();
        let candidate = &params[0] + &offset;
        if candidate.cmp_value(&params[0]) == std::cmp::Ordering::Less {
            return Ok(params[0].clone());
        }
        if params[1].cmp_value(&candidate) == std::cmp::Ordering::Less {
            return Ok(params[1].clone());
        }
        Ok(candidate)
    }

    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let lower = params[0].to_f64() as i64;
        let upper = params[1].to_f64() as i64;
        Ok(Real::from_i64(rng.gen_range(lower..=upper)))
    }
}
