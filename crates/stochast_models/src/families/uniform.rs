//! Continuous uniform family.

use rand::RngCore;
use stochast_core::{NumericError, Real};

use super::{uniform_open, validate_against_specs, Family, FamilyKind};
use crate::error::RegistryError;
use crate::params::{Constraint, ParamSpec};
use crate::support::Support;

static SPECS: [ParamSpec; 2] = [
    ParamSpec::new("lower", Constraint::Real),
    ParamSpec::new("upper", Constraint::Real),
];

/// The continuous uniform family `Uniform(lower, upper)` with
/// `lower < upper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl Uniform {
    fn width(params: &[Real]) -> Real {
        &params[1] - &params[0]
    }
}

impl Family for Uniform {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn kind(&self) -> FamilyKind {
        FamilyKind::Continuous
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &SPECS
    }

    fn validate(&self, params: &[Real]) -> Result<(), RegistryError> {
        validate_against_specs(self.name(), &SPECS, params)?;
        if params[0].cmp_value(&params[1]) != std::cmp::Ordering::Less {
            return Err(RegistryError::InvalidParameter {
                family: self.name().to_string(),
                parameter: "upper".to_string(),
                constraint: "must be strictly greater than lower".to_string(),
            });
        }
        Ok(())
    }

    fn support(&self, params: &[Real]) -> Support {
        Support::interval(params[0].clone(), params[1].clone())
    }

    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
        Ok((&params[0] + &params[1]).try_div(&Real::from_i64(2))?)
    }

    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError> {
        let w = Self::width(params);
        Ok((&w * &w).try_div(&Real::from_i64(12))?)
    }

    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        use std::cmp::Ordering::Less;
        if x.cmp_value(&params[0]) == Less || params[1].cmp_value(x) == Less {
            return Ok(Real::zero());
        }
        Ok(Real::one().try_div(&Self::width(params))?)
    }

    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
        use std::cmp::Ordering::Less;
        if x.cmp_value(&params[0]) == Less {
            return Ok(Real::zero());
        }
        if params[1].cmp_value(x) == Less {
            return Ok(Real::one());
        }
        Ok((x - &params[0]).try_div(&Self::width(params))?)
    }

    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError> {
        if p.is_negative() || p.cmp_value(&Real::one()) == std::cmp::Ordering::Greater {
            return Err(RegistryError::Numeric(NumericError::DomainError {
                function: "inverse_cdf",
                argument: p.to_decimal_string(),
            }));
        }
        Ok(&params[0] + &(p * &Self::width(params)))
    }

    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let a = params[0].to_f64();
        let b = params[1].to_f64();
        let u = uniform_open(rng);
        Ok(Real::from_f64(a + u * (b - a))?)
    }
}
