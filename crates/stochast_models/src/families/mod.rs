//! Distribution families.
//!
//! A [`Family`] bundles everything the evaluation engine needs to know
//! about one parametric family: parameter specifications, support,
//! closed-form moments, density/mass, CDF, quantile, and a sampling
//! hook. All analytic quantities are expressed in backend arithmetic
//! ([`Real`]); the sampling hook works in `f64` for throughput and
//! promotes the draw afterwards.

use rand::RngCore;
use stochast_core::backend::{current_config, Real};

use crate::error::RegistryError;
use crate::params::ParamSpec;
use crate::support::Support;

mod bernoulli;
mod binomial;
mod discrete_uniform;
mod exponential;
mod normal;
mod poisson;
mod uniform;

pub use bernoulli::Bernoulli;
pub use binomial::Binomial;
pub use discrete_uniform::DiscreteUniform;
pub use exponential::Exponential;
pub use normal::Normal;
pub use poisson::Poisson;
pub use uniform::Uniform;

/// Whether a family places mass on an integer lattice or density on an
/// interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    /// Density over an interval of the real line.
    Continuous,
    /// Probability mass on integer lattice points.
    Discrete,
}

/// A parametric distribution family.
///
/// Implementations must be cheap to share: all state lives in the
/// parameter vector passed to each call, never in the family itself.
pub trait Family: Send + Sync {
    /// Stable family name used for registry lookup and composition
    /// rules.
    fn name(&self) -> &'static str;

    /// Continuous or discrete.
    fn kind(&self) -> FamilyKind;

    /// Ordered parameter specifications.
    fn param_specs(&self) -> &'static [ParamSpec];

    /// Validates a parameter vector against [`Family::param_specs`].
    ///
    /// The default checks arity and per-parameter constraints; families
    /// with joint constraints (such as ordered interval endpoints)
    /// extend it.
    fn validate(&self, params: &[Real]) -> Result<(), RegistryError> {
        validate_against_specs(self.name(), self.param_specs(), params)
    }

    /// The support induced by `params`.
    fn support(&self, params: &[Real]) -> Support;

    /// Closed-form mean.
    fn mean(&self, params: &[Real]) -> Result<Real, RegistryError>;

    /// Closed-form variance.
    fn variance(&self, params: &[Real]) -> Result<Real, RegistryError>;

    /// Density at `x` for continuous families, mass at `x` for
    /// discrete ones (zero off the lattice).
    fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError>;

    /// Cumulative distribution function `P(X <= x)`.
    fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError>;

    /// Quantile function: the smallest `x` with `cdf(x) >= p`, for
    /// `p` in the open unit interval.
    fn inverse_cdf(&self, params: &[Real], p: &Real) -> Result<Real, RegistryError>;

    /// Draws one variate.
    ///
    /// The default routes a uniform `f64` through
    /// [`Family::inverse_cdf`]; families override it with a dedicated
    /// `rand_distr` sampler where one exists.
    fn draw(&self, params: &[Real], rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
        let u = uniform_open(rng);
        let p = Real::from_f64(u).map_err(RegistryError::Numeric)?;
        self.inverse_cdf(params, &p)
    }
}

/// Checks arity and per-parameter constraints.
pub(crate) fn validate_against_specs(
    family: &str,
    specs: &'static [ParamSpec],
    params: &[Real],
) -> Result<(), RegistryError> {
    if params.len() != specs.len() {
        return Err(RegistryError::InvalidParameter {
            family: family.to_string(),
            parameter: "arity".to_string(),
            constraint: format!("expected {} parameters, got {}", specs.len(), params.len()),
        });
    }
    for (spec, value) in specs.iter().zip(params) {
        if !spec.constraint.check(value) {
            return Err(RegistryError::InvalidParameter {
                family: family.to_string(),
                parameter: spec.name.to_string(),
                constraint: spec.constraint.describe().to_string(),
            });
        }
    }
    Ok(())
}

/// Uniform draw on the open interval (0, 1).
///
/// Endpoint draws are nudged inside so quantile functions never see a
/// degenerate probability.
pub(crate) fn uniform_open(rng: &mut dyn RngCore) -> f64 {
    use rand::Rng;
    let u: f64 = rng.gen();
    u.clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

/// Working precision for family mathematics: the coarsest parameter
/// precision, or the configured default for parameter-free calls.
pub(crate) fn working_digits(params: &[Real]) -> u32 {
    params
        .iter()
        .map(Real::precision_digits)
        .min()
        .unwrap_or_else(|| current_config().digits())
}

/// Maps an unexpected `rand_distr` constructor failure onto the
/// registry error taxonomy. Reached only if a parameter validated in
/// backend arithmetic degenerates when narrowed to `f64`.
pub(crate) fn sampler_error(family: &str, detail: impl std::fmt::Display) -> RegistryError {
    RegistryError::InvalidParameter {
        family: family.to_string(),
        parameter: "sampler".to_string(),
        constraint: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Constraint;

    #[test]
    fn test_validate_arity_mismatch() {
        static SPECS: [ParamSpec; 1] = [ParamSpec::new("p", Constraint::UnitInterval)];
        let err = validate_against_specs("bernoulli", &SPECS, &[]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidParameter { .. }));
    }

    #[test]
    fn test_validate_constraint_violation() {
        static SPECS: [ParamSpec; 1] = [ParamSpec::new("sigma", Constraint::Positive)];
        let err = validate_against_specs("normal", &SPECS, &[Real::zero()]).unwrap_err();
        match err {
            RegistryError::InvalidParameter { parameter, .. } => assert_eq!(parameter, "sigma"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_working_digits_takes_coarsest() {
        let a = Real::from_i64_at(1, 10);
        let b = Real::from_i64_at(2, 40);
        assert_eq!(working_digits(&[a, b]), 10);
    }

    #[test]
    fn test_uniform_open_stays_interior() {
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let u = uniform_open(&mut rng);
        assert!(u > 0.0 && u < 1.0);
    }
}
