//! Family registry, bound distributions, and composition rules.
//!
//! The [`Registry`] owns one [`DistributionSpec`] per family plus two
//! rule tables consulted during algebraic folding: composition hooks
//! keyed by `(family, family, operator)` that collapse an independent
//! pair of leaves into a single closed-form leaf, and affine hooks
//! that push a scale/shift into a family closed under affine maps.

use std::collections::HashMap;
use std::sync::Arc;

use stochast_core::Real;

use crate::error::RegistryError;
use crate::families::{
    Bernoulli, Binomial, DiscreteUniform, Exponential, Family, FamilyKind, Normal, Poisson,
    Uniform,
};
use crate::support::Support;

/// Arithmetic operator a composition hook is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldOp {
    /// Sum of two independent variables.
    Add,
    /// Difference of two independent variables.
    Sub,
    /// Product of two independent variables.
    Mul,
    /// Quotient of two independent variables.
    Div,
}

/// Immutable descriptor for one registered family.
///
/// Created once at registration and shared by every [`Distribution`]
/// bound from it.
#[derive(Clone)]
pub struct DistributionSpec {
    family: Arc<dyn Family>,
}

impl DistributionSpec {
    /// Wraps a family implementation.
    pub fn new(family: Arc<dyn Family>) -> Self {
        Self { family }
    }

    /// The underlying family.
    #[inline]
    pub fn family(&self) -> &Arc<dyn Family> {
        &self.family
    }

    /// The family name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.family.name()
    }
}

impl std::fmt::Debug for DistributionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionSpec")
            .field("family", &self.name())
            .finish()
    }
}

/// A family bound to concrete parameters.
///
/// Parameters are validated at construction; every delegated call can
/// therefore assume a well-formed vector.
#[derive(Clone)]
pub struct Distribution {
    spec: DistributionSpec,
    params: Vec<Real>,
}

impl Distribution {
    /// The family name.
    #[inline]
    pub fn family_name(&self) -> &'static str {
        self.spec.name()
    }

    /// Continuous or discrete.
    #[inline]
    pub fn kind(&self) -> FamilyKind {
        self.spec.family().kind()
    }

    /// The bound parameter vector.
    #[inline]
    pub fn params(&self) -> &[Real] {
        &self.params
    }

    /// The support induced by the bound parameters.
    pub fn support(&self) -> Support {
        self.spec.family().support(&self.params)
    }

    /// Closed-form mean.
    pub fn mean(&self) -> Result<Real, RegistryError> {
        self.spec.family().mean(&self.params)
    }

    /// Closed-form variance.
    pub fn variance(&self) -> Result<Real, RegistryError> {
        self.spec.family().variance(&self.params)
    }

    /// Closed-form standard deviation.
    pub fn std_dev(&self) -> Result<Real, RegistryError> {
        Ok(self.variance()?.sqrt()?)
    }

    /// Density (or mass) at `x`.
    pub fn pdf(&self, x: &Real) -> Result<Real, RegistryError> {
        self.spec.family().pdf(&self.params, x)
    }

    /// Cumulative distribution function.
    pub fn cdf(&self, x: &Real) -> Result<Real, RegistryError> {
        self.spec.family().cdf(&self.params, x)
    }

    /// Quantile function.
    pub fn inverse_cdf(&self, p: &Real) -> Result<Real, RegistryError> {
        self.spec.family().inverse_cdf(&self.params, p)
    }

    /// Draws one variate.
    pub fn draw(&self, rng: &mut dyn rand::RngCore) -> Result<Real, RegistryError> {
        self.spec.family().draw(&self.params, rng)
    }

    /// Whether `other` is bound from the same family with value-equal
    /// parameters.
    pub fn same_parameterisation(&self, other: &Distribution) -> bool {
        self.family_name() == other.family_name()
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.cmp_value(b) == std::cmp::Ordering::Equal)
    }
}

impl std::fmt::Debug for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distribution")
            .field("family", &self.family_name())
            .field("params", &self.params)
            .finish()
    }
}

/// Collapses an independent pair of bound leaves under a [`FoldOp`].
///
/// Returns `Ok(None)` when the pair has no closed form under this rule,
/// which is not an error.
pub type ComposeHook =
    fn(&Registry, &Distribution, &Distribution) -> Result<Option<Distribution>, RegistryError>;

/// Pushes `scale * X + shift` into a family closed under affine maps.
pub type AffineHook =
    fn(&Registry, &Distribution, &Real, &Real) -> Result<Option<Distribution>, RegistryError>;

/// The family registry.
pub struct Registry {
    families: HashMap<&'static str, DistributionSpec>,
    compose_hooks: HashMap<(&'static str, &'static str, FoldOp), ComposeHook>,
    affine_hooks: HashMap<&'static str, AffineHook>,
}

impl Registry {
    /// An empty registry with no families or rules.
    pub fn new() -> Self {
        Self {
            families: HashMap::new(),
            compose_hooks: HashMap::new(),
            affine_hooks: HashMap::new(),
        }
    }

    /// A registry preloaded with the built-in families and their
    /// composition and affine rules.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        // Registration of fresh names into an empty registry cannot
        // collide.
        let builtins: [Arc<dyn Family>; 7] = [
            Arc::new(Normal),
            Arc::new(Uniform),
            Arc::new(Exponential),
            Arc::new(Bernoulli),
            Arc::new(Binomial),
            Arc::new(Poisson),
            Arc::new(DiscreteUniform),
        ];
        for family in builtins {
            let spec = DistributionSpec::new(family);
            registry.families.insert(spec.name(), spec);
        }

        registry.register_compose_hook("normal", "normal", FoldOp::Add, compose_normal_sum);
        registry.register_compose_hook("normal", "normal", FoldOp::Sub, compose_normal_diff);
        registry.register_compose_hook("poisson", "poisson", FoldOp::Add, compose_poisson_sum);
        registry.register_compose_hook("binomial", "binomial", FoldOp::Add, compose_binomial_sum);
        registry.register_compose_hook(
            "bernoulli",
            "bernoulli",
            FoldOp::Add,
            compose_bernoulli_sum,
        );

        registry.register_affine_hook("normal", affine_normal);
        registry.register_affine_hook("uniform", affine_uniform);
        registry.register_affine_hook("exponential", affine_exponential);
        registry.register_affine_hook("discrete_uniform", affine_discrete_uniform);
        registry
    }

    /// Registers a family.
    pub fn register(&mut self, family: Arc<dyn Family>) -> Result<(), RegistryError> {
        let spec = DistributionSpec::new(family);
        if self.families.contains_key(spec.name()) {
            return Err(RegistryError::DuplicateFamily(spec.name().to_string()));
        }
        self.families.insert(spec.name(), spec);
        Ok(())
    }

    /// Looks up a registered family descriptor.
    pub fn get(&self, name: &str) -> Result<&DistributionSpec, RegistryError> {
        self.families
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFamily(name.to_string()))
    }

    /// Binds a family to a parameter vector, validating every
    /// constraint.
    pub fn instantiate(&self, name: &str, params: Vec<Real>) -> Result<Distribution, RegistryError> {
        let spec = self.get(name)?.clone();
        spec.family().validate(&params)?;
        Ok(Distribution { spec, params })
    }

    /// Installs (or replaces) a composition hook.
    pub fn register_compose_hook(
        &mut self,
        lhs: &'static str,
        rhs: &'static str,
        op: FoldOp,
        hook: ComposeHook,
    ) {
        self.compose_hooks.insert((lhs, rhs, op), hook);
    }

    /// Installs (or replaces) an affine hook.
    pub fn register_affine_hook(&mut self, family: &'static str, hook: AffineHook) {
        self.affine_hooks.insert(family, hook);
    }

    /// Attempts to collapse `lhs op rhs` (independent operands) into a
    /// single bound distribution. `Ok(None)` means no rule applies.
    pub fn compose(
        &self,
        op: FoldOp,
        lhs: &Distribution,
        rhs: &Distribution,
    ) -> Result<Option<Distribution>, RegistryError> {
        match self
            .compose_hooks
            .get(&(lhs.family_name(), rhs.family_name(), op))
        {
            Some(hook) => hook(self, lhs, rhs),
            None => Ok(None),
        }
    }

    /// Attempts to express `scale * X + shift` within `dist`'s family.
    /// `Ok(None)` means the family is not closed under this map.
    pub fn affine(
        &self,
        dist: &Distribution,
        scale: &Real,
        shift: &Real,
    ) -> Result<Option<Distribution>, RegistryError> {
        match self.affine_hooks.get(dist.family_name()) {
            Some(hook) => hook(self, dist, scale, shift),
            None => Ok(None),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn normal_sum_params(
    lhs: &Distribution,
    rhs: &Distribution,
    negate_rhs_mean: bool,
) -> Result<Vec<Real>, RegistryError> {
    let mu = if negate_rhs_mean {
        &lhs.params()[0] - &rhs.params()[0]
    } else {
        &lhs.params()[0] + &rhs.params()[0]
    };
    let var = &(&lhs.params()[1] * &lhs.params()[1]) + &(&rhs.params()[1] * &rhs.params()[1]);
    Ok(vec![mu, var.sqrt()?])
}

fn compose_normal_sum(
    registry: &Registry,
    lhs: &Distribution,
    rhs: &Distribution,
) -> Result<Option<Distribution>, RegistryError> {
    let params = normal_sum_params(lhs, rhs, false)?;
    registry.instantiate("normal", params).map(Some)
}

fn compose_normal_diff(
    registry: &Registry,
    lhs: &Distribution,
    rhs: &Distribution,
) -> Result<Option<Distribution>, RegistryError> {
    let params = normal_sum_params(lhs, rhs, true)?;
    registry.instantiate("normal", params).map(Some)
}

fn compose_poisson_sum(
    registry: &Registry,
    lhs: &Distribution,
    rhs: &Distribution,
) -> Result<Option<Distribution>, RegistryError> {
    let rate = &lhs.params()[0] + &rhs.params()[0];
    registry.instantiate("poisson", vec![rate]).map(Some)
}

fn compose_binomial_sum(
    registry: &Registry,
    lhs: &Distribution,
    rhs: &Distribution,
) -> Result<Option<Distribution>, RegistryError> {
    // Closed only for a shared success probability.
    if lhs.params()[1].cmp_value(&rhs.params()[1]) != std::cmp::Ordering::Equal {
        return Ok(None);
    }
    let n = &lhs.params()[0] + &rhs.params()[0];
    let p = lhs.params()[1].clone();
    registry.instantiate("binomial", vec![n, p]).map(Some)
}

fn compose_bernoulli_sum(
    registry: &Registry,
    lhs: &Distribution,
    rhs: &Distribution,
) -> Result<Option<Distribution>, RegistryError> {
    if lhs.params()[0].cmp_value(&rhs.params()[0]) != std::cmp::Ordering::Equal {
        return Ok(None);
    }
    let p = lhs.params()[0].clone();
    registry
        .instantiate("binomial", vec![Real::from_i64(2), p])
        .map(Some)
}

fn affine_normal(
    registry: &Registry,
    dist: &Distribution,
    scale: &Real,
    shift: &Real,
) -> Result<Option<Distribution>, RegistryError> {
    if scale.is_zero() {
        // Degenerate at `shift`; not expressible as a normal.
        return Ok(None);
    }
    let mu = &(scale * &dist.params()[0]) + shift;
    let sigma = &scale.abs() * &dist.params()[1];
    registry.instantiate("normal", vec![mu, sigma]).map(Some)
}

fn affine_uniform(
    registry: &Registry,
    dist: &Distribution,
    scale: &Real,
    shift: &Real,
) -> Result<Option<Distribution>, RegistryError> {
    if scale.is_zero() {
        return Ok(None);
    }
    let a = &(scale * &dist.params()[0]) + shift;
    let b = &(scale * &dist.params()[1]) + shift;
    // A negative scale reverses the endpoints.
    let params = if a.cmp_value(&b) == std::cmp::Ordering::Less {
        vec![a, b]
    } else {
        vec![b, a]
    };
    registry.instantiate("uniform", params).map(Some)
}

fn affine_exponential(
    registry: &Registry,
    dist: &Distribution,
    scale: &Real,
    shift: &Real,
) -> Result<Option<Distribution>, RegistryError> {
    // Closed only under positive scaling with no shift.
    if !scale.is_positive() || !shift.is_zero() {
        return Ok(None);
    }
    let rate = dist.params()[0].try_div(scale)?;
    registry.instantiate("exponential", vec![rate]).map(Some)
}

fn affine_discrete_uniform(
    registry: &Registry,
    dist: &Distribution,
    scale: &Real,
    shift: &Real,
) -> Result<Option<Distribution>, RegistryError> {
    // Closed only under unit scaling and lattice-preserving shifts.
    let unit = scale.abs().cmp_value(&Real::one()) == std::cmp::Ordering::Equal;
    if !unit || !shift.is_integer() {
        return Ok(None);
    }
    let a = &(scale * &dist.params()[0]) + shift;
    let b = &(scale * &dist.params()[1]) + shift;
    let params = if a.cmp_value(&b) == std::cmp::Ordering::Less {
        vec![a, b]
    } else {
        vec![b, a]
    };
    registry.instantiate("discrete_uniform", params).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn normal(mu: i64, sigma: i64) -> Distribution {
        Registry::with_builtins()
            .instantiate("normal", vec![Real::from_i64(mu), Real::from_i64(sigma)])
            .unwrap()
    }

    #[test]
    fn test_instantiate_unknown_family() {
        let registry = Registry::with_builtins();
        let err = registry.instantiate("cauchy", vec![]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownFamily(_)));
    }

    #[test]
    fn test_instantiate_validates_constraints() {
        let registry = Registry::with_builtins();
        let err = registry
            .instantiate("normal", vec![Real::zero(), Real::from_i64(-1)])
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidParameter { .. }));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::with_builtins();
        let err = registry.register(Arc::new(Normal)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateFamily(_)));
    }

    #[test]
    fn test_normal_sum_composes() {
        let registry = Registry::with_builtins();
        let lhs = normal(1, 3);
        let rhs = normal(2, 4);
        let sum = registry.compose(FoldOp::Add, &lhs, &rhs).unwrap().unwrap();
        assert_eq!(sum.family_name(), "normal");
        assert_relative_eq!(sum.params()[0].to_f64(), 3.0, max_relative = 1e-15);
        assert_relative_eq!(sum.params()[1].to_f64(), 5.0, max_relative = 1e-14);
    }

    #[test]
    fn test_normal_difference_composes() {
        let registry = Registry::with_builtins();
        let lhs = normal(5, 3);
        let rhs = normal(2, 4);
        let diff = registry.compose(FoldOp::Sub, &lhs, &rhs).unwrap().unwrap();
        assert_relative_eq!(diff.params()[0].to_f64(), 3.0, max_relative = 1e-15);
        assert_relative_eq!(diff.params()[1].to_f64(), 5.0, max_relative = 1e-14);
    }

    #[test]
    fn test_normal_product_has_no_rule() {
        let registry = Registry::with_builtins();
        let lhs = normal(0, 1);
        let rhs = normal(0, 1);
        assert!(registry.compose(FoldOp::Mul, &lhs, &rhs).unwrap().is_none());
    }

    #[test]
    fn test_poisson_sum_adds_rates() {
        let registry = Registry::with_builtins();
        let a = registry
            .instantiate("poisson", vec![Real::from_i64(2)])
            .unwrap();
        let b = registry
            .instantiate("poisson", vec![Real::from_i64(5)])
            .unwrap();
        let sum = registry.compose(FoldOp::Add, &a, &b).unwrap().unwrap();
        assert_eq!(sum.params()[0], Real::from_i64(7));
    }

    #[test]
    fn test_binomial_sum_requires_shared_p() {
        let registry = Registry::with_builtins();
        let p3 = Real::parse("0.3").unwrap();
        let p4 = Real::parse("0.4").unwrap();
        let a = registry
            .instantiate("binomial", vec![Real::from_i64(5), p3.clone()])
            .unwrap();
        let b = registry
            .instantiate("binomial", vec![Real::from_i64(7), p3])
            .unwrap();
        let c = registry
            .instantiate("binomial", vec![Real::from_i64(7), p4])
            .unwrap();
        let sum = registry.compose(FoldOp::Add, &a, &b).unwrap().unwrap();
        assert_eq!(sum.params()[0], Real::from_i64(12));
        assert!(registry.compose(FoldOp::Add, &a, &c).unwrap().is_none());
    }

    #[test]
    fn test_bernoulli_sum_becomes_binomial() {
        let registry = Registry::with_builtins();
        let p = Real::parse("0.5").unwrap();
        let a = registry.instantiate("bernoulli", vec![p.clone()]).unwrap();
        let b = registry.instantiate("bernoulli", vec![p]).unwrap();
        let sum = registry.compose(FoldOp::Add, &a, &b).unwrap().unwrap();
        assert_eq!(sum.family_name(), "binomial");
        assert_eq!(sum.params()[0], Real::from_i64(2));
    }

    #[test]
    fn test_affine_normal() {
        let registry = Registry::with_builtins();
        let x = normal(100, 15);
        let scaled = registry
            .affine(&x, &Real::from_i64(-2), &Real::from_i64(10))
            .unwrap()
            .unwrap();
        assert_relative_eq!(scaled.params()[0].to_f64(), -190.0, max_relative = 1e-15);
        assert_relative_eq!(scaled.params()[1].to_f64(), 30.0, max_relative = 1e-15);
    }

    #[test]
    fn test_affine_uniform_negative_scale_reorders() {
        let registry = Registry::with_builtins();
        let x = registry
            .instantiate("uniform", vec![Real::zero(), Real::one()])
            .unwrap();
        let mapped = registry
            .affine(&x, &Real::from_i64(-3), &Real::zero())
            .unwrap()
            .unwrap();
        assert_relative_eq!(mapped.params()[0].to_f64(), -3.0, max_relative = 1e-15);
        assert!(mapped.params()[1].is_zero());
    }

    #[test]
    fn test_affine_exponential_shift_not_closed() {
        let registry = Registry::with_builtins();
        let x = registry
            .instantiate("exponential", vec![Real::from_i64(2)])
            .unwrap();
        assert!(registry
            .affine(&x, &Real::one(), &Real::one())
            .unwrap()
            .is_none());
        let scaled = registry
            .affine(&x, &Real::from_i64(4), &Real::zero())
            .unwrap()
            .unwrap();
        assert_relative_eq!(scaled.params()[0].to_f64(), 0.5, max_relative = 1e-15);
    }

    #[test]
    fn test_same_parameterisation_is_value_based() {
        let registry = Registry::with_builtins();
        let a = registry
            .instantiate("normal", vec![Real::from_i64(1), Real::from_i64(2)])
            .unwrap();
        let b = registry
            .instantiate(
                "normal",
                vec![Real::from_i64_at(1, 50), Real::from_i64_at(2, 50)],
            )
            .unwrap();
        assert!(a.same_parameterisation(&b));
    }
}
