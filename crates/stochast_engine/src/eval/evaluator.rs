//! Query dispatch.
//!
//! One deterministic dispatcher serves every query: closed forms
//! first, quadrature where a rule applies, Monte Carlo as the
//! unconditional fallback. Pinning a strategy through
//! [`EvalConfig::with_force_strategy`] skips the cascade and surfaces
//! an error when the pinned strategy does not apply.

use std::sync::Arc;

use stochast_core::Real;
use stochast_models::Registry;

use crate::algebra::{normalize, normalize_event};
use crate::error::EvalError;
use crate::expr::{Event, Node, RandomVariable};

use super::config::{EvalConfig, Strategy};
use super::monte_carlo;
use super::quadrature;
use super::result::{EvaluationResult, Provenance};
use super::{exact, quadrature::QuadOutcome};

/// Evaluates expectation, variance, standard deviation, covariance,
/// correlation and probability queries.
///
/// # Examples
///
/// ```rust
/// use stochast_core::Real;
/// use stochast_engine::eval::{EvalConfig, Evaluator};
/// use stochast_engine::expr::RandomVariable;
///
/// let evaluator = Evaluator::new(EvalConfig::new()).unwrap();
/// let iq = RandomVariable::from_distribution(
///     evaluator
///         .registry()
///         .instantiate("normal", vec![Real::from_i64(100), Real::from_i64(15)])
///         .unwrap(),
/// );
/// let mean = evaluator.expectation(&iq).unwrap();
/// assert!(mean.is_exact());
/// assert_eq!(mean.value(), &Real::from_i64(100));
/// ```
pub struct Evaluator {
    registry: Registry,
    config: EvalConfig,
}

impl Evaluator {
    /// Creates an evaluator over the built-in families.
    pub fn new(config: EvalConfig) -> Result<Self, EvalError> {
        Self::with_registry(Registry::with_builtins(), config)
    }

    /// Creates an evaluator over a caller-supplied registry.
    pub fn with_registry(registry: Registry, config: EvalConfig) -> Result<Self, EvalError> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    /// The registry the evaluator folds and instantiates against.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// `E[expr]`.
    pub fn expectation(&self, rv: &RandomVariable) -> Result<EvaluationResult, EvalError> {
        let folded = normalize(&self.registry, rv);

        if let Some(strategy) = self.config.force_strategy() {
            return self.expectation_forced(&folded, strategy);
        }
        if let Some(value) = exact::mean(folded.node())? {
            tracing::debug!(query = "expectation", strategy = "exact", "query dispatched");
            return Ok(EvaluationResult::exact(value));
        }
        if let Some((m1, _)) = quadrature::moments(folded.node(), self.config.quadrature())? {
            tracing::debug!(query = "expectation", strategy = "quadrature", "query dispatched");
            return Ok(EvaluationResult::quadrature(m1.value, m1.error_bound));
        }
        tracing::debug!(query = "expectation", strategy = "monte_carlo", "query dispatched");
        let outcome = monte_carlo::expectation(&folded, self.config.monte_carlo())?;
        Ok(EvaluationResult::monte_carlo(
            outcome.value,
            outcome.samples,
            outcome.std_error,
        ))
    }

    fn expectation_forced(
        &self,
        folded: &RandomVariable,
        strategy: Strategy,
    ) -> Result<EvaluationResult, EvalError> {
        match strategy {
            Strategy::Exact => exact::mean(folded.node())?
                .map(EvaluationResult::exact)
                .ok_or_else(|| unsupported("expectation", "no closed form applies")),
            Strategy::Quadrature => {
                match quadrature::moments(folded.node(), self.config.quadrature())? {
                    Some((m1, _)) => Ok(EvaluationResult::quadrature(m1.value, m1.error_bound)),
                    None => Err(self.quadrature_refusal(folded.node())),
                }
            }
            Strategy::MonteCarlo => {
                let outcome = monte_carlo::expectation(folded, self.config.monte_carlo())?;
                Ok(EvaluationResult::monte_carlo(
                    outcome.value,
                    outcome.samples,
                    outcome.std_error,
                ))
            }
        }
    }

    /// `Var[expr]`.
    pub fn variance(&self, rv: &RandomVariable) -> Result<EvaluationResult, EvalError> {
        let folded = normalize(&self.registry, rv);

        if let Some(strategy) = self.config.force_strategy() {
            return self.variance_forced(&folded, strategy);
        }
        if let Some(value) = exact::variance(folded.node())? {
            tracing::debug!(query = "variance", strategy = "exact", "query dispatched");
            return Ok(EvaluationResult::exact(value));
        }
        if let Some(outcome) = self.variance_by_quadrature(&folded)? {
            tracing::debug!(query = "variance", strategy = "quadrature", "query dispatched");
            return Ok(EvaluationResult::quadrature(
                outcome.value,
                outcome.error_bound,
            ));
        }
        tracing::debug!(query = "variance", strategy = "monte_carlo", "query dispatched");
        let outcome = monte_carlo::variance(&folded, self.config.monte_carlo())?;
        Ok(EvaluationResult::monte_carlo(
            outcome.value,
            outcome.samples,
            outcome.std_error,
        ))
    }

    fn variance_forced(
        &self,
        folded: &RandomVariable,
        strategy: Strategy,
    ) -> Result<EvaluationResult, EvalError> {
        match strategy {
            Strategy::Exact => exact::variance(folded.node())?
                .map(EvaluationResult::exact)
                .ok_or_else(|| unsupported("variance", "no closed form applies")),
            Strategy::Quadrature => match self.variance_by_quadrature(folded)? {
                Some(outcome) => Ok(EvaluationResult::quadrature(
                    outcome.value,
                    outcome.error_bound,
                )),
                None => Err(self.quadrature_refusal(folded.node())),
            },
            Strategy::MonteCarlo => {
                let outcome = monte_carlo::variance(folded, self.config.monte_carlo())?;
                Ok(EvaluationResult::monte_carlo(
                    outcome.value,
                    outcome.samples,
                    outcome.std_error,
                ))
            }
        }
    }

    /// `Var = E[g^2] - E[g]^2` from one quadrature pass.
    fn variance_by_quadrature(
        &self,
        folded: &RandomVariable,
    ) -> Result<Option<QuadOutcome>, EvalError> {
        let Some((m1, m2)) = quadrature::moments(folded.node(), self.config.quadrature())? else {
            return Ok(None);
        };
        let value = &m2.value - &(&m1.value * &m1.value);
        let value = if value.is_negative() {
            Real::zero()
        } else {
            value
        };
        // First-order propagation of both integration bounds.
        let two = Real::from_i64(2);
        let propagated = &(&(&two * &m1.value.abs()) + &m1.error_bound) * &m1.error_bound;
        let error_bound = &m2.error_bound + &propagated;
        Ok(Some(QuadOutcome { value, error_bound }))
    }

    /// `Std[expr]`, derived from the variance query.
    pub fn std_dev(&self, rv: &RandomVariable) -> Result<EvaluationResult, EvalError> {
        let variance = self.variance(rv)?;
        let value = variance.value().sqrt()?;
        let provenance = match variance.provenance() {
            Provenance::Exact => Provenance::Exact,
            Provenance::Quadrature { error_bound } => Provenance::Quadrature {
                error_bound: delta_sqrt_error(&value, error_bound)?,
            },
            Provenance::MonteCarlo { samples, std_error } => Provenance::MonteCarlo {
                samples: *samples,
                std_error: delta_sqrt_error(&value, std_error)?,
            },
        };
        Ok(match provenance {
            Provenance::Exact => EvaluationResult::exact(value),
            Provenance::Quadrature { error_bound } => {
                EvaluationResult::quadrature(value, error_bound)
            }
            Provenance::MonteCarlo { samples, std_error } => {
                EvaluationResult::monte_carlo(value, samples, std_error)
            }
        })
    }

    /// `Cov[lhs, rhs] = E[lhs rhs] - E[lhs] E[rhs]`.
    ///
    /// Each expectation runs through the usual strategy cascade; a
    /// shared leaf between the operands routes the product through the
    /// sampler's shared draw environment. Covariance of a variable
    /// with itself is the variance query.
    pub fn covariance(
        &self,
        lhs: &RandomVariable,
        rhs: &RandomVariable,
    ) -> Result<EvaluationResult, EvalError> {
        if Arc::ptr_eq(lhs.node(), rhs.node()) {
            return self.variance(lhs);
        }
        let product = self.expectation(&(lhs * rhs))?;
        let mean_lhs = self.expectation(lhs)?;
        let mean_rhs = self.expectation(rhs)?;
        let value = product.value() - &(mean_lhs.value() * mean_rhs.value());
        // e(p - a b) <= e_p + |b| e_a + |a| e_b + e_a e_b.
        let cross = &(&mean_rhs.value().abs() * &spread(&mean_lhs))
            + &(&mean_lhs.value().abs() * &spread(&mean_rhs));
        let error = &(&spread(&product) + &cross) + &(&spread(&mean_lhs) * &spread(&mean_rhs));
        Ok(combined(value, error, &[&product, &mean_lhs, &mean_rhs]))
    }

    /// Pearson correlation `Cov[lhs, rhs] / (Std[lhs] Std[rhs])`.
    ///
    /// A degenerate operand (zero variance) makes the coefficient
    /// undefined and surfaces the division-by-zero error. Correlation
    /// of a variable with itself is exactly one.
    pub fn correlation(
        &self,
        lhs: &RandomVariable,
        rhs: &RandomVariable,
    ) -> Result<EvaluationResult, EvalError> {
        if Arc::ptr_eq(lhs.node(), rhs.node()) {
            return Ok(EvaluationResult::exact(Real::one()));
        }
        let cov = self.covariance(lhs, rhs)?;
        let std_lhs = self.std_dev(lhs)?;
        let std_rhs = self.std_dev(rhs)?;
        let denominator = std_lhs.value() * std_rhs.value();
        let value = cov.value().try_div(&denominator)?;
        // Quotient rule over the three estimates.
        let denominator_error = &(std_lhs.value() * &spread(&std_rhs))
            + &(std_rhs.value() * &spread(&std_lhs));
        let error = (&spread(&cov) + &(&value.abs() * &denominator_error)).try_div(&denominator)?;
        Ok(combined(value, error, &[&cov, &std_lhs, &std_rhs]))
    }

    /// `P(event)`.
    pub fn probability(&self, event: &Event) -> Result<EvaluationResult, EvalError> {
        let folded = normalize_event(&self.registry, event);

        if let Some(strategy) = self.config.force_strategy() {
            return self.probability_forced(&folded, strategy);
        }
        if let Some(value) = exact::probability(&folded)? {
            tracing::debug!(query = "probability", strategy = "exact", "query dispatched");
            return Ok(EvaluationResult::exact(value));
        }
        if let Some(outcome) = quadrature::probability(&folded, self.config.quadrature())? {
            tracing::debug!(query = "probability", strategy = "quadrature", "query dispatched");
            return Ok(EvaluationResult::quadrature(
                outcome.value,
                outcome.error_bound,
            ));
        }
        tracing::debug!(query = "probability", strategy = "monte_carlo", "query dispatched");
        let outcome = monte_carlo::probability(&folded, self.config.monte_carlo())?;
        Ok(EvaluationResult::monte_carlo(
            outcome.value,
            outcome.samples,
            outcome.std_error,
        ))
    }

    fn probability_forced(
        &self,
        folded: &Event,
        strategy: Strategy,
    ) -> Result<EvaluationResult, EvalError> {
        match strategy {
            Strategy::Exact => exact::probability(folded)?
                .map(EvaluationResult::exact)
                .ok_or_else(|| unsupported("probability", "no closed form applies")),
            Strategy::Quadrature => {
                match quadrature::probability(folded, self.config.quadrature())? {
                    Some(outcome) => Ok(EvaluationResult::quadrature(
                        outcome.value,
                        outcome.error_bound,
                    )),
                    None => {
                        if event_entangled(folded) {
                            Err(EvalError::NonIndependentUnsupported)
                        } else {
                            Err(unsupported("probability", "no quadrature rule applies"))
                        }
                    }
                }
            }
            Strategy::MonteCarlo => {
                let outcome = monte_carlo::probability(folded, self.config.monte_carlo())?;
                Ok(EvaluationResult::monte_carlo(
                    outcome.value,
                    outcome.samples,
                    outcome.std_error,
                ))
            }
        }
    }

    fn quadrature_refusal(&self, node: &Node) -> EvalError {
        if node_entangled(node) {
            EvalError::NonIndependentUnsupported
        } else {
            unsupported("query", "no quadrature rule applies")
        }
    }
}

fn unsupported(query: &str, reason: &str) -> EvalError {
    EvalError::UnsupportedExpression(format!("{query}: {reason}"))
}

/// Error transform for `sqrt` via the delta method; falls back to the
/// untransformed bound at a zero value.
fn delta_sqrt_error(sqrt_value: &Real, error: &Real) -> Result<Real, EvalError> {
    if sqrt_value.is_zero() {
        return Ok(error.clone());
    }
    Ok(error.try_div(&(&Real::from_i64(2) * sqrt_value))?)
}

/// The error figure a result carries: zero when exact, the bound for
/// quadrature, the standard error for Monte Carlo.
fn spread(result: &EvaluationResult) -> Real {
    match result.provenance() {
        Provenance::Exact => Real::zero(),
        Provenance::Quadrature { error_bound } => error_bound.clone(),
        Provenance::MonteCarlo { std_error, .. } => std_error.clone(),
    }
}

/// Tags a value combined from several sub-queries with the weakest
/// provenance among them. A Monte Carlo part reports the smallest
/// sample count involved.
fn combined(value: Real, error: Real, parts: &[&EvaluationResult]) -> EvaluationResult {
    let mut samples: Option<u64> = None;
    let mut any_quadrature = false;
    for part in parts {
        match part.provenance() {
            Provenance::Exact => {}
            Provenance::Quadrature { .. } => any_quadrature = true,
            Provenance::MonteCarlo { samples: n, .. } => {
                samples = Some(samples.map_or(*n, |s| s.min(*n)));
            }
        }
    }
    match samples {
        Some(n) => EvaluationResult::monte_carlo(value, n, error),
        None if any_quadrature => EvaluationResult::quadrature(value, error),
        None => EvaluationResult::exact(value),
    }
}

/// Whether any binary node in the tree combines dependent operands.
fn node_entangled(node: &Node) -> bool {
    match node {
        Node::Leaf { .. } | Node::Const(_) => false,
        Node::Unary { child, .. } => node_entangled(child),
        Node::Binary {
            lhs,
            rhs,
            independent,
            ..
        } => !independent || node_entangled(lhs) || node_entangled(rhs),
    }
}

fn event_entangled(event: &Event) -> bool {
    match event {
        Event::Compare { lhs, rhs, .. } => {
            node_entangled(lhs)
                || node_entangled(rhs)
                || lhs
                    .leaf_ids()
                    .intersection(&rhs.leaf_ids())
                    .next()
                    .is_some()
        }
        Event::And(a, b) | Event::Or(a, b) => event_entangled(a) || event_entangled(b),
        Event::Not(inner) => event_entangled(inner),
    }
}
