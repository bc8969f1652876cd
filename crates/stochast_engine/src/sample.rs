//! Sampling of expression trees and events.
//!
//! One draw environment (`LeafId` → value) is built per sample, so
//! every reference to the same leaf inside one sample observes the
//! same draw. Dependence introduced by shared subtrees therefore needs
//! no special handling here; it falls out of leaf identity.

use std::collections::HashMap;

use rand::RngCore;
use stochast_core::Real;

use crate::error::EvalError;
use crate::expr::{BinaryOp, Event, LeafId, Node, RandomVariable, UnaryOp};
use crate::rng::EngineRng;

fn apply_binary(op: BinaryOp, lhs: &Real, rhs: &Real) -> Result<Real, EvalError> {
    match op {
        BinaryOp::Add => Ok(lhs + rhs),
        BinaryOp::Sub => Ok(lhs - rhs),
        BinaryOp::Mul => Ok(lhs * rhs),
        BinaryOp::Div => Ok(lhs.try_div(rhs)?),
    }
}

/// Evaluates a tree, drawing any leaf not yet present in `env`.
pub(crate) fn eval_sampled(
    node: &Node,
    env: &mut HashMap<LeafId, Real>,
    rng: &mut dyn RngCore,
) -> Result<Real, EvalError> {
    match node {
        Node::Leaf { id, dist } => {
            if let Some(value) = env.get(id) {
                return Ok(value.clone());
            }
            let value = dist.draw(rng)?;
            env.insert(*id, value.clone());
            Ok(value)
        }
        Node::Const(value) => Ok(value.clone()),
        Node::Unary {
            op: UnaryOp::Neg,
            child,
        } => Ok(-&eval_sampled(child, env, rng)?),
        Node::Binary { op, lhs, rhs, .. } => {
            let l = eval_sampled(lhs, env, rng)?;
            let r = eval_sampled(rhs, env, rng)?;
            apply_binary(*op, &l, &r)
        }
    }
}

/// Evaluates a tree against a fixed environment; every leaf must be
/// bound.
pub(crate) fn eval_deterministic(
    node: &Node,
    env: &HashMap<LeafId, Real>,
) -> Result<Real, EvalError> {
    match node {
        Node::Leaf { id, .. } => env.get(id).cloned().ok_or_else(|| {
            EvalError::UnsupportedExpression(format!("unbound leaf {}", id.raw()))
        }),
        Node::Const(value) => Ok(value.clone()),
        Node::Unary {
            op: UnaryOp::Neg,
            child,
        } => Ok(-&eval_deterministic(child, env)?),
        Node::Binary { op, lhs, rhs, .. } => {
            let l = eval_deterministic(lhs, env)?;
            let r = eval_deterministic(rhs, env)?;
            apply_binary(*op, &l, &r)
        }
    }
}

/// Decides an event under one shared draw environment.
pub(crate) fn event_holds_sampled(
    event: &Event,
    env: &mut HashMap<LeafId, Real>,
    rng: &mut dyn RngCore,
) -> Result<bool, EvalError> {
    match event {
        Event::Compare { op, lhs, rhs } => {
            let l = eval_sampled(lhs, env, rng)?;
            let r = eval_sampled(rhs, env, rng)?;
            Ok(op.holds(l.cmp_value(&r)))
        }
        Event::And(a, b) => {
            Ok(event_holds_sampled(a, env, rng)? && event_holds_sampled(b, env, rng)?)
        }
        Event::Or(a, b) => {
            Ok(event_holds_sampled(a, env, rng)? || event_holds_sampled(b, env, rng)?)
        }
        Event::Not(inner) => Ok(!event_holds_sampled(inner, env, rng)?),
    }
}

/// Draws realisations of expressions and events.
///
/// # Examples
///
/// ```rust
/// use stochast_core::Real;
/// use stochast_engine::expr::RandomVariable;
/// use stochast_engine::rng::EngineRng;
/// use stochast_engine::sample::Sampler;
/// use stochast_models::Registry;
///
/// let registry = Registry::with_builtins();
/// let die = RandomVariable::from_distribution(
///     registry
///         .instantiate("discrete_uniform", vec![Real::from_i64(1), Real::from_i64(6)])
///         .unwrap(),
/// );
/// let mut rng = EngineRng::from_seed(42);
/// let rolls = Sampler::sample(&die, 10, &mut rng).unwrap();
/// assert_eq!(rolls.len(), 10);
/// ```
pub struct Sampler;

impl Sampler {
    /// Draws `count` realisations of an expression.
    pub fn sample(
        rv: &RandomVariable,
        count: usize,
        rng: &mut EngineRng,
    ) -> Result<Vec<Real>, EvalError> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut env = HashMap::new();
            out.push(eval_sampled(rv.node(), &mut env, rng)?);
        }
        Ok(out)
    }

    /// Draws `count` truth values of an event.
    pub fn sample_event(
        event: &Event,
        count: usize,
        rng: &mut EngineRng,
    ) -> Result<Vec<bool>, EvalError> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut env = HashMap::new();
            out.push(event_holds_sampled(event, &mut env, rng)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stochast_models::Registry;

    fn die(registry: &Registry) -> RandomVariable {
        RandomVariable::from_distribution(
            registry
                .instantiate(
                    "discrete_uniform",
                    vec![Real::from_i64(1), Real::from_i64(6)],
                )
                .unwrap(),
        )
    }

    #[test]
    fn test_samples_stay_in_support() {
        let registry = Registry::with_builtins();
        let d = die(&registry);
        let mut rng = EngineRng::from_seed(1);
        for roll in Sampler::sample(&d, 200, &mut rng).unwrap() {
            let v = roll.to_f64();
            assert!((1.0..=6.0).contains(&v));
            assert!(roll.is_integer());
        }
    }

    #[test]
    fn test_shared_leaf_reuses_draw() {
        let registry = Registry::with_builtins();
        let d = die(&registry);
        let diff = &d - &d;
        let mut rng = EngineRng::from_seed(2);
        for value in Sampler::sample(&diff, 100, &mut rng).unwrap() {
            assert!(value.is_zero());
        }
    }

    #[test]
    fn test_distinct_leaves_draw_independently() {
        let registry = Registry::with_builtins();
        let a = die(&registry);
        let b = die(&registry);
        let diff = &a - &b;
        let mut rng = EngineRng::from_seed(3);
        let values = Sampler::sample(&diff, 200, &mut rng).unwrap();
        assert!(values.iter().any(|v| !v.is_zero()));
    }

    #[test]
    fn test_event_sampling_shares_environment() {
        let registry = Registry::with_builtins();
        let d = die(&registry);
        // d == d holds on every sample because both sides see one draw.
        let event = d.eq_rv(&d);
        let mut rng = EngineRng::from_seed(4);
        let truths = Sampler::sample_event(&event, 50, &mut rng).unwrap();
        assert!(truths.into_iter().all(|t| t));
    }

    #[test]
    fn test_sampling_is_reproducible() {
        let registry = Registry::with_builtins();
        let d = die(&registry);
        let mut a = EngineRng::from_seed(5);
        let mut b = EngineRng::from_seed(5);
        assert_eq!(
            Sampler::sample(&d, 32, &mut a).unwrap(),
            Sampler::sample(&d, 32, &mut b).unwrap()
        );
    }
}
