//! Quadrature-based evaluation.
//!
//! Applies when a tree transforms a single continuous leaf
//! (`E[g(X)] = ∫ g(x) f(x) dx`), when a single discrete leaf is
//! transformed (mass-weighted summation over a capped support), or for
//! threshold probabilities of an independent sum or difference of two
//! continuous leaves (`P(X + Y <= c) = ∫ f_X(x) F_Y(c - x) dx`).
//! Every outcome carries the rule's error bound.

use std::collections::HashMap;
use std::sync::Arc;

use stochast_core::math::{integrate, QuadratureConfig};
use stochast_core::{NumericError, Real};
use stochast_models::{Bound, Distribution, FamilyKind};

use crate::error::EvalError;
use crate::expr::{BinaryOp, CmpOp, Event, LeafId, Node};
use crate::sample::eval_deterministic;

/// Tail probability cut when truncating an unbounded continuous
/// support to a finite integration interval.
const TAIL_EPSILON: f64 = 1e-18;

/// Cap on lattice points visited when summing over a discrete support.
const MAX_LATTICE_POINTS: u64 = 100_000;

pub(crate) struct QuadOutcome {
    pub(crate) value: Real,
    pub(crate) error_bound: Real,
}

/// Finds the single distinct leaf of a tree, if there is exactly one.
fn single_leaf(node: &Node) -> Option<(LeafId, Distribution)> {
    let ids = node.leaf_ids();
    if ids.len() != 1 {
        return None;
    }
    let id = *ids.iter().next()?;
    find_leaf(node, id).map(|dist| (id, dist))
}

fn find_leaf(node: &Node, target: LeafId) -> Option<Distribution> {
    match node {
        Node::Leaf { id, dist } if *id == target => Some(dist.clone()),
        Node::Leaf { .. } | Node::Const(_) => None,
        Node::Unary { child, .. } => find_leaf(child, target),
        Node::Binary { lhs, rhs, .. } => {
            find_leaf(lhs, target).or_else(|| find_leaf(rhs, target))
        }
    }
}

/// Truncates a continuous support to a finite integration interval,
/// cutting `TAIL_EPSILON` of probability from each unbounded end.
fn integration_interval(dist: &Distribution) -> Result<(Real, Real), EvalError> {
    let support = dist.support();
    let epsilon = Real::from_f64(TAIL_EPSILON)?;
    let lower = match support.lower() {
        Bound::Finite(v) => v.clone(),
        Bound::Unbounded => dist.inverse_cdf(&epsilon)?,
    };
    let upper = match support.upper() {
        Bound::Finite(v) => v.clone(),
        Bound::Unbounded => dist.inverse_cdf(&(&Real::one() - &epsilon))?,
    };
    Ok((lower, upper))
}

/// `E[g(X)]` and `E[g(X)^2]` for a single-leaf transform.
///
/// The second moment rides along in the same pass so a variance query
/// pays for one strategy decision, not two.
pub(crate) fn moments(
    node: &Arc<Node>,
    config: &QuadratureConfig,
) -> Result<Option<(QuadOutcome, QuadOutcome)>, EvalError> {
    let Some((id, dist)) = single_leaf(node) else {
        return Ok(None);
    };
    match dist.kind() {
        FamilyKind::Continuous => continuous_moments(node, id, &dist, config).map(Some),
        FamilyKind::Discrete => discrete_moments(node, id, &dist),
    }
}

fn transform(node: &Node, id: LeafId, x: &Real) -> Result<Real, NumericError> {
    let mut env = HashMap::new();
    env.insert(id, x.clone());
    // Deterministic evaluation can only fail numerically here; an
    // unbound leaf is impossible with the single-leaf environment.
    eval_deterministic(node, &env).map_err(|err| match err {
        EvalError::Numeric(e) => e,
        other => NumericError::DomainError {
            function: "transform",
            argument: other.to_string(),
        },
    })
}

fn continuous_moments(
    node: &Arc<Node>,
    id: LeafId,
    dist: &Distribution,
    config: &QuadratureConfig,
) -> Result<(QuadOutcome, QuadOutcome), EvalError> {
    let (lower, upper) = integration_interval(dist)?;

    let first = integrate(
        |x| {
            let g = transform(node, id, x)?;
            let density = dist.pdf(x).map_err(registry_to_numeric)?;
            Ok(&g * &density)
        },
        &lower,
        &upper,
        config,
    )?;
    let second = integrate(
        |x| {
            let g = transform(node, id, x)?;
            let density = dist.pdf(x).map_err(registry_to_numeric)?;
            Ok(&(&g * &g) * &density)
        },
        &lower,
        &upper,
        config,
    )?;

    Ok((
        QuadOutcome {
            value: first.value,
            error_bound: first.error_bound,
        },
        QuadOutcome {
            value: second.value,
            error_bound: second.error_bound,
        },
    ))
}

fn registry_to_numeric(err: stochast_models::RegistryError) -> NumericError {
    match err {
        stochast_models::RegistryError::Numeric(e) => e,
        other => NumericError::DomainError {
            function: "density",
            argument: other.to_string(),
        },
    }
}

/// Mass-weighted summation over a discrete support. Exact when the
/// support fits under the lattice cap; a truncated walk reports the
/// unvisited tail mass as its error bound.
fn discrete_moments(
    node: &Arc<Node>,
    id: LeafId,
    dist: &Distribution,
) -> Result<Option<(QuadOutcome, QuadOutcome)>, EvalError> {
    let support = dist.support();
    let Bound::Finite(lower) = support.lower().clone() else {
        return Ok(None);
    };
    let bounded_top = match support.upper() {
        Bound::Finite(v) => Some(v.clone()),
        Bound::Unbounded => None,
    };

    let mut first = Real::zero();
    let mut second = Real::zero();
    let mut covered = Real::zero();
    let mut k = lower;
    let mut steps = 0u64;
    loop {
        if let Some(top) = &bounded_top {
            if top.cmp_value(&k) == std::cmp::Ordering::Less {
                break;
            }
        }
        if steps >= MAX_LATTICE_POINTS {
            break;
        }
        let mass = dist.pdf(&k)?;
        let g = transform(node, id, &k)?;
        first = &first + &(&g * &mass);
        second = &second + &(&(&g * &g) * &mass);
        covered = &covered + &mass;
        // An unbounded walk stops once the remaining tail is below the
        // truncation threshold.
        if bounded_top.is_none() {
            let remaining = &Real::one() - &covered;
            if remaining.to_f64() < TAIL_EPSILON && steps > 0 {
                break;
            }
        }
        k = &k + &Real::one();
        steps += 1;
    }

    let tail = {
        let remaining = &Real::one() - &covered;
        if remaining.is_negative() {
            Real::zero()
        } else {
            remaining
        }
    };
    Ok(Some((
        QuadOutcome {
            value: first,
            error_bound: tail.clone(),
        },
        QuadOutcome {
            value: second,
            error_bound: tail,
        },
    )))
}

/// Threshold probability for an independent sum or difference of two
/// continuous leaves.
pub(crate) fn probability(
    event: &Event,
    config: &QuadratureConfig,
) -> Result<Option<QuadOutcome>, EvalError> {
    let Event::Compare { op, lhs, rhs } = event else {
        return match event {
            Event::Not(inner) => Ok(probability(inner, config)?.map(|outcome| QuadOutcome {
                value: &Real::one() - &outcome.value,
                error_bound: outcome.error_bound,
            })),
            _ => Ok(None),
        };
    };

    // Bring the comparison into the form `X (+|-) Y cmp c`.
    let (pair, threshold, op) = match (lhs.as_ref(), rhs.as_ref()) {
        (Node::Binary { .. }, Node::Const(c)) => (Arc::clone(lhs), c.clone(), *op),
        (Node::Const(c), Node::Binary { .. }) => (Arc::clone(rhs), c.clone(), op.mirrored()),
        // `X cmp Y` over distinct leaves is `X - Y cmp 0`.
        (Node::Leaf { id: a, .. }, Node::Leaf { id: b, .. }) if a != b => (
            Arc::new(Node::Binary {
                op: BinaryOp::Sub,
                lhs: Arc::clone(lhs),
                rhs: Arc::clone(rhs),
                independent: true,
            }),
            Real::zero(),
            *op,
        ),
        _ => return Ok(None),
    };

    let Node::Binary {
        op: pair_op,
        lhs: x_node,
        rhs: y_node,
        independent: true,
    } = pair.as_ref()
    else {
        return Ok(None);
    };
    let (Node::Leaf { dist: x, .. }, Node::Leaf { dist: y, .. }) =
        (x_node.as_ref(), y_node.as_ref())
    else {
        return Ok(None);
    };
    if x.kind() != FamilyKind::Continuous || y.kind() != FamilyKind::Continuous {
        return Ok(None);
    }
    let subtract = match pair_op {
        BinaryOp::Add => false,
        BinaryOp::Sub => true,
        _ => return Ok(None),
    };

    // For continuous variables strict and non-strict thresholds agree,
    // and point events are null.
    let below = match op {
        CmpOp::Lt | CmpOp::Le => true,
        CmpOp::Gt | CmpOp::Ge => false,
        CmpOp::Eq => {
            return Ok(Some(QuadOutcome {
                value: Real::zero(),
                error_bound: Real::zero(),
            }))
        }
        CmpOp::Ne => {
            return Ok(Some(QuadOutcome {
                value: Real::one(),
                error_bound: Real::zero(),
            }))
        }
    };

    let (lower, upper) = integration_interval(x)?;
    let result = integrate(
        |t| {
            let density = x.pdf(t).map_err(registry_to_numeric)?;
            // P(Y <= c - t) for a sum; P(Y >= t - c) for a difference.
            let weight = if subtract {
                let arg = t - &threshold;
                &Real::one() - &y.cdf(&arg).map_err(registry_to_numeric)?
            } else {
                let arg = &threshold - t;
                y.cdf(&arg).map_err(registry_to_numeric)?
            };
            Ok(&density * &weight)
        },
        &lower,
        &upper,
        config,
    )?;

    let value = if below {
        result.value
    } else {
        &Real::one() - &result.value
    };
    Ok(Some(QuadOutcome {
        value,
        error_bound: result.error_bound,
    }))
}
