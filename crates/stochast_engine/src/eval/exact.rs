//! Closed-form evaluation rules.
//!
//! Each function returns `Ok(None)` when no closed form applies to the
//! (already normalised) tree; the dispatcher then falls through to the
//! next strategy. Rules used:
//! - linearity of expectation for sums and differences, valid without
//!   any independence assumption
//! - the product rule `E[XY] = E[X] E[Y]` for independent factors
//! - variance additivity for independent sums, the affine variance
//!   rule, and `Var(XY)` for independent factors via second moments
//! - leaf-against-constant probabilities through the family CDF, with
//!   strictness semantics read from the family kind

use stochast_core::Real;
use stochast_models::{Distribution, FamilyKind};

use crate::error::EvalError;
use crate::expr::{BinaryOp, CmpOp, Event, Node, UnaryOp};

pub(crate) fn mean(node: &Node) -> Result<Option<Real>, EvalError> {
    match node {
        Node::Const(value) => Ok(Some(value.clone())),
        Node::Leaf { dist, .. } => Ok(Some(dist.mean()?)),
        Node::Unary {
            op: UnaryOp::Neg,
            child,
        } => Ok(mean(child)?.map(|m| -&m)),
        Node::Binary {
            op,
            lhs,
            rhs,
            independent,
        } => {
            let (Some(ml), Some(mr)) = (mean(lhs)?, mean(rhs)?) else {
                return Ok(None);
            };
            match op {
                BinaryOp::Add => Ok(Some(&ml + &mr)),
                BinaryOp::Sub => Ok(Some(&ml - &mr)),
                BinaryOp::Mul if *independent => Ok(Some(&ml * &mr)),
                // E[X / c] for a deterministic divisor.
                BinaryOp::Div if matches!(rhs.as_ref(), Node::Const(_)) => {
                    Ok(Some(ml.try_div(&mr)?))
                }
                _ => Ok(None),
            }
        }
    }
}

pub(crate) fn variance(node: &Node) -> Result<Option<Real>, EvalError> {
    match node {
        Node::Const(_) => Ok(Some(Real::zero())),
        Node::Leaf { dist, .. } => Ok(Some(dist.variance()?)),
        Node::Unary {
            op: UnaryOp::Neg,
            child,
        } => variance(child),
        Node::Binary {
            op,
            lhs,
            rhs,
            independent,
        } => match op {
            BinaryOp::Add | BinaryOp::Sub => {
                // A deterministic offset leaves the variance unchanged.
                if matches!(lhs.as_ref(), Node::Const(_)) {
                    return variance(rhs);
                }
                if matches!(rhs.as_ref(), Node::Const(_)) {
                    return variance(lhs);
                }
                if !independent {
                    return Ok(None);
                }
                let (Some(vl), Some(vr)) = (variance(lhs)?, variance(rhs)?) else {
                    return Ok(None);
                };
                Ok(Some(&vl + &vr))
            }
            BinaryOp::Mul => {
                if let Node::Const(c) = lhs.as_ref() {
                    return Ok(variance(rhs)?.map(|v| &(c * c) * &v));
                }
                if let Node::Const(c) = rhs.as_ref() {
                    return Ok(variance(lhs)?.map(|v| &(c * c) * &v));
                }
                if !independent {
                    return Ok(None);
                }
                // Var(XY) = E[X^2] E[Y^2] - (E[X] E[Y])^2 for
                // independent factors.
                let (Some(vl), Some(vr)) = (variance(lhs)?, variance(rhs)?) else {
                    return Ok(None);
                };
                let (Some(ml), Some(mr)) = (mean(lhs)?, mean(rhs)?) else {
                    return Ok(None);
                };
                let second_l = &vl + &(&ml * &ml);
                let second_r = &vr + &(&mr * &mr);
                let mean_product = &ml * &mr;
                Ok(Some(
                    &(&second_l * &second_r) - &(&mean_product * &mean_product),
                ))
            }
            BinaryOp::Div => {
                if let Node::Const(c) = rhs.as_ref() {
                    let Some(v) = variance(lhs)? else {
                        return Ok(None);
                    };
                    return Ok(Some(v.try_div(&(c * c))?));
                }
                Ok(None)
            }
        },
    }
}

pub(crate) fn probability(event: &Event) -> Result<Option<Real>, EvalError> {
    match event {
        Event::Compare { op, lhs, rhs } => match (lhs.as_ref(), rhs.as_ref()) {
            (Node::Const(a), Node::Const(b)) => {
                let holds = op.holds(a.cmp_value(b));
                Ok(Some(if holds { Real::one() } else { Real::zero() }))
            }
            (Node::Leaf { dist, .. }, Node::Const(c)) => leaf_vs_const(*op, dist, c).map(Some),
            (Node::Const(c), Node::Leaf { dist, .. }) => {
                leaf_vs_const(op.mirrored(), dist, c).map(Some)
            }
            _ => Ok(None),
        },
        Event::Not(inner) => Ok(probability(inner)?.map(|p| &Real::one() - &p)),
        // Conjunctions and disjunctions need joint information the
        // closed forms do not carry.
        Event::And(_, _) | Event::Or(_, _) => Ok(None),
    }
}

/// CDF probability of a leaf against a constant, with discrete and
/// continuous strictness semantics.
fn leaf_vs_const(op: CmpOp, dist: &Distribution, c: &Real) -> Result<Real, EvalError> {
    let one = Real::one();
    match dist.kind() {
        FamilyKind::Continuous => {
            let cdf = dist.cdf(c)?;
            Ok(match op {
                CmpOp::Lt | CmpOp::Le => cdf,
                CmpOp::Gt | CmpOp::Ge => &one - &cdf,
                // A continuous variable hits any single point with
                // probability zero.
                CmpOp::Eq => Real::zero(),
                CmpOp::Ne => one,
            })
        }
        FamilyKind::Discrete => {
            let cdf = dist.cdf(c)?;
            let mass = dist.pdf(c)?;
            Ok(match op {
                CmpOp::Le => cdf,
                CmpOp::Lt => &cdf - &mass,
                CmpOp::Gt => &one - &cdf,
                CmpOp::Ge => &(&one - &cdf) + &mass,
                CmpOp::Eq => mass,
                CmpOp::Ne => &one - &mass,
            })
        }
    }
}
