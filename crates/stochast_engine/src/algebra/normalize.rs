//! Best-effort normalisation pass.
//!
//! Rewrites an expression tree bottom-up into a form with more
//! closed-form structure: constant arithmetic is folded, affine maps
//! are pushed into affine-closed leaf families, independent leaf pairs
//! collapse through the registry's composition hooks, and structural
//! self-cancellations (`X - X`, `X / X`) become constants.
//!
//! Every rewrite preserves the distribution of the expression exactly.
//! A fold that does not apply, or whose hook declines, simply leaves
//! the node in place; normalisation never fails.

use std::sync::Arc;

use stochast_core::Real;
use stochast_models::{FoldOp, Registry};

use crate::expr::{BinaryOp, Event, Node, RandomVariable, UnaryOp};

/// Normalises a random variable against a registry's fold rules.
pub fn normalize(registry: &Registry, rv: &RandomVariable) -> RandomVariable {
    RandomVariable::from_node(normalize_node(registry, rv.node()))
}

/// Normalises both sides of every comparison in an event.
pub fn normalize_event(registry: &Registry, event: &Event) -> Event {
    match event {
        Event::Compare { op, lhs, rhs } => Event::Compare {
            op: *op,
            lhs: normalize_node(registry, lhs),
            rhs: normalize_node(registry, rhs),
        },
        Event::And(a, b) => Event::And(
            Box::new(normalize_event(registry, a)),
            Box::new(normalize_event(registry, b)),
        ),
        Event::Or(a, b) => Event::Or(
            Box::new(normalize_event(registry, a)),
            Box::new(normalize_event(registry, b)),
        ),
        Event::Not(inner) => Event::Not(Box::new(normalize_event(registry, inner))),
    }
}

pub(crate) fn normalize_node(registry: &Registry, node: &Arc<Node>) -> Arc<Node> {
    match node.as_ref() {
        Node::Leaf { .. } | Node::Const(_) => Arc::clone(node),
        Node::Unary { op, child } => {
            let child_n = normalize_node(registry, child);
            match (op, child_n.as_ref()) {
                (UnaryOp::Neg, Node::Const(v)) => Arc::new(Node::Const(-v)),
                (UnaryOp::Neg, Node::Leaf { dist, .. }) => {
                    let minus_one = Real::from_i64(-1);
                    if let Ok(Some(folded)) = registry.affine(dist, &minus_one, &Real::zero()) {
                        return fresh_leaf(folded);
                    }
                    rebuild_unary(node, *op, child, child_n)
                }
                _ => rebuild_unary(node, *op, child, child_n),
            }
        }
        Node::Binary {
            op,
            lhs,
            rhs,
            independent,
        } => {
            let lhs_n = normalize_node(registry, lhs);
            let rhs_n = normalize_node(registry, rhs);

            if let Some(folded) = fold_binary(registry, *op, &lhs_n, &rhs_n, *independent) {
                return folded;
            }

            if Arc::ptr_eq(&lhs_n, lhs) && Arc::ptr_eq(&rhs_n, rhs) {
                Arc::clone(node)
            } else {
                Arc::new(Node::Binary {
                    op: *op,
                    lhs: lhs_n,
                    rhs: rhs_n,
                    independent: *independent,
                })
            }
        }
    }
}

fn rebuild_unary(
    original: &Arc<Node>,
    op: UnaryOp,
    old_child: &Arc<Node>,
    new_child: Arc<Node>,
) -> Arc<Node> {
    if Arc::ptr_eq(&new_child, old_child) {
        Arc::clone(original)
    } else {
        Arc::new(Node::Unary {
            op,
            child: new_child,
        })
    }
}

fn fresh_leaf(dist: stochast_models::Distribution) -> Arc<Node> {
    RandomVariable::from_distribution(dist).node().clone()
}

fn fold_op(op: BinaryOp) -> FoldOp {
    match op {
        BinaryOp::Add => FoldOp::Add,
        BinaryOp::Sub => FoldOp::Sub,
        BinaryOp::Mul => FoldOp::Mul,
        BinaryOp::Div => FoldOp::Div,
    }
}

/// Attempts every fold rule for one binary node. `None` keeps the node
/// unfolded.
fn fold_binary(
    registry: &Registry,
    op: BinaryOp,
    lhs: &Arc<Node>,
    rhs: &Arc<Node>,
    independent: bool,
) -> Option<Arc<Node>> {
    // Constant arithmetic.
    if let (Node::Const(a), Node::Const(b)) = (lhs.as_ref(), rhs.as_ref()) {
        let value = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            // Division by a zero constant is left for evaluation to
            // surface as an error.
            BinaryOp::Div => a.try_div(b).ok()?,
        };
        return Some(Arc::new(Node::Const(value)));
    }

    // Structural self-cancellation: the two operands are the same
    // subtree object, hence the same random quantity.
    if same_quantity(lhs, rhs) {
        match op {
            BinaryOp::Sub => return Some(Arc::new(Node::Const(Real::zero()))),
            BinaryOp::Div => {
                if let Node::Leaf { dist, .. } = lhs.as_ref() {
                    if !dist.support().contains_zero() {
                        return Some(Arc::new(Node::Const(Real::one())));
                    }
                }
            }
            _ => {}
        }
    }

    // Affine maps onto a leaf.
    match (lhs.as_ref(), rhs.as_ref()) {
        (Node::Leaf { dist, .. }, Node::Const(c)) => {
            let attempt = match op {
                BinaryOp::Add => registry.affine(dist, &Real::one(), c),
                BinaryOp::Sub => registry.affine(dist, &Real::one(), &(-c)),
                BinaryOp::Mul => registry.affine(dist, c, &Real::zero()),
                BinaryOp::Div => match Real::one().try_div(c) {
                    Ok(inverse) => registry.affine(dist, &inverse, &Real::zero()),
                    Err(_) => Ok(None),
                },
            };
            if let Ok(Some(folded)) = attempt {
                return Some(fresh_leaf(folded));
            }
        }
        (Node::Const(c), Node::Leaf { dist, .. }) => {
            let attempt = match op {
                BinaryOp::Add => registry.affine(dist, &Real::one(), c),
                BinaryOp::Sub => registry.affine(dist, &Real::from_i64(-1), c),
                BinaryOp::Mul => registry.affine(dist, c, &Real::zero()),
                // A constant divided by a variable is not affine.
                BinaryOp::Div => Ok(None),
            };
            if let Ok(Some(folded)) = attempt {
                return Some(fresh_leaf(folded));
            }
        }
        (Node::Leaf { dist: a, .. }, Node::Leaf { dist: b, .. }) if independent => {
            if let Ok(Some(folded)) = registry.compose(fold_op(op), a, b) {
                return Some(fresh_leaf(folded));
            }
        }
        _ => {}
    }

    None
}

/// Whether two operand trees denote the same random quantity.
fn same_quantity(lhs: &Arc<Node>, rhs: &Arc<Node>) -> bool {
    if Arc::ptr_eq(lhs, rhs) {
        return true;
    }
    matches!(
        (lhs.as_ref(), rhs.as_ref()),
        (Node::Leaf { id: a, .. }, Node::Leaf { id: b, .. }) if a == b
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use stochast_models::Registry;

    fn registry() -> Registry {
        Registry::with_builtins()
    }

    fn normal(registry: &Registry, mu: i64, sigma: i64) -> RandomVariable {
        RandomVariable::from_distribution(
            registry
                .instantiate("normal", vec![Real::from_i64(mu), Real::from_i64(sigma)])
                .unwrap(),
        )
    }

    fn leaf_params(rv: &RandomVariable) -> Vec<f64> {
        match rv.node().as_ref() {
            Node::Leaf { dist, .. } => dist.params().iter().map(Real::to_f64).collect(),
            other => panic!("expected a leaf, got {other:?}"),
        }
    }

    #[test]
    fn test_constant_arithmetic_folds() {
        let reg = registry();
        let c = RandomVariable::constant(Real::from_i64(6));
        let d = RandomVariable::constant(Real::from_i64(3));
        let folded = normalize(&reg, &(&(&c + &d) * &d));
        match folded.node().as_ref() {
            Node::Const(v) => assert_eq!(*v, Real::from_i64(27)),
            other => panic!("expected a constant, got {other:?}"),
        }
    }

    #[test]
    fn test_division_by_zero_constant_stays_unfolded() {
        let reg = registry();
        let c = RandomVariable::constant(Real::from_i64(6));
        let z = RandomVariable::constant(Real::zero());
        let kept = normalize(&reg, &(&c / &z));
        assert!(matches!(kept.node().as_ref(), Node::Binary { .. }));
    }

    #[test]
    fn test_self_difference_folds_to_zero() {
        let reg = registry();
        let x = normal(&reg, 3, 2);
        let folded = normalize(&reg, &(&x - &x));
        match folded.node().as_ref() {
            Node::Const(v) => assert!(v.is_zero()),
            other => panic!("expected a constant, got {other:?}"),
        }
    }

    #[test]
    fn test_self_quotient_folds_away_from_zero_support() {
        let reg = registry();
        let x = RandomVariable::from_distribution(
            reg.instantiate("uniform", vec![Real::from_i64(1), Real::from_i64(2)])
                .unwrap(),
        );
        let folded = normalize(&reg, &(&x / &x));
        match folded.node().as_ref() {
            Node::Const(v) => assert_eq!(*v, Real::one()),
            other => panic!("expected a constant, got {other:?}"),
        }
    }

    #[test]
    fn test_self_quotient_kept_when_support_spans_zero() {
        let reg = registry();
        let x = normal(&reg, 0, 1);
        let kept = normalize(&reg, &(&x / &x));
        assert!(matches!(kept.node().as_ref(), Node::Binary { .. }));
    }

    #[test]
    fn test_normal_sum_chain_collapses_to_one_leaf() {
        let reg = registry();
        let a = normal(&reg, 1, 2);
        let b = normal(&reg, 2, 3);
        let c = normal(&reg, 3, 6);
        let folded = normalize(&reg, &(&(&a + &b) + &c));
        let params = leaf_params(&folded);
        assert_relative_eq!(params[0], 6.0, max_relative = 1e-14);
        assert_relative_eq!(params[1], 7.0, max_relative = 1e-13);
    }

    #[test]
    fn test_affine_pushes_into_normal_leaf() {
        let reg = registry();
        let x = normal(&reg, 100, 15);
        let folded = normalize(&reg, &(&(&x * 2) + 5));
        let params = leaf_params(&folded);
        assert_relative_eq!(params[0], 205.0, max_relative = 1e-14);
        assert_relative_eq!(params[1], 30.0, max_relative = 1e-14);
    }

    #[test]
    fn test_negation_folds_through_affine_hook() {
        let reg = registry();
        let x = normal(&reg, 5, 2);
        let folded = normalize(&reg, &(-&x));
        let params = leaf_params(&folded);
        assert_relative_eq!(params[0], -5.0, max_relative = 1e-14);
        assert_relative_eq!(params[1], 2.0, max_relative = 1e-14);
    }

    #[test]
    fn test_dependent_pair_never_composed() {
        let reg = registry();
        let x = normal(&reg, 0, 1);
        // x + x is 2x, not a variance-2 sum of independent draws.
        let kept = normalize(&reg, &(&x + &x));
        assert!(matches!(kept.node().as_ref(), Node::Binary { .. }));
    }

    #[test]
    fn test_unfoldable_family_pair_kept() {
        let reg = registry();
        let x = RandomVariable::from_distribution(
            reg.instantiate("exponential", vec![Real::from_i64(1)]).unwrap(),
        );
        let y = RandomVariable::from_distribution(
            reg.instantiate("exponential", vec![Real::from_i64(2)]).unwrap(),
        );
        let kept = normalize(&reg, &(&x + &y));
        assert!(matches!(kept.node().as_ref(), Node::Binary { .. }));
    }

    #[test]
    fn test_event_sides_are_normalized() {
        let reg = registry();
        let x = normal(&reg, 0, 1);
        let event = (&x - &x).eq_value(Real::zero());
        match normalize_event(&reg, &event) {
            Event::Compare { lhs, .. } => {
                assert!(matches!(lhs.as_ref(), Node::Const(v) if v.is_zero()))
            }
            other => panic!("expected a comparison, got {other:?}"),
        }
    }
}
