//! Random-variable expression trees.
//!
//! A [`RandomVariable`] is a cheap handle (`Arc`) to an immutable
//! [`Node`] tree. Composing variables never mutates existing trees;
//! sub-expressions are shared structurally, and that sharing is what
//! carries dependence information: a leaf reached through two paths is
//! the *same* random quantity, not an independent copy.

mod event;

pub use event::{CmpOp, Event};

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use stochast_core::Real;
use stochast_models::Distribution;

static NEXT_LEAF_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a distribution leaf.
///
/// Two leaves with the same identity are the same random quantity;
/// distinct identities are assumed independent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafId(u64);

impl LeafId {
    fn fresh() -> Self {
        LeafId(NEXT_LEAF_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier, for logging.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Unary operator on a random variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
}

/// Binary operator combining two random variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Sum.
    Add,
    /// Difference.
    Sub,
    /// Product.
    Mul,
    /// Quotient.
    Div,
}

/// One node of an expression tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// A distribution leaf.
    Leaf {
        /// Identity of this random quantity.
        id: LeafId,
        /// The bound distribution.
        dist: Distribution,
    },
    /// A deterministic constant.
    Const(Real),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand subtree.
        child: Arc<Node>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand subtree.
        lhs: Arc<Node>,
        /// Right operand subtree.
        rhs: Arc<Node>,
        /// Whether the operand subtrees share no leaf identity.
        ///
        /// Computed at construction; a shared leaf forces `false` and
        /// the flag is never recomputed afterwards.
        independent: bool,
    },
}

impl Node {
    /// Collects the set of leaf identities reachable from this node.
    pub fn leaf_ids(&self) -> BTreeSet<LeafId> {
        let mut ids = BTreeSet::new();
        self.collect_leaf_ids(&mut ids);
        ids
    }

    fn collect_leaf_ids(&self, ids: &mut BTreeSet<LeafId>) {
        match self {
            Node::Leaf { id, .. } => {
                ids.insert(*id);
            }
            Node::Const(_) => {}
            Node::Unary { child, .. } => child.collect_leaf_ids(ids),
            Node::Binary { lhs, rhs, .. } => {
                lhs.collect_leaf_ids(ids);
                rhs.collect_leaf_ids(ids);
            }
        }
    }
}

/// A symbolic random variable.
///
/// Cloning is cheap (an `Arc` bump) and clones refer to the *same*
/// random quantity: `x.clone() - x` is identically zero, not the
/// difference of two independent draws.
///
/// # Examples
///
/// ```rust
/// use stochast_core::Real;
/// use stochast_engine::expr::RandomVariable;
/// use stochast_models::Registry;
///
/// let registry = Registry::with_builtins();
/// let iq = RandomVariable::from_distribution(
///     registry
///         .instantiate("normal", vec![Real::from_i64(100), Real::from_i64(15)])
///         .unwrap(),
/// );
/// let shifted = &iq + &RandomVariable::constant(Real::from_i64(10));
/// let event = shifted.ge_value(Real::from_i64(140));
/// let _ = event;
/// ```
#[derive(Clone)]
pub struct RandomVariable {
    node: Arc<Node>,
}

impl RandomVariable {
    /// Wraps a bound distribution in a fresh leaf.
    pub fn from_distribution(dist: Distribution) -> Self {
        Self {
            node: Arc::new(Node::Leaf {
                id: LeafId::fresh(),
                dist,
            }),
        }
    }

    /// A deterministic constant.
    pub fn constant(value: Real) -> Self {
        Self {
            node: Arc::new(Node::Const(value)),
        }
    }

    pub(crate) fn from_node(node: Arc<Node>) -> Self {
        Self { node }
    }

    /// The root of the expression tree.
    #[inline]
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Leaf identities referenced by this expression.
    pub fn leaf_ids(&self) -> BTreeSet<LeafId> {
        self.node.leaf_ids()
    }

    fn binary(op: BinaryOp, lhs: &RandomVariable, rhs: &RandomVariable) -> RandomVariable {
        let shared = lhs
            .leaf_ids()
            .intersection(&rhs.leaf_ids())
            .next()
            .is_some();
        RandomVariable {
            node: Arc::new(Node::Binary {
                op,
                lhs: Arc::clone(&lhs.node),
                rhs: Arc::clone(&rhs.node),
                independent: !shared,
            }),
        }
    }

    /// Sum of two variables.
    pub fn add(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(BinaryOp::Add, self, other)
    }

    /// Difference of two variables.
    pub fn sub(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(BinaryOp::Sub, self, other)
    }

    /// Product of two variables.
    pub fn mul(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(BinaryOp::Mul, self, other)
    }

    /// Quotient of two variables.
    pub fn div(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(BinaryOp::Div, self, other)
    }

    /// Arithmetic negation.
    pub fn neg(&self) -> RandomVariable {
        RandomVariable {
            node: Arc::new(Node::Unary {
                op: UnaryOp::Neg,
                child: Arc::clone(&self.node),
            }),
        }
    }

    /// Scales by a deterministic factor.
    pub fn scale(&self, factor: Real) -> RandomVariable {
        self.mul(&RandomVariable::constant(factor))
    }

    /// Shifts by a deterministic offset.
    pub fn shift(&self, offset: Real) -> RandomVariable {
        self.add(&RandomVariable::constant(offset))
    }

    fn compare(&self, op: CmpOp, rhs: &RandomVariable) -> Event {
        Event::compare(op, Arc::clone(&self.node), Arc::clone(&rhs.node))
    }

    /// The event `self < other`.
    pub fn lt(&self, other: &RandomVariable) -> Event {
        self.compare(CmpOp::Lt, other)
    }

    /// The event `self <= other`.
    pub fn le(&self, other: &RandomVariable) -> Event {
        self.compare(CmpOp::Le, other)
    }

    /// The event `self > other`.
    pub fn gt(&self, other: &RandomVariable) -> Event {
        self.compare(CmpOp::Gt, other)
    }

    /// The event `self >= other`.
    pub fn ge(&self, other: &RandomVariable) -> Event {
        self.compare(CmpOp::Ge, other)
    }

    /// The event `self == other` (equality in value).
    pub fn eq_rv(&self, other: &RandomVariable) -> Event {
        self.compare(CmpOp::Eq, other)
    }

    /// The event `self != other`.
    pub fn ne_rv(&self, other: &RandomVariable) -> Event {
        self.compare(CmpOp::Ne, other)
    }

    /// The event `self < threshold`.
    pub fn lt_value(&self, threshold: Real) -> Event {
        self.lt(&RandomVariable::constant(threshold))
    }

    /// The event `self <= threshold`.
    pub fn le_value(&self, threshold: Real) -> Event {
        self.le(&RandomVariable::constant(threshold))
    }

    /// The event `self > threshold`.
    pub fn gt_value(&self, threshold: Real) -> Event {
        self.gt(&RandomVariable::constant(threshold))
    }

    /// The event `self >= threshold`.
    pub fn ge_value(&self, threshold: Real) -> Event {
        self.ge(&RandomVariable::constant(threshold))
    }

    /// The event `self == threshold`.
    pub fn eq_value(&self, threshold: Real) -> Event {
        self.eq_rv(&RandomVariable::constant(threshold))
    }

    /// The event `self != threshold`.
    pub fn ne_value(&self, threshold: Real) -> Event {
        self.ne_rv(&RandomVariable::constant(threshold))
    }
}

impl std::fmt::Debug for RandomVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomVariable")
            .field("node", &self.node)
            .finish()
    }
}

macro_rules! impl_rv_binary_op {
    ($trait:ident, $method:ident) => {
        impl std::ops::$trait for &RandomVariable {
            type Output = RandomVariable;

            fn $method(self, rhs: &RandomVariable) -> RandomVariable {
                RandomVariable::$method(self, rhs)
            }
        }

        impl std::ops::$trait for RandomVariable {
            type Output = RandomVariable;

            fn $method(self, rhs: RandomVariable) -> RandomVariable {
                RandomVariable::$method(&self, &rhs)
            }
        }

        impl std::ops::$trait<Real> for &RandomVariable {
            type Output = RandomVariable;

            fn $method(self, rhs: Real) -> RandomVariable {
                RandomVariable::$method(self, &RandomVariable::constant(rhs))
            }
        }

        impl std::ops::$trait<i64> for &RandomVariable {
            type Output = RandomVariable;

            fn $method(self, rhs: i64) -> RandomVariable {
                RandomVariable::$method(self, &RandomVariable::constant(Real::from_i64(rhs)))
            }
        }
    };
}

impl_rv_binary_op!(Add, add);
impl_rv_binary_op!(Sub, sub);
impl_rv_binary_op!(Mul, mul);
impl_rv_binary_op!(Div, div);

impl std::ops::Neg for &RandomVariable {
    type Output = RandomVariable;

    fn neg(self) -> RandomVariable {
        RandomVariable::neg(self)
    }
}

impl std::ops::Neg for RandomVariable {
    type Output = RandomVariable;

    fn neg(self) -> RandomVariable {
        RandomVariable::neg(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stochast_models::Registry;

    fn unit_normal() -> RandomVariable {
        let registry = Registry::with_builtins();
        RandomVariable::from_distribution(
            registry
                .instantiate("normal", vec![Real::zero(), Real::one()])
                .unwrap(),
        )
    }

    #[test]
    fn test_leaf_ids_are_unique() {
        let a = unit_normal();
        let b = unit_normal();
        assert_ne!(a.leaf_ids(), b.leaf_ids());
    }

    #[test]
    fn test_clone_preserves_identity() {
        let a = unit_normal();
        let b = a.clone();
        assert_eq!(a.leaf_ids(), b.leaf_ids());
    }

    #[test]
    fn test_distinct_leaves_compose_independently() {
        let a = unit_normal();
        let b = unit_normal();
        let sum = &a + &b;
        match sum.node().as_ref() {
            Node::Binary { independent, .. } => assert!(independent),
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_forces_dependence() {
        let a = unit_normal();
        let diff = &a - &a;
        match diff.node().as_ref() {
            Node::Binary { independent, .. } => assert!(!independent),
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_shared_subtree_detected_through_nesting() {
        let a = unit_normal();
        let b = unit_normal();
        let inner = &a + &b;
        // `a` appears on both sides through the nested sum.
        let outer = &inner * &a;
        match outer.node().as_ref() {
            Node::Binary { independent, .. } => assert!(!independent),
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_constant_operand_stays_independent() {
        let a = unit_normal();
        let shifted = &a + 10;
        match shifted.node().as_ref() {
            Node::Binary { op, independent, .. } => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(independent);
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_scale_and_shift_builders() {
        let a = unit_normal();
        let mapped = a.scale(Real::from_i64(3)).shift(Real::from_i64(1));
        assert_eq!(mapped.leaf_ids(), a.leaf_ids());
    }

    #[test]
    fn test_composition_shares_subtrees() {
        let a = unit_normal();
        let sum = &a + &a;
        match sum.node().as_ref() {
            Node::Binary { lhs, rhs, .. } => assert!(Arc::ptr_eq(lhs, rhs)),
            other => panic!("unexpected node: {other:?}"),
        }
    }
}
