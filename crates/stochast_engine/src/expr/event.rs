//! Events: comparisons over random variables and their boolean
//! combinations.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{LeafId, Node};

/// Comparison operator between two expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Equal in value.
    Eq,
    /// Not equal in value.
    Ne,
}

impl CmpOp {
    /// The operator with its operands swapped (`a < b` ⇔ `b > a`).
    pub fn mirrored(self) -> CmpOp {
        match self {
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ne => CmpOp::Ne,
        }
    }

    /// Applies the comparison to an ordering of `lhs` against `rhs`.
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            CmpOp::Lt => ordering == Less,
            CmpOp::Le => ordering != Greater,
            CmpOp::Gt => ordering == Greater,
            CmpOp::Ge => ordering != Less,
            CmpOp::Eq => ordering == Equal,
            CmpOp::Ne => ordering != Equal,
        }
    }
}

/// A measurable event over one or more random variables.
///
/// Events are consumed only by the probability query; construction is
/// independence-agnostic, and the evaluator decides strategy at
/// evaluation time.
#[derive(Debug, Clone)]
pub enum Event {
    /// A comparison between two expressions.
    Compare {
        /// The comparison operator.
        op: CmpOp,
        /// Left-hand expression.
        lhs: Arc<Node>,
        /// Right-hand expression.
        rhs: Arc<Node>,
    },
    /// Both sub-events hold.
    And(Box<Event>, Box<Event>),
    /// At least one sub-event holds.
    Or(Box<Event>, Box<Event>),
    /// The sub-event does not hold.
    Not(Box<Event>),
}

impl Event {
    pub(crate) fn compare(op: CmpOp, lhs: Arc<Node>, rhs: Arc<Node>) -> Self {
        Event::Compare { op, lhs, rhs }
    }

    /// Conjunction of two events.
    pub fn and(self, other: Event) -> Event {
        Event::And(Box::new(self), Box::new(other))
    }

    /// Disjunction of two events.
    pub fn or(self, other: Event) -> Event {
        Event::Or(Box::new(self), Box::new(other))
    }

    /// Complement of this event.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Event {
        Event::Not(Box::new(self))
    }

    /// Leaf identities referenced anywhere in the event.
    pub fn leaf_ids(&self) -> BTreeSet<LeafId> {
        let mut ids = BTreeSet::new();
        self.collect_leaf_ids(&mut ids);
        ids
    }

    fn collect_leaf_ids(&self, ids: &mut BTreeSet<LeafId>) {
        match self {
            Event::Compare { lhs, rhs, .. } => {
                ids.extend(lhs.leaf_ids());
                ids.extend(rhs.leaf_ids());
            }
            Event::And(a, b) | Event::Or(a, b) => {
                a.collect_leaf_ids(ids);
                b.collect_leaf_ids(ids);
            }
            Event::Not(inner) => inner.collect_leaf_ids(ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_holds_table() {
        assert!(CmpOp::Lt.holds(Ordering::Less));
        assert!(!CmpOp::Lt.holds(Ordering::Equal));
        assert!(CmpOp::Le.holds(Ordering::Equal));
        assert!(CmpOp::Ge.holds(Ordering::Greater));
        assert!(CmpOp::Eq.holds(Ordering::Equal));
        assert!(CmpOp::Ne.holds(Ordering::Greater));
    }

    #[test]
    fn test_mirror_round_trips() {
        for op in [CmpOp::Lt, CmpOp::Le, CmpOp::Gt, CmpOp::Ge, CmpOp::Eq, CmpOp::Ne] {
            assert_eq!(op.mirrored().mirrored(), op);
        }
    }

    #[test]
    fn test_mirror_flips_strictness_side() {
        assert!(CmpOp::Lt.mirrored().holds(Ordering::Greater));
        assert!(!CmpOp::Lt.mirrored().holds(Ordering::Less));
    }
}
