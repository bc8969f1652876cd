//! Support descriptions for distribution families.

use stochast_core::Real;

/// One end of a support interval.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// The support extends without bound in this direction.
    Unbounded,
    /// The support is bounded by a finite value (inclusive).
    Finite(Real),
}

impl Bound {
    /// Returns the finite value, if any.
    #[inline]
    pub fn finite(&self) -> Option<&Real> {
        match self {
            Bound::Finite(v) => Some(v),
            Bound::Unbounded => None,
        }
    }
}

/// The set of values a distribution assigns positive mass or density to.
///
/// Discrete supports are integer lattices; continuous supports are
/// intervals. Bounds are inclusive where finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Support {
    lower: Bound,
    upper: Bound,
    discrete: bool,
}

impl Support {
    /// A continuous support over the whole real line.
    #[inline]
    pub fn real_line() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            discrete: false,
        }
    }

    /// A continuous support over a finite interval `[lower, upper]`.
    #[inline]
    pub fn interval(lower: Real, upper: Real) -> Self {
        Self {
            lower: Bound::Finite(lower),
            upper: Bound::Finite(upper),
            discrete: false,
        }
    }

    /// A continuous support over `[lower, +inf)`.
    #[inline]
    pub fn half_line(lower: Real) -> Self {
        Self {
            lower: Bound::Finite(lower),
            upper: Bound::Unbounded,
            discrete: false,
        }
    }

    /// A discrete integer support over `[lower, upper]`.
    #[inline]
    pub fn integer_range(lower: Real, upper: Real) -> Self {
        Self {
            lower: Bound::Finite(lower),
            upper: Bound::Finite(upper),
            discrete: true,
        }
    }

    /// A discrete integer support over `[lower, +inf)`.
    #[inline]
    pub fn integers_from(lower: Real) -> Self {
        Self {
            lower: Bound::Finite(lower),
            upper: Bound::Unbounded,
            discrete: true,
        }
    }

    /// The lower bound.
    #[inline]
    pub fn lower(&self) -> &Bound {
        &self.lower
    }

    /// The upper bound.
    #[inline]
    pub fn upper(&self) -> &Bound {
        &self.upper
    }

    /// Whether the support is an integer lattice.
    #[inline]
    pub fn is_discrete(&self) -> bool {
        self.discrete
    }

    /// Whether both ends of the support are finite.
    #[inline]
    pub fn is_bounded(&self) -> bool {
        matches!(
            (&self.lower, &self.upper),
            (Bound::Finite(_), Bound::Finite(_))
        )
    }

    /// Whether the value zero lies inside the support.
    pub fn contains_zero(&self) -> bool {
        let below = match &self.lower {
            Bound::Unbounded => true,
            Bound::Finite(l) => !l.is_positive(),
        };
        let above = match &self.upper {
            Bound::Unbounded => true,
            Bound::Finite(u) => !u.is_negative(),
        };
        below && above
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_line_is_unbounded() {
        let s = Support::real_line();
        assert!(!s.is_bounded());
        assert!(!s.is_discrete());
        assert!(s.contains_zero());
    }

    #[test]
    fn test_interval_bounds() {
        let s = Support::interval(Real::from_i64(1), Real::from_i64(3));
        assert!(s.is_bounded());
        assert!(!s.contains_zero());
        assert_eq!(s.lower().finite(), Some(&Real::from_i64(1)));
    }

    #[test]
    fn test_half_line_contains_zero_at_boundary() {
        let s = Support::half_line(Real::zero());
        assert!(s.contains_zero());
        assert!(!s.is_bounded());
    }

    #[test]
    fn test_integer_range_is_discrete() {
        let s = Support::integer_range(Real::zero(), Real::from_i64(10));
        assert!(s.is_discrete());
        assert!(s.is_bounded());
        assert!(s.contains_zero());
    }

    #[test]
    fn test_negative_interval_excludes_zero() {
        let s = Support::interval(Real::from_i64(-5), Real::from_i64(-1));
        assert!(!s.contains_zero());
    }
}
