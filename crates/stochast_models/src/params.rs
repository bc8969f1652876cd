//! Parameter specifications and validation.

use stochast_core::Real;

/// Domain constraint attached to a single distribution parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Any finite real value.
    Real,
    /// Strictly positive real value.
    Positive,
    /// Real value in the closed unit interval `[0, 1]`.
    UnitInterval,
    /// Integer value.
    Integer,
    /// Non-negative integer value.
    NonNegativeInteger,
}

impl Constraint {
    /// Checks whether `value` satisfies the constraint.
    pub fn check(&self, value: &Real) -> bool {
        match self {
            Constraint::Real => true,
            Constraint::Positive => value.is_positive(),
            Constraint::UnitInterval => {
                !value.is_negative() && value.cmp_value(&Real::one()) != std::cmp::Ordering::Greater
            }
            Constraint::Integer => value.is_integer(),
            Constraint::NonNegativeInteger => !value.is_negative() && value.is_integer(),
        }
    }

    /// Human-readable description of the constraint, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Constraint::Real => "must be a finite real value",
            Constraint::Positive => "must be strictly positive",
            Constraint::UnitInterval => "must lie in [0, 1]",
            Constraint::Integer => "must be an integer",
            Constraint::NonNegativeInteger => "must be a non-negative integer",
        }
    }
}

/// Declares one named parameter of a distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name as it appears in constructors and error messages.
    pub name: &'static str,
    /// Domain constraint the parameter must satisfy.
    pub constraint: Constraint,
}

impl ParamSpec {
    /// Creates a parameter specification.
    #[inline]
    pub const fn new(name: &'static str, constraint: Constraint) -> Self {
        Self { name, constraint }
    }
}
