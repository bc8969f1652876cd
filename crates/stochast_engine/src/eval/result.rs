//! Evaluation results and their provenance.

use stochast_core::Real;

/// How a value was obtained, with the accuracy information the method
/// provides.
#[derive(Debug, Clone, PartialEq)]
pub enum Provenance {
    /// Closed-form result; exact at the working precision.
    Exact,
    /// Adaptive quadrature result.
    Quadrature {
        /// Error bound reported by the integration rule.
        error_bound: Real,
    },
    /// Monte Carlo estimate.
    MonteCarlo {
        /// Number of samples aggregated.
        samples: u64,
        /// Standard error of the estimate.
        std_error: Real,
    },
}

/// A query result: the value together with how it was obtained.
///
/// # Examples
/// ```
/// use stochast_core::Real;
/// use stochast_engine::eval::{EvaluationResult, Provenance};
///
/// let result = EvaluationResult::exact(Real::from_i64(100));
/// assert!(result.is_exact());
/// assert_eq!(result.value(), &Real::from_i64(100));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    value: Real,
    provenance: Provenance,
}

impl EvaluationResult {
    /// Wraps a closed-form value.
    #[inline]
    pub fn exact(value: Real) -> Self {
        Self {
            value,
            provenance: Provenance::Exact,
        }
    }

    /// Wraps a quadrature value with its error bound.
    #[inline]
    pub fn quadrature(value: Real, error_bound: Real) -> Self {
        Self {
            value,
            provenance: Provenance::Quadrature { error_bound },
        }
    }

    /// Wraps a Monte Carlo estimate with its sample count and standard
    /// error.
    #[inline]
    pub fn monte_carlo(value: Real, samples: u64, std_error: Real) -> Self {
        Self {
            value,
            provenance: Provenance::MonteCarlo { samples, std_error },
        }
    }

    /// The computed value.
    #[inline]
    pub fn value(&self) -> &Real {
        &self.value
    }

    /// Consumes the result, returning the value.
    #[inline]
    pub fn into_value(self) -> Real {
        self.value
    }

    /// How the value was obtained.
    #[inline]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Whether the value is closed-form.
    #[inline]
    pub fn is_exact(&self) -> bool {
        matches!(self.provenance, Provenance::Exact)
    }

    /// Whether the value came from quadrature.
    #[inline]
    pub fn is_quadrature(&self) -> bool {
        matches!(self.provenance, Provenance::Quadrature { .. })
    }

    /// Whether the value is a Monte Carlo estimate.
    #[inline]
    pub fn is_monte_carlo(&self) -> bool {
        matches!(self.provenance, Provenance::MonteCarlo { .. })
    }
}
