//! Error types for the evaluation engine.

use stochast_core::NumericError;
use stochast_models::RegistryError;
use thiserror::Error;

/// Categorised evaluation errors.
///
/// # Variants
/// - `NonIndependentUnsupported`: A forced quadrature strategy met a
///   dependence-entangled tree
/// - `UnsupportedExpression`: No strategy could evaluate the tree
/// - `RetryBudgetExhausted`: Monte Carlo draws kept failing past the
///   retry budget
/// - `InvalidConfig`: An evaluation configuration failed validation
/// - `Numeric` / `Registry`: Failures surfaced from the lower layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The requested strategy needs independence the tree cannot
    /// guarantee.
    #[error("expression entangles dependent variables; the requested strategy needs independent operands")]
    NonIndependentUnsupported,

    /// No evaluation strategy applies to this expression.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// Monte Carlo sampling kept failing after exhausting its retries.
    #[error("sampling retry budget of {budget} exhausted")]
    RetryBudgetExhausted {
        /// Number of retries that were attempted.
        budget: u32,
    },

    /// The evaluation configuration is inconsistent.
    #[error("invalid evaluation configuration: {0}")]
    InvalidConfig(String),

    /// A numeric backend failure.
    #[error(transparent)]
    Numeric(#[from] NumericError),

    /// A distribution registry failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget_display() {
        let err = EvalError::RetryBudgetExhausted { budget: 16 };
        assert_eq!(format!("{}", err), "sampling retry budget of 16 exhausted");
    }

    #[test]
    fn test_numeric_error_conversion() {
        let err: EvalError = NumericError::DivisionByZero.into();
        assert!(matches!(err, EvalError::Numeric(_)));
    }

    #[test]
    fn test_registry_error_conversion() {
        let err: EvalError = RegistryError::UnknownFamily("x".into()).into();
        assert!(matches!(err, EvalError::Registry(_)));
    }
}
