//! Error types for the distribution registry.

use stochast_core::NumericError;
use thiserror::Error;

/// Categorised registry errors.
///
/// # Variants
/// - `DuplicateFamily`: A family name collided at registration
/// - `UnknownFamily`: Instantiation referenced an unregistered family
/// - `InvalidParameter`: A parameter violated its domain constraint
/// - `Numeric`: A backend failure surfaced through family mathematics
///
/// # Examples
/// ```
/// use stochast_models::RegistryError;
///
/// let err = RegistryError::UnknownFamily("cauchy".to_string());
/// assert_eq!(format!("{}", err), "unknown distribution family \"cauchy\"");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A family with this name is already registered.
    #[error("distribution family {0:?} is already registered")]
    DuplicateFamily(String),

    /// No family with this name is registered.
    #[error("unknown distribution family {0:?}")]
    UnknownFamily(String),

    /// A parameter violated the family's domain constraint.
    #[error("invalid parameter {parameter:?} for family {family:?}: {constraint}")]
    InvalidParameter {
        /// The family being instantiated.
        family: String,
        /// The offending parameter name.
        parameter: String,
        /// Human-readable description of the violated constraint.
        constraint: String,
    },

    /// A numeric backend failure.
    #[error(transparent)]
    Numeric(#[from] NumericError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_family_display() {
        let err = RegistryError::DuplicateFamily("normal".to_string());
        assert!(format!("{}", err).contains("already registered"));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = RegistryError::InvalidParameter {
            family: "normal".to_string(),
            parameter: "sigma".to_string(),
            constraint: "must be strictly positive".to_string(),
        };
        let rendered = format!("{}", err);
        assert!(rendered.contains("sigma"));
        assert!(rendered.contains("strictly positive"));
    }

    #[test]
    fn test_numeric_error_conversion() {
        let err: RegistryError = NumericError::DivisionByZero.into();
        assert!(matches!(err, RegistryError::Numeric(_)));
    }

    #[test]
    fn test_error_trait_implementation() {
        let err = RegistryError::UnknownFamily("x".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
