//! Process-wide precision configuration for the numeric backend.
//!
//! The original design used hidden mutable global state for precision;
//! here configuration is an explicit, validated value installed once at
//! startup. Values constructed afterwards read the installed
//! configuration; values constructed earlier keep their
//! construction-time precision so that results stay reproducible across
//! later reconfiguration.

use std::sync::RwLock;

use crate::types::NumericError;

/// Minimum supported working precision, in decimal digits.
pub const MIN_DIGITS: u32 = 1;

/// Maximum supported working precision, in decimal digits.
pub const MAX_DIGITS: u32 = 100_000;

/// Default working precision, in decimal digits.
pub const DEFAULT_DIGITS: u32 = 30;

/// Identity of the active arbitrary-precision provider.
///
/// Higher layers may report the identity in diagnostics but must never
/// branch on it for behaviour; only numeric results may differ, and only
/// by precision-driven rounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackendKind {
    /// Pure-Rust decimal big-float provider (`dashu-float`).
    #[default]
    Reference,

    /// GMP/MPFR-backed provider (`rug`), available behind the
    /// `accelerated` cargo feature.
    #[cfg(feature = "accelerated")]
    Accelerated,
}

impl BackendKind {
    /// Returns the discoverable identity string for this provider.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Reference => "reference",
            #[cfg(feature = "accelerated")]
            BackendKind::Accelerated => "accelerated",
        }
    }
}

/// Immutable precision configuration.
///
/// Installed process-wide via [`configure`]; read by every value
/// constructor in [`crate::backend::Real`].
///
/// # Examples
/// ```
/// use stochast_core::backend::{configure, PrecisionConfig};
///
/// let config = PrecisionConfig::new(50).unwrap();
/// configure(config).unwrap();
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrecisionConfig {
    digits: u32,
    backend: BackendKind,
}

impl PrecisionConfig {
    /// Creates a configuration with the given working precision in
    /// decimal digits and the default (reference) provider.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::PrecisionUnderflow`] if `digits` is
    /// outside `[MIN_DIGITS, MAX_DIGITS]`.
    pub fn new(digits: u32) -> Result<Self, NumericError> {
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
            return Err(NumericError::PrecisionUnderflow {
                requested: digits,
                min: MIN_DIGITS,
                max: MAX_DIGITS,
            });
        }
        Ok(Self {
            digits,
            backend: BackendKind::default(),
        })
    }

    /// Selects an explicit provider.
    #[inline]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Returns the working precision in decimal digits.
    #[inline]
    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Returns the selected provider.
    #[inline]
    pub fn backend(&self) -> BackendKind {
        self.backend
    }
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            digits: DEFAULT_DIGITS,
            backend: BackendKind::default(),
        }
    }
}

/// The installed process-wide configuration.
///
/// Expected to be written once during an initialisation phase before
/// concurrent use begins; concurrent reconfiguration must be serialised
/// externally by the caller.
static CONFIG: RwLock<PrecisionConfig> = RwLock::new(PrecisionConfig {
    digits: DEFAULT_DIGITS,
    backend: BackendKind::Reference,
});

/// Installs the process-wide precision configuration.
///
/// Only values constructed after this call observe the new precision;
/// existing values keep their construction-time precision.
///
/// # Errors
///
/// Returns [`NumericError::PrecisionUnderflow`] if the configured digit
/// count is outside the supported range.
pub fn configure(config: PrecisionConfig) -> Result<(), NumericError> {
    // Re-validate: the struct may have been deserialised.
    let validated = PrecisionConfig::new(config.digits)?.with_backend(config.backend);
    let mut guard = CONFIG.write().unwrap_or_else(|e| e.into_inner());
    *guard = validated;
    Ok(())
}

/// Returns the currently installed configuration.
#[inline]
pub fn current_config() -> PrecisionConfig {
    *CONFIG.read().unwrap_or_else(|e| e.into_inner())
}

/// Returns the identity string of the active provider.
///
/// Either `"reference"` or `"accelerated"`.
#[inline]
pub fn backend_name() -> &'static str {
    current_config().backend().name()
}
