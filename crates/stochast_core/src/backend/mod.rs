//! Arbitrary-precision numeric backend.
//!
//! Wraps a pluggable multi-precision arithmetic provider behind a
//! uniform surface:
//!
//! - [`Real`]: the value type (construction, arithmetic, comparison,
//!   elementary functions)
//! - [`PrecisionConfig`] / [`configure`]: process-wide working precision
//! - [`backend_name`]: the discoverable identity of the active provider
//!
//! Two providers exist: the always-available pure-Rust `"reference"`
//! provider (`dashu-float`) and the MPFR-backed `"accelerated"` provider
//! (`rug`) behind the `accelerated` cargo feature. Layers above this one
//! must never branch on the identity: only performance may differ, never
//! values beyond precision-driven rounding.

mod config;
mod real;
mod reference;

#[cfg(feature = "accelerated")]
mod accelerated;

pub use config::{
    backend_name, configure, current_config, BackendKind, PrecisionConfig, DEFAULT_DIGITS,
    MAX_DIGITS, MIN_DIGITS,
};
pub use real::Real;
