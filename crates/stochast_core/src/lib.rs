//! # stochast_core: Numeric Foundation for the stochast Toolkit
//!
//! ## Layer 1 (Foundation) Role
//!
//! stochast_core is the bottom layer of the 3-layer architecture,
//! providing:
//! - The arbitrary-precision numeric backend (`backend`): the [`Real`]
//!   value type, process-wide precision configuration, and the
//!   discoverable provider identity
//! - Special functions expressed in backend arithmetic
//!   (`math::special`)
//! - Adaptive numeric integration (`math::quadrature`)
//! - Newton refinement for inverse-CDF evaluation (`math::solvers`)
//! - Error types: [`NumericError`] (`types`)
//!
//! ## Provider Model
//!
//! Two arbitrary-precision providers sit behind one surface:
//! `"reference"` (pure-Rust `dashu-float`, always available) and
//! `"accelerated"` (MPFR via `rug`, behind the `accelerated` feature).
//! The provider is selected at process start through
//! [`backend::configure`]; everything above this crate is agnostic to
//! which one is active.
//!
//! ## Usage
//!
//! ```rust
//! use stochast_core::backend::{backend_name, Real};
//!
//! let a = Real::parse("0.1").unwrap();
//! let b = Real::parse("0.2").unwrap();
//! assert_eq!(&a + &b, Real::parse("0.3").unwrap());
//! assert_eq!(backend_name(), "reference");
//! ```
//!
//! ## Feature Flags
//!
//! - `accelerated`: enable the MPFR-backed provider (needs GMP/MPFR)
//! - `serde`: serialisation support for configuration types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod backend;
pub mod math;
pub mod types;

pub use backend::Real;
pub use types::NumericError;
