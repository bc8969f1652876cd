//! # stochast_models: Distribution Families and Registry
//!
//! ## Layer 2 (Models) Role
//!
//! stochast_models sits between the numeric foundation
//! (`stochast_core`) and the evaluation engine, providing:
//! - The [`Family`] trait: parameter contracts, supports, moments,
//!   density/mass, CDF, quantile, and sampling for one parametric
//!   family (`families`)
//! - Seven built-in families: normal, uniform, exponential, Bernoulli,
//!   binomial, Poisson, and discrete uniform
//! - The [`Registry`]: family registration, validated instantiation
//!   into bound [`Distribution`] values, and the composition/affine
//!   rule tables consulted during algebraic folding (`registry`)
//! - Parameter and support descriptors (`params`, `support`)
//! - Error types: [`RegistryError`] (`error`)
//!
//! ## Usage
//!
//! ```rust
//! use stochast_core::Real;
//! use stochast_models::Registry;
//!
//! let registry = Registry::with_builtins();
//! let iq = registry
//!     .instantiate("normal", vec![Real::from_i64(100), Real::from_i64(15)])
//!     .unwrap();
//! assert_eq!(iq.mean().unwrap(), Real::from_i64(100));
//! ```
//!
//! ## Feature Flags
//!
//! - `accelerated`: forward the MPFR-backed provider selection to
//!   `stochast_core`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod error;
pub mod families;
pub mod params;
pub mod registry;
pub mod support;

pub use error::RegistryError;
pub use families::{Family, FamilyKind};
pub use registry::{Distribution, DistributionSpec, FoldOp, Registry};
pub use support::{Bound, Support};
