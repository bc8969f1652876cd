//! Shared mathematics expressed in backend arithmetic.
//!
//! - [`special`]: special functions (erf family, gamma family, pi)
//! - [`quadrature`]: adaptive numeric integration
//! - [`solvers`]: Newton refinement for inverse-CDF evaluation

pub mod quadrature;
pub mod solvers;
pub mod special;

pub use quadrature::{integrate, QuadratureConfig, QuadratureResult};
pub use solvers::newton_refine;
