//! # stochast_engine: Symbolic Random Variables and Evaluation
//!
//! ## Layer 3 (Engine) Role
//!
//! stochast_engine is the top layer of the 3-layer architecture,
//! providing:
//! - Immutable expression trees over distribution leaves, with
//!   structural dependence tracking ([`expr`])
//! - Events: comparisons and their boolean combinations
//!   ([`expr::Event`])
//! - Best-effort algebraic folding against the registry's composition
//!   and affine rules ([`algebra`])
//! - Query evaluation with one deterministic strategy cascade (exact,
//!   then quadrature, then Monte Carlo), every result tagged with its
//!   provenance ([`eval`])
//! - Reproducible sampling of expressions and events ([`sample`],
//!   [`rng`])
//!
//! ## Usage
//!
//! ```rust
//! use stochast_core::Real;
//! use stochast_engine::eval::{EvalConfig, Evaluator};
//! use stochast_engine::expr::RandomVariable;
//!
//! let evaluator = Evaluator::new(EvalConfig::new()).unwrap();
//! let iq = RandomVariable::from_distribution(
//!     evaluator
//!         .registry()
//!         .instantiate("normal", vec![Real::from_i64(100), Real::from_i64(15)])
//!         .unwrap(),
//! );
//! let tail = evaluator
//!     .probability(&iq.ge_value(Real::from_i64(130)))
//!     .unwrap();
//! assert!(tail.is_exact());
//! ```
//!
//! ## Feature Flags
//!
//! - `accelerated`: forward the MPFR-backed numeric provider down the
//!   stack

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod algebra;
pub mod error;
pub mod eval;
pub mod expr;
pub mod rng;
pub mod sample;

pub use error::EvalError;
pub use eval::{EvalConfig, EvaluationResult, Evaluator, Provenance};
pub use expr::{Event, RandomVariable};
pub use rng::EngineRng;
pub use sample::Sampler;
