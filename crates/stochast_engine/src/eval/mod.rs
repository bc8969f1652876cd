//! Query evaluation: strategy dispatch, configuration and results.
//!
//! - [`Evaluator`]: expectation, variance, standard deviation and
//!   probability queries over expression trees
//! - [`EvalConfig`] / [`MonteCarloConfig`]: strategy and sampling
//!   configuration
//! - [`EvaluationResult`] / [`Provenance`]: values tagged with how they
//!   were obtained

mod config;
mod evaluator;
mod exact;
mod monte_carlo;
mod quadrature;
mod result;

pub use config::{
    EvalConfig, MonteCarloConfig, Strategy, DEFAULT_MC_BATCH_SIZE, DEFAULT_MC_SAMPLES,
    MAX_MC_SAMPLES, MC_RETRY_BUDGET,
};
pub use evaluator::Evaluator;
pub use result::{EvaluationResult, Provenance};
