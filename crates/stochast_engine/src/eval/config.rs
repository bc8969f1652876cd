//! Evaluation configuration.

use stochast_core::math::QuadratureConfig;

use crate::error::EvalError;

/// Retries granted to one Monte Carlo sample before the whole query
/// fails.
pub const MC_RETRY_BUDGET: u32 = 16;

/// Default Monte Carlo sample count.
pub const DEFAULT_MC_SAMPLES: u64 = 100_000;

/// Default Monte Carlo batch size for parallel execution.
pub const DEFAULT_MC_BATCH_SIZE: u64 = 8_192;

/// Hard cap on the Monte Carlo sample count.
pub const MAX_MC_SAMPLES: u64 = 1_000_000_000;

/// An evaluation strategy the dispatcher can be pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Closed-form moments and CDF probabilities only.
    Exact,
    /// Adaptive numeric integration.
    Quadrature,
    /// Monte Carlo sampling.
    MonteCarlo,
}

/// Monte Carlo sampling configuration.
///
/// # Examples
/// ```
/// use stochast_engine::eval::MonteCarloConfig;
///
/// let config = MonteCarloConfig::new()
///     .with_samples(50_000)
///     .with_seed(42);
/// assert_eq!(config.samples(), 50_000);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MonteCarloConfig {
    samples: u64,
    batch_size: u64,
    seed: u64,
}

impl MonteCarloConfig {
    /// Creates the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total sample count (a hard cap, never exceeded).
    #[inline]
    pub fn with_samples(mut self, samples: u64) -> Self {
        self.samples = samples;
        self
    }

    /// Sets the per-batch sample count for parallel execution.
    #[inline]
    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the base seed; batch streams are derived from it.
    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Total sample count.
    #[inline]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Per-batch sample count.
    #[inline]
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Base seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.samples == 0 {
            return Err(EvalError::InvalidConfig(
                "sample count must be at least 1".to_string(),
            ));
        }
        if self.samples > MAX_MC_SAMPLES {
            return Err(EvalError::InvalidConfig(format!(
                "sample count {} exceeds the cap of {}",
                self.samples, MAX_MC_SAMPLES
            )));
        }
        if self.batch_size == 0 {
            return Err(EvalError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_MC_SAMPLES,
            batch_size: DEFAULT_MC_BATCH_SIZE,
            seed: 0,
        }
    }
}

/// Top-level evaluation configuration.
///
/// Strategy selection is automatic (exact, then quadrature, then Monte
/// Carlo) unless pinned with [`EvalConfig::with_force_strategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalConfig {
    quadrature: QuadratureConfig,
    monte_carlo: MonteCarloConfig,
    force_strategy: Option<Strategy>,
}

impl EvalConfig {
    /// Creates the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quadrature configuration.
    #[inline]
    pub fn with_quadrature(mut self, quadrature: QuadratureConfig) -> Self {
        self.quadrature = quadrature;
        self
    }

    /// Sets the Monte Carlo configuration.
    #[inline]
    pub fn with_monte_carlo(mut self, monte_carlo: MonteCarloConfig) -> Self {
        self.monte_carlo = monte_carlo;
        self
    }

    /// Pins the dispatcher to one strategy.
    #[inline]
    pub fn with_force_strategy(mut self, strategy: Strategy) -> Self {
        self.force_strategy = Some(strategy);
        self
    }

    /// The quadrature configuration.
    #[inline]
    pub fn quadrature(&self) -> &QuadratureConfig {
        &self.quadrature
    }

    /// The Monte Carlo configuration.
    #[inline]
    pub fn monte_carlo(&self) -> &MonteCarloConfig {
        &self.monte_carlo
    }

    /// The pinned strategy, if any.
    #[inline]
    pub fn force_strategy(&self) -> Option<Strategy> {
        self.force_strategy
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.quadrature.tolerance() <= 0.0 {
            return Err(EvalError::InvalidConfig(
                "quadrature tolerance must be positive".to_string(),
            ));
        }
        self.monte_carlo.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EvalConfig::new().validate().is_ok());
    }

    #[test]
    fn test_zero_samples_rejected() {
        let config = EvalConfig::new().with_monte_carlo(MonteCarloConfig::new().with_samples(0));
        assert!(matches!(
            config.validate(),
            Err(EvalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sample_cap_enforced() {
        let config = MonteCarloConfig::new().with_samples(MAX_MC_SAMPLES + 1);
        assert!(config.validate().is_err());
        assert!(MonteCarloConfig::new()
            .with_samples(MAX_MC_SAMPLES)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_force_strategy_round_trips() {
        let config = EvalConfig::new().with_force_strategy(Strategy::Quadrature);
        assert_eq!(config.force_strategy(), Some(Strategy::Quadrature));
    }
}
