//! Monte Carlo evaluation.
//!
//! Samples are drawn in parallel batches over disjoint RNG streams
//! derived from `(seed, batch index)`, merged by combining sums and
//! counts, so results are reproducible for a given seed and
//! independent of batch scheduling. Transient numeric failures inside
//! one sample are retried with a fresh draw up to [`MC_RETRY_BUDGET`];
//! a sample that keeps failing aborts the whole query.

use std::collections::HashMap;

use rayon::prelude::*;
use stochast_core::Real;

use crate::error::EvalError;
use crate::expr::{Event, RandomVariable};
use crate::rng::EngineRng;
use crate::sample::{eval_sampled, event_holds_sampled};

use super::config::{MonteCarloConfig, MC_RETRY_BUDGET};

pub(crate) struct McOutcome {
    pub(crate) value: Real,
    pub(crate) samples: u64,
    pub(crate) std_error: Real,
}

/// Whether an error is a per-sample numeric transient worth retrying.
fn is_transient(err: &EvalError) -> bool {
    matches!(
        err,
        EvalError::Numeric(_)
            | EvalError::Registry(stochast_models::RegistryError::Numeric(_))
    )
}

/// Runs one closure per sample with the retry budget applied.
fn run_batches<T, F>(config: &MonteCarloConfig, per_sample: F) -> Result<Vec<T>, EvalError>
where
    T: Send,
    F: Fn(&mut EngineRng) -> Result<T, EvalError> + Sync,
{
    let total = config.samples();
    let batch_size = config.batch_size();
    let batches = total.div_ceil(batch_size);
    let base = EngineRng::from_seed(config.seed());

    let per_batch: Vec<Vec<T>> = (0..batches)
        .into_par_iter()
        .map(|index| {
            let mut rng = base.derive_stream(index);
            let in_batch = batch_size.min(total - index * batch_size);
            let mut out = Vec::with_capacity(in_batch as usize);
            for _ in 0..in_batch {
                out.push(sample_with_retries(&mut rng, &per_sample)?);
            }
            Ok(out)
        })
        .collect::<Result<_, EvalError>>()?;

    Ok(per_batch.into_iter().flatten().collect())
}

fn sample_with_retries<T, F>(rng: &mut EngineRng, per_sample: &F) -> Result<T, EvalError>
where
    F: Fn(&mut EngineRng) -> Result<T, EvalError>,
{
    let mut attempts = 0u32;
    loop {
        match per_sample(rng) {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempts < MC_RETRY_BUDGET => {
                tracing::trace!(attempt = attempts, error = %err, "retrying failed sample");
                attempts += 1;
            }
            Err(err) if is_transient(&err) => {
                return Err(EvalError::RetryBudgetExhausted {
                    budget: MC_RETRY_BUDGET,
                })
            }
            Err(err) => return Err(err),
        }
    }
}

fn value_statistics(values: &[Real]) -> Result<(Real, Real, Real), EvalError> {
    let n = Real::from_i64(values.len() as i64);
    let mut sum = Real::zero();
    let mut sum_sq = Real::zero();
    for v in values {
        sum = &sum + v;
        sum_sq = &sum_sq + &(v * v);
    }
    let mean = sum.try_div(&n)?;
    let squared_sum = (&sum * &sum).try_div(&n)?;
    let centred = &sum_sq - &squared_sum;
    let variance = if values.len() > 1 {
        let v = centred.try_div(&Real::from_i64(values.len() as i64 - 1))?;
        // Rounding can push an identically-zero spread negative.
        if v.is_negative() {
            Real::zero()
        } else {
            v
        }
    } else {
        Real::zero()
    };
    Ok((mean, variance, n))
}

/// Estimates `E[expr]`.
pub(crate) fn expectation(
    rv: &RandomVariable,
    config: &MonteCarloConfig,
) -> Result<McOutcome, EvalError> {
    let node = rv.node().clone();
    let values = run_batches(config, |rng| {
        let mut env = HashMap::new();
        eval_sampled(&node, &mut env, rng)
    })?;
    let (mean, variance, n) = value_statistics(&values)?;
    let std_error = variance.try_div(&n)?.sqrt()?;
    Ok(McOutcome {
        value: mean,
        samples: values.len() as u64,
        std_error,
    })
}

/// Estimates `Var[expr]` with a normal-approximation standard error.
pub(crate) fn variance(
    rv: &RandomVariable,
    config: &MonteCarloConfig,
) -> Result<McOutcome, EvalError> {
    let node = rv.node().clone();
    let values = run_batches(config, |rng| {
        let mut env = HashMap::new();
        eval_sampled(&node, &mut env, rng)
    })?;
    let (_, variance, _) = value_statistics(&values)?;
    // se(S^2) ~ S^2 sqrt(2 / (n - 1)) under approximate normality.
    let spread_factor = Real::from_f64((2.0 / (values.len().max(2) as f64 - 1.0)).sqrt())?;
    let std_error = &variance * &spread_factor;
    Ok(McOutcome {
        value: variance,
        samples: values.len() as u64,
        std_error,
    })
}

/// Estimates `P(event)`.
pub(crate) fn probability(
    event: &Event,
    config: &MonteCarloConfig,
) -> Result<McOutcome, EvalError> {
    let truths = run_batches(config, |rng| {
        let mut env = HashMap::new();
        event_holds_sampled(event, &mut env, rng)
    })?;
    let n = truths.len() as u64;
    let hits = truths.iter().filter(|t| **t).count() as i64;
    let total = Real::from_i64(n as i64);
    let p = Real::from_i64(hits).try_div(&total)?;
    // se = sqrt(p (1 - p) / n)
    let complement = &Real::one() - &p;
    let std_error = (&p * &complement).try_div(&total)?.sqrt()?;
    Ok(McOutcome {
        value: p,
        samples: n,
        std_error,
    })
}
