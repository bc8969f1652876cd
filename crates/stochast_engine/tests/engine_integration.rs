//! End-to-end tests spanning expression construction, folding,
//! evaluation and sampling.

use approx::assert_relative_eq;
use proptest::prelude::*;
use stochast_core::Real;
use stochast_engine::eval::{EvalConfig, Evaluator, MonteCarloConfig, Provenance, Strategy};
use stochast_engine::expr::RandomVariable;
use stochast_engine::rng::EngineRng;
use stochast_engine::sample::Sampler;
use stochast_engine::EvalError;

fn evaluator() -> Evaluator {
    Evaluator::new(EvalConfig::new()).unwrap()
}

fn rv(ev: &Evaluator, family: &str, params: Vec<i64>) -> RandomVariable {
    RandomVariable::from_distribution(
        ev.registry()
            .instantiate(family, params.into_iter().map(Real::from_i64).collect())
            .unwrap(),
    )
}

#[test]
fn test_iq_worked_scenario() {
    let ev = evaluator();
    let iq = rv(&ev, "normal", vec![100, 15]);

    let mean = ev.expectation(&iq).unwrap();
    assert!(mean.is_exact());
    assert_eq!(mean.value(), &Real::from_i64(100));

    let std = ev.std_dev(&iq).unwrap();
    assert!(std.is_exact());
    assert_eq!(std.value(), &Real::from_i64(15));

    let tail = ev.probability(&iq.ge_value(Real::from_i64(130))).unwrap();
    assert!(tail.is_exact());
    assert_relative_eq!(
        tail.value().to_f64(),
        0.022750131948179195,
        max_relative = 1e-13
    );
}

#[test]
fn test_self_difference_is_certain() {
    let ev = evaluator();
    for (family, params) in [
        ("normal", vec![0, 1]),
        ("discrete_uniform", vec![1, 6]),
        ("exponential", vec![3]),
    ] {
        let x = rv(&ev, family, params);
        let p = ev
            .probability(&(&x - &x).eq_value(Real::zero()))
            .unwrap();
        assert!(p.is_exact(), "{family} should fold to a certainty");
        assert_eq!(p.value(), &Real::one());
    }
}

#[test]
fn test_normal_sum_fold_is_exact() {
    let ev = evaluator();
    let a = rv(&ev, "normal", vec![1, 3]);
    let b = rv(&ev, "normal", vec![2, 4]);
    let sum = &a + &b;

    let mean = ev.expectation(&sum).unwrap();
    assert!(mean.is_exact());
    assert_eq!(mean.value(), &Real::from_i64(3));

    let std = ev.std_dev(&sum).unwrap();
    assert!(std.is_exact());
    assert_relative_eq!(std.value().to_f64(), 5.0, max_relative = 1e-14);
}

#[test]
fn test_dependent_double_has_four_times_variance() {
    let ev = evaluator();
    let x = rv(&ev, "normal", vec![0, 1]);
    // 2X, built as X + X: variance 4, not the independent sum's 2.
    let doubled = &x + &x;
    let result = ev.variance(&doubled).unwrap();
    // Out of closed-form reach, but the tree transforms a single leaf,
    // so the single-variable quadrature rule picks it up.
    assert!(result.is_quadrature());
    assert_relative_eq!(result.value().to_f64(), 4.0, max_relative = 1e-6);
}

#[test]
fn test_discrete_vs_continuous_strictness() {
    let ev = evaluator();

    let die = rv(&ev, "discrete_uniform", vec![1, 6]);
    let lt = ev.probability(&die.lt_value(Real::from_i64(3))).unwrap();
    let le = ev.probability(&die.le_value(Real::from_i64(3))).unwrap();
    assert_relative_eq!(lt.value().to_f64(), 2.0 / 6.0, max_relative = 1e-13);
    assert_relative_eq!(le.value().to_f64(), 0.5, max_relative = 1e-13);

    let z = rv(&ev, "normal", vec![0, 1]);
    let lt = ev.probability(&z.lt_value(Real::zero())).unwrap();
    let le = ev.probability(&z.le_value(Real::zero())).unwrap();
    assert_eq!(lt.value(), le.value());
}

#[test]
fn test_tail_monotonicity() {
    let ev = evaluator();
    let iq = rv(&ev, "normal", vec![100, 15]);
    let mut previous = Real::one();
    for threshold in [100, 110, 120, 130, 140] {
        let p = ev
            .probability(&iq.ge_value(Real::from_i64(threshold)))
            .unwrap()
            .into_value();
        assert!(p.cmp_value(&previous) == std::cmp::Ordering::Less);
        previous = p;
    }
}

#[test]
fn test_empirical_moments_converge() {
    let ev = evaluator();
    let x = rv(&ev, "normal", vec![100, 15]);
    let mut rng = EngineRng::from_seed(20_260_830);
    let draws = Sampler::sample(&x, 100_000, &mut rng).unwrap();

    let n = draws.len() as f64;
    let mean: f64 = draws.iter().map(Real::to_f64).sum::<f64>() / n;
    let var: f64 = draws
        .iter()
        .map(|v| (v.to_f64() - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);

    // se(mean) = 15 / sqrt(100k) ~ 0.047; se(var) ~ 1.0. Allow 5 sigma.
    assert!((mean - 100.0).abs() < 0.25);
    assert!((var - 225.0).abs() < 5.5);
}

#[test]
fn test_monte_carlo_probability_matches_exact() {
    let exact_ev = evaluator();
    let mc_ev = Evaluator::new(
        EvalConfig::new()
            .with_force_strategy(Strategy::MonteCarlo)
            .with_monte_carlo(MonteCarloConfig::new().with_samples(100_000).with_seed(7)),
    )
    .unwrap();

    let exact_iq = rv(&exact_ev, "normal", vec![100, 15]);
    let mc_iq = rv(&mc_ev, "normal", vec![100, 15]);

    let exact_p = exact_ev
        .probability(&exact_iq.ge_value(Real::from_i64(115)))
        .unwrap()
        .into_value()
        .to_f64();
    let mc = mc_ev
        .probability(&mc_iq.ge_value(Real::from_i64(115)))
        .unwrap();
    match mc.provenance() {
        Provenance::MonteCarlo { std_error, .. } => {
            let se = std_error.to_f64();
            assert!((mc.value().to_f64() - exact_p).abs() < 6.0 * se.max(1e-4));
        }
        other => panic!("expected a Monte Carlo result, got {other:?}"),
    }
}

#[test]
fn test_forced_quadrature_on_entangled_event_errors() {
    let ev = Evaluator::new(EvalConfig::new().with_force_strategy(Strategy::Quadrature)).unwrap();
    let x = rv(&ev, "exponential", vec![1]);
    let y = rv(&ev, "exponential", vec![2]);
    // X appears on both sides of the threshold expression.
    let event = (&(&x + &y) * &x).le_value(Real::one());
    let err = ev.probability(&event).unwrap_err();
    assert_eq!(err, EvalError::NonIndependentUnsupported);
}

#[test]
fn test_event_combinators_via_sampling() {
    let ev = Evaluator::new(
        EvalConfig::new()
            .with_monte_carlo(MonteCarloConfig::new().with_samples(60_000).with_seed(11)),
    )
    .unwrap();
    let die = rv(&ev, "discrete_uniform", vec![1, 6]);
    // P(2 <= die <= 5) = 4/6 through a conjunction.
    let event = die
        .ge_value(Real::from_i64(2))
        .and(die.le_value(Real::from_i64(5)));
    let p = ev.probability(&event).unwrap();
    assert!(p.is_monte_carlo());
    assert!((p.value().to_f64() - 4.0 / 6.0).abs() < 0.01);

    // The complement comes out exact through the complement rule.
    let complement = die.ge_value(Real::from_i64(2)).not();
    let q = ev.probability(&complement).unwrap();
    assert!(q.is_exact());
    assert_relative_eq!(q.value().to_f64(), 1.0 / 6.0, max_relative = 1e-13);
}

#[test]
fn test_poisson_fold_and_mass_query() {
    let ev = evaluator();
    let a = rv(&ev, "poisson", vec![2]);
    let b = rv(&ev, "poisson", vec![3]);
    // The sum folds to Poisson(5); P(N == 4) is then a closed-form
    // mass query.
    let p = ev
        .probability(&(&a + &b).eq_value(Real::from_i64(4)))
        .unwrap();
    assert!(p.is_exact());
    let expected = (-5f64).exp() * 5f64.powi(4) / 24.0;
    assert_relative_eq!(p.value().to_f64(), expected, max_relative = 1e-12);
}

#[test]
fn test_covariance_with_self_matches_variance() {
    let ev = evaluator();
    let x = rv(&ev, "normal", vec![100, 15]);
    let cov = ev.covariance(&x, &x.clone()).unwrap();
    let var = ev.variance(&x).unwrap();
    assert!(cov.is_exact());
    assert_eq!(cov.value(), var.value());
    assert_eq!(cov.value(), &Real::from_i64(225));
}

#[test]
fn test_covariance_of_independent_leaves_is_zero() {
    let ev = evaluator();
    let x = rv(&ev, "normal", vec![100, 15]);
    let y = rv(&ev, "normal", vec![100, 15]);
    // E[XY] factorises for independent leaves; the whole query stays
    // closed form.
    let cov = ev.covariance(&x, &y).unwrap();
    assert!(cov.is_exact());
    assert!(cov.value().is_zero());

    let corr = ev.correlation(&x, &y).unwrap();
    assert!(corr.is_exact());
    assert!(corr.value().is_zero());
}

#[test]
fn test_covariance_of_overlapping_sums() {
    let ev = Evaluator::new(
        EvalConfig::new()
            .with_monte_carlo(MonteCarloConfig::new().with_samples(100_000).with_seed(31)),
    )
    .unwrap();
    let x = rv(&ev, "uniform", vec![0, 1]);
    let y = rv(&ev, "uniform", vec![0, 1]);
    let sum = &x + &y;

    // Cov(X, X + Y) = Var(X) = 1/12; the shared leaf forces the
    // product expectation through sampling.
    let cov = ev.covariance(&x, &sum).unwrap();
    assert!(cov.is_monte_carlo());
    assert!((cov.value().to_f64() - 1.0 / 12.0).abs() < 0.01);
    if let Provenance::MonteCarlo { std_error, .. } = cov.provenance() {
        assert!(std_error.is_positive());
    }

    // Corr(X, X + Y) = 1 / sqrt(2) with both standard deviations
    // closed form.
    let corr = ev.correlation(&x, &sum).unwrap();
    assert!(corr.is_monte_carlo());
    assert!((corr.value().to_f64() - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.05);
}

#[test]
fn test_correlation_of_degenerate_variable_is_undefined() {
    use stochast_core::NumericError;

    let ev = evaluator();
    let x = rv(&ev, "normal", vec![100, 15]);
    let c = RandomVariable::constant(Real::from_i64(5));
    let err = ev.correlation(&x, &c).unwrap_err();
    assert_eq!(err, EvalError::Numeric(NumericError::DivisionByZero));
}

#[test]
fn test_retry_budget_exhaustion_fails_the_query() {
    use rand::RngCore;
    use std::sync::Arc;
    use stochast_core::NumericError;
    use stochast_models::params::ParamSpec;
    use stochast_models::{Family, FamilyKind, Registry, RegistryError, Support};

    struct Flaky;

    static SPECS: [ParamSpec; 0] = [];

    impl Family for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn kind(&self) -> FamilyKind {
            FamilyKind::Continuous
        }
        fn param_specs(&self) -> &'static [ParamSpec] {
            &SPECS
        }
        fn support(&self, _params: &[Real]) -> Support {
            Support::real_line()
        }
        fn mean(&self, _params: &[Real]) -> Result<Real, RegistryError> {
            Ok(Real::zero())
        }
        fn variance(&self, _params: &[Real]) -> Result<Real, RegistryError> {
            Ok(Real::one())
        }
        fn pdf(&self, _params: &[Real], _x: &Real) -> Result<Real, RegistryError> {
            Ok(Real::zero())
        }
        fn cdf(&self, _params: &[Real], _x: &Real) -> Result<Real, RegistryError> {
            Ok(Real::zero())
        }
        fn inverse_cdf(&self, _params: &[Real], _p: &Real) -> Result<Real, RegistryError> {
            Ok(Real::zero())
        }
        fn draw(&self, _params: &[Real], _rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
            // Every draw fails with a numeric transient.
            Err(RegistryError::Numeric(NumericError::DivisionByZero))
        }
    }

    let mut registry = Registry::with_builtins();
    registry.register(Arc::new(Flaky)).unwrap();
    let ev = Evaluator::with_registry(
        registry,
        EvalConfig::new()
            .with_force_strategy(Strategy::MonteCarlo)
            .with_monte_carlo(MonteCarloConfig::new().with_samples(64).with_seed(7)),
    )
    .unwrap();

    let x = RandomVariable::from_distribution(ev.registry().instantiate("flaky", vec![]).unwrap());
    let err = ev.expectation(&x).unwrap_err();
    assert_eq!(err, EvalError::RetryBudgetExhausted { budget: 16 });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_shift_moves_mean_exactly(mu in -50i64..50, shift in -100i64..100) {
        let ev = evaluator();
        let x = rv(&ev, "normal", vec![mu, 10]);
        let shifted = &x + shift;
        let mean = ev.expectation(&shifted).unwrap();
        prop_assert!(mean.is_exact());
        prop_assert_eq!(mean.into_value(), Real::from_i64(mu + shift));
    }

    #[test]
    fn prop_scaling_scales_std_dev(scale in 1i64..20) {
        let ev = evaluator();
        let x = rv(&ev, "normal", vec![0, 3]);
        let scaled = &x * scale;
        let std = ev.std_dev(&scaled).unwrap();
        prop_assert!(std.is_exact());
        prop_assert_eq!(std.into_value(), Real::from_i64(3 * scale));
    }

    #[test]
    fn prop_probabilities_stay_in_unit_interval(threshold in -200i64..200) {
        let ev = evaluator();
        let x = rv(&ev, "normal", vec![0, 25]);
        let p = ev
            .probability(&x.le_value(Real::from_i64(threshold)))
            .unwrap()
            .into_value();
        prop_assert!(!p.is_negative());
        prop_assert!(p.cmp_value(&Real::one()) != std::cmp::Ordering::Greater);
    }
}
