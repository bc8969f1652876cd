//! Integration tests exercising the registry and built-in families
//! together.

use approx::assert_relative_eq;
use proptest::prelude::*;
use stochast_core::Real;
use stochast_models::{FamilyKind, FoldOp, Registry};

fn registry() -> Registry {
    Registry::with_builtins()
}

#[test]
fn test_builtin_families_resolve() {
    let registry = registry();
    for name in [
        "normal",
        "uniform",
        "exponential",
        "bernoulli",
        "binomial",
        "poisson",
        "discrete_uniform",
    ] {
        assert_eq!(registry.get(name).unwrap().name(), name);
    }
}

#[test]
fn test_kinds_are_declared_not_inferred() {
    let registry = registry();
    let die = registry
        .instantiate("discrete_uniform", vec![Real::from_i64(1), Real::from_i64(6)])
        .unwrap();
    let iq = registry
        .instantiate("normal", vec![Real::from_i64(100), Real::from_i64(15)])
        .unwrap();
    assert_eq!(die.kind(), FamilyKind::Discrete);
    assert_eq!(iq.kind(), FamilyKind::Continuous);
}

#[test]
fn test_iq_scenario_moments() {
    let registry = registry();
    let iq = registry
        .instantiate("normal", vec![Real::from_i64(100), Real::from_i64(15)])
        .unwrap();
    assert_eq!(iq.mean().unwrap(), Real::from_i64(100));
    assert_eq!(iq.std_dev().unwrap(), Real::from_i64(15));

    // Two-sigma upper tail of the IQ distribution.
    let tail = &Real::one() - &iq.cdf(&Real::from_i64(130)).unwrap();
    assert_relative_eq!(
        tail.to_f64(),
        0.022750131948179195,
        max_relative = 1e-13
    );
}

#[test]
fn test_chained_normal_fold_stays_closed() {
    let registry = registry();
    let a = registry
        .instantiate("normal", vec![Real::from_i64(1), Real::from_i64(2)])
        .unwrap();
    let b = registry
        .instantiate("normal", vec![Real::from_i64(2), Real::from_i64(3)])
        .unwrap();
    let c = registry
        .instantiate("normal", vec![Real::from_i64(3), Real::from_i64(6)])
        .unwrap();
    let ab = registry.compose(FoldOp::Add, &a, &b).unwrap().unwrap();
    let abc = registry.compose(FoldOp::Add, &ab, &c).unwrap().unwrap();
    assert_relative_eq!(abc.params()[0].to_f64(), 6.0, max_relative = 1e-15);
    // sqrt(4 + 9 + 36) = 7
    assert_relative_eq!(abc.params()[1].to_f64(), 7.0, max_relative = 1e-14);
}

#[test]
fn test_user_registered_family_participates() {
    use rand::RngCore;
    use stochast_models::params::{Constraint, ParamSpec};
    use stochast_models::{Family, RegistryError, Support};

    static SPECS: [ParamSpec; 1] = [ParamSpec::new("value", Constraint::Real)];

    /// Point mass at a single value.
    #[derive(Debug)]
    struct Degenerate;

    impl Family for Degenerate {
        fn name(&self) -> &'static str {
            "degenerate"
        }
        fn kind(&self) -> FamilyKind {
            FamilyKind::Discrete
        }
        fn param_specs(&self) -> &'static [ParamSpec] {
            &SPECS
        }
        fn support(&self, params: &[Real]) -> Support {
            Support::integer_range(params[0].clone(), params[0].clone())
        }
        fn mean(&self, params: &[Real]) -> Result<Real, RegistryError> {
            Ok(params[0].clone())
        }
        fn variance(&self, _params: &[Real]) -> Result<Real, RegistryError> {
            Ok(Real::zero())
        }
        fn pdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
            Ok(
                if x.cmp_value(&params[0]) == std::cmp::Ordering::Equal {
                    Real::one()
                } else {
                    Real::zero()
                },
            )
        }
        fn cdf(&self, params: &[Real], x: &Real) -> Result<Real, RegistryError> {
            Ok(
                if x.cmp_value(&params[0]) == std::cmp::Ordering::Less {
                    Real::zero()
                } else {
                    Real::one()
                },
            )
        }
        fn inverse_cdf(&self, params: &[Real], _p: &Real) -> Result<Real, RegistryError> {
            Ok(params[0].clone())
        }
        fn draw(&self, params: &[Real], _rng: &mut dyn RngCore) -> Result<Real, RegistryError> {
            Ok(params[0].clone())
        }
    }

    let mut registry = registry();
    registry.register(std::sync::Arc::new(Degenerate)).unwrap();
    let point = registry
        .instantiate("degenerate", vec![Real::from_i64(42)])
        .unwrap();
    assert_eq!(point.mean().unwrap(), Real::from_i64(42));
    assert!(point.variance().unwrap().is_zero());

    // A second registration of the same name collides.
    let err = registry
        .register(std::sync::Arc::new(Degenerate))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateFamily(_)));
}

#[test]
fn test_empirical_mean_tracks_analytic_mean() {
    use rand::SeedableRng;

    let registry = registry();
    let x = registry
        .instantiate("exponential", vec![Real::from_i64(4)])
        .unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(20_260_830);
    let n = 20_000;
    let mut total = 0.0f64;
    for _ in 0..n {
        total += x.draw(&mut rng).unwrap().to_f64();
    }
    let empirical = total / n as f64;
    // Std error of the mean is (1/rate)/sqrt(n) ~ 0.0018; allow 5 sigma.
    assert!((empirical - 0.25).abs() < 0.009);
}

proptest! {
    #[test]
    fn prop_normal_rejects_non_positive_sigma(sigma in -10.0f64..=0.0) {
        let registry = registry();
        let result = registry.instantiate(
            "normal",
            vec![Real::zero(), Real::from_f64(sigma).unwrap()],
        );
        prop_assert!(result.is_err());
    }

    #[test]
    fn prop_normal_cdf_monotone(a in -5.0f64..5.0, b in -5.0f64..5.0) {
        let registry = registry();
        let x = registry
            .instantiate("normal", vec![Real::zero(), Real::one()])
            .unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let c_lo = x.cdf(&Real::from_f64(lo).unwrap()).unwrap();
        let c_hi = x.cdf(&Real::from_f64(hi).unwrap()).unwrap();
        prop_assert!(c_lo.cmp_value(&c_hi) != std::cmp::Ordering::Greater);
    }

    #[test]
    fn prop_uniform_quantile_round_trip(p in 0.01f64..0.99) {
        let registry = registry();
        let x = registry
            .instantiate("uniform", vec![Real::from_i64(-2), Real::from_i64(3)])
            .unwrap();
        let q = x.inverse_cdf(&Real::from_f64(p).unwrap()).unwrap();
        let back = x.cdf(&q).unwrap();
        prop_assert!((back.to_f64() - p).abs() < 1e-12);
    }

    #[test]
    fn prop_bernoulli_masses_sum_to_one(p in 0.0f64..=1.0) {
        let registry = registry();
        let x = registry
            .instantiate("bernoulli", vec![Real::from_f64(p).unwrap()])
            .unwrap();
        let total = &x.pdf(&Real::zero()).unwrap() + &x.pdf(&Real::one()).unwrap();
        prop_assert_eq!(total, Real::one());
    }
}
