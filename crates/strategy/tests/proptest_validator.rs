use std::sync::Arc;

use common::{DataSourceRef, MarketStrategy, Operator};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strategy::{DataSourceRegistry, StrategyValidator};

fn validator() -> StrategyValidator {
    StrategyValidator::new(Arc::new(
        DataSourceRegistry::bundled().expect("bundled registry"),
    ))
}

fn any_operator() -> impl Strategy<Value = Option<Operator>> {
    prop_oneof![
        Just(None),
        Just(Some(Operator::Gt)),
        Just(Some(Operator::Lt)),
        Just(Some(Operator::Gte)),
        Just(Some(Operator::Other("~".into()))),
    ]
}

/// Mix of registry ids and garbage ids.
fn any_id() -> impl Strategy<Value = i64> {
    prop_oneof![
        prop::sample::select(vec![12243i64, 12245, 12249, 12253, 12263, 12292]),
        any::<i64>(),
        Just(0i64),
    ]
}

fn any_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), Just(Some(0.0)), (0.01f64..100_000.0).prop_map(Some)]
}

fn any_reference() -> impl Strategy<Value = DataSourceRef> {
    (any_id(), any_value(), any_value(), any_operator()).prop_map(|(id, current, target, op)| {
        DataSourceRef {
            id,
            current_value: current,
            target_value: target,
            operator: op,
        }
    })
}

fn any_strategy() -> impl Strategy<Value = MarketStrategy> {
    (
        "[a-z0-9]{1,8}",
        prop::option::of(prop::collection::vec(any_reference(), 0..5)),
        prop::option::of(prop_oneof![Just(String::new()), "[a-z <>=0-9.]{1,20}"]),
    )
        .prop_map(|(id, sources, logic)| {
            let mut s = MarketStrategy::new(id, "generated");
            s.used_data_sources = sources;
            s.mathematical_logic = logic;
            s
        })
}

proptest! {
    /// Every output reference is a registry id, whatever the input.
    #[test]
    fn output_references_are_always_known(
        strategies in prop::collection::vec(any_strategy(), 0..8),
        seed in any::<u64>(),
    ) {
        let v = validator();
        let out = v.validate_strategies(&strategies, &mut ChaCha8Rng::seed_from_u64(seed));

        prop_assert_eq!(out.len(), strategies.len());
        for (fixed, original) in out.iter().zip(&strategies) {
            prop_assert_eq!(&fixed.id, &original.id);

            let refs = fixed.used_data_sources.as_ref().expect("sources populated");
            prop_assert!(!refs.is_empty());
            for r in refs {
                prop_assert!(v.registry().contains(r.id), "unknown id {} survived", r.id);
                prop_assert!(r.current_value.is_some());
                prop_assert!(r.target_value.is_some());
                prop_assert!(r.operator.is_some());
            }

            let logic = fixed.mathematical_logic.as_deref().unwrap_or_default();
            prop_assert!(!logic.is_empty());
            if let Some(given) = original.mathematical_logic.as_deref().filter(|l| !l.is_empty()) {
                prop_assert_eq!(logic, given);
            }
        }
    }

    /// Re-validating output never changes it: every reference is now valid
    /// and fully populated, so no random fallback is drawn again.
    #[test]
    fn validation_is_idempotent_on_its_own_output(
        strategies in prop::collection::vec(any_strategy(), 0..8),
        seed in any::<u64>(),
    ) {
        let v = validator();
        let once = v.validate_strategies(&strategies, &mut ChaCha8Rng::seed_from_u64(seed));
        let twice = v.validate_strategies(&once, &mut ChaCha8Rng::seed_from_u64(seed ^ 1));
        prop_assert_eq!(once, twice);
    }

    /// Fallback targets stay within 90%..110% of the current price.
    #[test]
    fn fallback_target_straddles_current(seed in any::<u64>()) {
        let v = validator();
        let fb = v.fallback_reference(&mut ChaCha8Rng::seed_from_u64(seed));
        prop_assert!(v.registry().fallbacks().any(|s| s.id == fb.id));
        if fb.current_value == 0.0 {
            prop_assert_eq!(fb.target_value, 0.0);
        } else {
            prop_assert!(fb.target_value >= 0.9 * fb.current_value);
            prop_assert!(fb.target_value <= 1.1 * fb.current_value);
        }
    }
}
