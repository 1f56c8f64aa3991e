//! Randomized checks of the algebra against a plain Rust model of each specification.
use std::sync::Arc;

use hyspec::prelude::*;
use hyspec::walker::free_parameters;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

type Model = Arc<dyn Fn(i64) -> bool + Send + Sync>;

fn model(f: impl Fn(i64) -> bool + Send + Sync + 'static) -> Model {
    Arc::new(f)
}

fn random_spec(rng: &mut impl Rng, budget: usize) -> (Specification<i64>, Model) {
    if budget == 0 || rng.random_bool(0.25) {
        let k = rng.random_range(-20..=20i64);
        return match rng.random_range(0..=6) {
            0 => (specify::greater_than(k), model(move |x| x > k)),
            1 => (specify::less_than(k), model(move |x| x < k)),
            2 => (specify::equal_to(k), model(move |x| x == k)),
            3 => (specify::at_least(k), model(move |x| x >= k)),
            4 => {
                let m = rng.random_range(2..=5i64);
                let spec = Specification::from_fn(|x| {
                    x.rem(Expr::constant(m)).equals(Expr::constant(0i64))
                });
                (spec, model(move |x| x % m == 0))
            }
            5 => (specify::any(), model(|_| true)),
            6 => (specify::no(), model(|_| false)),
            _ => unreachable!(),
        };
    }

    let (left, f) = random_spec(rng, budget - 1);
    if rng.random_bool(0.2) {
        return (left.not(), model(move |x| !f(x)));
    }

    let (right, g) = random_spec(rng, budget - 1);
    match rng.random_range(0..=5) {
        0 => (left.and(right), model(move |x| f(x) && g(x))),
        1 => (left.or(right), model(move |x| f(x) || g(x))),
        2 => (left.xor(right), model(move |x| f(x) ^ g(x))),
        3 => (left.and_not(right), model(move |x| f(x) && !g(x))),
        4 => (left.or_not(right), model(move |x| f(x) || !g(x))),
        5 => (left.xor_not(right), model(move |x| f(x) ^ !g(x))),
        _ => unreachable!(),
    }
}

fn agree(spec: &Specification<i64>, model: &Model) {
    for x in -25..=25i64 {
        assert_eq!(spec.evaluate(&x), model(x), "`{spec}` disagrees at {x}");
    }
}

#[test]
fn random_compositions_match_their_model() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let (spec, model) = random_spec(&mut rng, 5);
        agree(&spec, &model);
    }
}

#[test]
fn random_compositions_keep_a_single_free_parameter() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    for _ in 0..200 {
        let (spec, _) = random_spec(&mut rng, 5);
        let criteria = spec.criteria();
        for free in free_parameters(criteria.body()) {
            assert_eq!(&free, criteria.parameter(), "stray parameter in `{spec}`");
        }
    }
}

#[test]
fn negation_and_de_morgan() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    for _ in 0..50 {
        let (a, _) = random_spec(&mut rng, 3);
        let (b, _) = random_spec(&mut rng, 3);

        let double = a.not().not();
        let de_morgan_and = (&a & &b).not();
        let expanded_and = a.not().or(b.not());
        let de_morgan_or = (&a | &b).not();
        let expanded_or = a.not().and(b.not());

        for x in -25..=25i64 {
            assert_eq!(double.evaluate(&x), a.evaluate(&x));
            assert_eq!(de_morgan_and.evaluate(&x), expanded_and.evaluate(&x));
            assert_eq!(de_morgan_or.evaluate(&x), expanded_or.evaluate(&x));
            assert_eq!(
                a.xor(&b).evaluate(&x),
                a.evaluate(&x) != b.evaluate(&x)
            );
        }
    }
}

#[test]
fn tautology_and_contradiction_are_identities() {
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let always = specify::any::<i64>();
    let never = specify::no::<i64>();

    for _ in 0..50 {
        let (a, _) = random_spec(&mut rng, 3);
        for x in -25..=25i64 {
            let expected = a.evaluate(&x);
            assert_eq!(a.and(&always).evaluate(&x), expected);
            assert_eq!(a.or(&never).evaluate(&x), expected);
            assert_eq!(a.xor(&never).evaluate(&x), expected);
            assert!(!a.and(&never).evaluate(&x));
            assert!(a.or(&always).evaluate(&x));
            assert!(a.or_not(&a).evaluate(&x));
            assert!(!a.and_not(&a).evaluate(&x));
        }
    }
}
