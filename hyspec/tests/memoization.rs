use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use hyspec::prelude::*;

/// `x > 0` that counts how many times its criteria was built.
struct Counted {
    builds: Arc<AtomicUsize>,
}

impl SpecificationNode<i64> for Counted {
    fn build_criteria(&self) -> Criteria<i64> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Criteria::new(|x| x.gt(Expr::constant(0i64)))
    }
}

fn counted() -> (Specification<i64>, Arc<AtomicUsize>) {
    let builds = Arc::new(AtomicUsize::new(0));
    let spec = Specification::new(Counted {
        builds: builds.clone(),
    });
    (spec, builds)
}

#[test]
fn criteria_is_built_once() {
    let (spec, builds) = counted();
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let first = spec.criteria().body().clone();
    let second = spec.clone().criteria().body().clone();
    assert!(first.ptr_eq(&second));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn compiled_predicate_is_reused() {
    let (spec, builds) = counted();

    let compiled = spec.compiled().unwrap() as *const _;
    for x in -10..10i64 {
        assert_eq!(spec.evaluate(&x), x > 0);
    }
    assert_eq!(spec.compiled().unwrap() as *const _, compiled);
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn shared_operands_build_once() {
    let (leaf, builds) = counted();
    let first = leaf.and(specify::less_than(10i64));
    let second = leaf.or(specify::equal_to(-5i64));
    let third = leaf.for_all();

    assert!(first.evaluate(&3));
    assert!(second.evaluate(&-5));
    assert!(third.evaluate(&vec![1, 2]));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_first_use_builds_once() {
    let (spec, builds) = counted();
    let composite = spec.and_not(specify::equal_to(7i64));

    std::thread::scope(|scope| {
        for t in 0..8i64 {
            let composite = composite.clone();
            scope.spawn(move || {
                for x in -20..20i64 {
                    assert_eq!(composite.evaluate(&(x + t)), x + t > 0 && x + t != 7);
                }
            });
        }
    });
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn conversions_share_the_memoized_criteria() {
    let spec = specify::between(0i64, 10);

    let criteria: Criteria<i64> = (&spec).into();
    assert!(criteria.body().ptr_eq(spec.criteria().body()));

    let back = Specification::from(criteria.clone());
    assert!(back.criteria().body().ptr_eq(criteria.body()));
    assert_eq!(back.criteria(), spec.criteria());
}
