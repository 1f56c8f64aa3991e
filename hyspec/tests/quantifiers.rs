use hyspec::expr::ExprNode;
use hyspec::prelude::*;

fn positive() -> Specification<i64> {
    specify::greater_than(0i64)
}

#[test]
fn for_any() {
    let spec = positive().for_any();

    assert_eq!(spec.to_string(), "xs => any(xs, x => x > 0)");
    assert!(spec.evaluate(&vec![-1, -2, -3, -4, 0, 1]));
    assert!(spec.evaluate(&vec![-1, -2, -3, -4, 0, 1, 2]));
    assert!(!spec.evaluate(&vec![-1, -2, -3, -4, 0]));
    assert!(!spec.evaluate(&vec![]));
}

#[test]
fn for_all() {
    let spec = positive().for_all();

    assert_eq!(spec.to_string(), "xs => all(xs, x => x > 0)");
    assert!(spec.evaluate(&vec![1, 2, 3, 4]));
    assert!(spec.evaluate(&vec![1, 1, 2, 3, 4, 5, 6]));
    assert!(!spec.evaluate(&vec![1, 2, 3, 4, 0]));
    assert!(!spec.evaluate(&vec![3, 32, 589, 0, 11]));
    assert!(spec.evaluate(&vec![]));
}

#[test]
fn for_one() {
    let spec = positive().for_one();

    assert!(spec.evaluate(&vec![-1, -2, -3, -4, 0, 1]));
    assert!(!spec.evaluate(&vec![-1, -2, -3, -4, 0]));
    assert!(!spec.evaluate(&vec![-1, -2, -3, -4, 0, 1, 2]));
    assert!(!spec.evaluate(&vec![]));
}

#[test]
fn unique_quantification_counts_against_one() {
    let inner = specify::equal_to(0i64);
    let spec = inner.for_one();
    let criteria = spec.criteria();

    let ExprNode::Binary { op, lhs, rhs } = criteria.body().node() else {
        panic!("expected a comparison, got {:?}", criteria.body());
    };
    assert_eq!(op.symbol(), "==");
    assert_eq!(rhs.as_constant(), Some(&Value::Int(1)));

    let ExprNode::Call { target, method, args } = lhs.node() else {
        panic!("expected a call, got {lhs:?}");
    };
    assert!(target.is_none());
    assert_eq!(method, &Method::Count);
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].as_parameter(), Some(criteria.parameter()));
    assert_eq!(args[1], inner.criteria().to_expr());
}

#[test]
fn quantified_leaf_shares_the_root() {
    let leaf = positive();
    let hundred = Lambda::<i64, Vec<i64>>::named("n", |_| {
        Expr::constant(Value::Seq(vec![Value::Int(100)].into()))
    });
    let left = leaf.and(leaf.for_any().adapt(hundred));
    let small = specify::less_than(10i64);
    let spec = left.and(&small);

    assert_eq!(
        spec.to_string(),
        "x => x > 0 && any([100], x => x > 0) && x < 10"
    );
    for x in [-5i64, 0, 5, 10, 50, 100] {
        assert_eq!(
            spec.evaluate(&x),
            left.evaluate(&x) && small.evaluate(&x),
            "candidate {x}"
        );
    }
    assert!(spec.evaluate(&5));
    assert!(!spec.evaluate(&50));

    let every = leaf.for_all().and(leaf.for_any());
    assert!(every.evaluate(&vec![3, 32, 589, 11]));
    assert!(!every.evaluate(&vec![3, 32, 589, 0, 11]));
}

#[test]
fn nested_quantifiers_bind_each_level() {
    // Every row holds at least one negative number.
    let spec = specify::less_than(0i64).for_any().for_all();

    assert!(spec.evaluate(&vec![vec![1, -1], vec![-5]]));
    assert!(!spec.evaluate(&vec![vec![1, -1], vec![5, 6]]));
    assert!(spec.evaluate(&vec![]));
    assert!(!spec.evaluate(&vec![vec![]]));
}

#[test]
fn quantified_specifications_compose() {
    let words = specify::starts_with("ab").for_any().and(
        specify::ends_with("z").for_all().not(),
    );

    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert!(words.evaluate(&owned(&["Abc", "xyz"])));
    assert!(!words.evaluate(&owned(&["abz", "xyz"])));
    assert!(!words.evaluate(&owned(&["xyz"])));
}
