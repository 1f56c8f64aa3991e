use hyspec::error::{CompileError, SpecError};
use hyspec::prelude::*;
use hyspec::walker::{free_parameters, parameters};

fn criteria_parameters<T: Candidate>(spec: &Specification<T>) -> (Parameter, Vec<Parameter>) {
    let criteria = spec.criteria();
    (criteria.parameter().clone(), free_parameters(criteria.body()))
}

#[test]
fn composition_keeps_only_the_left_parameter() {
    let a = specify::greater_than(0i64);
    let b = specify::less_than(100i64);
    let c = specify::equal_to(42i64);
    let d = Specification::<i64>::from_fn(|x| x.rem(Expr::constant(3i64)).equals(Expr::constant(0i64)));

    let spec = a.and(&b).or(c.not()).xor(&d);
    let (parameter, free) = criteria_parameters(&spec);

    assert_eq!(&parameter, a.criteria().parameter());
    assert_eq!(free, vec![parameter.clone()]);

    let everywhere = parameters(spec.criteria().body());
    for other in [&b, &c, &d] {
        assert!(!everywhere.contains(other.criteria().parameter()));
    }
}

#[test]
fn conversion_drops_the_inner_parameter() {
    let inner = specify::in_range(1i64, 3);
    let len = Lambda::<String, i64>::named("s", |s| s.method(Method::Length, []));
    let spec = inner.adapt(len.clone());
    let (parameter, free) = criteria_parameters(&spec);

    assert_eq!(&parameter, len.parameter());
    assert_eq!(free, vec![parameter]);
    assert!(!parameters(spec.criteria().body()).contains(inner.criteria().parameter()));
}

#[test]
fn quantifiers_bind_the_element_parameter() {
    let inner = specify::greater_than(0i64);
    let spec = inner.for_all();
    let (parameter, free) = criteria_parameters(&spec);

    assert_eq!(free, vec![parameter.clone()]);
    // The element parameter is still there, bound by the nested lambda.
    let everywhere = parameters(spec.criteria().body());
    assert!(everywhere.contains(&parameter));
    assert!(everywhere.contains(inner.criteria().parameter()));
}

#[test]
fn parameters_are_matched_by_identity_not_name() {
    let x = Parameter::of::<i64>("x");
    let impostor = Parameter::of::<i64>("x");
    assert_ne!(x, impostor);

    let criteria = Criteria::<i64>::from_parts(x, impostor.to_expr().gt(Expr::constant(0i64)));
    let spec = specify::satisfying(criteria);

    match spec.try_evaluate(&1) {
        Err(SpecError::Compile(CompileError::UnboundParameter { name, .. })) => {
            assert_eq!(name, "x")
        }
        other => panic!("expected an unbound parameter, got {other:?}"),
    }
}

#[test]
fn self_composition_is_sound() {
    let spec = specify::greater_than(5i64);
    let both = spec.and(&spec);
    let either = spec.xor(&spec);

    let (parameter, free) = criteria_parameters(&both);
    assert_eq!(free, vec![parameter]);
    assert!(both.evaluate(&6) && !both.evaluate(&5));
    assert!(!either.evaluate(&6) && !either.evaluate(&5));
}
