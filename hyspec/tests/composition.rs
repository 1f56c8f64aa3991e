use chrono::NaiveDate;
use hyspec::prelude::*;
use hyspec::spec::conversion::Conversion;
use hyspec::spec::logic::{Conjunction, Disjunction, ExclusiveDisjunction, Negation};
use hyspec::spec::quantifier::{
    ExistentialQuantification, UniqueQuantification, UniversalQuantification,
};

#[derive(Default)]
struct IntegerGreaterThanZero;

impl SpecificationNode<i32> for IntegerGreaterThanZero {
    fn build_criteria(&self) -> Criteria<i32> {
        Criteria::new(|x| x.gt(Expr::constant(0i64)))
    }
}

#[derive(Default)]
struct IntegerLessThanZero;

impl SpecificationNode<i32> for IntegerLessThanZero {
    fn build_criteria(&self) -> Criteria<i32> {
        Criteria::new(|x| x.lt(Expr::constant(0i64)))
    }
}

#[derive(Default)]
struct IntegerEqualToZero;

impl SpecificationNode<i32> for IntegerEqualToZero {
    fn build_criteria(&self) -> Criteria<i32> {
        Criteria::new(|x| x.equals(Expr::constant(0i64)))
    }
}

/// `(x > 0 || x == 0) && !(x < 0)`
struct NonNegative;

impl Composite<i32> for NonNegative {
    fn build_composite(&self) -> Specification<i32> {
        specify::satisfying_node::<i32, IntegerGreaterThanZero>()
            .or_with::<IntegerEqualToZero>()
            .and_not_with::<IntegerLessThanZero>()
    }
}

fn positive() -> Specification<i32> {
    Specification::new(IntegerGreaterThanZero)
}

fn negative() -> Specification<i32> {
    Specification::new(IntegerLessThanZero)
}

fn day_of_month() -> Lambda<NaiveDate, i32> {
    Lambda::named("d", |d| d.method(Method::Day, []))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn not_wraps_its_operand() {
    let spec = positive();

    for negated in [spec.not(), !&spec, !spec.clone()] {
        let node = negated.downcast_ref::<Negation<i32>>().unwrap();
        assert!(node.inner().ptr_eq(&spec));
        assert_eq!(negated.kind(), "Negation");
    }
}

#[test]
fn and_keeps_both_operands() {
    let left = positive();
    let right = negative();

    for spec in [left.and(&right), &left & &right] {
        let node = spec.downcast_ref::<Conjunction<i32>>().unwrap();
        assert!(node.left().ptr_eq(&left));
        assert!(node.right().ptr_eq(&right));
    }
}

#[test]
fn and_not_negates_the_right_operand() {
    let left = positive();
    let right = negative();
    let spec = left.and_not(&right);

    let node = spec.downcast_ref::<Conjunction<i32>>().unwrap();
    assert!(node.left().ptr_eq(&left));
    let negation = node.right().downcast_ref::<Negation<i32>>().unwrap();
    assert!(negation.inner().ptr_eq(&right));
}

#[test]
fn and_with_builds_a_default_node() {
    let left = positive();
    let spec = left.and_with::<IntegerLessThanZero>();

    let node = spec.downcast_ref::<Conjunction<i32>>().unwrap();
    assert!(node.left().ptr_eq(&left));
    assert!(node.right().downcast_ref::<IntegerLessThanZero>().is_some());
    assert!(!spec.evaluate(&1));
}

#[test]
fn and_from_adapts_the_right_operand() {
    let left = specify::greater_than(date(2024, 1, 1));
    let right = positive();
    let converter = day_of_month();
    let spec = left.and_from(converter.clone(), &right);

    let node = spec.downcast_ref::<Conjunction<NaiveDate>>().unwrap();
    assert!(node.left().ptr_eq(&left));
    let conversion = node
        .right()
        .downcast_ref::<Conversion<NaiveDate, i32>>()
        .unwrap();
    assert!(conversion.inner().ptr_eq(&right));
    assert_eq!(conversion.converter(), &converter);
    assert!(spec.evaluate(&date(2024, 3, 5)));
}

#[test]
fn and_not_from_negates_the_adapted_operand() {
    let left = specify::any::<NaiveDate>();
    let right = specify::equal_to(1i32);
    let spec = left.and_not_from(day_of_month(), &right);

    let node = spec.downcast_ref::<Conjunction<NaiveDate>>().unwrap();
    let negation = node.right().downcast_ref::<Negation<NaiveDate>>().unwrap();
    let conversion = negation
        .inner()
        .downcast_ref::<Conversion<NaiveDate, i32>>()
        .unwrap();
    assert!(conversion.inner().ptr_eq(&right));
    assert!(!spec.evaluate(&date(2024, 2, 1)));
    assert!(spec.evaluate(&date(2024, 2, 2)));
}

#[test]
fn or_family() {
    let left = positive();
    let right = negative();

    let or = left.or(&right);
    let node = or.downcast_ref::<Disjunction<i32>>().unwrap();
    assert!(node.left().ptr_eq(&left) && node.right().ptr_eq(&right));
    assert!((&left | &right).downcast_ref::<Disjunction<i32>>().is_some());

    let or_not = left.or_not(&right);
    let node = or_not.downcast_ref::<Disjunction<i32>>().unwrap();
    let negation = node.right().downcast_ref::<Negation<i32>>().unwrap();
    assert!(negation.inner().ptr_eq(&right));

    let or_with = left.or_with::<IntegerEqualToZero>();
    let node = or_with.downcast_ref::<Disjunction<i32>>().unwrap();
    assert!(node.right().downcast_ref::<IntegerEqualToZero>().is_some());
    assert!(or_with.evaluate(&0) && !or_with.evaluate(&-1));

    let or_not_with = left.or_not_with::<IntegerEqualToZero>();
    assert!(or_not_with.evaluate(&-1) && !or_not_with.evaluate(&0));

    let converter = day_of_month();
    let dates = specify::no::<NaiveDate>();
    let or_from = dates.or_from(converter.clone(), &right);
    let node = or_from.downcast_ref::<Disjunction<NaiveDate>>().unwrap();
    let conversion = node
        .right()
        .downcast_ref::<Conversion<NaiveDate, i32>>()
        .unwrap();
    assert_eq!(conversion.converter(), &converter);

    let or_not_from = dates.or_not_from(converter, &right);
    let node = or_not_from.downcast_ref::<Disjunction<NaiveDate>>().unwrap();
    assert!(node.right().downcast_ref::<Negation<NaiveDate>>().is_some());
}

#[test]
fn xor_family() {
    let left = positive();
    let right = negative();

    let xor = left.xor(&right);
    let node = xor.downcast_ref::<ExclusiveDisjunction<i32>>().unwrap();
    assert!(node.left().ptr_eq(&left) && node.right().ptr_eq(&right));
    assert!((&left ^ &right).downcast_ref::<ExclusiveDisjunction<i32>>().is_some());

    let xor_not = left.xor_not(&right);
    let node = xor_not.downcast_ref::<ExclusiveDisjunction<i32>>().unwrap();
    let negation = node.right().downcast_ref::<Negation<i32>>().unwrap();
    assert!(negation.inner().ptr_eq(&right));

    let xor_with = left.xor_with::<IntegerEqualToZero>();
    assert!(xor_with.evaluate(&0) && xor_with.evaluate(&3) && !xor_with.evaluate(&-3));

    // x > 0 ^ !(x == 0) holds for negative x only.
    let xor_not_with = left.xor_not_with::<IntegerEqualToZero>();
    assert!(xor_not_with.evaluate(&-3));
    assert!(!xor_not_with.evaluate(&0));
    assert!(!xor_not_with.evaluate(&3));
}

#[test]
fn quantifiers_wrap_their_element_specification() {
    let spec = positive();

    let any = spec.for_any();
    let node = any.downcast_ref::<ExistentialQuantification<i32>>().unwrap();
    assert!(node.inner().ptr_eq(&spec));

    let all = spec.for_all();
    let node = all.downcast_ref::<UniversalQuantification<i32>>().unwrap();
    assert!(node.inner().ptr_eq(&spec));

    let one = spec.for_one();
    let node = one.downcast_ref::<UniqueQuantification<i32>>().unwrap();
    assert!(node.inner().ptr_eq(&spec));
}

#[test]
fn adapt_wraps_inner_and_converter() {
    let inner = positive();
    let converter = day_of_month();
    let spec = inner.adapt(converter.clone());

    let node = spec.downcast_ref::<Conversion<NaiveDate, i32>>().unwrap();
    assert!(node.inner().ptr_eq(&inner));
    assert_eq!(node.converter(), &converter);
}

#[test]
fn composite_matches_its_expansion() {
    let expansion = NonNegative.build_composite();
    let node = expansion.downcast_ref::<Conjunction<i32>>().unwrap();
    let left = node.left().downcast_ref::<Disjunction<i32>>().unwrap();
    assert!(left.left().downcast_ref::<IntegerGreaterThanZero>().is_some());
    assert!(left.right().downcast_ref::<IntegerEqualToZero>().is_some());
    let right = node.right().downcast_ref::<Negation<i32>>().unwrap();
    assert!(right.inner().downcast_ref::<IntegerLessThanZero>().is_some());

    let composite = Specification::composite(NonNegative);
    assert_eq!(
        composite.to_string(),
        "x => (x > 0 || x == 0) && !(x < 0)"
    );
    assert_eq!(composite.to_string(), expansion.to_string());
    assert!(composite.evaluate(&0));
    assert!(composite.evaluate(&5));
    assert!(!composite.evaluate(&-3));
}

#[test]
fn evaluate_and_filter_agree() {
    let spec = positive();
    let candidates = [-1, 0, 1, 2, 3];

    assert!(!spec.evaluate(&-1));
    assert!(!spec.evaluate(&0));
    assert!(spec.evaluate(&1));

    let selected: Vec<i32> = spec.filter(candidates).collect();
    assert_eq!(selected, vec![1, 2, 3]);
    for item in candidates.iter().matching(&spec) {
        assert!(spec.evaluate(item));
    }
}
