//! Fluent entry points assembling leaf comparators and combinators.
//!
//! ```
//! use hyspec::prelude::*;
//!
//! let teenager = specify::in_range(13i64, 19);
//! let spec = teenager.or(specify::greater_than(64));
//! assert!(spec.evaluate(&15));
//! assert!(spec.evaluate(&70));
//! assert!(!spec.evaluate(&30));
//! ```
use std::sync::Arc;

use crate::{
    comparisons::{BinaryComparison, Contains, EndsWith, MatchesRegex, StartsWith, TypeIs},
    expr::{
        BinaryOp, Criteria, Lambda,
        method::{RegexOptions, StringComparison},
    },
    spec::{
        Specification, SpecificationNode,
        logic::{Contradiction, Tautology},
    },
    value::{Candidate, ValueType},
};

#[inline]
fn compare<T: Candidate>(op: BinaryOp, value: T) -> Specification<T> {
    Specification::new(BinaryComparison::new(op, value))
}

pub fn equal_to<T: Candidate>(value: T) -> Specification<T> {
    compare(BinaryOp::Equal, value)
}

pub fn not_equal_to<T: Candidate>(value: T) -> Specification<T> {
    compare(BinaryOp::NotEqual, value)
}

pub fn less_than<T: Candidate>(value: T) -> Specification<T> {
    compare(BinaryOp::LessThan, value)
}

pub fn less_than_or_equal_to<T: Candidate>(value: T) -> Specification<T> {
    compare(BinaryOp::LessThanOrEqual, value)
}

/// Alias of [`less_than_or_equal_to`].
pub fn at_most<T: Candidate>(value: T) -> Specification<T> {
    less_than_or_equal_to(value)
}

pub fn greater_than<T: Candidate>(value: T) -> Specification<T> {
    compare(BinaryOp::GreaterThan, value)
}

pub fn greater_than_or_equal_to<T: Candidate>(value: T) -> Specification<T> {
    compare(BinaryOp::GreaterThanOrEqual, value)
}

/// Alias of [`greater_than_or_equal_to`].
pub fn at_least<T: Candidate>(value: T) -> Specification<T> {
    greater_than_or_equal_to(value)
}

/// Strictly between `lower` and `upper`.
pub fn between<T: Candidate>(lower: T, upper: T) -> Specification<T> {
    greater_than(lower).and(less_than(upper))
}

/// Between `lower` and `upper`, bounds included.
pub fn in_range<T: Candidate>(lower: T, upper: T) -> Specification<T> {
    at_least(lower).and(at_most(upper))
}

/// Strictly below `lower` or strictly above `upper`.
pub fn outside<T: Candidate>(lower: T, upper: T) -> Specification<T> {
    less_than(lower).or(greater_than(upper))
}

pub fn is_true() -> Specification<bool> {
    Specification::from_fn(|x| x)
}

pub fn is_false() -> Specification<bool> {
    is_true().not()
}

pub fn starts_with(value: impl Into<Arc<str>>) -> Specification<String> {
    Specification::new(StartsWith::new(value))
}

pub fn starts_with_with(
    value: impl Into<Arc<str>>,
    comparison: StringComparison,
) -> Specification<String> {
    Specification::new(StartsWith::with_comparison(value, comparison))
}

pub fn ends_with(value: impl Into<Arc<str>>) -> Specification<String> {
    Specification::new(EndsWith::new(value))
}

pub fn ends_with_with(
    value: impl Into<Arc<str>>,
    comparison: StringComparison,
) -> Specification<String> {
    Specification::new(EndsWith::with_comparison(value, comparison))
}

pub fn contains(value: impl Into<Arc<str>>) -> Specification<String> {
    Specification::new(Contains::new(value))
}

pub fn contains_with(
    value: impl Into<Arc<str>>,
    comparison: StringComparison,
) -> Specification<String> {
    Specification::new(Contains::with_comparison(value, comparison))
}

pub fn matches_regex(pattern: impl Into<Arc<str>>) -> Specification<String> {
    matches_regex_with(pattern, RegexOptions::empty())
}

pub fn matches_regex_with(
    pattern: impl Into<Arc<str>>,
    options: RegexOptions,
) -> Specification<String> {
    Specification::new(MatchesRegex::new(pattern, options))
}

/// Satisfied by every candidate.
pub fn any<T: Candidate>() -> Specification<T> {
    Specification::new(Tautology::default())
}

/// Satisfied by no candidate.
pub fn no<T: Candidate>() -> Specification<T> {
    Specification::new(Contradiction::default())
}

/// Ad-hoc specification over raw criteria.
pub fn satisfying<T: Candidate>(criteria: Criteria<T>) -> Specification<T> {
    Specification::from_criteria(criteria)
}

/// Default-constructed node `S`.
pub fn satisfying_node<T: Candidate, S: SpecificationNode<T> + Default>() -> Specification<T> {
    Specification::new(S::default())
}

/// `spec` judged on the image of the candidate through `converter`.
pub fn satisfying_from<T: Candidate, U: Candidate>(
    converter: Lambda<T, U>,
    spec: impl Into<Specification<U>>,
) -> Specification<T> {
    spec.into().adapt(converter)
}

/// Candidates whose runtime type is `dtype`.
pub fn of_type<T: Candidate>(dtype: ValueType) -> Specification<T> {
    Specification::new(TypeIs::new(dtype))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_helpers_respect_their_bounds() {
        let open = between(1i64, 5);
        let closed = in_range(1i64, 5);
        let out = outside(1i64, 5);

        assert!(!open.evaluate(&1) && open.evaluate(&3) && !open.evaluate(&5));
        assert!(closed.evaluate(&1) && closed.evaluate(&5) && !closed.evaluate(&6));
        assert!(out.evaluate(&0) && !out.evaluate(&1) && out.evaluate(&6));
        assert_eq!(open.to_string(), "x => x > 1 && x < 5");
    }

    #[test]
    fn boolean_helpers() {
        assert!(is_true().evaluate(&true));
        assert!(!is_true().evaluate(&false));
        assert!(is_false().evaluate(&false));
        assert_eq!(is_false().to_string(), "x => !x");
    }

    #[test]
    fn named_nodes_are_default_constructed() {
        let always = satisfying_node::<f64, Tautology<f64>>();
        assert!(always.evaluate(&-1.5));
        assert!(!no::<f64>().evaluate(&-1.5));
    }
}
