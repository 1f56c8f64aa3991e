//! Quantifiers lifting a specification over `T` to sequences of `T`.
//!
//! The inner criteria becomes the per-element lambda of a sequence call on a fresh `xs`
//! parameter. On an empty sequence, existential and unique quantification are unsatisfied and
//! universal quantification holds.
use crate::{
    expr::{Criteria, Expr, Parameter, method::Method},
    spec::{Specification, SpecificationNode},
    value::Candidate,
};

fn lift<T: Candidate>(
    inner: &Specification<T>,
    method: Method,
    finish: impl FnOnce(Expr) -> Expr,
) -> Criteria<Vec<T>> {
    let xs = Parameter::of::<Vec<T>>("xs");
    let call = Expr::call(None, method, [xs.to_expr(), inner.criteria().to_expr()]);
    Criteria::from_parts(xs, finish(call))
}

macro_rules! quantifier {
    ($(#[$doc:meta])* $name:ident, $method:expr, $finish:expr) => {
        $(#[$doc])*
        pub struct $name<T: Candidate> {
            inner: Specification<T>,
        }

        impl<T: Candidate> $name<T> {
            pub fn new(inner: Specification<T>) -> Self {
                Self { inner }
            }

            #[inline]
            pub fn inner(&self) -> &Specification<T> {
                &self.inner
            }
        }

        impl<T: Candidate> SpecificationNode<Vec<T>> for $name<T> {
            fn build_criteria(&self) -> Criteria<Vec<T>> {
                lift(&self.inner, $method, $finish)
            }
        }
    };
}

quantifier!(
    /// `any(xs, inner)`
    ExistentialQuantification,
    Method::Any,
    |call| call
);
quantifier!(
    /// `all(xs, inner)`
    UniversalQuantification,
    Method::All,
    |call| call
);
quantifier!(
    /// `count(xs, inner) == 1`
    UniqueQuantification,
    Method::Count,
    |call: Expr| call.equals(Expr::constant(1i64))
);
