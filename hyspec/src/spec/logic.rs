//! Boolean combinators of the specification algebra.
//!
//! Binary composites merge the criteria of their operands into a single tree over one
//! parameter: the left operand's parameter is kept and every occurrence of the right operand's
//! parameter is substituted with it. The convention is fixed so that printing and structural
//! equality of composed trees are deterministic.
use std::marker::PhantomData;

use crate::{
    expr::{BinaryOp, Criteria, Expr},
    spec::{Specification, SpecificationNode},
    value::Candidate,
    walker::substitute,
};

/// Join the criteria of `left` and `right` with `op`, over the parameter of `left`.
fn merge<T: Candidate>(
    left: &Specification<T>,
    right: &Specification<T>,
    op: BinaryOp,
) -> Criteria<T> {
    let left = left.criteria();
    let right = right.criteria();
    let rebound = substitute(
        right.body(),
        &right.parameter().to_expr(),
        &left.parameter().to_expr(),
    );
    Criteria::from_parts(
        left.parameter().clone(),
        Expr::binary(op, left.body().clone(), rebound),
    )
}

macro_rules! binary_composite {
    ($(#[$doc:meta])* $name:ident, $op:expr) => {
        $(#[$doc])*
        pub struct $name<T: Candidate> {
            left: Specification<T>,
            right: Specification<T>,
        }

        impl<T: Candidate> $name<T> {
            pub fn new(left: Specification<T>, right: Specification<T>) -> Self {
                Self { left, right }
            }

            #[inline]
            pub fn left(&self) -> &Specification<T> {
                &self.left
            }

            #[inline]
            pub fn right(&self) -> &Specification<T> {
                &self.right
            }
        }

        impl<T: Candidate> SpecificationNode<T> for $name<T> {
            fn build_criteria(&self) -> Criteria<T> {
                merge(&self.left, &self.right, $op)
            }
        }
    };
}

binary_composite!(
    /// Satisfied when both operands are (`&&`).
    Conjunction,
    BinaryOp::AndAlso
);
binary_composite!(
    /// Satisfied when either operand is (`||`).
    Disjunction,
    BinaryOp::OrElse
);
binary_composite!(
    /// Satisfied when exactly one operand is (`^`).
    ExclusiveDisjunction,
    BinaryOp::Xor
);

/// Satisfied when the inner specification is not.
pub struct Negation<T: Candidate> {
    inner: Specification<T>,
}

impl<T: Candidate> Negation<T> {
    pub fn new(inner: Specification<T>) -> Self {
        Self { inner }
    }

    #[inline]
    pub fn inner(&self) -> &Specification<T> {
        &self.inner
    }
}

impl<T: Candidate> SpecificationNode<T> for Negation<T> {
    fn build_criteria(&self) -> Criteria<T> {
        let inner = self.inner.criteria();
        Criteria::from_parts(inner.parameter().clone(), inner.body().clone().not())
    }
}

/// Satisfied by every candidate.
pub struct Tautology<T>(PhantomData<fn(&T)>);

impl<T> Default for Tautology<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Candidate> SpecificationNode<T> for Tautology<T> {
    fn build_criteria(&self) -> Criteria<T> {
        Criteria::new(|_| Expr::constant(true))
    }
}

/// Satisfied by no candidate.
pub struct Contradiction<T>(PhantomData<fn(&T)>);

impl<T> Default for Contradiction<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Candidate> SpecificationNode<T> for Contradiction<T> {
    fn build_criteria(&self) -> Criteria<T> {
        Criteria::new(|_| Expr::constant(false))
    }
}

/// Raw criteria used as is.
pub struct Proposition<T: Candidate> {
    criteria: Criteria<T>,
}

impl<T: Candidate> Proposition<T> {
    pub fn new(criteria: Criteria<T>) -> Self {
        Self { criteria }
    }

    #[inline]
    pub fn criteria(&self) -> &Criteria<T> {
        &self.criteria
    }
}

impl<T: Candidate> SpecificationNode<T> for Proposition<T> {
    fn build_criteria(&self) -> Criteria<T> {
        self.criteria.clone()
    }
}
