//! Type-adapting composite: judge `TOuter` candidates with a specification over `TInner`.
//!
//! The converter body replaces every occurrence of the inner parameter, and the resulting tree
//! is re-parameterized on the converter's parameter. Adapting an adapted specification composes
//! the converters inside a single tree, so evaluation remains one pass.
use crate::{
    expr::{Criteria, Lambda},
    spec::{Specification, SpecificationNode},
    value::Candidate,
    walker::substitute,
};

/// Splice `converter` into the parameter slot of `inner`.
pub(crate) fn adapt_criteria<O: Candidate, I: Candidate>(
    inner: &Criteria<I>,
    converter: &Lambda<O, I>,
) -> Criteria<O> {
    let body = substitute(
        inner.body(),
        &inner.parameter().to_expr(),
        converter.body(),
    );
    Criteria::from_parts(converter.parameter().clone(), body)
}

pub struct Conversion<TOuter: Candidate, TInner: Candidate> {
    inner: Specification<TInner>,
    converter: Lambda<TOuter, TInner>,
}

impl<TOuter: Candidate, TInner: Candidate> Conversion<TOuter, TInner> {
    pub fn new(inner: Specification<TInner>, converter: Lambda<TOuter, TInner>) -> Self {
        Self { inner, converter }
    }

    #[inline]
    pub fn inner(&self) -> &Specification<TInner> {
        &self.inner
    }

    #[inline]
    pub fn converter(&self) -> &Lambda<TOuter, TInner> {
        &self.converter
    }
}

impl<TOuter: Candidate, TInner: Candidate> SpecificationNode<TOuter>
    for Conversion<TOuter, TInner>
{
    fn build_criteria(&self) -> Criteria<TOuter> {
        adapt_criteria(self.inner.criteria(), &self.converter)
    }
}
