//! Iterator filtering by specification.
use std::{borrow::Borrow, iter::FusedIterator};

use crate::{spec::Specification, value::Candidate};

/// Lazy iterator over the items satisfying a specification.
///
/// Created by [`Specification::filter`] or [`Matching::matching`]. It is as restartable and as
/// finite as the underlying iterator.
pub struct Matches<I, T: Candidate> {
    iter: I,
    spec: Specification<T>,
}

impl<I, T: Candidate> Matches<I, T> {
    pub(crate) fn new(iter: I, spec: Specification<T>) -> Self {
        Self { iter, spec }
    }

    #[inline]
    pub fn specification(&self) -> &Specification<T> {
        &self.spec
    }
}

impl<I, T> Iterator for Matches<I, T>
where
    I: Iterator,
    I::Item: Borrow<T>,
    T: Candidate,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let spec = &self.spec;
        self.iter.find(|item| spec.evaluate(item.borrow()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.iter.size_hint().1)
    }
}

impl<I, T> DoubleEndedIterator for Matches<I, T>
where
    I: DoubleEndedIterator,
    I::Item: Borrow<T>,
    T: Candidate,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let spec = &self.spec;
        self.iter.rfind(|item| spec.evaluate(item.borrow()))
    }
}

impl<I, T> FusedIterator for Matches<I, T>
where
    I: FusedIterator,
    I::Item: Borrow<T>,
    T: Candidate,
{
}

impl<I: Clone, T: Candidate> Clone for Matches<I, T> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
            spec: self.spec.clone(),
        }
    }
}

/// `matching` adapter on anything iterable.
///
/// ```
/// use hyspec::prelude::*;
///
/// let small = specify::at_most(2i64);
/// let kept: Vec<i64> = vec![1, 5, 2, 8].matching(&small).collect();
/// assert_eq!(kept, vec![1, 2]);
///
/// let names = vec!["Anna".to_owned(), "bob".to_owned(), "annie".to_owned()];
/// let ann = specify::starts_with("ann");
/// assert_eq!(names.iter().matching(&ann).count(), 2);
/// ```
pub trait Matching: IntoIterator + Sized {
    fn matching<T: Candidate>(self, spec: &Specification<T>) -> Matches<Self::IntoIter, T>
    where
        Self::Item: Borrow<T>,
    {
        spec.filter(self)
    }
}

impl<I: IntoIterator> Matching for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn filters_owned_and_borrowed_items() {
        let odd = Specification::<i64>::from_fn(|x| {
            x.rem(Expr::constant(2i64)).not_equals(Expr::constant(0i64))
        });
        let items = vec![1i64, 2, 3, 4, 5];

        let borrowed: Vec<&i64> = items.iter().matching(&odd).collect();
        assert_eq!(borrowed, vec![&1, &3, &5]);

        let reversed: Vec<i64> = odd.filter(items.clone()).rev().collect();
        assert_eq!(reversed, vec![5, 3, 1]);
    }

    #[test]
    fn infinite_inputs_stay_lazy() {
        let big = Specification::<i64>::from_fn(|x| x.gt(Expr::constant(100i64)));
        let first: Vec<i64> = (0i64..).matching(&big).take(3).collect();
        assert_eq!(first, vec![101, 102, 103]);
    }
}
