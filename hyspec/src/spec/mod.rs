//! Specification core: shared handles over composable predicate nodes.
//!
//! Role
//! - [`SpecificationNode`] is the open extension point: any type able to produce a
//!   [`Criteria`] over `T` is a node. Leaf comparators, the logic combinators of [`logic`], the
//!   type-adapting [`conversion`] and the [`quantifier`] lifts are all plain implementors.
//! - [`Specification`] is a cheap-to-clone handle over one node. It memoizes the node's criteria
//!   and the compiled predicate: both are produced at most once per node, on first request, and
//!   are stable for the node's lifetime.
//!
//! Composition is constructive: every operator returns a new node wrapping (shared) handles on
//! its operands. A single specification can thus be reused in many composites, and every
//! composite sees the memoized criteria of its children.
//!
//! Example
//! ```
//! use hyspec::prelude::*;
//!
//! let positive = specify::greater_than(0i64);
//! let even = Specification::from_fn(|x| x.rem(Expr::constant(2i64)).equals(Expr::constant(0i64)));
//! let spec = positive.and(&even);
//!
//! assert_eq!(spec.to_string(), "x => x > 0 && x % 2 == 0");
//! assert!(spec.evaluate(&4));
//! assert!(!spec.evaluate(&3));
//! assert!(!spec.evaluate(&-2));
//! ```
pub mod conversion;
pub mod logic;
pub mod quantifier;

use std::{fmt, marker::PhantomData, ops, sync::Arc};

use downcast_rs::{DowncastSync, impl_downcast};
use log::trace;
use once_cell::sync::OnceCell;

use crate::{
    compile::{CompiledPredicate, compile},
    error::{CompileError, SpecError},
    expr::{Criteria, Expr, Lambda},
    ext::Matches,
    spec::{
        conversion::{Conversion, adapt_criteria},
        logic::{Conjunction, Disjunction, ExclusiveDisjunction, Negation, Proposition},
        quantifier::{ExistentialQuantification, UniqueQuantification, UniversalQuantification},
    },
    value::Candidate,
    walker::node_count,
};

/// A node of the specification algebra over candidates of type `T`.
pub trait SpecificationNode<T: Candidate>: DowncastSync {
    /// Produce the criteria of this node.
    ///
    /// Called at most once per [`Specification`] handle family; composite nodes call
    /// [`Specification::criteria`] on their children, which is memoized.
    fn build_criteria(&self) -> Criteria<T>;

    /// Short name of the node kind, for diagnostics.
    fn kind(&self) -> &'static str {
        // Strip module path and generics.
        let name = std::any::type_name::<Self>();
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name)
    }
}
impl_downcast!(sync SpecificationNode<T> where T: Candidate);

struct Shared<T: Candidate> {
    node: Box<dyn SpecificationNode<T>>,
    criteria: OnceCell<Criteria<T>>,
    compiled: OnceCell<CompiledPredicate<T>>,
}

/// Shared, immutable handle over a [`SpecificationNode`].
pub struct Specification<T: Candidate>(Arc<Shared<T>>);

impl<T: Candidate> Specification<T> {
    /// Wrap a node.
    pub fn new(node: impl SpecificationNode<T>) -> Self {
        Self(Arc::new(Shared {
            node: Box::new(node),
            criteria: OnceCell::new(),
            compiled: OnceCell::new(),
        }))
    }

    /// Specification whose criteria is exactly `criteria`.
    #[inline]
    pub fn from_criteria(criteria: Criteria<T>) -> Self {
        Self::new(Proposition::new(criteria))
    }

    /// Specification built from a body over a fresh parameter `x`.
    #[inline]
    pub fn from_fn(build: impl FnOnce(Expr) -> Expr) -> Self {
        Self::from_criteria(Criteria::new(build))
    }

    /// Wrap a user-defined [`Composite`].
    pub fn composite(composite: impl Composite<T>) -> Self {
        Self::new(Composed {
            composite,
            _marker: PhantomData,
        })
    }

    /// Wrap a user-defined [`Adapter`] whose inner candidates are `U`.
    pub fn adapter<U: Candidate>(adapter: impl Adapter<T, U>) -> Self {
        Self::new(Adapted {
            adapter,
            _marker: PhantomData,
        })
    }

    /// The memoized criteria; built on first access.
    pub fn criteria(&self) -> &Criteria<T> {
        self.0.criteria.get_or_init(|| {
            let criteria = self.0.node.build_criteria();
            trace!(
                "built criteria of `{}` node ({} nodes)",
                self.0.node.kind(),
                node_count(criteria.body())
            );
            criteria
        })
    }

    /// Owned copy of the memoized criteria.
    #[inline]
    pub fn to_criteria(&self) -> Criteria<T> {
        self.criteria().clone()
    }

    /// The memoized compiled predicate; compiled on first access.
    pub fn compiled(&self) -> Result<&CompiledPredicate<T>, CompileError> {
        self.0.compiled.get_or_try_init(|| compile(self.criteria()))
    }

    /// Evaluate `candidate`, reporting compilation and evaluation failures.
    pub fn try_evaluate(&self, candidate: &T) -> Result<bool, SpecError> {
        Ok(self.compiled()?.call(candidate)?)
    }

    /// Evaluate `candidate`.
    ///
    /// # Panics
    /// When the criteria cannot be compiled or evaluated. Both denote a malformed tree produced
    /// by a faulty node; see [`try_evaluate`](Self::try_evaluate) to observe the error instead.
    pub fn evaluate(&self, candidate: &T) -> bool {
        match self.try_evaluate(candidate) {
            Ok(satisfied) => satisfied,
            Err(err) => panic!("cannot evaluate `{}`: {err}", self.criteria()),
        }
    }

    /// Lazily keep the items of `items` satisfying this specification.
    pub fn filter<I>(&self, items: I) -> Matches<I::IntoIter, T>
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<T>,
    {
        Matches::new(items.into_iter(), self.clone())
    }

    #[inline]
    pub fn node(&self) -> &dyn SpecificationNode<T> {
        &*self.0.node
    }

    #[inline]
    pub fn kind(&self) -> &'static str {
        self.0.node.kind()
    }

    /// The underlying node if it is an `N`.
    #[inline]
    pub fn downcast_ref<N: SpecificationNode<T>>(&self) -> Option<&N> {
        self.node().downcast_ref::<N>()
    }

    /// Whether both handles share the same node (and therefore the same memoized state).
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Negation of this specification.
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Self {
        Self::new(Negation::new(self.clone()))
    }

    /// Conjunction with `other`.
    pub fn and(&self, other: impl Into<Self>) -> Self {
        Self::new(Conjunction::new(self.clone(), other.into()))
    }

    /// Disjunction with `other`.
    pub fn or(&self, other: impl Into<Self>) -> Self {
        Self::new(Disjunction::new(self.clone(), other.into()))
    }

    /// Exclusive disjunction with `other`.
    pub fn xor(&self, other: impl Into<Self>) -> Self {
        Self::new(ExclusiveDisjunction::new(self.clone(), other.into()))
    }

    pub fn and_not(&self, other: impl Into<Self>) -> Self {
        self.and(other.into().not())
    }

    pub fn or_not(&self, other: impl Into<Self>) -> Self {
        self.or(other.into().not())
    }

    pub fn xor_not(&self, other: impl Into<Self>) -> Self {
        self.xor(other.into().not())
    }

    /// Conjunction with a default-constructed `S`.
    pub fn and_with<S: SpecificationNode<T> + Default>(&self) -> Self {
        self.and(Self::new(S::default()))
    }

    pub fn and_not_with<S: SpecificationNode<T> + Default>(&self) -> Self {
        self.and_not(Self::new(S::default()))
    }

    pub fn or_with<S: SpecificationNode<T> + Default>(&self) -> Self {
        self.or(Self::new(S::default()))
    }

    pub fn or_not_with<S: SpecificationNode<T> + Default>(&self) -> Self {
        self.or_not(Self::new(S::default()))
    }

    pub fn xor_with<S: SpecificationNode<T> + Default>(&self) -> Self {
        self.xor(Self::new(S::default()))
    }

    pub fn xor_not_with<S: SpecificationNode<T> + Default>(&self) -> Self {
        self.xor_not(Self::new(S::default()))
    }

    /// Conjunction with `spec` judged on the image of the candidate through `converter`.
    pub fn and_from<U: Candidate>(
        &self,
        converter: Lambda<T, U>,
        spec: impl Into<Specification<U>>,
    ) -> Self {
        self.and(spec.into().adapt(converter))
    }

    pub fn and_not_from<U: Candidate>(
        &self,
        converter: Lambda<T, U>,
        spec: impl Into<Specification<U>>,
    ) -> Self {
        self.and_not(spec.into().adapt(converter))
    }

    pub fn or_from<U: Candidate>(
        &self,
        converter: Lambda<T, U>,
        spec: impl Into<Specification<U>>,
    ) -> Self {
        self.or(spec.into().adapt(converter))
    }

    pub fn or_not_from<U: Candidate>(
        &self,
        converter: Lambda<T, U>,
        spec: impl Into<Specification<U>>,
    ) -> Self {
        self.or_not(spec.into().adapt(converter))
    }

    /// Judge candidates of type `O` by mapping them through `converter` first.
    ///
    /// ```
    /// use hyspec::prelude::*;
    ///
    /// let short = specify::less_than(4i64);
    /// let len = Lambda::<String, i64>::named("s", |s| s.method(Method::Length, []));
    /// let short_word = short.adapt(len);
    ///
    /// assert_eq!(short_word.to_string(), "s => s.len() < 4");
    /// assert!(short_word.evaluate(&"abc".to_owned()));
    /// ```
    pub fn adapt<O: Candidate>(&self, converter: Lambda<O, T>) -> Specification<O> {
        Specification::new(Conversion::new(self.clone(), converter))
    }

    /// Satisfied by sequences with at least one satisfying element.
    pub fn for_any(&self) -> Specification<Vec<T>> {
        Specification::new(ExistentialQuantification::new(self.clone()))
    }

    /// Satisfied by sequences whose elements all satisfy this specification.
    pub fn for_all(&self) -> Specification<Vec<T>> {
        Specification::new(UniversalQuantification::new(self.clone()))
    }

    /// Satisfied by sequences with exactly one satisfying element.
    pub fn for_one(&self) -> Specification<Vec<T>> {
        Specification::new(UniqueQuantification::new(self.clone()))
    }
}

impl<T: Candidate> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Candidate> fmt::Display for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.criteria(), f)
    }
}

impl<T: Candidate> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("kind", &self.kind())
            .field("criteria", &format_args!("{}", self.criteria()))
            .finish()
    }
}

impl<T: Candidate> From<Criteria<T>> for Specification<T> {
    #[inline]
    fn from(criteria: Criteria<T>) -> Self {
        Self::from_criteria(criteria)
    }
}

impl<T: Candidate> From<&Specification<T>> for Specification<T> {
    #[inline]
    fn from(spec: &Specification<T>) -> Self {
        spec.clone()
    }
}

impl<T: Candidate> From<Specification<T>> for Criteria<T> {
    #[inline]
    fn from(spec: Specification<T>) -> Self {
        spec.to_criteria()
    }
}

impl<T: Candidate> From<&Specification<T>> for Criteria<T> {
    #[inline]
    fn from(spec: &Specification<T>) -> Self {
        spec.to_criteria()
    }
}

macro_rules! impl_operator {
    ($trait:ident, $method:ident, $inherent:ident) => {
        impl<T: Candidate, R: Into<Specification<T>>> ops::$trait<R> for Specification<T> {
            type Output = Specification<T>;

            #[inline]
            fn $method(self, rhs: R) -> Self::Output {
                Specification::$inherent(&self, rhs)
            }
        }

        impl<T: Candidate, R: Into<Specification<T>>> ops::$trait<R> for &Specification<T> {
            type Output = Specification<T>;

            #[inline]
            fn $method(self, rhs: R) -> Self::Output {
                Specification::$inherent(self, rhs)
            }
        }
    };
}

impl_operator!(BitAnd, bitand, and);
impl_operator!(BitOr, bitor, or);
impl_operator!(BitXor, bitxor, xor);

impl<T: Candidate> ops::Not for Specification<T> {
    type Output = Specification<T>;

    #[inline]
    fn not(self) -> Self::Output {
        Specification::not(&self)
    }
}

impl<T: Candidate> ops::Not for &Specification<T> {
    type Output = Specification<T>;

    #[inline]
    fn not(self) -> Self::Output {
        Specification::not(self)
    }
}

/// A reusable specification defined in terms of other specifications.
///
/// ```
/// use hyspec::prelude::*;
///
/// struct Adult;
///
/// impl Composite<i64> for Adult {
///     fn build_composite(&self) -> Specification<i64> {
///         specify::in_range(18, 130)
///     }
/// }
///
/// let adult = Specification::composite(Adult);
/// assert!(adult.evaluate(&42));
/// assert!(!adult.evaluate(&12));
/// ```
pub trait Composite<T: Candidate>: Send + Sync + 'static {
    fn build_composite(&self) -> Specification<T>;
}

/// A reusable type-adapting specification: an inner specification over `TInner` and the
/// converter mapping outer candidates onto it.
pub trait Adapter<TOuter: Candidate, TInner: Candidate>: Send + Sync + 'static {
    fn build_inner(&self) -> Specification<TInner>;

    fn build_converter(&self) -> Lambda<TOuter, TInner>;
}

/// Node wrapping a [`Composite`].
pub struct Composed<C, T> {
    composite: C,
    _marker: PhantomData<fn() -> T>,
}

impl<C, T> Composed<C, T> {
    #[inline]
    pub fn composite(&self) -> &C {
        &self.composite
    }
}

impl<T: Candidate, C: Composite<T>> SpecificationNode<T> for Composed<C, T> {
    fn build_criteria(&self) -> Criteria<T> {
        self.composite.build_composite().to_criteria()
    }
}

/// Node wrapping an [`Adapter`].
pub struct Adapted<A, TInner> {
    adapter: A,
    _marker: PhantomData<fn() -> TInner>,
}

impl<A, TInner> Adapted<A, TInner> {
    #[inline]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}

impl<TOuter, TInner, A> SpecificationNode<TOuter> for Adapted<A, TInner>
where
    TOuter: Candidate,
    TInner: Candidate,
    A: Adapter<TOuter, TInner>,
{
    fn build_criteria(&self) -> Criteria<TOuter> {
        let inner = self.adapter.build_inner();
        adapt_criteria(inner.criteria(), &self.adapter.build_converter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::Expr, spec::logic::Tautology};

    #[test]
    fn criteria_and_compiled_form_are_memoized() {
        let spec = Specification::<i64>::from_fn(|x| x.gt(Expr::constant(0i64)));
        let a = spec.criteria().body().clone();
        let b = spec.clone().criteria().body().clone();
        assert!(a.ptr_eq(&b));

        let first = spec.compiled().unwrap() as *const CompiledPredicate<i64>;
        assert!(spec.evaluate(&1));
        let second = spec.compiled().unwrap() as *const CompiledPredicate<i64>;
        assert_eq!(first, second);
    }

    #[test]
    fn downcast_and_kind_expose_the_node() {
        let spec = Specification::<i64>::new(Tautology::default());
        assert_eq!(spec.kind(), "Tautology");
        assert!(spec.downcast_ref::<Tautology<i64>>().is_some());
        assert!(spec.downcast_ref::<Negation<i64>>().is_none());

        let negated = !&spec;
        let negation = negated.downcast_ref::<Negation<i64>>().unwrap();
        assert!(negation.inner().ptr_eq(&spec));
    }

    #[test]
    fn operators_match_inherent_methods() {
        let a = Specification::<i64>::from_fn(|x| x.gt(Expr::constant(0i64)));
        let b = Specification::<i64>::from_fn(|x| x.lt(Expr::constant(10i64)));
        assert_eq!((&a & &b).to_string(), a.and(&b).to_string());
        assert_eq!((&a | &b).to_string(), a.or(&b).to_string());
        assert_eq!((a.clone() ^ b.clone()).to_string(), a.xor(&b).to_string());
        assert_eq!((!a.clone()).to_string(), "x => !(x > 0)");
    }

    #[test]
    fn malformed_trees_report_compile_errors() {
        let broken = Specification::<i64>::from_fn(|x| x.add(Expr::constant(1i64)));
        assert!(matches!(
            broken.try_evaluate(&1),
            Err(SpecError::Compile(CompileError::NonBooleanBody(_)))
        ));
    }

    #[test]
    #[should_panic(expected = "cannot evaluate")]
    fn evaluate_panics_on_malformed_trees() {
        let broken = Specification::<i64>::from_fn(|x| x.add(Expr::constant(1i64)));
        broken.evaluate(&1);
    }
}
