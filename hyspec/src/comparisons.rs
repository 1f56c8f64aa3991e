//! Leaf comparators: specifications built directly from concrete values.
//!
//! Each leaf emits a criteria with exactly one parameter of its candidate type and a boolean
//! body. String comparators default to [`StringComparison::IgnoreCase`].
use std::{marker::PhantomData, sync::Arc};

use crate::{
    error::CompileError,
    expr::{
        BinaryOp, Criteria, Expr,
        method::{Method, RegexOptions, StringComparison, cached_regex},
    },
    spec::SpecificationNode,
    value::{Candidate, ValueType},
};

/// `x <op> value` for a comparison operator.
pub struct BinaryComparison<T> {
    op: BinaryOp,
    value: T,
}

impl<T: Candidate> BinaryComparison<T> {
    pub fn new(op: BinaryOp, value: T) -> Self {
        debug_assert!(op.is_comparison(), "`{op}` is not a comparison operator");
        Self { op, value }
    }

    #[inline]
    pub fn op(&self) -> BinaryOp {
        self.op
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: Candidate> SpecificationNode<T> for BinaryComparison<T> {
    fn build_criteria(&self) -> Criteria<T> {
        Criteria::new(|x| Expr::binary(self.op, x, Expr::literal(&self.value)))
    }
}

/// Shared state of the string comparators.
macro_rules! string_comparator {
    ($(#[$doc:meta])* $name:ident, |$x:ident, $value:ident, $cmp:ident| $body:expr) => {
        $(#[$doc])*
        pub struct $name {
            value: Arc<str>,
            comparison: StringComparison,
        }

        impl $name {
            pub fn new(value: impl Into<Arc<str>>) -> Self {
                Self::with_comparison(value, StringComparison::default())
            }

            pub fn with_comparison(value: impl Into<Arc<str>>, comparison: StringComparison) -> Self {
                Self {
                    value: value.into(),
                    comparison,
                }
            }

            #[inline]
            pub fn value(&self) -> &str {
                &self.value
            }

            #[inline]
            pub fn comparison(&self) -> StringComparison {
                self.comparison
            }
        }

        impl SpecificationNode<String> for $name {
            fn build_criteria(&self) -> Criteria<String> {
                let $value = Expr::constant(self.value.clone());
                let $cmp = self.comparison;
                Criteria::new(|$x| $body)
            }
        }
    };
}

string_comparator!(
    /// `x.index_of(value) >= 0`
    Contains,
    |x, value, cmp| x
        .method(Method::IndexOf(cmp), [value])
        .ge(Expr::constant(0i64))
);
string_comparator!(
    /// `x.starts_with(value)`
    StartsWith,
    |x, value, cmp| x.method(Method::StartsWith(cmp), [value])
);
string_comparator!(
    /// `x.ends_with(value)`
    EndsWith,
    |x, value, cmp| x.method(Method::EndsWith(cmp), [value])
);

/// `is_match(x, pattern)`: unanchored regular expression search.
pub struct MatchesRegex {
    pattern: Arc<str>,
    options: RegexOptions,
}

impl MatchesRegex {
    /// Invalid patterns surface when the specification is compiled.
    pub fn new(pattern: impl Into<Arc<str>>, options: RegexOptions) -> Self {
        Self {
            pattern: pattern.into(),
            options,
        }
    }

    /// Validate `pattern` upfront.
    pub fn try_new(pattern: impl Into<Arc<str>>, options: RegexOptions) -> Result<Self, CompileError> {
        let pattern = pattern.into();
        cached_regex(&pattern, options).map_err(|err| CompileError::InvalidRegex {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { pattern, options })
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub fn options(&self) -> RegexOptions {
        self.options
    }
}

impl SpecificationNode<String> for MatchesRegex {
    fn build_criteria(&self) -> Criteria<String> {
        Criteria::new(|x| {
            Expr::call(
                None,
                Method::IsMatch(self.options),
                [x, Expr::constant(self.pattern.clone())],
            )
        })
    }
}

/// `x is dtype`; meaningful for dynamically typed candidates.
pub struct TypeIs<T> {
    dtype: ValueType,
    _marker: PhantomData<fn(&T)>,
}

impl<T> TypeIs<T> {
    pub fn new(dtype: ValueType) -> Self {
        Self {
            dtype,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn dtype(&self) -> &ValueType {
        &self.dtype
    }
}

impl<T: Candidate> SpecificationNode<T> for TypeIs<T> {
    fn build_criteria(&self) -> Criteria<T> {
        Criteria::new(|x| x.type_is(self.dtype.clone()))
    }
}
