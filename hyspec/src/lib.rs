//! Hyspec: composable predicate specifications exported as inspectable expression trees.
//!
//! A specification describes a boolean condition over candidates of some type. Specifications
//! combine (`and`, `or`, `xor`, `not`), adapt across types through a converter, and lift to
//! sequences (`for_any`, `for_all`, `for_one`). Every specification exposes its condition as a
//! single-parameter expression tree ([`expr::Criteria`]), which can be printed, walked by an
//! external translation layer, or compiled once into a callable predicate.
//!
//! Tree shape
//!  - Nodes are immutable and reference counted; rewrites share every untouched subtree.
//!  - Each criteria has exactly one free parameter. Parameters carry a unique identity token and
//!    substitution matches on it, never on names or structure.
//!
//! Performance
//!  - Criteria and compiled predicates are memoized per specification node: building a tree is
//!    O(n) once, evaluating a candidate is a single pass over pre-built closures.
//!
//! Example
//! ```
//! use hyspec::prelude::*;
//!
//! let positive = specify::greater_than(0i64);
//! let lonely = positive.for_one();
//!
//! assert_eq!(lonely.to_string(), "xs => count(xs, x => x > 0) == 1");
//! assert!(lonely.evaluate(&vec![-1, -2, -3, -4, 0, 1]));
//! assert!(!lonely.evaluate(&vec![-1, -2, -3, -4, 0, 1, 2]));
//! ```

/// Leaf comparators: relational, string, regex and type tests.
pub mod comparisons;
/// Type checking and lowering of criteria into callable predicates.
pub mod compile;
/// Error types of compilation and evaluation.
pub mod error;
/// Expression trees, parameters and lambdas.
pub mod expr;
/// Iterator filtering by specification.
pub mod ext;
/// The specification algebra.
pub mod spec;
/// Fluent constructors.
pub mod specify;
/// Runtime values, static types and the candidate bridge.
pub mod value;
/// Traversal and identity-based substitution.
pub mod walker;

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - `Specification` with its node trait and user composite traits
    //! - The `specify` constructors
    //! - Tree building blocks (`Expr`, `Lambda`, `Criteria`, `Method`)
    //! - Pretty-printing via `PrettyExpr`
    pub use crate::expr::{
        Criteria, Expr, Lambda, Parameter,
        method::{Method, NativeFn, RegexOptions, StringComparison},
        pretty::PrettyExpr,
    };
    pub use crate::spec::{Adapter, Composite, Specification, SpecificationNode};
    pub use crate::specify;
    pub use crate::value::{Candidate, Value, ValueType};

    // Iterator ergonomics
    pub use crate::ext::Matching;
}
