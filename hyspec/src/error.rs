use thiserror::Error;

use crate::{
    expr::{BinaryOp, UnaryOp},
    value::ValueType,
};

/// A predicate tree that cannot be turned into a callable.
///
/// Every variant points at an internal defect: a leaf comparator or a rewrite produced a tree
/// violating the single-parameter or typing invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("parameter `{name}` (#{id}) is not bound by any enclosing lambda")]
    UnboundParameter { name: String, id: u64 },

    #[error("predicate parameter of type `{found}` cannot receive candidates of type `{expected}`")]
    ParameterType { expected: ValueType, found: ValueType },

    #[error("predicate body must be `bool`, found `{0}`")]
    NonBooleanBody(ValueType),

    #[error("operator `{op}` cannot be applied to `{found}`")]
    UnaryOperand { op: UnaryOp, found: ValueType },

    #[error("operator `{op}` cannot be applied to `{lhs}` and `{rhs}`")]
    BinaryOperands {
        op: BinaryOp,
        lhs: ValueType,
        rhs: ValueType,
    },

    #[error("method `{method}` expects {expected}, found {found}")]
    MethodSignature {
        method: String,
        expected: String,
        found: String,
    },

    #[error("invalid regular expression `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("lambda expressions may only appear as arguments of sequence calls")]
    DanglingLambda,
}

/// Failure while running a compiled predicate.
///
/// Well-typed trees built from the bundled comparators never produce these; they surface
/// arithmetic faults in converters and errors reported by native functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("expected a `{expected}` value, found `{found}`")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },

    #[error("values of type `{lhs}` and `{rhs}` are not comparable")]
    Incomparable { lhs: ValueType, rhs: ValueType },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in `{0}`")]
    Overflow(BinaryOp),

    #[error("parameter slot {0} read before being bound")]
    UnsetSlot(usize),

    #[error("invalid regular expression `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("native function `{name}` failed: {message}")]
    Native { name: String, message: String },
}

/// Either half of the evaluation pipeline failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
