//! Predicate trees: an immutable, reference-counted expression language.
//!
//! Role
//! - [`Expr`] is a cheap-to-clone handle on an immutable [`ExprNode`]. Rewrites never mutate a
//!   node; they build new parents around untouched, shared children.
//! - [`Parameter`] is the placeholder for the candidate. Each parameter carries a unique
//!   [`ParamId`] drawn at creation time and two parameter nodes denote the same variable if and
//!   only if their ids match, regardless of display name or type.
//! - [`Lambda`] pairs one parameter with a body and is the typed unit specifications exchange;
//!   [`Criteria`] is the boolean-valued flavour.
//!
//! Equality semantics
//! - [`Expr::same`] is node identity (shared node, or same parameter id) and is what substitution
//!   matches on.
//! - `PartialEq` is structural and exists for diagnostics and tests. Parameters compare by id, so
//!   two trees built over different placeholders are never structurally equal.
//!
//! Example
//! ```
//! use hyspec::expr::{Criteria, Expr};
//!
//! let positive: Criteria<i32> = Criteria::new(|x| x.gt(Expr::constant(0)));
//! assert_eq!(positive.to_string(), "x => x > 0");
//! ```
pub mod method;
pub mod pretty;

use std::{
    fmt,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use smallvec::SmallVec;
use strum::{Display, EnumDiscriminants, EnumIs, IntoStaticStr};

use crate::{
    expr::method::Method,
    value::{Candidate, Value, ValueType},
};

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque identity token of a [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamId(u64);

impl ParamId {
    fn fresh() -> Self {
        Self(NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw numeric id.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Placeholder standing for the single free variable of a predicate.
#[derive(Debug, Clone)]
pub struct Parameter {
    id: ParamId,
    name: Arc<str>,
    dtype: ValueType,
}

impl Parameter {
    /// Create a fresh parameter; its id differs from every parameter created before.
    pub fn new(name: impl Into<Arc<str>>, dtype: ValueType) -> Self {
        Self {
            id: ParamId::fresh(),
            name: name.into(),
            dtype,
        }
    }

    /// Fresh parameter typed after the candidate type `T`.
    #[inline]
    pub fn of<T: Candidate>(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, T::value_type())
    }

    #[inline]
    pub fn id(&self) -> ParamId {
        self.id
    }

    /// Display name; carries no identity.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn dtype(&self) -> &ValueType {
        &self.dtype
    }

    /// Reference to this parameter as an expression node.
    #[inline]
    pub fn to_expr(&self) -> Expr {
        Expr::parameter(self)
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl std::hash::Hash for Parameter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Negate,
}

/// Binary operators: boolean connectives, comparisons and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIs)]
pub enum BinaryOp {
    #[strum(serialize = "&&")]
    AndAlso,
    #[strum(serialize = "||")]
    OrElse,
    #[strum(serialize = "^")]
    Xor,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanOrEqual,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanOrEqual,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
}

impl BinaryOp {
    /// Operator symbol as printed.
    #[inline]
    pub fn symbol(&self) -> &'static str {
        self.into()
    }

    /// `&&`, `||`, `^`
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse | BinaryOp::Xor)
    }

    /// `==`, `!=`
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    /// `<`, `<=`, `>`, `>=`
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    /// Any comparison producing a boolean from two values.
    pub fn is_comparison(&self) -> bool {
        self.is_equality() || self.is_relational()
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }
}

/// Node vocabulary of predicate trees.
///
/// The set is closed: rewriting, printing and compilation match exhaustively on it. Open-ended
/// behaviour enters through [`Method::Native`] calls.
#[derive(Debug, EnumDiscriminants)]
#[strum_discriminants(name(ExprKind), derive(Hash, Display, EnumIs))]
pub enum ExprNode {
    /// Literal value.
    Constant(Value),
    /// Reference to a parameter.
    Parameter(Parameter),
    Unary {
        op: UnaryOp,
        operand: Expr,
    },
    Binary {
        op: BinaryOp,
        lhs: Expr,
        rhs: Expr,
    },
    /// Member-style call when `target` is set, static call otherwise.
    Call {
        target: Option<Expr>,
        method: Method,
        args: SmallVec<Expr, 2>,
    },
    /// Runtime type test: `operand is dtype`.
    TypeIs {
        operand: Expr,
        dtype: ValueType,
    },
    /// Nested single-parameter function, used as the per-element predicate of sequence calls.
    Lambda {
        parameter: Parameter,
        body: Expr,
    },
}

/// Shared handle on an immutable expression node.
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
    #[inline]
    fn from_node(node: ExprNode) -> Self {
        Self(Arc::new(node))
    }

    /// Borrow the underlying node.
    #[inline]
    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    /// Discriminant of the underlying node.
    #[inline]
    pub fn kind(&self) -> ExprKind {
        ExprKind::from(self.node())
    }

    /// Literal node.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::from_node(ExprNode::Constant(value.into()))
    }

    /// Literal node holding the dynamic form of a candidate value.
    pub fn literal<T: Candidate>(value: &T) -> Self {
        Self::from_node(ExprNode::Constant(value.to_value()))
    }

    /// Reference to `parameter`.
    pub fn parameter(parameter: &Parameter) -> Self {
        Self::from_node(ExprNode::Parameter(parameter.clone()))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::from_node(ExprNode::Unary { op, operand })
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::from_node(ExprNode::Binary { op, lhs, rhs })
    }

    /// Call `method`, on `target` when given.
    pub fn call(target: Option<Expr>, method: Method, args: impl IntoIterator<Item = Expr>) -> Self {
        Self::from_node(ExprNode::Call {
            target,
            method,
            args: args.into_iter().collect(),
        })
    }

    /// Nested lambda node.
    pub fn lambda(parameter: Parameter, body: Expr) -> Self {
        Self::from_node(ExprNode::Lambda { parameter, body })
    }

    /// Member call `self.method(args)`.
    #[inline]
    pub fn method(self, method: Method, args: impl IntoIterator<Item = Expr>) -> Self {
        Self::call(Some(self), method, args)
    }

    /// Type test `self is dtype`.
    #[inline]
    pub fn type_is(self, dtype: ValueType) -> Self {
        Self::from_node(ExprNode::TypeIs {
            operand: self,
            dtype,
        })
    }

    /// Build `!self`.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        Self::unary(UnaryOp::Negate, self)
    }

    /// Build `self && rhs`.
    #[inline]
    pub fn and_also(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::AndAlso, self, rhs)
    }

    /// Build `self || rhs`.
    #[inline]
    pub fn or_else(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::OrElse, self, rhs)
    }

    /// Build `self ^ rhs`.
    #[inline]
    pub fn xor(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Xor, self, rhs)
    }

    /// Build `self == rhs`.
    #[inline]
    pub fn equals(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Equal, self, rhs)
    }

    #[inline]
    pub fn not_equals(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::NotEqual, self, rhs)
    }

    #[inline]
    pub fn lt(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::LessThan, self, rhs)
    }

    #[inline]
    pub fn le(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::LessThanOrEqual, self, rhs)
    }

    #[inline]
    pub fn gt(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::GreaterThan, self, rhs)
    }

    #[inline]
    pub fn ge(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::GreaterThanOrEqual, self, rhs)
    }

    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Add, self, rhs)
    }

    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Subtract, self, rhs)
    }

    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Multiply, self, rhs)
    }

    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Divide, self, rhs)
    }

    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn rem(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Modulo, self, rhs)
    }

    /// Node identity: the same shared node, or two references to the same parameter.
    pub fn same(&self, other: &Expr) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }

        match (self.node(), other.node()) {
            (ExprNode::Parameter(a), ExprNode::Parameter(b)) => a.id == b.id,
            _ => false,
        }
    }

    /// Pointer identity of the shared node.
    #[inline]
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The referenced parameter if this is a parameter node.
    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self.node() {
            ExprNode::Parameter(p) => Some(p),
            _ => None,
        }
    }

    /// The literal if this is a constant node.
    pub fn as_constant(&self) -> Option<&Value> {
        match self.node() {
            ExprNode::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> SmallVec<&Expr, 4> {
        let mut children = SmallVec::new();
        match self.node() {
            ExprNode::Constant(_) | ExprNode::Parameter(_) => {}
            ExprNode::Unary { operand, .. } | ExprNode::TypeIs { operand, .. } => {
                children.push(operand)
            }
            ExprNode::Binary { lhs, rhs, .. } => {
                children.push(lhs);
                children.push(rhs);
            }
            ExprNode::Call { target, args, .. } => {
                children.extend(target.iter());
                children.extend(args.iter());
            }
            ExprNode::Lambda { body, .. } => children.push(body),
        }
        children
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.node(), f)
    }
}

impl PartialEq for Expr {
    /// Structural equality; parameters compare by identity token.
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }

        match (self.node(), other.node()) {
            (ExprNode::Constant(a), ExprNode::Constant(b)) => {
                a == b && a.value_type() == b.value_type()
            }
            (ExprNode::Parameter(a), ExprNode::Parameter(b)) => a == b,
            (
                ExprNode::Unary { op: op_a, operand: a },
                ExprNode::Unary { op: op_b, operand: b },
            ) => op_a == op_b && a == b,
            (
                ExprNode::Binary {
                    op: op_a,
                    lhs: lhs_a,
                    rhs: rhs_a,
                },
                ExprNode::Binary {
                    op: op_b,
                    lhs: lhs_b,
                    rhs: rhs_b,
                },
            ) => op_a == op_b && lhs_a == lhs_b && rhs_a == rhs_b,
            (
                ExprNode::Call {
                    target: target_a,
                    method: method_a,
                    args: args_a,
                },
                ExprNode::Call {
                    target: target_b,
                    method: method_b,
                    args: args_b,
                },
            ) => method_a == method_b && target_a == target_b && args_a == args_b,
            (
                ExprNode::TypeIs {
                    operand: a,
                    dtype: dtype_a,
                },
                ExprNode::TypeIs {
                    operand: b,
                    dtype: dtype_b,
                },
            ) => dtype_a == dtype_b && a == b,
            (
                ExprNode::Lambda {
                    parameter: param_a,
                    body: body_a,
                },
                ExprNode::Lambda {
                    parameter: param_b,
                    body: body_b,
                },
            ) => param_a == param_b && body_a == body_b,
            _ => false,
        }
    }
}

impl Eq for Expr {}

/// Typed single-parameter function `A -> R`.
///
/// Used both for the criteria of a specification (`R = bool`) and for converters feeding the
/// type-adapting composite. The type parameters only document intent; the tree itself is
/// dynamically typed and checked at compile time.
pub struct Lambda<A, R> {
    parameter: Parameter,
    body: Expr,
    _marker: PhantomData<fn(A) -> R>,
}

/// Boolean-valued predicate over candidates of type `T`.
pub type Criteria<T> = Lambda<T, bool>;

impl<A: Candidate, R: Candidate> Lambda<A, R> {
    /// Build a lambda over a fresh parameter named `x`.
    pub fn new(build: impl FnOnce(Expr) -> Expr) -> Self {
        Self::named("x", build)
    }

    /// Build a lambda over a fresh parameter with the given display name.
    pub fn named(name: &str, build: impl FnOnce(Expr) -> Expr) -> Self {
        let parameter = Parameter::of::<A>(name);
        let body = build(parameter.to_expr());
        Self::from_parts(parameter, body)
    }

    /// Assemble a lambda from an existing parameter and body.
    pub fn from_parts(parameter: Parameter, body: Expr) -> Self {
        debug_assert!(
            parameter.dtype().accepts(&A::value_type()),
            "lambda parameter typed `{}` cannot bind `{}`",
            parameter.dtype(),
            A::value_type()
        );
        Self {
            parameter,
            body,
            _marker: PhantomData,
        }
    }
}

impl<A, R> Lambda<A, R> {
    #[inline]
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    #[inline]
    pub fn body(&self) -> &Expr {
        &self.body
    }

    /// This lambda as a nested [`ExprNode::Lambda`] node.
    pub fn to_expr(&self) -> Expr {
        Expr::lambda(self.parameter.clone(), self.body.clone())
    }

    pub fn into_parts(self) -> (Parameter, Expr) {
        (self.parameter, self.body)
    }
}

impl<A, R> Clone for Lambda<A, R> {
    fn clone(&self) -> Self {
        Self {
            parameter: self.parameter.clone(),
            body: self.body.clone(),
            _marker: PhantomData,
        }
    }
}

impl<A, R> fmt::Debug for Lambda<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("parameter", &self.parameter)
            .field("body", &self.body)
            .finish()
    }
}

impl<A, R> PartialEq for Lambda<A, R> {
    fn eq(&self, other: &Self) -> bool {
        self.parameter == other.parameter && self.body == other.body
    }
}
