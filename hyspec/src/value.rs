//! Runtime values and the static types attached to expression nodes.
//!
//! Role
//! - [`ValueType`] tags the static type of every node of a predicate tree; the compiler uses
//!   it to reject ill-typed trees before any candidate is evaluated.
//! - [`Value`] is the dynamic payload exchanged by compiled closures.
//! - [`Candidate`] bridges concrete Rust types and the dynamic layer: a type is a valid
//!   candidate for a specification as soon as it can describe its [`ValueType`] and convert
//!   itself into a [`Value`].
use std::{cmp::Ordering, fmt, sync::Arc};

use chrono::{NaiveDate, Weekday};
use strum::EnumIs;

/// Static type of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum ValueType {
    /// Dynamically typed; any runtime value may flow here. Only `Any` operands make
    /// type-tests meaningful.
    Any,
    Bool,
    Int,
    Float,
    Str,
    Date,
    Weekday,
    /// Finite sequence of elements of the given type.
    Seq(Box<ValueType>),
}

impl ValueType {
    /// Sequence of `element`.
    #[inline]
    pub fn seq_of(element: ValueType) -> Self {
        ValueType::Seq(Box::new(element))
    }

    /// Element type when `self` is a sequence.
    pub fn element(&self) -> Option<&ValueType> {
        match self {
            ValueType::Seq(element) => Some(element),
            ValueType::Any => Some(&ValueType::Any),
            _ => None,
        }
    }

    /// Whether a value statically typed `other` may be used where `self` is expected.
    pub fn accepts(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) | (_, ValueType::Any) => true,
            (ValueType::Seq(a), ValueType::Seq(b)) => a.accepts(b),
            (a, b) => a == b,
        }
    }

    /// Types supporting `<`, `<=`, `>`, `>=`.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            ValueType::Any | ValueType::Int | ValueType::Float | ValueType::Str | ValueType::Date
        )
    }

    /// Types supporting arithmetic.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Any | ValueType::Int | ValueType::Float)
    }

    /// Runtime type test, used by `TypeIs` nodes.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Seq(element), Value::Seq(items)) => {
                items.iter().all(|item| element.matches(item))
            }
            (expected, value) => *expected == value.value_type(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Str => write!(f, "str"),
            ValueType::Date => write!(f, "date"),
            ValueType::Weekday => write!(f, "weekday"),
            ValueType::Seq(element) => write!(f, "[{element}]"),
        }
    }
}

/// Dynamically typed runtime value.
///
/// Strings and sequences are reference counted so that constants embedded in a tree can be
/// handed to every evaluation without copying their contents.
#[derive(Debug, Clone, EnumIs)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Date(NaiveDate),
    Weekday(Weekday),
    Seq(Arc<[Value]>),
}

impl Value {
    /// Runtime type tag. Sequences report the type of their first element (or `any` when empty).
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Date(_) => ValueType::Date,
            Value::Weekday(_) => ValueType::Weekday,
            Value::Seq(items) => ValueType::seq_of(
                items
                    .first()
                    .map(Value::value_type)
                    .unwrap_or(ValueType::Any),
            ),
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[inline]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Ordering between two values. Integers and floats are compared numerically; any other
    /// mix of types is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => compare_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => compare_int_float(*b, *a).map(Ordering::reverse),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Exact ordering of an integer against a float, without rounding the integer.
fn compare_int_float(a: i64, b: f64) -> Option<Ordering> {
    // 2^63, the first float past `i64::MAX`.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if b.is_nan() {
        return None;
    }
    if b >= BOUND {
        return Some(Ordering::Less);
    }
    if b < -BOUND {
        return Some(Ordering::Greater);
    }
    let whole = b.floor();
    // `whole` is integral and in range, so the cast is exact.
    match a.cmp(&(whole as i64)) {
        Ordering::Equal if whole < b => Some(Ordering::Less),
        ordering => Some(ordering),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Weekday(a), Value::Weekday(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (a, b) => a.compare(b) == Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::Date(d) => write!(f, "{d}"),
            Value::Weekday(w) => write!(f, "{w}"),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::Str(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<Weekday> for Value {
    fn from(value: Weekday) -> Self {
        Value::Weekday(value)
    }
}

/// A Rust type that specifications can be written against.
///
/// Implementors describe their static [`ValueType`] and convert themselves to and from the
/// dynamic [`Value`] representation used by compiled predicates.
pub trait Candidate: Sized + Send + Sync + 'static {
    /// Static type of candidates of this Rust type.
    fn value_type() -> ValueType;

    /// Convert a candidate into its dynamic representation.
    fn to_value(&self) -> Value;

    /// Recover a candidate from a dynamic value, if the value has the right shape.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_candidate_for_int {
    ($($t:ty),*) => {
        $(
            impl Candidate for $t {
                #[inline]
                fn value_type() -> ValueType {
                    ValueType::Int
                }

                #[inline]
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                #[inline]
                fn from_value(value: &Value) -> Option<Self> {
                    value.as_int().and_then(|i| <$t>::try_from(i).ok())
                }
            }
        )*
    };
}

impl_candidate_for_int!(i8, i16, i32, i64, u8, u16, u32);

impl Candidate for f64 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl Candidate for f32 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        let x = value.as_float()?;
        let narrowed = x as f32;
        (f64::from(narrowed) == x || x.is_nan()).then_some(narrowed)
    }
}

impl Candidate for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl Candidate for String {
    fn value_type() -> ValueType {
        ValueType::Str
    }

    fn to_value(&self) -> Value {
        Value::Str(self.as_str().into())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl Candidate for Arc<str> {
    fn value_type() -> ValueType {
        ValueType::Str
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl Candidate for NaiveDate {
    fn value_type() -> ValueType {
        ValueType::Date
    }

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_date()
    }
}

impl Candidate for Weekday {
    fn value_type() -> ValueType {
        ValueType::Weekday
    }

    fn to_value(&self) -> Value {
        Value::Weekday(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Weekday(w) => Some(*w),
            _ => None,
        }
    }
}

impl Candidate for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: Candidate> Candidate for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::seq_of(T::value_type())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Candidate::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_seq()?.iter().map(T::from_value).collect()
    }
}
