//! Lowering of criteria into callable predicates.
//!
//! Compilation runs once per specification: the tree is type-checked node by node, every
//! parameter (the root one and those bound by nested lambdas) receives a slot in an evaluation
//! frame, and the tree is turned into nested boxed closures. Evaluating a candidate is then a
//! single pass over those closures, with no tree matching nor parameter lookup by id.
//!
//! Performance
//! - Compilation is O(n) in the number of nodes.
//! - Regular expressions with constant patterns are resolved at compile time.
use std::{collections::HashMap, fmt, marker::PhantomData};

use chrono::Datelike;
use log::debug;
use smallvec::{SmallVec, smallvec};

use crate::{
    error::{CompileError, EvalError},
    expr::{
        BinaryOp, Criteria, Expr, ExprNode, ParamId, Parameter, UnaryOp,
        method::{Method, StringComparison, build_regex, cached_regex},
    },
    value::{Candidate, Value, ValueType},
    walker::node_count,
};

type Thunk = Box<dyn Fn(&mut Frame) -> Result<Value, EvalError> + Send + Sync>;

/// Parameter slots of a single evaluation.
struct Frame {
    slots: SmallVec<Option<Value>, 4>,
}

impl Frame {
    fn new(slot_count: usize) -> Self {
        Self {
            slots: smallvec![None; slot_count],
        }
    }

    #[inline]
    fn get(&self, slot: usize) -> Result<Value, EvalError> {
        self.slots[slot].clone().ok_or(EvalError::UnsetSlot(slot))
    }

    #[inline]
    fn set(&mut self, slot: usize, value: Value) {
        self.slots[slot] = Some(value);
    }
}

/// Callable form of a [`Criteria`].
pub struct CompiledPredicate<T> {
    root: Thunk,
    parameter_slot: usize,
    slot_count: usize,
    _marker: PhantomData<fn(&T) -> bool>,
}

impl<T: Candidate> CompiledPredicate<T> {
    /// Evaluate the predicate against `candidate`.
    pub fn call(&self, candidate: &T) -> Result<bool, EvalError> {
        let mut frame = Frame::new(self.slot_count);
        frame.set(self.parameter_slot, candidate.to_value());
        expect_bool((self.root)(&mut frame)?)
    }

    /// Number of parameter slots (root parameter plus nested lambda parameters).
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }
}

impl<T> fmt::Debug for CompiledPredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPredicate")
            .field("parameter_slot", &self.parameter_slot)
            .field("slot_count", &self.slot_count)
            .finish_non_exhaustive()
    }
}

/// Type-check `criteria` and lower it into a [`CompiledPredicate`].
pub fn compile<T: Candidate>(criteria: &Criteria<T>) -> Result<CompiledPredicate<T>, CompileError> {
    let parameter = criteria.parameter();
    if !parameter.dtype().accepts(&T::value_type()) {
        return Err(CompileError::ParameterType {
            expected: T::value_type(),
            found: parameter.dtype().clone(),
        });
    }

    let mut compiler = Compiler::default();
    let (parameter_slot, _) = compiler.bind(parameter);
    let (dtype, root) = compiler.expr(criteria.body())?;
    if !ValueType::Bool.accepts(&dtype) {
        return Err(CompileError::NonBooleanBody(dtype));
    }

    let slot_count = compiler.slot_count;
    debug!(
        "compiled predicate over `{}`: {} node(s), {} slot(s)",
        T::value_type(),
        node_count(criteria.body()),
        slot_count
    );

    Ok(CompiledPredicate {
        root,
        parameter_slot,
        slot_count,
        _marker: PhantomData,
    })
}

#[derive(Default)]
struct Compiler {
    /// Slots of the parameters in scope.
    scope: HashMap<ParamId, usize>,
    slot_count: usize,
}

impl Compiler {
    /// Allocate a fresh slot for `parameter`, returning it with the slot it shadows.
    ///
    /// Every binder owns its slot: a lambda rebinding a parameter that is already in scope must
    /// not overwrite the outer value.
    fn bind(&mut self, parameter: &Parameter) -> (usize, Option<usize>) {
        let slot = self.slot_count;
        self.slot_count += 1;
        (slot, self.scope.insert(parameter.id(), slot))
    }

    /// Leave the scope of `parameter`, restoring the binding it shadowed.
    fn unbind(&mut self, parameter: &Parameter, shadowed: Option<usize>) {
        match shadowed {
            Some(slot) => self.scope.insert(parameter.id(), slot),
            None => self.scope.remove(&parameter.id()),
        };
    }

    fn expr(&mut self, expr: &Expr) -> Result<(ValueType, Thunk), CompileError> {
        match expr.node() {
            ExprNode::Constant(value) => {
                let value = value.clone();
                Ok((value.value_type(), Box::new(move |_| Ok(value.clone()))))
            }
            ExprNode::Parameter(parameter) => {
                let slot = self.scope.get(&parameter.id()).copied().ok_or_else(|| {
                    CompileError::UnboundParameter {
                        name: parameter.name().to_owned(),
                        id: parameter.id().raw(),
                    }
                })?;
                Ok((parameter.dtype().clone(), Box::new(move |f| f.get(slot))))
            }
            ExprNode::Unary { op, operand } => self.unary(*op, operand),
            ExprNode::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            ExprNode::Call {
                target,
                method,
                args,
            } => self.call(target.as_ref(), method, args),
            ExprNode::TypeIs { operand, dtype } => {
                let (_, operand) = self.expr(operand)?;
                let dtype = dtype.clone();
                Ok((
                    ValueType::Bool,
                    Box::new(move |f| Ok(Value::Bool(dtype.matches(&operand(f)?)))),
                ))
            }
            ExprNode::Lambda { .. } => Err(CompileError::DanglingLambda),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(ValueType, Thunk), CompileError> {
        let (dtype, operand) = self.expr(operand)?;
        match op {
            UnaryOp::Not => {
                if !ValueType::Bool.accepts(&dtype) {
                    return Err(CompileError::UnaryOperand { op, found: dtype });
                }
                Ok((
                    ValueType::Bool,
                    Box::new(move |f| Ok(Value::Bool(!expect_bool(operand(f)?)?))),
                ))
            }
            UnaryOp::Negate => {
                if !dtype.is_numeric() {
                    return Err(CompileError::UnaryOperand { op, found: dtype });
                }
                Ok((
                    dtype,
                    Box::new(move |f| match operand(f)? {
                        Value::Int(i) => i
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or(EvalError::Overflow(BinaryOp::Subtract)),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(EvalError::TypeMismatch {
                            expected: ValueType::Float,
                            found: other.value_type(),
                        }),
                    }),
                ))
            }
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(ValueType, Thunk), CompileError> {
        let (lhs_type, lhs) = self.expr(lhs)?;
        let (rhs_type, rhs) = self.expr(rhs)?;
        let mismatch = || CompileError::BinaryOperands {
            op,
            lhs: lhs_type.clone(),
            rhs: rhs_type.clone(),
        };
        let numeric_pair = lhs_type.is_numeric() && rhs_type.is_numeric();

        let thunk: Thunk = match op {
            BinaryOp::AndAlso | BinaryOp::OrElse | BinaryOp::Xor => {
                if !ValueType::Bool.accepts(&lhs_type) || !ValueType::Bool.accepts(&rhs_type) {
                    return Err(mismatch());
                }
                match op {
                    BinaryOp::AndAlso => Box::new(move |f| {
                        Ok(Value::Bool(
                            expect_bool(lhs(f)?)? && expect_bool(rhs(f)?)?,
                        ))
                    }),
                    BinaryOp::OrElse => Box::new(move |f| {
                        Ok(Value::Bool(
                            expect_bool(lhs(f)?)? || expect_bool(rhs(f)?)?,
                        ))
                    }),
                    _ => Box::new(move |f| {
                        Ok(Value::Bool(expect_bool(lhs(f)?)? ^ expect_bool(rhs(f)?)?))
                    }),
                }
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                if !lhs_type.accepts(&rhs_type) && !numeric_pair {
                    return Err(mismatch());
                }
                let negate = op == BinaryOp::NotEqual;
                Box::new(move |f| Ok(Value::Bool((lhs(f)? == rhs(f)?) != negate)))
            }
            BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual => {
                if !lhs_type.is_ordered()
                    || !rhs_type.is_ordered()
                    || (!lhs_type.accepts(&rhs_type) && !numeric_pair)
                {
                    return Err(mismatch());
                }
                Box::new(move |f| {
                    let (a, b) = (lhs(f)?, rhs(f)?);
                    let ordering = a.compare(&b).ok_or_else(|| EvalError::Incomparable {
                        lhs: a.value_type(),
                        rhs: b.value_type(),
                    })?;
                    Ok(Value::Bool(match op {
                        BinaryOp::LessThan => ordering.is_lt(),
                        BinaryOp::LessThanOrEqual => ordering.is_le(),
                        BinaryOp::GreaterThan => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    }))
                })
            }
            BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Modulo => {
                if !numeric_pair {
                    return Err(mismatch());
                }
                let dtype = match (&lhs_type, &rhs_type) {
                    (ValueType::Int, ValueType::Int) => ValueType::Int,
                    (ValueType::Float, _) | (_, ValueType::Float) => ValueType::Float,
                    _ => ValueType::Any,
                };
                let thunk: Thunk = Box::new(move |f| arithmetic(op, lhs(f)?, rhs(f)?));
                return Ok((dtype, thunk));
            }
        };

        Ok((ValueType::Bool, thunk))
    }

    fn call(
        &mut self,
        target: Option<&Expr>,
        method: &Method,
        args: &[Expr],
    ) -> Result<(ValueType, Thunk), CompileError> {
        let signature = |expected: &str| CompileError::MethodSignature {
            method: method.name().to_owned(),
            expected: expected.to_owned(),
            found: describe_call(target, args),
        };

        match method {
            Method::IndexOf(cmp) => {
                let (haystack, needle) = self.string_operands(target, args, signature)?;
                let cmp = *cmp;
                Ok((
                    ValueType::Int,
                    Box::new(move |f| {
                        let (h, n) = (haystack(f)?, needle(f)?);
                        let index = cmp.index_of(expect_str(&h)?, expect_str(&n)?);
                        Ok(Value::Int(index.map_or(-1, |i| i as i64)))
                    }),
                ))
            }
            Method::StartsWith(cmp) | Method::EndsWith(cmp) => {
                let (haystack, affix) = self.string_operands(target, args, signature)?;
                let test: fn(&StringComparison, &str, &str) -> bool = match method {
                    Method::StartsWith(_) => StringComparison::starts_with,
                    _ => StringComparison::ends_with,
                };
                let cmp = *cmp;
                Ok((
                    ValueType::Bool,
                    Box::new(move |f| {
                        let (h, a) = (haystack(f)?, affix(f)?);
                        Ok(Value::Bool(test(&cmp, expect_str(&h)?, expect_str(&a)?)))
                    }),
                ))
            }
            Method::IsMatch(options) => {
                let (None, [input, pattern]) = (target, args) else {
                    return Err(signature("no receiver and (input, pattern) arguments"));
                };
                let (input_type, input) = self.expr(input)?;
                if !ValueType::Str.accepts(&input_type) {
                    return Err(signature("a `str` input"));
                }

                if let Some(Value::Str(pattern)) = pattern.as_constant() {
                    let regex = cached_regex(pattern, *options).map_err(|err| {
                        CompileError::InvalidRegex {
                            pattern: pattern.to_string(),
                            message: err.to_string(),
                        }
                    })?;
                    return Ok((
                        ValueType::Bool,
                        Box::new(move |f| {
                            let input = input(f)?;
                            Ok(Value::Bool(regex.is_match(expect_str(&input)?)))
                        }),
                    ));
                }

                let (pattern_type, pattern) = self.expr(pattern)?;
                if !ValueType::Str.accepts(&pattern_type) {
                    return Err(signature("a `str` pattern"));
                }
                let options = *options;
                Ok((
                    ValueType::Bool,
                    Box::new(move |f| {
                        let (input, pattern) = (input(f)?, pattern(f)?);
                        let pattern = expect_str(&pattern)?;
                        let regex = build_regex(pattern, options).map_err(|err| {
                            EvalError::InvalidRegex {
                                pattern: pattern.to_owned(),
                                message: err.to_string(),
                            }
                        })?;
                        Ok(Value::Bool(regex.is_match(expect_str(&input)?)))
                    }),
                ))
            }
            Method::Any | Method::All | Method::Count => {
                let (None, [sequence, predicate]) = (target, args) else {
                    return Err(signature("no receiver and (sequence, lambda) arguments"));
                };
                let ExprNode::Lambda { parameter, body } = predicate.node() else {
                    return Err(signature("a lambda as second argument"));
                };

                let (sequence_type, sequence) = self.expr(sequence)?;
                let Some(element) = sequence_type.element() else {
                    return Err(signature("a sequence as first argument"));
                };
                if !parameter.dtype().accepts(element) {
                    return Err(signature("a lambda accepting the sequence elements"));
                }

                let (slot, shadowed) = self.bind(parameter);
                let body = self.expr(body);
                self.unbind(parameter, shadowed);
                let (body_type, body) = body?;
                if !ValueType::Bool.accepts(&body_type) {
                    return Err(signature("a boolean lambda body"));
                }

                let thunk: Thunk = match method {
                    Method::Any => Box::new(move |f| {
                        let items = sequence(f)?;
                        for item in expect_seq(&items)? {
                            f.set(slot, item.clone());
                            if expect_bool(body(f)?)? {
                                return Ok(Value::Bool(true));
                            }
                        }
                        Ok(Value::Bool(false))
                    }),
                    Method::All => Box::new(move |f| {
                        let items = sequence(f)?;
                        for item in expect_seq(&items)? {
                            f.set(slot, item.clone());
                            if !expect_bool(body(f)?)? {
                                return Ok(Value::Bool(false));
                            }
                        }
                        Ok(Value::Bool(true))
                    }),
                    _ => {
                        return Ok((
                            ValueType::Int,
                            Box::new(move |f| {
                                let items = sequence(f)?;
                                let mut count = 0i64;
                                for item in expect_seq(&items)? {
                                    f.set(slot, item.clone());
                                    if expect_bool(body(f)?)? {
                                        count += 1;
                                    }
                                }
                                Ok(Value::Int(count))
                            }),
                        ));
                    }
                };
                Ok((ValueType::Bool, thunk))
            }
            Method::Weekday | Method::Year | Method::Month | Method::Day => {
                let (Some(date), []) = (target, args) else {
                    return Err(signature("a `date` receiver and no arguments"));
                };
                let (date_type, date) = self.expr(date)?;
                if !ValueType::Date.accepts(&date_type) {
                    return Err(signature("a `date` receiver"));
                }

                let (dtype, accessor): (ValueType, fn(chrono::NaiveDate) -> Value) = match method
                {
                    Method::Weekday => (ValueType::Weekday, |d| Value::Weekday(d.weekday())),
                    Method::Year => (ValueType::Int, |d| Value::Int(d.year().into())),
                    Method::Month => (ValueType::Int, |d| Value::Int(d.month().into())),
                    _ => (ValueType::Int, |d| Value::Int(d.day().into())),
                };
                Ok((
                    dtype,
                    Box::new(move |f| Ok(accessor(expect_date(&date(f)?)?))),
                ))
            }
            Method::Length => {
                let (Some(receiver), []) = (target, args) else {
                    return Err(signature("a receiver and no arguments"));
                };
                let (receiver_type, receiver) = self.expr(receiver)?;
                if !matches!(
                    receiver_type,
                    ValueType::Str | ValueType::Seq(_) | ValueType::Any
                ) {
                    return Err(signature("a `str` or sequence receiver"));
                }
                Ok((
                    ValueType::Int,
                    Box::new(move |f| match receiver(f)? {
                        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                        Value::Seq(items) => Ok(Value::Int(items.len() as i64)),
                        other => Err(EvalError::TypeMismatch {
                            expected: ValueType::Str,
                            found: other.value_type(),
                        }),
                    }),
                ))
            }
            Method::Native(native) => {
                if target.is_some() || args.len() != native.params().len() {
                    return Err(signature(&format!(
                        "no receiver and {} argument(s)",
                        native.params().len()
                    )));
                }

                let mut thunks: SmallVec<Thunk, 2> = SmallVec::new();
                for (arg, expected) in args.iter().zip(native.params()) {
                    let (arg_type, thunk) = self.expr(arg)?;
                    if !expected.accepts(&arg_type) {
                        return Err(signature(&format!("a `{expected}` argument")));
                    }
                    thunks.push(thunk);
                }

                let native = native.clone();
                Ok((
                    native.returns().clone(),
                    Box::new(move |f| {
                        let values = thunks
                            .iter()
                            .map(|thunk| thunk(f))
                            .collect::<Result<SmallVec<Value, 2>, _>>()?;
                        let result = native.invoke(&values)?;
                        if !native.returns().matches(&result) {
                            return Err(EvalError::TypeMismatch {
                                expected: native.returns().clone(),
                                found: result.value_type(),
                            });
                        }
                        Ok(result)
                    }),
                ))
            }
        }
    }

    /// Receiver and single argument of a string method, both typed `str`.
    fn string_operands(
        &mut self,
        target: Option<&Expr>,
        args: &[Expr],
        signature: impl Fn(&str) -> CompileError,
    ) -> Result<(Thunk, Thunk), CompileError> {
        let (Some(receiver), [argument]) = (target, args) else {
            return Err(signature("a `str` receiver and one argument"));
        };
        let (receiver_type, receiver) = self.expr(receiver)?;
        let (argument_type, argument) = self.expr(argument)?;
        if !ValueType::Str.accepts(&receiver_type) || !ValueType::Str.accepts(&argument_type) {
            return Err(signature("a `str` receiver and a `str` argument"));
        }
        Ok((receiver, argument))
    }
}

fn describe_call(target: Option<&Expr>, args: &[Expr]) -> String {
    format!(
        "{} receiver and {} argument(s)",
        if target.is_some() { "a" } else { "no" },
        args.len()
    )
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) && b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Subtract => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            BinaryOp::Divide => a.checked_div(b),
            _ => a.checked_rem(b),
        };
        return result.map(Value::Int).ok_or(EvalError::Overflow(op));
    }

    let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
        let offending = if lhs.as_float().is_none() { lhs } else { rhs };
        return Err(EvalError::TypeMismatch {
            expected: ValueType::Float,
            found: offending.value_type(),
        });
    };
    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        _ => a % b,
    }))
}

#[inline]
fn expect_bool(value: Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| EvalError::TypeMismatch {
        expected: ValueType::Bool,
        found: value.value_type(),
    })
}

#[inline]
fn expect_str(value: &Value) -> Result<&str, EvalError> {
    value.as_str().ok_or_else(|| EvalError::TypeMismatch {
        expected: ValueType::Str,
        found: value.value_type(),
    })
}

#[inline]
fn expect_date(value: &Value) -> Result<chrono::NaiveDate, EvalError> {
    value.as_date().ok_or_else(|| EvalError::TypeMismatch {
        expected: ValueType::Date,
        found: value.value_type(),
    })
}

#[inline]
fn expect_seq(value: &Value) -> Result<&[Value], EvalError> {
    value.as_seq().ok_or_else(|| EvalError::TypeMismatch {
        expected: ValueType::seq_of(ValueType::Any),
        found: value.value_type(),
    })
}
