//! Call targets available to [`ExprNode::Call`](crate::expr::ExprNode::Call) nodes.
//!
//! The vocabulary mirrors what leaf comparators and quantifiers need: string searches, regex
//! matching, sequence combinators, date accessors. Anything else is expressed with a
//! [`NativeFn`], a named host function with a declared signature.
use std::{collections::HashMap, fmt, sync::Arc};

use bitflags::bitflags;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use strum::{Display, EnumIs};

use crate::{
    error::EvalError,
    value::{Candidate, Value, ValueType},
};

/// Case handling for string searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum StringComparison {
    #[strum(serialize = "ordinal")]
    Ordinal,
    #[default]
    #[strum(serialize = "ignore_case")]
    IgnoreCase,
}

impl StringComparison {
    /// Char index of the first occurrence of `needle` in `haystack`.
    pub fn index_of(&self, haystack: &str, needle: &str) -> Option<usize> {
        match self {
            StringComparison::Ordinal => haystack
                .find(needle)
                .map(|byte| haystack[..byte].chars().count()),
            StringComparison::IgnoreCase => haystack
                .char_indices()
                .map(|(byte, _)| byte)
                .chain(std::iter::once(haystack.len()))
                .position(|byte| folded_prefix(&haystack[byte..], needle)),
        }
    }

    pub fn starts_with(&self, haystack: &str, prefix: &str) -> bool {
        match self {
            StringComparison::Ordinal => haystack.starts_with(prefix),
            StringComparison::IgnoreCase => folded_prefix(haystack, prefix),
        }
    }

    pub fn ends_with(&self, haystack: &str, suffix: &str) -> bool {
        match self {
            StringComparison::Ordinal => haystack.ends_with(suffix),
            StringComparison::IgnoreCase => haystack
                .to_lowercase()
                .ends_with(&suffix.to_lowercase()),
        }
    }
}

/// Case-folded `haystack.starts_with(prefix)`.
fn folded_prefix(haystack: &str, prefix: &str) -> bool {
    let mut hay = haystack.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|c| hay.next() == Some(c))
}

bitflags! {
    /// Flags controlling regular expression matching.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegexOptions: u8 {
        const IGNORE_CASE = 1 << 0;
        const MULTILINE = 1 << 1;
        const DOT_MATCHES_NEW_LINE = 1 << 2;
        const IGNORE_WHITESPACE = 1 << 3;
    }
}

impl fmt::Display for RegexOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = String::new();
        for (flag, c) in [
            (RegexOptions::IGNORE_CASE, 'i'),
            (RegexOptions::MULTILINE, 'm'),
            (RegexOptions::DOT_MATCHES_NEW_LINE, 's'),
            (RegexOptions::IGNORE_WHITESPACE, 'x'),
        ] {
            if self.contains(flag) {
                flags.push(c);
            }
        }
        write!(f, "{flags}")
    }
}

static REGEX_CACHE: Lazy<Mutex<HashMap<(String, RegexOptions), Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Compile `pattern`, sharing compiled automata process-wide.
///
/// Only patterns known when a specification is built go through here; patterns computed from
/// candidates use [`build_regex`] so that the cache stays bounded by the specifications alive.
pub(crate) fn cached_regex(pattern: &str, options: RegexOptions) -> Result<Regex, regex::Error> {
    let mut cache = REGEX_CACHE.lock();
    if let Some(regex) = cache.get(&(pattern.to_owned(), options)) {
        return Ok(regex.clone());
    }

    let regex = build_regex(pattern, options)?;
    cache.insert((pattern.to_owned(), options), regex.clone());
    Ok(regex)
}

/// Compile `pattern` without touching the shared cache.
pub(crate) fn build_regex(pattern: &str, options: RegexOptions) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(options.contains(RegexOptions::IGNORE_CASE))
        .multi_line(options.contains(RegexOptions::MULTILINE))
        .dot_matches_new_line(options.contains(RegexOptions::DOT_MATCHES_NEW_LINE))
        .ignore_whitespace(options.contains(RegexOptions::IGNORE_WHITESPACE))
        .build()
}

#[cfg(test)]
pub(crate) fn is_cached(pattern: &str, options: RegexOptions) -> bool {
    REGEX_CACHE.lock().contains_key(&(pattern.to_owned(), options))
}

/// Signature of a native callback.
pub type NativeCallback = dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync;

/// Named host function callable from a tree.
///
/// Identity is the callback allocation: clones of one `NativeFn` are the same method, two
/// functions built separately are not, even with equal names.
#[derive(Clone)]
pub struct NativeFn {
    name: Arc<str>,
    params: Arc<[ValueType]>,
    returns: ValueType,
    callback: Arc<NativeCallback>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<Arc<str>>,
        params: impl IntoIterator<Item = ValueType>,
        returns: ValueType,
        callback: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            returns,
            callback: Arc::new(callback),
        }
    }

    /// Lift a typed unary function.
    ///
    /// ```
    /// use hyspec::expr::method::NativeFn;
    ///
    /// let sign = NativeFn::unary("sign", |d: f64| if d > 0.0 { 1i64 } else if d < 0.0 { -1 } else { 0 });
    /// assert_eq!(sign.name(), "sign");
    /// ```
    pub fn unary<A: Candidate, R: Candidate>(
        name: impl Into<Arc<str>>,
        f: impl Fn(A) -> R + Send + Sync + 'static,
    ) -> Self {
        let name: Arc<str> = name.into();
        let reported = name.clone();
        Self::new(name, [A::value_type()], R::value_type(), move |args| {
            let arg = args
                .first()
                .and_then(A::from_value)
                .ok_or_else(|| EvalError::Native {
                    name: reported.to_string(),
                    message: format!("expected one `{}` argument", A::value_type()),
                })?;
            Ok(f(arg).to_value())
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    #[inline]
    pub fn returns(&self) -> &ValueType {
        &self.returns
    }

    #[inline]
    pub fn invoke(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.callback)(args)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Method identity of a call node.
#[derive(Debug, Clone, PartialEq, EnumIs)]
pub enum Method {
    /// `target.index_of(needle)`: char index of the first match, or `-1`.
    IndexOf(StringComparison),
    /// `target.starts_with(prefix)`
    StartsWith(StringComparison),
    /// `target.ends_with(suffix)`
    EndsWith(StringComparison),
    /// Static `is_match(input, pattern)`; unanchored search.
    IsMatch(RegexOptions),
    /// Static `any(seq, predicate)`.
    Any,
    /// Static `all(seq, predicate)`.
    All,
    /// Static `count(seq, predicate)`.
    Count,
    /// `date.weekday()`
    Weekday,
    /// `date.year()`
    Year,
    /// `date.month()`, 1-based.
    Month,
    /// `date.day()`, 1-based.
    Day,
    /// `target.len()` of a string (chars) or a sequence.
    Length,
    /// Static call into a host function.
    Native(NativeFn),
}

impl Method {
    /// Name as printed.
    pub fn name(&self) -> &str {
        match self {
            Method::IndexOf(_) => "index_of",
            Method::StartsWith(_) => "starts_with",
            Method::EndsWith(_) => "ends_with",
            Method::IsMatch(_) => "is_match",
            Method::Any => "any",
            Method::All => "all",
            Method::Count => "count",
            Method::Weekday => "weekday",
            Method::Year => "year",
            Method::Month => "month",
            Method::Day => "day",
            Method::Length => "len",
            Method::Native(f) => f.name(),
        }
    }

    /// Modifier printed after the arguments, if the method carries one.
    pub fn modifier(&self) -> Option<String> {
        match self {
            Method::IndexOf(cmp) | Method::StartsWith(cmp) | Method::EndsWith(cmp) => {
                Some(cmp.to_string())
            }
            Method::IsMatch(options) if !options.is_empty() => Some(options.to_string()),
            _ => None,
        }
    }

    /// Whether the method is called without a receiver.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Method::IsMatch(_) | Method::Any | Method::All | Method::Count | Method::Native(_)
        )
    }

    /// Whether the method consumes a sequence and a per-element lambda.
    pub fn is_sequence_combinator(&self) -> bool {
        matches!(self, Method::Any | Method::All | Method::Count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_case_index_reports_char_offsets() {
        let cmp = StringComparison::IgnoreCase;
        assert_eq!(cmp.index_of("aValuE", "value"), Some(1));
        assert_eq!(cmp.index_of("éaVALUE", "value"), Some(2));
        assert_eq!(cmp.index_of("val", "value"), None);
        assert_eq!(StringComparison::Ordinal.index_of("ValuE", "value"), None);
    }

    #[test]
    fn regexes_are_shared_through_the_cache() {
        let a = cached_regex("[a-z][0-9].+", RegexOptions::empty()).unwrap();
        let b = cached_regex("[a-z][0-9].+", RegexOptions::empty()).unwrap();
        assert_eq!(a.as_str(), b.as_str());
        assert!(a.is_match("b3ds145a"));
        assert!(!a.is_match("a1"));
        assert!(cached_regex("(", RegexOptions::empty()).is_err());
    }

    #[test]
    fn native_functions_compare_by_callback() {
        let a = NativeFn::unary("sign", |d: f64| d.signum() as i64);
        let b = NativeFn::unary("sign", |d: f64| d.signum() as i64);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.invoke(&[Value::Float(-3.0)]), Ok(Value::Int(-1)));
        assert!(a.invoke(&[Value::Str("x".into())]).is_err());
    }
}
