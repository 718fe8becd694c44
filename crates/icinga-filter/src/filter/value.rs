//! Scalar values and the rows they are read from.
//!
//! Rows are plain string-keyed maps. Every comparison the evaluator performs goes
//! through the small closed [`Value`] type, so coercion rules live in one place.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar value stored in a row or used as a filter literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// No value. Rows treat this the same as a missing column.
    #[default]
    Null,
    /// A boolean flag.
    Bool(bool),
    /// Any numeric value.
    Number(f64),
    /// Free text.
    String(String),
}

impl Value {
    /// Returns the canonical textual form used for equality and wildcard matching.
    ///
    /// Integral numbers are printed without a fraction, booleans as `1`/`0`
    /// and null as the empty string.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Bool(true) => Cow::Borrowed("1"),
            Value::Bool(false) => Cow::Borrowed("0"),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::String(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Returns the numeric interpretation of this value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_number(s),
        }
    }

    /// Returns the exact integer interpretation of this value, if it has one.
    ///
    /// Integer text is parsed without going through `f64`, so ids beyond
    /// 2^53 keep every digit.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(i128::from(*b)),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e38 => Some(*n as i128),
            Value::Number(_) => None,
            Value::String(s) => s.trim().parse::<i128>().ok(),
        }
    }

    /// Orders two values numerically, or returns `None` if either is not a number.
    ///
    /// Two integers compare exactly; anything else compares as `f64`.
    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.as_number()?.partial_cmp(&other.as_number()?),
        }
    }

    /// Returns the truthiness of the value.
    ///
    /// Null, `false`, zero, the empty string and `"0"` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty() && s != "0",
        }
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the textual form contains the `*` wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Value::String(s) if s.contains('*'))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            // Integers past 2^53 would lose digits as f64
            serde_json::Value::Number(n) if !is_exact_in_f64(n) => Value::String(n.to_string()),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s.clone()),
            // Nested structures are compared by their JSON text
            other => Value::String(other.to_string()),
        }
    }
}

/// Conversion into the ordered literal list of a condition.
///
/// Implemented for single scalars and for lists, so `Filter::where_` accepts
/// both `"ping"` and `["ping", "nothing"]`.
pub trait IntoValues {
    /// Converts `self` into a list of literal values.
    fn into_values(self) -> Vec<Value>;
}

macro_rules! impl_into_values_for_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValues for $ty {
                fn into_values(self) -> Vec<Value> {
                    vec![Value::from(self)]
                }
            }
        )*
    };
}

impl_into_values_for_scalar!(&str, String, bool, i32, i64, f64);

impl IntoValues for Value {
    fn into_values(self) -> Vec<Value> {
        vec![self]
    }
}

impl<T: Into<Value>> IntoValues for Vec<T> {
    fn into_values(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Value>, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

/// A row that can be filtered.
///
/// Implementations return `None` for columns that do not exist. Callers treat
/// `Some(Value::Null)` exactly like `None`.
pub trait Row {
    /// Looks up the value of `column`.
    fn value(&self, column: &str) -> Option<Value>;
}

/// The default row representation: an ordered map of column to value.
pub type Record = BTreeMap<String, Value>;

impl Row for BTreeMap<String, Value> {
    fn value(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl Row for HashMap<String, Value> {
    fn value(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl Row for serde_json::Map<String, serde_json::Value> {
    fn value(&self, column: &str) -> Option<Value> {
        if let Some(value) = self.get(column) {
            return Some(Value::from(value));
        }
        lookup_path(self, column).map(Value::from)
    }
}

impl Row for serde_json::Value {
    fn value(&self, column: &str) -> Option<Value> {
        self.as_object().and_then(|object| object.value(column))
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn value(&self, column: &str) -> Option<Value> {
        (**self).value(column)
    }
}

/// Resolves a dotted path such as `host.name` through nested JSON objects.
fn lookup_path<'a>(
    object: &'a serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('.');
    let mut current = object.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Largest integer magnitude every `f64` below it represents exactly.
const MAX_EXACT_F64_INTEGER: u64 = 1 << 53;

fn is_exact_in_f64(n: &serde_json::Number) -> bool {
    match (n.as_i64(), n.as_u64()) {
        (Some(i), _) => i.unsigned_abs() <= MAX_EXACT_F64_INTEGER,
        (None, Some(u)) => u <= MAX_EXACT_F64_INTEGER,
        (None, None) => true,
    }
}

/// Parses a trimmed decimal number, rejecting empty strings, NaN and infinities.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let first = trimmed.as_bytes()[0];
    if !(first.is_ascii_digit() || first == b'-' || first == b'+' || first == b'.') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Formats a number, dropping the fraction of integral values.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
