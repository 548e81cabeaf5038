//! The universal dynamic datum flowing through filters.
//!
//! Every filter classifies an incoming [`Value`] into exactly one [`Kind`]
//! before acting; ambiguous inputs are resolved by the fixed priority order
//! implemented in [`Value::kind`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Capability exposed by opaque host objects so the property resolver can
/// look up named fields without reflection.
///
/// Hosts that cannot implement this trait can instead enter the engine as
/// [`Value::Hash`] records via [`Value::from`] on a `serde_json::Value`.
pub trait Indexable: Send + Sync {
    fn contains_key(&self, name: &str) -> bool;
    fn get(&self, name: &str) -> Option<Value>;

    /// String form used when the object is written into rendered output.
    fn render(&self) -> String {
        String::new()
    }
}

/// Dynamic value.
///
/// `Int`/`Long` mirror the two integer widths of the source language so the
/// coercion engine can apply its narrower-then-wider promotion rule.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    Array(Vec<Value>),
    Hash(HashMap<String, Value>),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Opaque(Arc<dyn Indexable>),
}

/// Classification used by every filter before acting on a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    RealLike,
    IntegerLike,
    NumericString,
    SequenceLike,
    RecordLike,
    Opaque,
    Scalar,
}

impl Value {
    /// Classify per the fixed priority order: real-like before
    /// integer-like, numeric strings before plain scalars, sequences
    /// before records.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Float(_) | Value::Decimal(_) => Kind::RealLike,
            Value::Int(_) | Value::Long(_) => Kind::IntegerLike,
            Value::Str(s) if is_numeric_str(s) => Kind::NumericString,
            Value::Array(_) => Kind::SequenceLike,
            Value::Hash(_) => Kind::RecordLike,
            Value::Opaque(_) => Kind::Opaque,
            _ => Kind::Scalar,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind(), Kind::RealLike | Kind::IntegerLike)
    }

    /// Nil and `false` are falsy; everything else, including zero, the
    /// empty string and the empty sequence, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Decimal reading of a numeric or numeric-string value.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Long(i) => Some(Decimal::from(*i)),
            Value::Float(f) => Decimal::from_f64(*f),
            Value::Decimal(d) => Some(*d),
            Value::Str(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(f64::from(*i)),
            Value::Long(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Whole-number reading used for positional filter arguments such as
    /// slice offsets and truncation lengths. Fractions are truncated.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Value::Decimal(d) => d.trunc().to_i64(),
            Value::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    /// Parse a numeric-looking string into the narrowest representation,
    /// first successful parse wins: int, long, decimal, double.
    pub fn parse_numeric(s: &str) -> Option<Value> {
        let s = s.trim();
        if let Ok(i) = s.parse::<i32>() {
            return Some(Value::Int(i));
        }
        if let Ok(i) = s.parse::<i64>() {
            return Some(Value::Long(i));
        }
        if let Ok(d) = Decimal::from_str(s) {
            return Some(Value::Decimal(d));
        }
        // Overflowing text parses to infinity; that is not a number here.
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
    }

    /// Type-insensitive equality used for `where` matching: `"1"` equals
    /// integer 1, decimal 1.0 equals integer 1, everything else compares
    /// structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        let numeric_side = |v: &Value| {
            matches!(
                v.kind(),
                Kind::RealLike | Kind::IntegerLike | Kind::NumericString
            )
        };
        if numeric_side(self) && numeric_side(other) {
            if let (Some(a), Some(b)) = (self.to_decimal(), other.to_decimal()) {
                return a == b;
            }
            if let (Some(a), Some(b)) = (self.to_f64(), other.to_f64()) {
                return a == b;
            }
        }
        self == other
    }

    /// Expose a value as an ordered sequence, flattening `depth` levels of
    /// nested sequences. Non-sequence input becomes a one-element sequence.
    pub fn flatten(&self, depth: usize) -> Vec<Value> {
        match self {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Array(_) if depth > 0 => out.extend(item.flatten(depth - 1)),
                        _ => out.push(item.clone()),
                    }
                }
                out
            }
            other => vec![other.clone()],
        }
    }
}

/// A string counts as numeric when the whole trimmed text parses as a
/// number.
fn is_numeric_str(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && (Decimal::from_str(s).is_ok() || s.parse::<f64>().is_ok())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Int(a), Value::Long(b)) | (Value::Long(b), Value::Int(a)) => {
                i64::from(*a) == *b
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Long(i) => write!(f, "Long({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Decimal(d) => write!(f, "Decimal({})", d),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Hash(map) => f.debug_tuple("Hash").field(map).finish(),
            Value::DateTime(dt) => write!(f, "DateTime({})", dt),
            Value::Date(d) => write!(f, "Date({})", d),
            Value::Time(t) => write!(f, "Time({})", t),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl fmt::Display for Value {
    /// Output form of a value: Nil renders as nothing, sequences render
    /// their elements back to back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for item in items {
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Hash(map) => {
                write!(f, "{{")?;
                let mut first = true;
                for (key, value) in map {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                    first = false;
                }
                write!(f, "}}")
            }
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::Opaque(o) => write!(f, "{}", o.render()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Hash(v)
    }
}

/// Host data without an [`Indexable`] implementation enters the engine as
/// plain records through its JSON form.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if let Ok(narrow) = i32::try_from(i) {
                        Value::Int(narrow)
                    } else {
                        Value::Long(i)
                    }
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Hash(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_kind_priority() {
        assert_eq!(Value::Float(1.5).kind(), Kind::RealLike);
        assert_eq!(Value::Decimal(Decimal::ONE).kind(), Kind::RealLike);
        assert_eq!(Value::Int(1).kind(), Kind::IntegerLike);
        assert_eq!(Value::Long(1).kind(), Kind::IntegerLike);
        assert_eq!(Value::from("1.5").kind(), Kind::NumericString);
        assert_eq!(Value::from("ten").kind(), Kind::Scalar);
        assert_eq!(Value::Array(vec![]).kind(), Kind::SequenceLike);
        assert_eq!(Value::Hash(HashMap::new()).kind(), Kind::RecordLike);
        assert_eq!(Value::Nil.kind(), Kind::Scalar);
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::from("").is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn test_loose_eq_cross_type() {
        assert!(Value::from("1").loose_eq(&Value::Int(1)));
        assert!(Value::Decimal(Decimal::new(10, 1)).loose_eq(&Value::Int(1)));
        assert!(Value::Long(5).loose_eq(&Value::Int(5)));
        assert!(!Value::from("1a").loose_eq(&Value::Int(1)));
        assert!(Value::from("x").loose_eq(&Value::from("x")));
    }

    #[test]
    fn test_flatten_one_level() {
        let nested = Value::Array(vec![
            Value::Int(1),
            Value::Array(vec![Value::Int(2), Value::Array(vec![Value::Int(3)])]),
        ]);
        assert_eq!(
            nested.flatten(1),
            vec![
                Value::Int(1),
                Value::Int(2),
                Value::Array(vec![Value::Int(3)])
            ]
        );
    }

    #[test]
    fn test_flatten_wraps_scalar() {
        assert_eq!(Value::Int(7).flatten(1), vec![Value::Int(7)]);
    }

    #[test]
    fn test_parse_numeric_narrowest_first() {
        assert_eq!(Value::parse_numeric("3"), Some(Value::Int(3)));
        assert_eq!(
            Value::parse_numeric("3000000000"),
            Some(Value::Long(3_000_000_000))
        );
        assert!(matches!(
            Value::parse_numeric("3.5"),
            Some(Value::Decimal(_))
        ));
        assert_eq!(Value::parse_numeric("1e400"), None);
        assert_eq!(Value::parse_numeric("abc"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Nil.to_string(), "");
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::from("a")]).to_string(),
            "1a"
        );
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"n": 1, "s": "x", "a": [1.5, null]}"#).unwrap();
        let value = Value::from(json);
        if let Value::Hash(map) = value {
            assert_eq!(map["n"], Value::Int(1));
            assert_eq!(map["s"], Value::from("x"));
            assert_eq!(map["a"], Value::Array(vec![Value::Float(1.5), Value::Nil]));
        } else {
            panic!("expected a record");
        }
    }
}
