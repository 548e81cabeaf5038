//! Named-property resolution.
//!
//! Filters such as `map`, `where`, `sum` and the sort family look up a
//! property on each element. Resolution tries, in order: a record entry
//! under the exact key, then an opaque host advertising the key through
//! [`Indexable`]. Everything else, sequences included, has no named
//! properties and resolves to absent.

use crate::value::Value;

pub use crate::value::Indexable;

/// Resolve `name` on `value`. Absent is `None`; a present-but-nil entry is
/// `Some(Value::Nil)`, which matters for truthiness tests downstream.
pub fn resolve(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Hash(map) => map.get(name).cloned(),
        Value::Opaque(host) if host.contains_key(name) => {
            Some(host.get(name).unwrap_or(Value::Nil))
        }
        _ => None,
    }
}
