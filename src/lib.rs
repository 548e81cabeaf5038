//! # brine
//!
//! Value-transformation core for a Liquid-style templating engine: the
//! dynamic [`Value`] type, the numeric coercion engine, the property
//! resolver, the standard filter set, and the render context they all
//! run inside.
//!
//! ## Architecture
//!
//! - [`value`] — the dynamic datum and its classification rules.
//! - [`numeric`] — arithmetic coercion, rounding, the unary family.
//! - [`compat`] — compatibility levels and the behavior gate table.
//! - [`resolve`] — named-property lookup on records and opaque hosts.
//! - [`registry`] / [`filters`] — filter dispatch and the standard set.
//! - [`context`] — per-render state: scopes, registers, locale, deadline.
//! - [`locale`] — culture-dependent number, currency and date formats.
//!
//! ## Example
//!
//! ```
//! use brine::{RenderContext, SyntaxLevel, Value};
//!
//! let ctx = RenderContext::new(SyntaxLevel::V3);
//! let out = ctx
//!     .apply_filter("upcase", &Value::from("hello"), &[])
//!     .unwrap();
//! assert_eq!(out, Value::from("HELLO"));
//! ```

pub mod compat;
pub mod context;
pub mod error;
pub mod filters;
pub mod locale;
pub mod numeric;
pub mod registry;
pub mod resolve;
pub mod value;

pub use compat::{Gate, SyntaxLevel};
pub use context::{Deadline, RenderContext, RenderRequest, SharedState, Template};
pub use error::{Error, FilterError, FilterResult, NumericError, RenderResult};
pub use locale::FormatProvider;
pub use numeric::Op;
pub use registry::{FilterFn, FilterRegistry, FilterSpec};
pub use resolve::resolve;
pub use value::{Indexable, Kind, Value};
