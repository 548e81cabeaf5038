//! Filter registry and dispatch.
//!
//! Every filter is registered once with its canonical name, optional
//! aliases, the minimum compatibility level at which it exists, and an
//! argument-count contract. Lookup is case-insensitive. A name miss and a
//! level miss are indistinguishable to the caller: both are an unknown
//! filter.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use tracing::debug;

use crate::compat::SyntaxLevel;
use crate::context::RenderContext;
use crate::error::{FilterError, FilterResult};
use crate::value::Value;

/// A filter body: the piped input plus any extra arguments.
pub type FilterFn = fn(&RenderContext, &Value, &[Value]) -> FilterResult<Value>;

#[derive(Debug)]
pub struct FilterSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Level at which the filter becomes available.
    pub min_level: SyntaxLevel,
    /// Bounds on the extra arguments, input excluded.
    pub min_args: usize,
    pub max_args: usize,
    pub func: FilterFn,
}

#[derive(Default)]
pub struct FilterRegistry {
    specs: Vec<FilterSpec>,
    by_name: HashMap<String, usize>,
}

lazy_static! {
    static ref STANDARD: Arc<FilterRegistry> = {
        let mut registry = FilterRegistry::new();
        crate::filters::register_standard(&mut registry);
        Arc::new(registry)
    };
}

impl FilterRegistry {
    pub fn new() -> Self {
        FilterRegistry::default()
    }

    /// The shared registry holding the standard filter set.
    pub fn standard() -> Arc<FilterRegistry> {
        Arc::clone(&STANDARD)
    }

    pub fn register(&mut self, spec: FilterSpec) {
        let index = self.specs.len();
        self.by_name.insert(spec.name.to_lowercase(), index);
        for alias in spec.aliases {
            self.by_name.insert(alias.to_lowercase(), index);
        }
        self.specs.push(spec);
    }

    pub fn lookup(&self, name: &str, level: SyntaxLevel) -> Result<&FilterSpec, FilterError> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.specs[index])
            .filter(|spec| level >= spec.min_level)
            .ok_or_else(|| FilterError::UnknownFilter {
                name: name.to_string(),
            })
    }

    #[tracing::instrument(skip(self, ctx, input, args), fields(filter = name))]
    pub fn apply(
        &self,
        ctx: &RenderContext,
        name: &str,
        input: &Value,
        args: &[Value],
    ) -> FilterResult<Value> {
        let spec = self.lookup(name, ctx.level)?;
        if args.len() < spec.min_args || args.len() > spec.max_args {
            return Err(FilterError::Argument(format!(
                "{} expects {} to {} arguments, got {}",
                spec.name,
                spec.min_args,
                spec.max_args,
                args.len()
            )));
        }
        debug!(args = args.len(), "applying filter");
        (spec.func)(ctx, input, args)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn shout(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
        Ok(Value::Str(input.to_string().to_uppercase()))
    }

    fn test_registry() -> FilterRegistry {
        let mut registry = FilterRegistry::new();
        registry.register(FilterSpec {
            name: "shout",
            aliases: &["s"],
            min_level: SyntaxLevel::V2a,
            min_args: 0,
            max_args: 1,
            func: shout,
        });
        registry
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let registry = test_registry();
        assert!(registry.lookup("SHOUT", SyntaxLevel::V3).is_ok());
        assert!(registry.lookup("Shout", SyntaxLevel::V3).is_ok());
    }

    #[test]
    fn test_alias_lookup() {
        let registry = test_registry();
        let spec = registry.lookup("S", SyntaxLevel::V3).unwrap();
        assert_eq!(spec.name, "shout");
    }

    #[test]
    fn test_level_gating() {
        let registry = test_registry();
        assert!(registry.lookup("shout", SyntaxLevel::V2a).is_ok());
        assert_eq!(
            registry.lookup("shout", SyntaxLevel::V2).unwrap_err(),
            FilterError::UnknownFilter {
                name: "shout".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_name() {
        let registry = test_registry();
        assert_eq!(
            registry.lookup("whisper", SyntaxLevel::V3).unwrap_err(),
            FilterError::UnknownFilter {
                name: "whisper".to_string()
            }
        );
    }

    #[test]
    fn test_argument_count_contract() {
        let registry = test_registry();
        let ctx = RenderContext::new(SyntaxLevel::V3);
        let too_many = vec![Value::Int(1), Value::Int(2)];
        let result = registry.apply(&ctx, "shout", &Value::from("hi"), &too_many);
        assert!(matches!(result, Err(FilterError::Argument(_))));
        let result = registry.apply(&ctx, "shout", &Value::from("hi"), &[]);
        assert_eq!(result, Ok(Value::from("HI")));
    }
}
