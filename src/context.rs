//! Render-time state.
//!
//! A [`RenderContext`] is the single-threaded bag of state one render
//! evaluates against: a chain of variable scopes, a register map for
//! filter-private scratch data, the active [`FormatProvider`] and
//! [`SyntaxLevel`], and an optional deadline.
//!
//! A [`Template`] decides how renders share state. A reentrant template
//! hands every render its own copies of the template-level assigns and
//! registers, so concurrent renders cannot observe each other. A
//! non-reentrant template hands out shared handles instead; writes made
//! during a render persist into the template. Callers of a non-reentrant
//! template must serialize renders themselves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::compat::SyntaxLevel;
use crate::error::{Error, FilterResult, RenderResult};
use crate::locale::FormatProvider;
use crate::registry::FilterRegistry;
use crate::value::Value;

/// Absolute point in time after which a render must stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Deadline {
            at: Instant::now() + timeout,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Template-level state shared by every render of a non-reentrant
/// template.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    pub assigns: Arc<DashMap<String, Value>>,
    pub registers: Arc<DashMap<String, Value>>,
}

/// Everything a caller can configure for one render.
#[derive(Clone, Default)]
pub struct RenderRequest {
    pub local_variables: HashMap<String, Value>,
    pub registers: HashMap<String, Value>,
    /// Replacement filter registry; the standard set when absent.
    pub filters: Option<Arc<FilterRegistry>>,
    pub level: SyntaxLevel,
    pub format_provider: FormatProvider,
    pub ruby_date_format: bool,
    /// Zero or absent means no deadline.
    pub timeout: Option<Duration>,
}

/// A compiled template's state container.
pub struct Template {
    reentrant: bool,
    shared: SharedState,
}

impl Template {
    /// Reentrant templates isolate each render; this is the safe default.
    pub fn new() -> Self {
        Template {
            reentrant: true,
            shared: SharedState::default(),
        }
    }

    /// Renders of a non-reentrant template read and write the template's
    /// own assigns and registers. The caller owns serialization.
    pub fn non_reentrant() -> Self {
        Template {
            reentrant: false,
            shared: SharedState::default(),
        }
    }

    pub fn is_reentrant(&self) -> bool {
        self.reentrant
    }

    pub fn assign<K: Into<String>>(&self, name: K, value: Value) {
        self.shared.assigns.insert(name.into(), value);
    }

    pub fn set_register<K: Into<String>>(&self, name: K, value: Value) {
        self.shared.registers.insert(name.into(), value);
    }

    pub fn assigned(&self, name: &str) -> Option<Value> {
        self.shared.assigns.get(name).map(|entry| entry.clone())
    }

    pub fn register(&self, name: &str) -> Option<Value> {
        self.shared.registers.get(name).map(|entry| entry.clone())
    }

    /// Build the context for one render according to the request and the
    /// template's reentrancy mode.
    pub fn context_for(&self, request: RenderRequest) -> RenderContext {
        let mut ctx = RenderContext::from_request(request);
        if self.reentrant {
            let copied: HashMap<String, Value> = self
                .shared
                .assigns
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect();
            // Outermost, so request locals keep shadowing template state.
            ctx.scopes.push(copied);
            for entry in self.shared.registers.iter() {
                ctx.registers
                    .entry(entry.key().clone())
                    .or_insert_with(|| entry.value().clone());
            }
        } else {
            ctx.shared = Some(self.shared.clone());
        }
        ctx
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-render evaluation state.
pub struct RenderContext {
    /// Variable scopes, most local first.
    scopes: Vec<HashMap<String, Value>>,
    /// Handles into a non-reentrant template, consulted after the scopes.
    shared: Option<SharedState>,
    registers: HashMap<String, Value>,
    pub provider: FormatProvider,
    pub level: SyntaxLevel,
    pub ruby_date_format: bool,
    deadline: Option<Deadline>,
    pub trace_id: Uuid,
    registry: Arc<FilterRegistry>,
}

impl RenderContext {
    pub fn new(level: SyntaxLevel) -> Self {
        RenderContext {
            scopes: vec![HashMap::new()],
            shared: None,
            registers: HashMap::new(),
            provider: FormatProvider::default(),
            level,
            ruby_date_format: false,
            deadline: None,
            trace_id: Uuid::new_v4(),
            registry: FilterRegistry::standard(),
        }
    }

    #[tracing::instrument(skip(request), fields(level = %request.level))]
    pub fn from_request(request: RenderRequest) -> Self {
        let mut ctx = RenderContext::new(request.level);
        if let Some(registry) = request.filters {
            ctx.registry = registry;
        }
        ctx.provider = request.format_provider;
        ctx.ruby_date_format = request.ruby_date_format;
        ctx.registers = request.registers;
        ctx.deadline = request
            .timeout
            .filter(|t| !t.is_zero())
            .map(Deadline::after);
        ctx.push_scope(request.local_variables);
        debug!(trace_id = %ctx.trace_id, "render context created");
        ctx
    }

    pub fn push_scope(&mut self, scope: HashMap<String, Value>) {
        self.scopes.insert(0, scope);
    }

    pub fn pop_scope(&mut self) -> Option<HashMap<String, Value>> {
        // The outermost scope stays; it anchors `set`.
        if self.scopes.len() > 1 {
            Some(self.scopes.remove(0))
        } else {
            None
        }
    }

    /// Bind a variable in the innermost scope.
    pub fn set<K: Into<String>>(&mut self, name: K, value: Value) {
        if let Some(scope) = self.scopes.first_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Look a variable up through the scope chain, then through the
    /// template's shared assigns. Absent is `None`.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        for scope in &self.scopes {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        if let Some(shared) = &self.shared {
            if let Some(entry) = shared.assigns.get(name) {
                return Some(entry.clone());
            }
        }
        None
    }

    pub fn register(&self, name: &str) -> Option<Value> {
        if let Some(shared) = &self.shared {
            if let Some(entry) = shared.registers.get(name) {
                return Some(entry.clone());
            }
        }
        self.registers.get(name).cloned()
    }

    pub fn set_register<K: Into<String>>(&mut self, name: K, value: Value) {
        if let Some(shared) = &self.shared {
            shared.registers.insert(name.into(), value);
        } else {
            self.registers.insert(name.into(), value);
        }
    }

    /// Fail the render once the deadline has elapsed. Called between
    /// evaluation steps, not inside individual filters.
    pub fn check_deadline(&self) -> RenderResult<()> {
        match self.deadline {
            Some(deadline) if deadline.expired() => Err(Error::Timeout),
            _ => Ok(()),
        }
    }

    /// Dispatch a filter by name through the registry.
    pub fn apply_filter(&self, name: &str, input: &Value, args: &[Value]) -> FilterResult<Value> {
        self.registry.apply(self, name, input, args)
    }
}
