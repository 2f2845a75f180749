//! Attribute access policy for the template sandbox.
//!
//! The deny table lists the attribute names abused in classic template
//! escapes (class hierarchy walks, frame and code object access, globals).
//! Everything underscore-prefixed is blocked wholesale; the table exists so
//! the well-known escape vectors stay blocked even if the prefix rule is
//! ever loosened.

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, Value};

/// Attribute names that must never be reachable from a template.
pub const DANGEROUS_ATTRIBUTES: &[&str] = &[
    "__class__",
    "__mro__",
    "__subclasses__",
    "__globals__",
    "__code__",
    "__closure__",
    "__func__",
    "__self__",
    "__dict__",
    "__module__",
    "__builtins__",
    "func_globals",
    "gi_frame",
    "gi_code",
    "cr_frame",
    "cr_code",
];

/// Decide whether a template may read the given attribute.
///
/// Blocks every underscore-prefixed name and everything in
/// [`DANGEROUS_ATTRIBUTES`].
pub fn is_safe_attribute(attr: &str) -> bool {
    !attr.starts_with('_') && !DANGEROUS_ATTRIBUTES.contains(&attr)
}

/// A string-keyed map whose attribute access is gated by the policy.
///
/// Every object graph the sandbox exposes to templates is wrapped in one of
/// these. Blocked attributes resolve to undefined; combined with the
/// environment's strict undefined behavior the render fails instead of
/// leaking anything.
#[derive(Debug, Clone)]
pub struct GuardedMap {
    entries: BTreeMap<String, Value>,
}

impl GuardedMap {
    /// Wrap a key-value map in the attribute guard.
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Direct (host-side) lookup, bypassing no policy: host code is trusted.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

impl Object for GuardedMap {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let attr = key.as_str()?;
        if !is_safe_attribute(attr) {
            tracing::warn!(attr, "sandbox blocked attribute access");
            return None;
        }
        self.entries.get(attr).cloned()
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.entries.keys().map(Value::from).collect())
    }
}
