//! Name resolution for the evaluator
//!
//! Scopes are lexically nested and immutable:
//! - The root scope resolves function names, case-insensitively
//! - A context scope wraps the caller's context object
//! - Anonymous functions add a scope for their arguments

use std::sync::Arc;

use crate::functions;
use crate::types::{Object, Value};

#[derive(Debug)]
enum Source {
    /// The built-in function registry
    Functions,
    /// Properties of an object, matched case-sensitively
    Object(Object),
}

/// A scope containing named values
#[derive(Debug)]
pub struct Scope {
    source: Source,
    /// Parent scope (for lexical nesting)
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// The outermost scope, which only knows about functions
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            source: Source::Functions,
            parent: None,
        })
    }

    /// A scope for a context object, under the root scope
    pub fn for_context(context: Object) -> Arc<Self> {
        Self::root().child(context)
    }

    /// Create a child scope whose names shadow this one's
    pub fn child(self: &Arc<Self>, object: Object) -> Arc<Self> {
        Arc::new(Self {
            source: Source::Object(object),
            parent: Some(Arc::clone(self)),
        })
    }

    /// Look up a name, searching parent scopes
    pub fn get(&self, name: &str) -> Option<Value> {
        let local = match &self.source {
            Source::Functions => functions::lookup(name).map(Value::Function),
            Source::Object(object) => object.get(name).cloned(),
        };

        match (local, &self.parent) {
            (Some(value), _) => Some(value),
            (None, Some(parent)) => parent.get(name),
            (None, None) => None,
        }
    }

    /// The deprecation message of the property `name` resolves to, if any
    pub fn deprecation(&self, name: &str) -> Option<String> {
        match &self.source {
            Source::Object(object) if object.get(name).is_some() => {
                object.deprecation(name).map(str::to_string)
            }
            Source::Functions if functions::lookup(name).is_some() => None,
            _ => self.parent.as_ref().and_then(|parent| parent.deprecation(name)),
        }
    }

    /// Check if a name resolves anywhere in the scope chain
    pub fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn object(pairs: &[(&str, Value)]) -> Object {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_scope_get() {
        let scope = Scope::for_context(object(&[("x", Value::from(42))]));

        assert_eq!(scope.get("x"), Some(Value::from(42)));
        assert_eq!(scope.get("y"), None);
    }

    #[test]
    fn test_scope_is_case_sensitive_for_properties() {
        let scope = Scope::for_context(object(&[("name", Value::text("Bob"))]));

        assert!(scope.is_defined("name"));
        assert!(!scope.is_defined("NAME"));
    }

    #[test]
    fn test_scope_parent_lookup() {
        let parent = Scope::for_context(object(&[("x", Value::from(42))]));
        let child = parent.child(object(&[("y", Value::from(100))]));

        // child can see parent's binding
        assert_eq!(child.get("x"), Some(Value::from(42)));
        assert_eq!(child.get("y"), Some(Value::from(100)));
        assert_eq!(parent.get("y"), None);
    }

    #[test]
    fn test_scope_deprecation() {
        let parent = Scope::for_context(object(&[("x", Value::from(1))]).deprecate("x", "use y"));
        let child = parent.child(object(&[("z", Value::from(2))]));
        let shadowed = parent.child(object(&[("x", Value::from(3))]));

        assert_eq!(child.deprecation("x"), Some("use y".to_string()));
        assert_eq!(child.deprecation("z"), None);
        assert_eq!(shadowed.deprecation("x"), None);
        assert_eq!(child.deprecation("upper"), None);
    }

    #[test]
    fn test_scope_shadowing() {
        let parent = Scope::for_context(object(&[("x", Value::from(42))]));
        let child = parent.child(object(&[("x", Value::from(100))]));

        assert_eq!(child.get("x"), Some(Value::from(100)));
    }

    #[test]
    fn test_root_resolves_functions() {
        let scope = Scope::for_context(Object::default());

        assert!(matches!(scope.get("upper"), Some(Value::Function(_))));
        assert!(matches!(scope.get("UPPER"), Some(Value::Function(_))));
        assert_eq!(scope.get("no_such_function"), None);

        // context values shadow functions
        let shadowed = Scope::for_context(object(&[("upper", Value::text("x"))]));
        assert_eq!(shadowed.get("upper"), Some(Value::text("x")));
    }
}
