//! A stack of name bindings with lexical shadowing.
//!
//! Bindings are pushed when entering a binder's body and popped on exit.
//! A name pushed twice shadows the earlier binding until popped.

use std::collections::HashMap;

/// A scoped symbol table mapping names to values of type `T`.
#[derive(Debug, Clone)]
pub struct Scope<T> {
    table: HashMap<String, Vec<T>>,
}

impl<T> Scope<T> {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Push a binding for `name`, shadowing any existing one.
    pub fn push(&mut self, name: &str, value: T) {
        self.table.entry(name.to_string()).or_default().push(value);
    }

    /// Pop the innermost binding for `name`.
    ///
    /// Panics if `name` has no binding; push/pop must be balanced by the
    /// traversal that owns the scope.
    pub fn pop(&mut self, name: &str) {
        let stack = self
            .table
            .get_mut(name)
            .unwrap_or_else(|| panic!("popping unbound name `{}`", name));
        stack.pop();
        if stack.is_empty() {
            self.table.remove(name);
        }
    }

    /// Get the innermost binding for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.table.get(name).and_then(|stack| stack.last())
    }

    /// Whether `name` is currently bound.
    pub fn contains(&self, name: &str) -> bool {
        self.table.get(name).is_some_and(|stack| !stack.is_empty())
    }

    /// Whether the scope has no bindings at all.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut scope: Scope<i64> = Scope::new();
        assert!(!scope.contains("x"));

        scope.push("x", 1);
        assert_eq!(scope.get("x"), Some(&1));

        scope.push("x", 2);
        assert_eq!(scope.get("x"), Some(&2));

        scope.pop("x");
        assert_eq!(scope.get("x"), Some(&1));

        scope.pop("x");
        assert!(!scope.contains("x"));
        assert!(scope.is_empty());
    }

    #[test]
    #[should_panic(expected = "unbound name")]
    fn test_unbalanced_pop_panics() {
        let mut scope: Scope<i64> = Scope::new();
        scope.pop("y");
    }
}
