// File: src/interpreter/environment.rs
//
// Variable storage for the EngPy interpreter.
// A single flat mapping from name to integer: blocks do not open scopes.

use std::collections::HashMap;

/// Variable storage for one run
///
/// Owned by the caller and passed by reference into the interpreter, so a
/// process can drive several independent programs, and a REPL session can
/// keep its bindings between inputs.
///
/// # Examples
///
/// ```
/// use engpy::interpreter::Environment;
///
/// let mut env = Environment::new();
/// env.set("x".to_string(), 10);
/// env.set("x".to_string(), 20);  // create-or-overwrite
/// assert_eq!(env.get("x"), Some(20));
/// assert_eq!(env.get("y"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, i64>,
}

impl Environment {
    pub fn new() -> Self {
        Environment { vars: HashMap::new() }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.vars.get(name).copied()
    }

    /// Bind `name`, replacing any previous value
    pub fn set(&mut self, name: String, value: i64) {
        self.vars.insert(name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// All bindings ordered by name
    pub fn iter_sorted(&self) -> Vec<(&str, i64)> {
        let mut entries: Vec<(&str, i64)> =
            self.vars.iter().map(|(name, value)| (name.as_str(), *value)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}
