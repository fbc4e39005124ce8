//! Environment for variable bindings

use super::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared reference to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

/// Environment holding variable bindings
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Variable bindings in this scope
    bindings: HashMap<String, Value>,
    /// Enclosing environment for lexical scoping
    outer: Option<EnvRef>,
}

impl Environment {
    /// Create a new global environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new environment enclosed by `outer`
    pub fn with_outer(outer: EnvRef) -> Self {
        Environment {
            bindings: HashMap::new(),
            outer: Some(outer),
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this scope, shadowing any outer binding
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Look up a variable in the scope chain
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref()?.borrow().get(name),
        }
    }

    /// Update the nearest existing binding; false when there is none
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.bindings.get_mut(name) {
            *slot = value;
            true
        } else if let Some(outer) = &self.outer {
            outer.borrow_mut().set(name, value)
        } else {
            false
        }
    }

    /// Assignment: update the nearest binding, or define one here
    pub fn assign(&mut self, name: &str, value: Value) {
        if !self.set(name, value.clone()) {
            self.define(name, value);
        }
    }

    /// Check if a variable exists in the scope chain
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
            || self
                .outer
                .as_ref()
                .is_some_and(|outer| outer.borrow().contains(name))
    }

    /// Every name visible from this scope, innermost first
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        if let Some(outer) = &self.outer {
            names.extend(outer.borrow().names());
        }
        names
    }

    /// Bindings of this scope only
    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.bindings
    }
}

/// Create a child environment from an outer reference
pub fn child_env(outer: &EnvRef) -> EnvRef {
    Environment::with_outer(Rc::clone(outer)).into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("x", Value::Int(42));
        assert_eq!(env.get("x"), Some(Value::Int(42)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn test_scope_chain() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Int(1));

        let child = child_env(&outer);
        child.borrow_mut().define("y", Value::Int(2));

        assert_eq!(child.borrow().get("x"), Some(Value::Int(1)));
        assert_eq!(child.borrow().get("y"), Some(Value::Int(2)));
        assert_eq!(outer.borrow().get("y"), None);
    }

    #[test]
    fn test_shadowing() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Int(1));

        let child = child_env(&outer);
        child.borrow_mut().define("x", Value::str("inner"));

        assert_eq!(child.borrow().get("x"), Some(Value::str("inner")));
        assert_eq!(outer.borrow().get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn test_set_in_outer_scope() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Int(1));

        let child = child_env(&outer);
        assert!(child.borrow_mut().set("x", Value::Int(99)));
        assert_eq!(outer.borrow().get("x"), Some(Value::Int(99)));
        assert!(child.borrow().bindings().is_empty());
    }

    #[test]
    fn test_set_missing_does_not_create() {
        let outer = Environment::new().into_ref();
        let child = child_env(&outer);
        assert!(!child.borrow_mut().set("x", Value::Int(1)));
        assert_eq!(child.borrow().get("x"), None);
    }

    #[test]
    fn test_assign_updates_or_defines() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("count", Value::Int(0));
        let child = child_env(&outer);

        child.borrow_mut().assign("count", Value::Int(5));
        child.borrow_mut().assign("fresh", Value::Bool(true));

        assert_eq!(outer.borrow().get("count"), Some(Value::Int(5)));
        assert_eq!(outer.borrow().get("fresh"), None);
        assert_eq!(child.borrow().get("fresh"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_contains_three_levels() {
        let gp = Environment::new().into_ref();
        gp.borrow_mut().define("a", Value::Int(1));
        let p = child_env(&gp);
        p.borrow_mut().define("b", Value::Int(2));
        let c = child_env(&p);

        assert!(c.borrow().contains("a"));
        assert!(c.borrow().contains("b"));
        assert!(!c.borrow().contains("z"));
    }

    #[test]
    fn test_names_walks_chain() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("outer_name", Value::Null);
        let child = child_env(&outer);
        child.borrow_mut().define("inner_name", Value::Null);

        let names = child.borrow().names();
        assert_eq!(names, vec!["inner_name".to_string(), "outer_name".to_string()]);
    }
}
