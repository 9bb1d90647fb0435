use crate::error::RuntimeError;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope. Closures keep their defining scope alive
/// after the call that created it has returned.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

/// One lexical scope: bindings plus a link to the enclosing scope.
/// The global scope is the only one without an `enclosing` link.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef<'a>) -> EnvRef<'a> {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Names bound directly in this scope.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.values.keys().copied()
    }

    /// Binds `name` in this scope only, replacing any previous binding.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, value);
    }

    /// Looks `name` up through the whole chain, innermost first.
    pub fn get(&self, name: &str, line: usize) -> Result<Value<'a>, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }

    /// Rebinds the nearest existing `name`; never creates a binding.
    pub fn assign(&mut self, name: &str, value: Value<'a>, line: usize) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }

    /// Reads `name` from the scope exactly `distance` links out.
    ///
    /// The resolver guarantees the scope exists and binds `name`; `None`
    /// means the resolver and the evaluator disagree about scope shape.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value<'a>> {
        if distance == 0 {
            return self.values.get(name).cloned();
        }

        let enclosing = self.enclosing.as_ref()?;
        let value = enclosing.borrow().get_at(distance - 1, name);
        value
    }

    /// Writes `name` in the scope exactly `distance` links out. Returns
    /// `false` if that scope does not exist or lacks the binding.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value<'a>) -> bool {
        if distance == 0 {
            return match self.values.get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            };
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
            None => {
                debug!("assign_at ran past the global scope looking for '{}'", name);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(value: &Value<'_>) -> f64 {
        match value {
            Value::Number(n) => *n,
            other => panic!("expected a number, got {}", other),
        }
    }

    #[test]
    fn define_shadows_only_the_current_scope() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::child_of(&globals);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(num(&inner.borrow().get("a", 1).unwrap()), 2.0);
        assert_eq!(num(&globals.borrow().get("a", 1).unwrap()), 1.0);
    }

    #[test]
    fn assign_walks_to_the_binding_scope() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::child_of(&globals);

        inner.borrow_mut().assign("a", Value::Number(3.0), 1).unwrap();

        assert_eq!(num(&globals.borrow().get("a", 1).unwrap()), 3.0);
        assert!(inner.borrow().get_at(0, "a").is_none());
    }

    #[test]
    fn missing_names_report_undefined_variable() {
        let env = Environment::new();

        let err = env.get("nope", 7).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UndefinedVariable {
                name: "nope".into(),
                line: 7
            }
        );

        let mut env = env;
        assert!(env.assign("nope", Value::Nil, 8).is_err());
    }

    #[test]
    fn distance_lookups_skip_shadowing_scopes() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let outer = Environment::child_of(&globals);
        outer.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::child_of(&outer);
        inner.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(num(&inner.borrow().get_at(1, "x").unwrap()), 1.0);
        assert!(inner.borrow_mut().assign_at(1, "x", Value::Number(5.0)));
        assert_eq!(num(&outer.borrow().get_at(0, "x").unwrap()), 5.0);
        assert_eq!(num(&inner.borrow().get_at(0, "x").unwrap()), 2.0);
        assert!(!inner.borrow_mut().assign_at(4, "x", Value::Nil));
    }
}
