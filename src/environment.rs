//! Chained runtime scope frames.
//!
//! A frame owns its bindings and shares its parent: closures and child frames
//! hold an `Rc` to the frame they were created in, so a frame lives as long as
//! anything still refers to it.

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared reference to a frame.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A frame with no parent (the global frame).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this frame, shadowing outer bindings.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}'", name);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up through the whole chain.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::UndefinedVariable {
                token: name.clone(),
            })
        }
    }

    /// Rebind an existing `name` wherever it lives in the chain.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::UndefinedVariable {
                token: name.clone(),
            })
        }
    }

    /// Names bound directly in this frame, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }

    /// The frame exactly `distance` parent links above `env`.
    ///
    /// # Panics
    ///
    /// If the chain is shorter than `distance`: the resolver computed a
    /// distance that does not exist at runtime.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current = Rc::clone(env);

        for hop in 0..distance {
            let parent = match current.borrow().enclosing.as_ref() {
                Some(parent) => Rc::clone(parent),
                None => panic!(
                    "internal error: resolved distance {} but the environment chain ends after {} frame(s)",
                    distance, hop
                ),
            };
            current = parent;
        }

        current
    }

    /// Read `name` from the frame `distance` links up, without searching.
    ///
    /// # Panics
    ///
    /// If that frame does not bind `name`.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Value {
        let frame = Self::ancestor(env, distance);
        let value = frame.borrow().values.get(name).cloned();

        match value {
            Some(value) => value,
            None => panic!(
                "internal error: '{}' is not bound at resolved distance {}",
                name, distance
            ),
        }
    }

    /// Overwrite `name` in the frame `distance` links up.
    ///
    /// # Panics
    ///
    /// If that frame does not bind `name`.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) {
        let frame = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => panic!(
                "internal error: '{}' is not bound at resolved distance {}",
                name, distance
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(lexeme: &str) -> Token {
        Token::synthetic(lexeme, 1)
    }

    #[test]
    fn get_walks_the_chain() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Int(1));

        let child = Environment::with_enclosing(Rc::clone(&globals));
        assert!(matches!(child.get(&name("a")), Ok(Value::Int(1))));
        assert!(matches!(
            child.get(&name("b")),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn define_shadows_outer_binding() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Int(1));

        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        inner.borrow_mut().define("x", Value::Int(2));

        assert!(matches!(Environment::get_at(&inner, 0, "x"), Value::Int(2)));
        assert!(matches!(Environment::get_at(&inner, 1, "x"), Value::Int(1)));
    }

    #[test]
    fn assign_at_touches_only_the_target_frame() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Int(1));
        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        inner.borrow_mut().define("x", Value::Int(2));

        Environment::assign_at(&inner, 1, "x", Value::Int(10));

        assert!(matches!(Environment::get_at(&inner, 0, "x"), Value::Int(2)));
        assert!(matches!(Environment::get_at(&outer, 0, "x"), Value::Int(10)));
    }

    #[test]
    fn assign_to_unbound_name_fails() {
        let mut env = Environment::new();
        assert!(matches!(
            env.assign(&name("ghost"), Value::Nil),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn unsatisfiable_distance_is_fatal() {
        let env = Environment::new().into_ref();
        Environment::get_at(&env, 1, "x");
    }

    #[test]
    fn shared_frame_sees_mutation() {
        let shared = Environment::new().into_ref();
        shared.borrow_mut().define("n", Value::Int(0));

        let a = Environment::with_enclosing(Rc::clone(&shared)).into_ref();
        let b = Environment::with_enclosing(Rc::clone(&shared)).into_ref();

        Environment::assign_at(&a, 1, "n", Value::Int(5));
        assert!(matches!(Environment::get_at(&b, 1, "n"), Value::Int(5)));
    }
}
