//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::{FunctionDecl, Resolution};
use crate::environment::{EnvRef, Environment};
use crate::native::NativeFunction;
use crate::object::{Class, Instance, SeenPairs, Store};

/// A value the evaluator can produce.
///
/// Cloning is cheap: strings, functions, classes and instances are
/// reference counted.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(Rc<str>),
    Function(Rc<UserFunction>),
    Native(NativeFunction),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Name used in type errors.
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "nil".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Double(_) => "double".into(),
            Value::String(_) => "string".into(),
            Value::Function(_) | Value::Native(_) => "function".into(),
            Value::Class(_) => "class".into(),
            // Reporting must not panic while the instance is being mutated.
            Value::Instance(instance) => instance
                .try_borrow()
                .map_or_else(|_| "instance".into(), |i| i.class().name.clone()),
        }
    }

    /// Numeric value with int promoted to double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Text of a primitive string or of a `String` instance.
    pub fn as_text(&self) -> Option<Rc<str>> {
        match self {
            Value::String(s) => Some(Rc::clone(s)),
            Value::Instance(instance) => match &instance.borrow().store {
                Store::String(s) => Some(Rc::clone(s)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Language equality: defined only within a kind.
    ///
    /// Numbers compare by value across int/double, built-in kinds compare by
    /// contents, everything else by identity.
    pub fn equals(&self, other: &Value) -> bool {
        self.equals_within(other, &mut SeenPairs::new())
    }

    pub(crate) fn equals_within(&self, other: &Value, seen: &mut SeenPairs) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => {
                if Rc::ptr_eq(a, b) || !seen.insert((Rc::as_ptr(a), Rc::as_ptr(b))) {
                    return true;
                }
                a.borrow().store.structurally_equals(&b.borrow().store, seen)
            }
            (Value::String(_), Value::String(_) | Value::Instance(_))
            | (Value::Instance(_), Value::String(_)) => match (self.as_text(), other.as_text()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", itoa::Buffer::new().format(*n)),
            Value::Double(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Function(function) => write!(f, "{}", function),
            Value::Native(native) => write!(f, "<native fn {}>", native.name()),
            Value::Class(class) => write!(f, "{}", class.name),
            Value::Instance(instance) => write!(f, "{}", instance.borrow()),
        }
    }
}

/// How many arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub required: usize,
    /// Surplus arguments are collected into a list.
    pub variadic: bool,
}

impl Arity {
    pub const fn fixed(required: usize) -> Self {
        Arity {
            required,
            variadic: false,
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.required
        } else {
            count == self.required
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variadic {
            write!(f, "at least {}", self.required)
        } else {
            write!(f, "{}", self.required)
        }
    }
}

/// A function written in the language: its resolved declaration plus the
/// frame that was active where it was defined.
pub struct UserFunction {
    pub decl: Rc<FunctionDecl<Resolution>>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl UserFunction {
    pub fn new(decl: Rc<FunctionDecl<Resolution>>, closure: EnvRef, is_initializer: bool) -> Self {
        UserFunction {
            decl,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name.lexeme
    }

    pub fn arity(&self) -> Arity {
        match &self.decl.params {
            None => Arity::fixed(0),
            Some(params) => match params.last() {
                Some(last) if last.variadic => Arity {
                    required: params.len() - 1,
                    variadic: true,
                },
                _ => Arity::fixed(params.len()),
            },
        }
    }

    pub fn is_getter(&self) -> bool {
        self.decl.is_getter()
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> UserFunction {
        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.define("this", Value::Instance(instance));

        UserFunction {
            decl: Rc::clone(&self.decl),
            closure: env.into_ref(),
            is_initializer: self.is_initializer,
        }
    }
}

impl fmt::Debug for UserFunction {
    // The closure may reach this function again; never print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decl.is_lambda {
            write!(f, "<fn>")
        } else {
            write!(f, "<fn {}>", self.name())
        }
    }
}
