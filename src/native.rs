//! Functions implemented by the host.
//!
//! The set is closed, so it is an enum rather than a table of boxed closures:
//! values stay `Copy`, comparable and printable, and the prelude can rely on
//! every name in [`NativeFunction::ALL`] being bound before it runs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::Utc;
use log::debug;
use rand::Rng;

use crate::interpreter::Interpreter;
use crate::object::{DictKey, Instance, Store};
use crate::value::{Arity, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFunction {
    Clock,
    Str,
    Int,
    Double,
    ReadLine,
    Random,
    RandomInt,
    EnumCases,
    ListAppend,
    ListInsert,
    ListRemoveAt,
    ListClear,
    DictRemove,
    DictContainsKey,
}

type NativeResult = Result<Value, String>;

impl NativeFunction {
    pub const ALL: [NativeFunction; 14] = [
        NativeFunction::Clock,
        NativeFunction::Str,
        NativeFunction::Int,
        NativeFunction::Double,
        NativeFunction::ReadLine,
        NativeFunction::Random,
        NativeFunction::RandomInt,
        NativeFunction::EnumCases,
        NativeFunction::ListAppend,
        NativeFunction::ListInsert,
        NativeFunction::ListRemoveAt,
        NativeFunction::ListClear,
        NativeFunction::DictRemove,
        NativeFunction::DictContainsKey,
    ];

    /// Global name the function is bound to.
    pub fn name(self) -> &'static str {
        match self {
            NativeFunction::Clock => "clock",
            NativeFunction::Str => "str",
            NativeFunction::Int => "int",
            NativeFunction::Double => "double",
            NativeFunction::ReadLine => "readLine",
            NativeFunction::Random => "random",
            NativeFunction::RandomInt => "randomInt",
            NativeFunction::EnumCases => "enumCases",
            NativeFunction::ListAppend => "_listAppend",
            NativeFunction::ListInsert => "_listInsert",
            NativeFunction::ListRemoveAt => "_listRemoveAt",
            NativeFunction::ListClear => "_listClear",
            NativeFunction::DictRemove => "_dictRemove",
            NativeFunction::DictContainsKey => "_dictContainsKey",
        }
    }

    pub fn arity(self) -> Arity {
        let required = match self {
            NativeFunction::Clock | NativeFunction::ReadLine | NativeFunction::Random => 0,
            NativeFunction::Str
            | NativeFunction::Int
            | NativeFunction::Double
            | NativeFunction::EnumCases
            | NativeFunction::ListClear => 1,
            NativeFunction::RandomInt
            | NativeFunction::ListAppend
            | NativeFunction::ListRemoveAt
            | NativeFunction::DictRemove
            | NativeFunction::DictContainsKey => 2,
            NativeFunction::ListInsert => 3,
        };
        Arity::fixed(required)
    }

    /// Run the function. The arity has already been checked; a returned
    /// message becomes a runtime error at the call site.
    pub fn call(self, interp: &mut Interpreter, args: Vec<Value>) -> NativeResult {
        debug!("Calling native '{}' with {} argument(s)", self.name(), args.len());

        match self {
            NativeFunction::Clock => {
                let micros = Utc::now().timestamp_micros();
                Ok(Value::Double(micros as f64 / 1_000_000.0))
            }

            NativeFunction::Str => Ok(Value::String(Rc::from(args[0].to_string()))),

            NativeFunction::Int => to_int(&args[0]),

            NativeFunction::Double => to_double(&args[0]),

            NativeFunction::ReadLine => match interp.read_line() {
                Ok(Some(line)) => Ok(Value::String(Rc::from(line))),
                Ok(None) => Ok(Value::Nil),
                Err(err) => Err(format!("Could not read input: {}", err)),
            },

            NativeFunction::Random => Ok(Value::Double(interp.rng().gen::<f64>())),

            NativeFunction::RandomInt => {
                let low = expect_int(&args[0], "randomInt")?;
                let high = expect_int(&args[1], "randomInt")?;
                if low > high {
                    return Err(format!(
                        "randomInt bounds are reversed: {} > {}.",
                        low, high
                    ));
                }
                Ok(Value::Int(interp.rng().gen_range(low..=high)))
            }

            NativeFunction::EnumCases => match &args[0] {
                Value::Class(class) if class.is_enum() => {
                    Ok(interp.builtins().new_list(class.enum_cases().to_vec()))
                }
                other => Err(format!(
                    "enumCases expects an enum but got {}.",
                    other.type_name()
                )),
            },

            NativeFunction::ListAppend => {
                let value = args[1].clone();
                with_list(&args[0], |items| {
                    items.push(value);
                    Ok(Value::Nil)
                })
            }

            NativeFunction::ListInsert => {
                let index = expect_int(&args[1], "insert")?;
                let value = args[2].clone();
                with_list(&args[0], |items| {
                    let index = checked_index(index, items.len() + 1)?;
                    items.insert(index, value);
                    Ok(Value::Nil)
                })
            }

            NativeFunction::ListRemoveAt => {
                let index = expect_int(&args[1], "removeAt")?;
                with_list(&args[0], |items| {
                    let index = checked_index(index, items.len())?;
                    Ok(items.remove(index))
                })
            }

            NativeFunction::ListClear => with_list(&args[0], |items| {
                items.clear();
                Ok(Value::Nil)
            }),

            NativeFunction::DictRemove => {
                let key = hashable(&args[1])?;
                with_dictionary(&args[0], |entries| {
                    Ok(entries.remove(&key).unwrap_or(Value::Nil))
                })
            }

            NativeFunction::DictContainsKey => {
                let key = hashable(&args[1])?;
                with_dictionary(&args[0], |entries| Ok(Value::Bool(entries.contains_key(&key))))
            }
        }
    }
}

fn expect_int(value: &Value, what: &str) -> Result<i64, String> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(format!(
            "{} expects an int but got {}.",
            what,
            other.type_name()
        )),
    }
}

/// `index` as a position below `len`.
fn checked_index(index: i64, len: usize) -> Result<usize, String> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| format!("Index {} out of range.", index))
}

fn hashable(value: &Value) -> Result<DictKey, String> {
    DictKey::from_value(value)
        .ok_or_else(|| format!("A {} can't be used as a dictionary key.", value.type_name()))
}

fn instance_of(value: &Value) -> Option<&Rc<RefCell<Instance>>> {
    match value {
        Value::Instance(instance) => Some(instance),
        _ => None,
    }
}

fn with_list<F>(value: &Value, f: F) -> NativeResult
where
    F: FnOnce(&mut Vec<Value>) -> NativeResult,
{
    let instance = instance_of(value)
        .ok_or_else(|| format!("Expected a List but got {}.", value.type_name()))?;

    let mut instance = instance.borrow_mut();
    if let Store::List(items) = &mut instance.store {
        return f(items);
    }
    Err(format!("Expected a List but got {}.", instance.class().name))
}

fn with_dictionary<F>(value: &Value, f: F) -> NativeResult
where
    F: FnOnce(&mut BTreeMap<DictKey, Value>) -> NativeResult,
{
    let instance = instance_of(value)
        .ok_or_else(|| format!("Expected a Dictionary but got {}.", value.type_name()))?;

    let mut instance = instance.borrow_mut();
    if let Store::Dictionary(entries) = &mut instance.store {
        return f(entries);
    }
    Err(format!(
        "Expected a Dictionary but got {}.",
        instance.class().name
    ))
}

fn to_int(value: &Value) -> NativeResult {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Double(n) if n.is_finite() && n.abs() < i64::MAX as f64 => {
            Ok(Value::Int(n.trunc() as i64))
        }
        Value::Double(n) => Err(format!("Can't convert {} to int.", n)),
        other => match other.as_text() {
            Some(text) => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("Can't convert \"{}\" to int.", text)),
            None => Err(format!("Can't convert {} to int.", other.type_name())),
        },
    }
}

fn to_double(value: &Value) -> NativeResult {
    match value {
        Value::Int(n) => Ok(Value::Double(*n as f64)),
        Value::Double(n) => Ok(Value::Double(*n)),
        other => match other.as_text() {
            Some(text) => text
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| format!("Can't convert \"{}\" to double.", text)),
            None => Err(format!("Can't convert {} to double.", other.type_name())),
        },
    }
}
