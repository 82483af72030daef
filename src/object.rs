//! Classes, instances and the built-in collection kinds.
//!
//! Every runtime object is an [`Instance`] of some [`Class`]. What makes a
//! `List`, `Dictionary` or `String` special is its [`Store`]: a closed set of
//! native payloads that `Instance::get` / `Instance::set` know how to read and
//! protect. Which store an instance receives is decided by walking its class
//! chain for a [`BuiltinKind`].

use std::cell::{OnceCell, RefCell};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::value::{Arity, UserFunction, Value};

/// The class identities the evaluator gives a native payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    List,
    Dictionary,
    String,
}

impl BuiltinKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "List" => Some(BuiltinKind::List),
            "Dictionary" => Some(BuiltinKind::Dictionary),
            "String" => Some(BuiltinKind::String),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::List => "List",
            BuiltinKind::Dictionary => "Dictionary",
            BuiltinKind::String => "String",
        }
    }

    /// Payload of a freshly instantiated object of this kind.
    pub fn empty_store(self) -> Store {
        match self {
            BuiltinKind::List => Store::List(Vec::new()),
            BuiltinKind::Dictionary => Store::Dictionary(BTreeMap::new()),
            BuiltinKind::String => Store::String(Rc::from("")),
        }
    }
}

pub type MethodTable = HashMap<String, Rc<UserFunction>>;

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: MethodTable,
    pub static_methods: MethodTable,
    pub builtin: Option<BuiltinKind>,
    /// Set once, right after an enum class is created.
    cases: OnceCell<Vec<Value>>,
}

impl Class {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<Class>>,
        methods: MethodTable,
        static_methods: MethodTable,
        builtin: Option<BuiltinKind>,
    ) -> Self {
        Class {
            name: name.into(),
            superclass,
            methods,
            static_methods,
            builtin,
            cases: OnceCell::new(),
        }
    }

    /// A method-less class standing in for a built-in kind.
    pub fn bare(kind: BuiltinKind) -> Self {
        Class::new(kind.name(), None, HashMap::new(), HashMap::new(), Some(kind))
    }

    /// Build an enum class and its case instances, in declaration order.
    pub fn new_enum(name: impl Into<String>, case_names: &[&str]) -> Rc<Class> {
        let class = Rc::new(Class::new(name, None, HashMap::new(), HashMap::new(), None));

        let cases = case_names
            .iter()
            .zip(0_i64..)
            .map(|(case, raw_value)| {
                let store = Store::EnumCase {
                    name: Rc::from(*case),
                    raw_value,
                };
                Value::Instance(Rc::new(RefCell::new(Instance::new(
                    Rc::clone(&class),
                    store,
                ))))
            })
            .collect();

        // Freshly created, so the cell is still empty.
        let _ = class.cases.set(cases);

        debug!("Enum '{}' created with {} case(s)", class.name, case_names.len());

        class
    }

    pub fn is_enum(&self) -> bool {
        self.cases.get().is_some()
    }

    pub fn enum_cases(&self) -> &[Value] {
        self.cases.get().map_or(&[], Vec::as_slice)
    }

    pub fn enum_case(&self, name: &str) -> Option<Value> {
        self.enum_cases()
            .iter()
            .find(|case| match case {
                Value::Instance(instance) => {
                    matches!(&instance.borrow().store, Store::EnumCase { name: n, .. } if &**n == name)
                }
                _ => false,
            })
            .cloned()
    }

    /// Instance method lookup, nearest class first.
    pub fn find_method(&self, name: &str) -> Option<Rc<UserFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref()?.find_method(name)
    }

    /// Static method lookup, nearest class first.
    pub fn find_static(&self, name: &str) -> Option<Rc<UserFunction>> {
        if let Some(method) = self.static_methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref()?.find_static(name)
    }

    /// The built-in kind of this class or its nearest ancestor that has one.
    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        match self.builtin {
            Some(kind) => Some(kind),
            None => self.superclass.as_ref()?.builtin_kind(),
        }
    }

    /// Calling a class takes whatever its `init` takes.
    pub fn arity(&self) -> Arity {
        self.find_method("init")
            .map_or(Arity::fixed(0), |init| init.arity())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|class| &class.name),
            )
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("builtin", &self.builtin)
            .finish_non_exhaustive()
    }
}

/// Instance pairs an equality check has already entered.
pub type SeenPairs = HashSet<(*const RefCell<Instance>, *const RefCell<Instance>)>;

/// Native payload of an instance.
#[derive(Debug, Clone)]
pub enum Store {
    Plain,
    List(Vec<Value>),
    Dictionary(BTreeMap<DictKey, Value>),
    String(Rc<str>),
    EnumCase { name: Rc<str>, raw_value: i64 },
}

impl Store {
    /// Content equality for the built-in kinds. Plain objects and enum cases
    /// are only ever equal to themselves, which the caller checks first.
    ///
    /// `seen` holds the instance pairs already under comparison; meeting one
    /// again counts as equal, so self-containing collections terminate.
    pub fn structurally_equals(&self, other: &Store, seen: &mut SeenPairs) -> bool {
        match (self, other) {
            (Store::List(a), Store::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals_within(y, seen))
            }
            (Store::Dictionary(a), Store::Dictionary(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.equals_within(vb, seen))
            }
            (Store::String(a), Store::String(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
    pub store: Store,
}

impl Instance {
    pub fn new(class: Rc<Class>, store: Store) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
            store,
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Own field or computed property named `name`. Methods are the
    /// caller's business.
    pub fn get(&self, name: &str, builtins: &Builtins) -> Option<Value> {
        if let Some(value) = self.fields.get(name) {
            return Some(value.clone());
        }

        match (&self.store, name) {
            (Store::List(items), "count") => Some(Value::Int(items.len() as i64)),
            (Store::Dictionary(entries), "count") => Some(Value::Int(entries.len() as i64)),
            (Store::Dictionary(entries), "keys") => {
                Some(builtins.new_list(entries.keys().map(DictKey::to_value).collect()))
            }
            (Store::Dictionary(entries), "values") => {
                Some(builtins.new_list(entries.values().cloned().collect()))
            }
            (Store::String(text), "count") => Some(Value::Int(text.chars().count() as i64)),
            (Store::EnumCase { name, .. }, "name") => Some(Value::String(Rc::clone(name))),
            (Store::EnumCase { raw_value, .. }, "rawValue") => Some(Value::Int(*raw_value)),
            _ => None,
        }
    }

    /// Store a field. Only plain objects accept new properties.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), String> {
        match self.store {
            Store::Plain => {
                self.fields.insert(name.to_string(), value);
                Ok(())
            }
            Store::EnumCase { .. } => Err(format!(
                "Can't set properties on enum case of '{}'.",
                self.class.name
            )),
            _ => Err(format!(
                "Can't set properties on {} values.",
                self.class.builtin_kind().map_or("built-in", BuiltinKind::name)
            )),
        }
    }
}

/// Writes a value the way it appears inside a collection: strings quoted.
///
/// `open` is the chain of collections currently being written; one that
/// contains itself shows up as `[...]` the second time round.
fn write_element(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    open: &mut Vec<*const Instance>,
) -> fmt::Result {
    if let Some(text) = value.as_text() {
        return write!(f, "\"{}\"", text);
    }

    match value {
        Value::Instance(instance) => instance.borrow().write_nested(f, open),
        other => write!(f, "{}", other),
    }
}

impl Instance {
    fn write_nested(
        &self,
        f: &mut fmt::Formatter<'_>,
        open: &mut Vec<*const Instance>,
    ) -> fmt::Result {
        let ptr: *const Instance = self;
        if matches!(self.store, Store::List(_) | Store::Dictionary(_)) && open.contains(&ptr) {
            return write!(f, "[...]");
        }

        match &self.store {
            Store::Plain => write!(f, "{} instance", self.class.name),
            Store::String(text) => write!(f, "{}", text),
            Store::EnumCase { name, .. } => write!(f, "{}.{}", self.class.name, name),
            Store::List(items) => {
                open.push(ptr);
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_element(f, item, open)?;
                }
                open.pop();
                write!(f, "]")
            }
            Store::Dictionary(entries) if entries.is_empty() => write!(f, "[:]"),
            Store::Dictionary(entries) => {
                open.push(ptr);
                write!(f, "[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_element(f, &key.to_value(), open)?;
                    write!(f, ": ")?;
                    write_element(f, value, open)?;
                }
                open.pop();
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_nested(f, &mut Vec::new())
    }
}

/// The classes currently backing the built-in kinds.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub string: Rc<Class>,
    pub list: Rc<Class>,
    pub dictionary: Rc<Class>,
}

impl Builtins {
    /// Method-less stand-ins, used until (or unless) a prelude replaces them.
    pub fn bare() -> Self {
        Builtins {
            string: Rc::new(Class::bare(BuiltinKind::String)),
            list: Rc::new(Class::bare(BuiltinKind::List)),
            dictionary: Rc::new(Class::bare(BuiltinKind::Dictionary)),
        }
    }

    /// Make `class` the class behind its built-in kind.
    pub fn install(&mut self, class: Rc<Class>) {
        let slot = match class.builtin {
            Some(BuiltinKind::List) => &mut self.list,
            Some(BuiltinKind::Dictionary) => &mut self.dictionary,
            Some(BuiltinKind::String) => &mut self.string,
            None => return,
        };

        debug!("Installing '{}' as a built-in class", class.name);
        *slot = class;
    }

    fn instance(class: &Rc<Class>, store: Store) -> Value {
        Value::Instance(Rc::new(RefCell::new(Instance::new(Rc::clone(class), store))))
    }

    pub fn new_list(&self, items: Vec<Value>) -> Value {
        Self::instance(&self.list, Store::List(items))
    }

    pub fn new_dictionary(&self, entries: BTreeMap<DictKey, Value>) -> Value {
        Self::instance(&self.dictionary, Store::Dictionary(entries))
    }

    pub fn new_string(&self, text: Rc<str>) -> Value {
        Self::instance(&self.string, Store::String(text))
    }
}
