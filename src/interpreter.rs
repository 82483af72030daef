//! Tree-walking evaluator over a resolved program.
//!
//! Statements produce a [`Flow`] that says how control leaves them; errors
//! travel separately as [`RuntimeError`]. The current frame is swapped in and
//! out around blocks, loops, switch arms and calls, and always restored
//! before the result is returned.
//!
//! ### Logging Policy
//!
//! | Location                         | Level   | Purpose                      |
//! |----------------------------------|---------|------------------------------|
//! | `Interpreter::new`, `interpret`  | `info`  | Lifecycle milestones.        |
//! | declarations, calls              | `debug` | What gets bound / dispatched.|

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, BufReader, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ast::{ClassDecl, Expr, LiteralValue, Resolution, Stmt, VarRef};
use crate::config::Config;
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::native::NativeFunction;
use crate::object::{BuiltinKind, Builtins, Class, DictKey, Instance, MethodTable, Store};
use crate::token::{Token, TokenType};
use crate::value::{Arity, UserFunction, Value};

type RExpr = Expr<Resolution>;
type RStmt = Stmt<Resolution>;

/// Result of evaluation: a value or a runtime error.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Stack kept free below the current frame before recursing further.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// How control leaves a statement.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    builtins: Builtins,
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
    rng: StdRng,
    config: Config,
    call_depth: usize,
    loading_prelude: bool,
}

impl Interpreter {
    /// An interpreter writing to stdout and reading stdin, with every native
    /// function and the bare built-in classes defined as globals.
    pub fn new(config: Config) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_ref();
        let builtins = Builtins::bare();

        {
            let mut env = globals.borrow_mut();
            for native in NativeFunction::ALL {
                debug!("Defining native function '{}'", native.name());
                env.define(native.name(), Value::Native(native));
            }
            for class in [&builtins.list, &builtins.dictionary, &builtins.string] {
                env.define(&class.name, Value::Class(Rc::clone(class)));
            }
        }

        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            builtins,
            out: Box::new(io::stdout()),
            input: Box::new(BufReader::new(io::stdin())),
            rng,
            config,
            call_depth: 0,
            loading_prelude: false,
        }
    }

    /// Redirect `print`.
    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = out;
        self
    }

    /// Redirect `readLine`.
    pub fn with_input(mut self, input: Box<dyn BufRead>) -> Self {
        self.input = input;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// While set, global classes named after a built-in kind replace it.
    pub fn set_loading_prelude(&mut self, loading: bool) {
        self.loading_prelude = loading;
    }

    pub fn new_list(&self, items: Vec<Value>) -> Value {
        self.builtins.new_list(items)
    }

    pub fn new_dictionary(&self, entries: BTreeMap<DictKey, Value>) -> Value {
        self.builtins.new_dictionary(entries)
    }

    pub fn new_string(&self, text: &str) -> Value {
        self.builtins.new_string(Rc::from(text))
    }

    /// Value of a global, if bound.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals
            .borrow()
            .get(&Token::synthetic(name, 0))
            .ok()
    }

    /// Every name bound in the global frame, sorted.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.borrow().names()
    }

    /// Next line of input without its terminator; `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Execute a program.
    pub fn interpret(&mut self, statements: &[RStmt]) -> EvalResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = self.execute_all(statements);
        self.out.flush()?;
        result?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn execute_all(&mut self, statements: &[RStmt]) -> EvalResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `f` with `env` as the current frame, restoring the previous frame
    /// however `f` exits.
    fn in_environment<T>(
        &mut self,
        env: EnvRef,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let previous = mem::replace(&mut self.environment, env);
        let result = f(self);
        self.environment = previous;
        result
    }

    pub fn execute_block(&mut self, statements: &[RStmt], env: EnvRef) -> EvalResult<Flow> {
        self.in_environment(env, |this| this.execute_all(statements))
    }

    fn child_environment(&self) -> EnvRef {
        Environment::with_enclosing(Rc::clone(&self.environment)).into_ref()
    }

    pub fn execute(&mut self, stmt: &RStmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}'", name.lexeme);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let env = self.child_environment();
                return self.execute_block(statements, env);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While {
                keyword,
                condition,
                body,
            } => {
                let mut iterations = 0;
                while self.evaluate(condition)?.is_truthy() {
                    self.count_iteration(keyword, &mut iterations)?;
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }

            Stmt::For {
                keyword,
                initializer,
                condition,
                increment,
                body,
            } => {
                let env = self.child_environment();
                return self.in_environment(env, |this| {
                    if let Some(init) = initializer {
                        this.execute(init)?;
                    }

                    let mut iterations = 0;
                    loop {
                        if let Some(condition) = condition {
                            if !this.evaluate(condition)?.is_truthy() {
                                break;
                            }
                        }
                        this.count_iteration(keyword, &mut iterations)?;

                        match this.execute(body)? {
                            Flow::Break => break,
                            Flow::Return(value) => return Ok(Flow::Return(value)),
                            Flow::Normal | Flow::Continue => {}
                        }

                        if let Some(increment) = increment {
                            this.evaluate(increment)?;
                        }
                    }
                    Ok(Flow::Normal)
                });
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function =
                    UserFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }

            Stmt::Class(decl) => self.declare_class(decl)?,

            Stmt::Enum(decl) => {
                debug!("Defining enum '{}'", decl.name.lexeme);
                let cases: Vec<&str> = decl.cases.iter().map(|c| c.lexeme.as_str()).collect();
                let class = Class::new_enum(decl.name.lexeme.as_str(), &cases);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Class(class));
            }

            Stmt::Break(_) => return Ok(Flow::Break),

            Stmt::Continue(_) => return Ok(Flow::Continue),

            Stmt::Switch {
                subject,
                cases,
                default,
                ..
            } => {
                let subject = self.evaluate(subject)?;

                let mut arm = None;
                'cases: for case in cases {
                    for value in &case.values {
                        if subject.equals(&self.evaluate(value)?) {
                            arm = Some(&case.body);
                            break 'cases;
                        }
                    }
                }
                let arm = arm.or(default.as_ref().map(|d| &d.body));

                if let Some(body) = arm {
                    let env = self.child_environment();
                    return match self.execute_block(body, env)? {
                        Flow::Break => Ok(Flow::Normal),
                        flow => Ok(flow),
                    };
                }
            }
        }

        Ok(Flow::Normal)
    }

    fn count_iteration(&self, keyword: &Token, iterations: &mut u64) -> EvalResult<()> {
        *iterations += 1;
        match self.config.max_loop_iterations {
            Some(limit) if *iterations > limit => Err(RuntimeError::IterationLimit {
                token: keyword.clone(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    fn declare_class(&mut self, decl: &ClassDecl<Resolution>) -> EvalResult<()> {
        debug!("Defining class '{}'", decl.name.lexeme);

        let superclass = match &decl.superclass {
            Some(var) => match self.lookup_variable(var)? {
                Value::Class(class) if !class.is_enum() => Some(class),
                _ => {
                    return Err(RuntimeError::type_mismatch(
                        &var.name,
                        "Superclass must be a class.",
                    ))
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&decl.name.lexeme, Value::Nil);

        let mut static_methods = MethodTable::new();
        for method in decl.methods.iter().filter(|m| m.is_static) {
            let function = UserFunction::new(
                Rc::clone(&method.function),
                Rc::clone(&self.environment),
                false,
            );
            static_methods.insert(method.function.name.lexeme.clone(), Rc::new(function));
        }

        // Instance methods see `super` one frame above their `this` frame.
        let method_env = match &superclass {
            Some(superclass) => {
                let mut env = Environment::with_enclosing(Rc::clone(&self.environment));
                env.define("super", Value::Class(Rc::clone(superclass)));
                env.into_ref()
            }
            None => Rc::clone(&self.environment),
        };

        let mut methods: MethodTable = HashMap::new();
        for method in decl.methods.iter().filter(|m| !m.is_static) {
            let name = &method.function.name.lexeme;
            let function = UserFunction::new(
                Rc::clone(&method.function),
                Rc::clone(&method_env),
                name == "init",
            );
            methods.insert(name.clone(), Rc::new(function));
        }

        let builtin = if self.loading_prelude && Rc::ptr_eq(&self.environment, &self.globals) {
            BuiltinKind::from_name(&decl.name.lexeme)
        } else {
            None
        };

        let class = Rc::new(Class::new(
            decl.name.lexeme.as_str(),
            superclass,
            methods,
            static_methods,
            builtin,
        ));

        if builtin.is_some() {
            self.builtins.install(Rc::clone(&class));
        }

        self.environment
            .borrow_mut()
            .define(&decl.name.lexeme, Value::Class(class));

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &RExpr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Int(n) => Value::Int(*n),
                LiteralValue::Double(n) => Value::Double(*n),
                LiteralValue::Str(s) => Value::String(Rc::clone(s)),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.token_type {
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => match right {
                        Value::Int(n) => n
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or_else(|| RuntimeError::arithmetic(operator, "Integer overflow.")),
                        Value::Double(n) => Ok(Value::Double(-n)),
                        _ => Err(RuntimeError::type_mismatch(
                            operator,
                            "Operand must be a number.",
                        )),
                    },
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, &left, &right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuit = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable(var) | Expr::This(var) => self.lookup_variable(var),

            Expr::Assign { target, value } => {
                let value = self.evaluate(value)?;
                match target.slot {
                    Resolution::Local(distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &target.name.lexeme,
                        value.clone(),
                    ),
                    Resolution::Global => self
                        .globals
                        .borrow_mut()
                        .assign(&target.name, value.clone())?,
                }
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let arguments = self.evaluate_spreadable(arguments)?;
                self.call_value(callee, paren, arguments)
            }

            Expr::Lambda(decl) => Ok(Value::Function(Rc::new(UserFunction::new(
                Rc::clone(decl),
                Rc::clone(&self.environment),
                false,
            )))),

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                self.get_property(object, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::type_mismatch(
                        name,
                        "Only instances have fields.",
                    ));
                };
                let value = self.evaluate(value)?;
                instance
                    .borrow_mut()
                    .set(&name.lexeme, value.clone())
                    .map_err(|message| RuntimeError::type_mismatch(name, message))?;
                Ok(value)
            }

            Expr::Super { keyword, method } => self.super_method(keyword, method),

            Expr::List { elements, .. } => {
                let items = self.evaluate_spreadable(elements)?;
                Ok(self.builtins.new_list(items))
            }

            Expr::Dictionary { bracket, entries } => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    let key = self.evaluate(key)?;
                    let key = dict_key(bracket, &key)?;
                    let value = self.evaluate(value)?;
                    map.insert(key, value);
                }
                Ok(self.builtins.new_dictionary(map))
            }

            Expr::SubscriptGet {
                object,
                bracket,
                index,
            } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                subscript_get(bracket, &object, &index)
            }

            Expr::SubscriptSet {
                object,
                bracket,
                index,
                value,
            } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                let value = self.evaluate(value)?;
                subscript_set(bracket, &object, &index, value.clone())?;
                Ok(value)
            }

            Expr::Splat { operator, .. } => Err(RuntimeError::type_mismatch(
                operator,
                "A spread is only allowed in call arguments and list elements.",
            )),
        }
    }

    fn lookup_variable(&self, var: &VarRef<Resolution>) -> EvalResult<Value> {
        match var.slot {
            Resolution::Local(distance) => Ok(Environment::get_at(
                &self.environment,
                distance,
                &var.name.lexeme,
            )),
            Resolution::Global => self.globals.borrow().get(&var.name),
        }
    }

    /// Evaluate call arguments or list elements, flattening `...list`.
    fn evaluate_spreadable(&mut self, exprs: &[RExpr]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());

        for expr in exprs {
            match expr {
                Expr::Splat { operator, operand } => {
                    let spread = self.evaluate(operand)?;
                    let items = match &spread {
                        Value::Instance(instance) => match &instance.borrow().store {
                            Store::List(items) => Some(items.clone()),
                            _ => None,
                        },
                        _ => None,
                    };
                    match items {
                        Some(items) => values.extend(items),
                        None => {
                            return Err(RuntimeError::type_mismatch(
                                operator,
                                format!("Can only spread a list, not {}.", spread.type_name()),
                            ))
                        }
                    }
                }
                other => values.push(self.evaluate(other)?),
            }
        }

        Ok(values)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Objects
    // ─────────────────────────────────────────────────────────────────────────

    fn get_property(&mut self, object: Value, name: &Token) -> EvalResult<Value> {
        match object {
            Value::Instance(instance) => {
                let own = instance.borrow().get(&name.lexeme, &self.builtins);
                if let Some(value) = own {
                    return Ok(value);
                }

                let class = Rc::clone(instance.borrow().class());
                match class.find_method(&name.lexeme) {
                    Some(method) => {
                        let bound = Rc::new(method.bind(instance));
                        if bound.is_getter() {
                            self.call_function(&bound, Vec::new(), name)
                        } else {
                            Ok(Value::Function(bound))
                        }
                    }
                    None => Err(RuntimeError::UndefinedProperty {
                        token: name.clone(),
                    }),
                }
            }

            Value::String(text) => {
                let wrapped = self.builtins.new_string(text);
                self.get_property(wrapped, name)
            }

            Value::Class(class) => {
                if let Some(case) = class.enum_case(&name.lexeme) {
                    return Ok(case);
                }
                match class.find_static(&name.lexeme) {
                    Some(method) => Ok(Value::Function(method)),
                    None => Err(RuntimeError::UndefinedProperty {
                        token: name.clone(),
                    }),
                }
            }

            other => Err(RuntimeError::type_mismatch(
                name,
                format!("Only instances have properties, not {}.", other.type_name()),
            )),
        }
    }

    fn super_method(&mut self, keyword: &VarRef<Resolution>, method: &Token) -> EvalResult<Value> {
        let Resolution::Local(distance) = keyword.slot else {
            panic!("internal error: 'super' resolved as a global");
        };

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Value::Class(class) => class,
            other => panic!("internal error: 'super' bound to {}", other.type_name()),
        };
        // `this` always sits one frame closer than `super`.
        let instance = match Environment::get_at(&self.environment, distance - 1, "this") {
            Value::Instance(instance) => instance,
            other => panic!("internal error: 'this' bound to {}", other.type_name()),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => {
                let bound = Rc::new(found.bind(instance));
                if bound.is_getter() {
                    self.call_function(&bound, Vec::new(), method)
                } else {
                    Ok(Value::Function(bound))
                }
            }
            None => Err(RuntimeError::UndefinedProperty {
                token: method.clone(),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    fn check_arity(arity: Arity, paren: &Token, got: usize) -> EvalResult<()> {
        if arity.accepts(got) {
            Ok(())
        } else {
            Err(RuntimeError::Arity {
                token: paren.clone(),
                expected: arity,
                got,
            })
        }
    }

    /// Call any callable value with already evaluated arguments.
    pub fn call_value(
        &mut self,
        callee: Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => {
                Self::check_arity(function.arity(), paren, arguments.len())?;
                self.call_function(&function, arguments, paren)
            }

            Value::Native(native) => {
                Self::check_arity(native.arity(), paren, arguments.len())?;
                native
                    .call(self, arguments)
                    .map_err(|message| RuntimeError::Native {
                        token: paren.clone(),
                        message,
                    })
            }

            Value::Class(class) => {
                if class.is_enum() {
                    return Err(RuntimeError::type_mismatch(
                        paren,
                        format!("Can't instantiate enum '{}'.", class.name),
                    ));
                }
                Self::check_arity(class.arity(), paren, arguments.len())?;
                self.instantiate(&class, arguments, paren)
            }

            _ => Err(RuntimeError::NotCallable {
                token: paren.clone(),
            }),
        }
    }

    fn instantiate(
        &mut self,
        class: &Rc<Class>,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> EvalResult<Value> {
        debug!("Instantiating '{}'", class.name);

        let store = class
            .builtin_kind()
            .map_or(Store::Plain, BuiltinKind::empty_store);
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(class), store)));

        if let Some(init) = class.find_method("init") {
            let bound = init.bind(Rc::clone(&instance));
            self.call_function(&bound, arguments, paren)?;
        }

        Ok(Value::Instance(instance))
    }

    /// Run a user function body in a fresh child of its closure.
    pub fn call_function(
        &mut self,
        function: &UserFunction,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> EvalResult<Value> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::StackOverflow {
                token: paren.clone(),
            });
        }

        debug!("Calling '{}' with {} argument(s)", function.name(), arguments.len());

        let mut env = Environment::with_enclosing(Rc::clone(&function.closure));
        let mut arguments = arguments.into_iter();
        for param in function.decl.params.iter().flatten() {
            let value = if param.variadic {
                self.builtins.new_list(arguments.by_ref().collect())
            } else {
                arguments.next().unwrap_or(Value::Nil)
            };
            env.define(&param.name.lexeme, value);
        }

        self.call_depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            self.execute_block(&function.decl.body, env.into_ref())
        });
        self.call_depth -= 1;

        let flow = result?;

        if function.is_initializer {
            return Ok(Environment::get_at(&function.closure, 0, "this"));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

fn binary(operator: &Token, left: &Value, right: &Value) -> EvalResult<Value> {
    match operator.token_type {
        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.equals(right))),
        TokenType::BANG_EQUAL => Ok(Value::Bool(!left.equals(right))),

        TokenType::PLUS => {
            if let (Some(a), Some(b)) = (left.as_text(), right.as_text()) {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(&a);
                joined.push_str(&b);
                return Ok(Value::String(Rc::from(joined)));
            }
            if left.as_f64().is_none() || right.as_f64().is_none() {
                return Err(RuntimeError::type_mismatch(
                    operator,
                    "Operands must be two numbers or two strings.",
                ));
            }
            arithmetic(operator, left, right, i64::checked_add, |a, b| a + b)
        }
        TokenType::MINUS => arithmetic(operator, left, right, i64::checked_sub, |a, b| a - b),
        TokenType::STAR => arithmetic(operator, left, right, i64::checked_mul, |a, b| a * b),
        TokenType::SLASH | TokenType::PERCENT => {
            if right.as_f64() == Some(0.0) && left.as_f64().is_some() {
                return Err(RuntimeError::arithmetic(operator, "Division by zero."));
            }
            if operator.token_type == TokenType::SLASH {
                arithmetic(operator, left, right, i64::checked_div, |a, b| a / b)
            } else {
                arithmetic(operator, left, right, i64::checked_rem, |a, b| a % b)
            }
        }

        TokenType::GREATER => compare(operator, left, right, |o| o.is_gt()),
        TokenType::GREATER_EQUAL => compare(operator, left, right, |o| o.is_ge()),
        TokenType::LESS => compare(operator, left, right, |o| o.is_lt()),
        TokenType::LESS_EQUAL => compare(operator, left, right, |o| o.is_le()),

        _ => Err(RuntimeError::type_mismatch(
            operator,
            format!("Unknown binary operator '{}'.", operator.lexeme),
        )),
    }
}

/// int∘int stays int (checked); anything involving a double is done in f64.
fn arithmetic(
    operator: &Token,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    double_op: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::arithmetic(operator, "Integer overflow.")),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Double(double_op(a, b))),
            _ => Err(RuntimeError::type_mismatch(
                operator,
                "Operands must be numbers.",
            )),
        },
    }
}

fn compare(
    operator: &Token,
    left: &Value,
    right: &Value,
    test: fn(std::cmp::Ordering) -> bool,
) -> EvalResult<Value> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(RuntimeError::type_mismatch(
                    operator,
                    "Operands must be numbers.",
                ))
            }
        },
    };
    // NaN compares false every way.
    Ok(Value::Bool(ordering.is_some_and(test)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscripts
// ─────────────────────────────────────────────────────────────────────────────

fn dict_key(bracket: &Token, key: &Value) -> EvalResult<DictKey> {
    DictKey::from_value(key).ok_or_else(|| {
        RuntimeError::bad_index(
            bracket,
            format!("A {} can't be used as a dictionary key.", key.type_name()),
        )
    })
}

fn list_index(bracket: &Token, index: &Value, len: usize) -> EvalResult<usize> {
    let Value::Int(n) = index else {
        return Err(RuntimeError::bad_index(
            bracket,
            format!("Index must be an int, not {}.", index.type_name()),
        ));
    };
    usize::try_from(*n)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| RuntimeError::bad_index(bracket, format!("Index {} out of range.", n)))
}

fn char_at(bracket: &Token, text: &str, index: &Value) -> EvalResult<Value> {
    let i = list_index(bracket, index, text.chars().count())?;
    let ch: String = text.chars().skip(i).take(1).collect();
    Ok(Value::String(Rc::from(ch)))
}

fn subscript_get(bracket: &Token, object: &Value, index: &Value) -> EvalResult<Value> {
    match object {
        Value::String(text) => char_at(bracket, text, index),
        Value::Instance(cell) => {
            let instance = cell.borrow();
            match &instance.store {
                Store::List(items) => {
                    let i = list_index(bracket, index, items.len())?;
                    Ok(items[i].clone())
                }
                Store::Dictionary(entries) => {
                    let key = dict_key(bracket, index)?;
                    Ok(entries.get(&key).cloned().unwrap_or(Value::Nil))
                }
                Store::String(text) => char_at(bracket, text, index),
                _ => Err(not_subscriptable(bracket, object)),
            }
        }
        _ => Err(not_subscriptable(bracket, object)),
    }
}

fn subscript_set(bracket: &Token, object: &Value, index: &Value, value: Value) -> EvalResult<()> {
    let Value::Instance(cell) = object else {
        return Err(not_subscriptable(bracket, object));
    };

    // Taken before the mutable borrow: `index` may be this very instance.
    let key = DictKey::from_value(index);

    {
        let mut instance = cell.borrow_mut();
        match &mut instance.store {
            Store::List(items) => {
                let i = list_index(bracket, index, items.len())?;
                items[i] = value;
                return Ok(());
            }
            Store::Dictionary(entries) => {
                if let Some(key) = key {
                    entries.insert(key, value);
                    return Ok(());
                }
            }
            _ => {}
        }
    }

    match &cell.borrow().store {
        Store::Dictionary(_) => dict_key(bracket, index).map(|_| ()),
        _ => Err(not_subscriptable(bracket, object)),
    }
}

fn not_subscriptable(bracket: &Token, object: &Value) -> RuntimeError {
    RuntimeError::type_mismatch(
        bracket,
        format!("Can't subscript a value of type {}.", object.type_name()),
    )
}
