//! Static resolver pass.
//!
//! One depth-first walk over the parsed tree that
//! 1. tracks lexical scopes (a stack of `name → defined?` maps),
//! 2. rejects programs that break a static rule (first violation wins), and
//! 3. rebuilds the tree with every variable, assignment, `this` and `super`
//!    slot filled in: either the number of frames to walk outwards, or
//!    [`Resolution::Global`].
//!
//! The walk mirrors the frames the interpreter will create: blocks, function
//! bodies, `for` loops, switch arms and class bodies (`super`, then `this`)
//! each push exactly one scope. Top-level declarations are never pushed, so
//! anything not found locally is a global.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{
    ClassDecl, DefaultCase, EnumDecl, Expr, FunctionDecl, MethodDecl, Resolution, ResolvedTree,
    Stmt, SwitchCase, Unresolved, VarRef,
};
use crate::error::{ResolveError, Result};
use crate::token::Token;

type UExpr = Expr<Unresolved>;
type UStmt = Stmt<Unresolved>;
type RExpr = Expr<Resolution>;
type RStmt = Stmt<Resolution>;

type Resolved<T> = std::result::Result<T, ResolveError>;

/// What kind of function body we are in. Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Lambda,
    Method,
    Initializer,
}

/// What kind of class body we are in. Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
    /// Static methods run without an instance.
    StaticMethod,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
    switch_depth: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
            switch_depth: 0,
        }
    }

    /// Resolve a whole program. Nothing is returned unless every statement
    /// passes.
    pub fn resolve(mut self, statements: &[UStmt]) -> Result<ResolvedTree> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        let resolved = self.statements(statements)?;

        info!("Resolve pass finished");
        Ok(resolved)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn statements(&mut self, statements: &[UStmt]) -> Resolved<Vec<RStmt>> {
        statements.iter().map(|stmt| self.resolve_stmt(stmt)).collect()
    }

    /// Resolve `statements` inside a fresh scope.
    fn scoped_block(&mut self, statements: &[UStmt]) -> Resolved<Vec<RStmt>> {
        self.begin_scope();
        let resolved = self.statements(statements)?;
        self.end_scope();
        Ok(resolved)
    }

    fn resolve_stmt(&mut self, stmt: &UStmt) -> Resolved<RStmt> {
        let resolved = match stmt {
            Stmt::Expression(expr) => Stmt::Expression(self.resolve_expr(expr)?),

            Stmt::Print(expr) => Stmt::Print(self.resolve_expr(expr)?),

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name)?;
                let initializer = initializer
                    .as_ref()
                    .map(|expr| self.resolve_expr(expr))
                    .transpose()?;
                self.define(name);

                Stmt::Var {
                    name: name.clone(),
                    initializer,
                }
            }

            Stmt::Block(statements) => Stmt::Block(self.scoped_block(statements)?),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => Stmt::If {
                condition: self.resolve_expr(condition)?,
                then_branch: Box::new(self.resolve_stmt(then_branch)?),
                else_branch: match else_branch {
                    Some(stmt) => Some(Box::new(self.resolve_stmt(stmt)?)),
                    None => None,
                },
            },

            Stmt::While {
                keyword,
                condition,
                body,
            } => {
                let condition = self.resolve_expr(condition)?;
                let body = self.loop_body(body)?;

                Stmt::While {
                    keyword: keyword.clone(),
                    condition,
                    body: Box::new(body),
                }
            }

            Stmt::For {
                keyword,
                initializer,
                condition,
                increment,
                body,
            } => {
                // One scope holds the loop variable for every iteration.
                self.begin_scope();

                let initializer = match initializer {
                    Some(init) => Some(Box::new(self.resolve_stmt(init)?)),
                    None => None,
                };
                let condition = condition
                    .as_ref()
                    .map(|expr| self.resolve_expr(expr))
                    .transpose()?;
                let increment = increment
                    .as_ref()
                    .map(|expr| self.resolve_expr(expr))
                    .transpose()?;
                let body = self.loop_body(body)?;

                self.end_scope();

                Stmt::For {
                    keyword: keyword.clone(),
                    initializer,
                    condition,
                    increment,
                    body: Box::new(body),
                }
            }

            Stmt::Function(decl) => {
                debug!("Resolving function '{}'", decl.name.lexeme);
                // The name is visible inside its own body (recursion).
                self.declare(&decl.name)?;
                self.define(&decl.name);

                Stmt::Function(self.resolve_function(decl, FunctionType::Function)?)
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(ResolveError::ReturnOutsideFunction {
                        token: keyword.clone(),
                    });
                }

                let value = match value {
                    Some(_) if self.current_function == FunctionType::Initializer => {
                        return Err(ResolveError::ReturnValueFromInitializer {
                            token: keyword.clone(),
                        });
                    }
                    Some(expr) => Some(self.resolve_expr(expr)?),
                    None => None,
                };

                Stmt::Return {
                    keyword: keyword.clone(),
                    value,
                }
            }

            Stmt::Class(class) => Stmt::Class(self.resolve_class(class)?),

            Stmt::Enum(decl) => {
                let mut seen = HashSet::new();
                if let Some(duplicate) = decl
                    .cases
                    .iter()
                    .find(|case| !seen.insert(case.lexeme.as_str()))
                {
                    return Err(ResolveError::DuplicateEnumCase {
                        token: duplicate.clone(),
                    });
                }

                self.declare(&decl.name)?;
                self.define(&decl.name);

                Stmt::Enum(EnumDecl::clone(decl))
            }

            Stmt::Break(keyword) => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    return Err(ResolveError::BreakOutsideLoop {
                        token: keyword.clone(),
                    });
                }
                Stmt::Break(keyword.clone())
            }

            Stmt::Continue(keyword) => {
                if self.loop_depth == 0 {
                    return Err(ResolveError::ContinueOutsideLoop {
                        token: keyword.clone(),
                    });
                }
                Stmt::Continue(keyword.clone())
            }

            Stmt::Switch {
                keyword,
                subject,
                cases,
                default,
            } => {
                if cases.is_empty() && default.is_none() {
                    return Err(ResolveError::EmptySwitch {
                        token: keyword.clone(),
                    });
                }

                let subject = self.resolve_expr(subject)?;

                self.switch_depth += 1;

                let mut resolved_cases = Vec::with_capacity(cases.len());
                for case in cases {
                    resolved_cases.push(self.resolve_case(case)?);
                }

                let default = match default {
                    Some(arm) => {
                        if arm.body.is_empty() {
                            return Err(ResolveError::EmptyCase {
                                token: arm.keyword.clone(),
                            });
                        }
                        Some(DefaultCase {
                            keyword: arm.keyword.clone(),
                            body: self.scoped_block(&arm.body)?,
                        })
                    }
                    None => None,
                };

                self.switch_depth -= 1;

                Stmt::Switch {
                    keyword: keyword.clone(),
                    subject,
                    cases: resolved_cases,
                    default,
                }
            }
        };

        Ok(resolved)
    }

    fn loop_body(&mut self, body: &UStmt) -> Resolved<RStmt> {
        self.loop_depth += 1;
        let body = self.resolve_stmt(body)?;
        self.loop_depth -= 1;
        Ok(body)
    }

    fn resolve_case(&mut self, case: &SwitchCase<Unresolved>) -> Resolved<SwitchCase<Resolution>> {
        if case.body.is_empty() {
            return Err(ResolveError::EmptyCase {
                token: case.keyword.clone(),
            });
        }

        let values = case
            .values
            .iter()
            .map(|value| self.resolve_expr(value))
            .collect::<Resolved<Vec<_>>>()?;

        Ok(SwitchCase {
            keyword: case.keyword.clone(),
            values,
            body: self.scoped_block(&case.body)?,
        })
    }

    fn resolve_class(&mut self, class: &ClassDecl<Unresolved>) -> Resolved<ClassDecl<Resolution>> {
        debug!("Resolving class '{}'", class.name.lexeme);

        let enclosing_class = self.current_class;

        self.declare(&class.name)?;
        self.define(&class.name);

        let superclass = match &class.superclass {
            Some(superclass) if superclass.name.lexeme == class.name.lexeme => {
                return Err(ResolveError::SelfInheritance {
                    token: superclass.name.clone(),
                });
            }
            Some(superclass) => Some(self.var_ref(&superclass.name)),
            None => None,
        };

        let mut methods = Vec::with_capacity(class.methods.len());

        // Static methods close over the frame the class is declared in.
        self.current_class = ClassType::StaticMethod;
        for method in class.methods.iter().filter(|m| m.is_static) {
            let decl = &method.function;
            if decl.name.lexeme == "init" {
                return Err(ResolveError::StaticInitializer {
                    token: decl.name.clone(),
                });
            }
            methods.push(MethodDecl {
                function: self.resolve_function(decl, FunctionType::Function)?,
                is_static: true,
            });
        }

        self.current_class = if superclass.is_some() {
            ClassType::Subclass
        } else {
            ClassType::Class
        };

        if superclass.is_some() {
            self.begin_scope();
            self.define_synthetic("super");
        }

        self.begin_scope();
        self.define_synthetic("this");

        for method in class.methods.iter().filter(|m| !m.is_static) {
            let decl = &method.function;
            let kind = if decl.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            methods.push(MethodDecl {
                function: self.resolve_function(decl, kind)?,
                is_static: false,
            });
        }

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;

        Ok(ClassDecl {
            name: class.name.clone(),
            superclass,
            methods,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &UExpr) -> Resolved<RExpr> {
        let resolved = match expr {
            Expr::Literal(value) => Expr::Literal(value.clone()),

            Expr::Grouping(inner) => Expr::Grouping(Box::new(self.resolve_expr(inner)?)),

            Expr::Unary { operator, right } => Expr::Unary {
                operator: operator.clone(),
                right: Box::new(self.resolve_expr(right)?),
            },

            Expr::Binary {
                left,
                operator,
                right,
            } => Expr::Binary {
                left: Box::new(self.resolve_expr(left)?),
                operator: operator.clone(),
                right: Box::new(self.resolve_expr(right)?),
            },

            Expr::Logical {
                left,
                operator,
                right,
            } => Expr::Logical {
                left: Box::new(self.resolve_expr(left)?),
                operator: operator.clone(),
                right: Box::new(self.resolve_expr(right)?),
            },

            Expr::Variable(var) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&var.name.lexeme) == Some(&false) {
                        return Err(ResolveError::ReadInOwnInitializer {
                            token: var.name.clone(),
                        });
                    }
                }
                Expr::Variable(self.var_ref(&var.name))
            }

            Expr::Assign { target, value } => {
                // Right-hand side first, then bind the target.
                let value = Box::new(self.resolve_expr(value)?);
                Expr::Assign {
                    target: self.var_ref(&target.name),
                    value,
                }
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => Expr::Call {
                callee: Box::new(self.resolve_expr(callee)?),
                paren: paren.clone(),
                arguments: self.spreadable(arguments)?,
            },

            Expr::Lambda(decl) => Expr::Lambda(self.resolve_function(decl, FunctionType::Lambda)?),

            Expr::Get { object, name } => Expr::Get {
                object: Box::new(self.resolve_expr(object)?),
                name: name.clone(),
            },

            Expr::Set {
                object,
                name,
                value,
            } => Expr::Set {
                object: Box::new(self.resolve_expr(object)?),
                name: name.clone(),
                value: Box::new(self.resolve_expr(value)?),
            },

            Expr::This(keyword) => match self.current_class {
                ClassType::None | ClassType::StaticMethod => {
                    return Err(ResolveError::ThisOutsideClass {
                        token: keyword.name.clone(),
                    });
                }
                _ => Expr::This(self.var_ref(&keyword.name)),
            },

            Expr::Super { keyword, method } => match self.current_class {
                ClassType::None | ClassType::StaticMethod => {
                    return Err(ResolveError::SuperOutsideClass {
                        token: keyword.name.clone(),
                    });
                }
                ClassType::Class => {
                    return Err(ResolveError::SuperWithoutSuperclass {
                        token: keyword.name.clone(),
                    });
                }
                ClassType::Subclass => Expr::Super {
                    keyword: self.var_ref(&keyword.name),
                    method: method.clone(),
                },
            },

            Expr::List { bracket, elements } => Expr::List {
                bracket: bracket.clone(),
                elements: self.spreadable(elements)?,
            },

            Expr::Dictionary { bracket, entries } => {
                let mut resolved = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    resolved.push((self.resolve_expr(key)?, self.resolve_expr(value)?));
                }
                Expr::Dictionary {
                    bracket: bracket.clone(),
                    entries: resolved,
                }
            }

            Expr::SubscriptGet {
                object,
                bracket,
                index,
            } => Expr::SubscriptGet {
                object: Box::new(self.resolve_expr(object)?),
                bracket: bracket.clone(),
                index: Box::new(self.resolve_expr(index)?),
            },

            Expr::SubscriptSet {
                object,
                bracket,
                index,
                value,
            } => Expr::SubscriptSet {
                object: Box::new(self.resolve_expr(object)?),
                bracket: bracket.clone(),
                index: Box::new(self.resolve_expr(index)?),
                value: Box::new(self.resolve_expr(value)?),
            },

            Expr::Splat { operator, .. } => {
                return Err(ResolveError::MisplacedSplat {
                    token: operator.clone(),
                });
            }
        };

        Ok(resolved)
    }

    /// Call arguments and list elements: the one place `...expr` may appear.
    fn spreadable(&mut self, exprs: &[UExpr]) -> Resolved<Vec<RExpr>> {
        exprs
            .iter()
            .map(|expr| match expr {
                Expr::Splat { operator, operand } => Ok(Expr::Splat {
                    operator: operator.clone(),
                    operand: Box::new(self.resolve_expr(operand)?),
                }),
                other => self.resolve_expr(other),
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    ///
    /// Loop and switch nesting does not reach into a function body, so the
    /// counters are parked for its duration.
    fn resolve_function(
        &mut self,
        decl: &FunctionDecl<Unresolved>,
        kind: FunctionType,
    ) -> Resolved<Rc<FunctionDecl<Resolution>>> {
        if decl.params.is_none() && kind != FunctionType::Method {
            return Err(ResolveError::MissingParameterList {
                token: decl.name.clone(),
            });
        }

        let enclosing_function = self.current_function;
        let enclosing_loops = self.loop_depth;
        let enclosing_switches = self.switch_depth;

        self.current_function = kind;
        self.loop_depth = 0;
        self.switch_depth = 0;

        self.begin_scope();
        for param in decl.params.iter().flatten() {
            self.declare(&param.name)?;
            self.define(&param.name);
        }
        let body = self.statements(&decl.body)?;
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loops;
        self.switch_depth = enclosing_switches;

        Ok(Rc::new(FunctionDecl {
            name: decl.name.clone(),
            params: decl.params.clone(),
            body,
            is_lambda: decl.is_lambda,
        }))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) -> Resolved<()> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return Err(ResolveError::AlreadyDeclared {
                    token: name.clone(),
                });
            }
            scope.insert(name.lexeme.clone(), false);
        }
        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn define_synthetic(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Locate `name`: a local `depth` scopes out, or a global if no scope
    /// declares it.
    fn var_ref(&self, name: &Token) -> VarRef<Resolution> {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                return VarRef {
                    name: name.clone(),
                    slot: Resolution::Local(depth),
                };
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
        VarRef {
            name: name.clone(),
            slot: Resolution::Global,
        }
    }
}
