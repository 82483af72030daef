use std::fmt::Write;

use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};

/// Renders trees in parenthesised prefix form, one statement per line.
///
/// Works on resolved and unresolved trees alike; slots are not shown.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print<S>(expr: &Expr<S>) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),
                LiteralValue::False => "false".into(),
                LiteralValue::Nil => "nil".into(),
                LiteralValue::Str(s) => s.to_string(),
                LiteralValue::Int(n) => itoa::Buffer::new().format(*n).to_string(),
                LiteralValue::Double(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable(var) | Expr::This(var) => var.name.lexeme.clone(),

            Expr::Assign { target, value } => {
                format!("(= {} {})", target.name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => Self::list("call", Some(Self::print(callee)), arguments),

            Expr::Lambda(decl) => Self::function("lambda", decl),

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::List { elements, .. } => Self::list("list", None, elements),

            Expr::Dictionary { entries, .. } => {
                let mut s = String::from("(dict");
                for (key, value) in entries {
                    let _ = write!(s, " ({} {})", Self::print(key), Self::print(value));
                }
                s.push(')');
                s
            }

            Expr::SubscriptGet { object, index, .. } => {
                format!("([] {} {})", Self::print(object), Self::print(index))
            }

            Expr::SubscriptSet {
                object,
                index,
                value,
                ..
            } => format!(
                "([]= {} {} {})",
                Self::print(object),
                Self::print(index),
                Self::print(value)
            ),

            Expr::Splat { operand, .. } => format!("(... {})", Self::print(operand)),
        }
    }

    pub fn print_stmt<S>(stmt: &Stmt<S>) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.lexeme, Self::print(expr)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::block("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While {
                condition, body, ..
            } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
                ..
            } => format!(
                "(for {} {} {} {})",
                initializer
                    .as_ref()
                    .map_or_else(|| "nil".to_string(), |s| Self::print_stmt(s)),
                condition
                    .as_ref()
                    .map_or_else(|| "nil".to_string(), Self::print),
                increment
                    .as_ref()
                    .map_or_else(|| "nil".to_string(), Self::print),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => Self::function("fun", decl),

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", Self::print(expr)),
                None => "(return)".into(),
            },

            Stmt::Class(class) => {
                let mut s = format!("(class {}", class.name.lexeme);
                if let Some(superclass) = &class.superclass {
                    let _ = write!(s, " < {}", superclass.name.lexeme);
                }
                for method in &class.methods {
                    s.push(' ');
                    let tag = if method.is_static { "static" } else { "method" };
                    s.push_str(&Self::function(tag, &method.function));
                }
                s.push(')');
                s
            }

            Stmt::Enum(decl) => {
                let mut s = format!("(enum {}", decl.name.lexeme);
                for case in &decl.cases {
                    s.push(' ');
                    s.push_str(&case.lexeme);
                }
                s.push(')');
                s
            }

            Stmt::Break(_) => "(break)".into(),

            Stmt::Continue(_) => "(continue)".into(),

            Stmt::Switch {
                subject,
                cases,
                default,
                ..
            } => {
                let mut s = format!("(switch {}", Self::print(subject));
                for case in cases {
                    let values: Vec<String> = case.values.iter().map(Self::print).collect();
                    let _ = write!(s, " {}", Self::block(&format!("case {}", values.join(" ")), &case.body));
                }
                if let Some(default) = default {
                    let _ = write!(s, " {}", Self::block("default", &default.body));
                }
                s.push(')');
                s
            }
        }
    }

    /// A whole program, one statement per line.
    pub fn print_program<S>(statements: &[Stmt<S>]) -> String {
        statements
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn list<S>(tag: &str, head: Option<String>, items: &[Expr<S>]) -> String {
        let mut s = format!("({}", tag);
        for part in head.into_iter().chain(items.iter().map(Self::print)) {
            s.push(' ');
            s.push_str(&part);
        }
        s.push(')');
        s
    }

    fn block<S>(tag: &str, statements: &[Stmt<S>]) -> String {
        let mut s = format!("({}", tag);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    fn function<S>(tag: &str, decl: &FunctionDecl<S>) -> String {
        let params = match &decl.params {
            Some(params) => {
                let names: Vec<String> = params
                    .iter()
                    .map(|p| {
                        if p.variadic {
                            format!("...{}", p.name.lexeme)
                        } else {
                            p.name.lexeme.clone()
                        }
                    })
                    .collect();
                format!("({})", names.join(" "))
            }
            None => "getter".to_string(),
        };

        let name = if decl.is_lambda {
            String::new()
        } else {
            format!(" {}", decl.name.lexeme)
        };

        Self::block(&format!("{}{} {}", tag, name, params), &decl.body)
    }
}
