//! Centralised error hierarchy for the interpreter.
//!
//! Four disjoint taxonomies live here: lexical and syntactic errors (front
//! end), [`ResolveError`] (static rules, first error wins) and
//! [`RuntimeError`] (evaluation). Each subsystem converts its failure modes
//! into one of these so the crate can use a single [`Result`] alias and
//! interoperate with `anyhow` in the binary.
//!
//! The module **does not** print diagnostics itself.
//!
//! Control transfer (`return`, `break`, `continue`) is *not* an error and never
//! travels through these types; see `interpreter::Flow`.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;
use crate::value::Arity;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'x'` / ` at end`, empty when unknown.
        location: String,
    },

    /// Static‑analysis failure raised by the resolver.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        let location = match token.token_type {
            crate::token::TokenType::EOF => " at end".to_string(),
            _ => format!(" at '{}'", token.lexeme),
        };

        LoxError::Parse {
            message,
            line: token.line,
            location,
        }
    }

    /// Process exit code the CLI uses for this error (sysexits style).
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve(_) => 65,
            LoxError::Runtime(_) => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
        }
    }
}

/// A violated static rule, detected by the resolver before anything runs.
///
/// Every variant carries the offending token.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("[line {}] Error at '{}': Already a variable with this name in this scope.", .token.line, .token.lexeme)]
    AlreadyDeclared { token: Token },

    #[error("[line {}] Error at '{}': Can't read local variable in its own initializer.", .token.line, .token.lexeme)]
    ReadInOwnInitializer { token: Token },

    #[error("[line {}] Error at '{}': Can't return from top-level code.", .token.line, .token.lexeme)]
    ReturnOutsideFunction { token: Token },

    #[error("[line {}] Error at '{}': Can't return a value from an initializer.", .token.line, .token.lexeme)]
    ReturnValueFromInitializer { token: Token },

    #[error("[line {}] Error at '{}': A class can't declare a static 'init'.", .token.line, .token.lexeme)]
    StaticInitializer { token: Token },

    #[error("[line {}] Error at '{}': Can't use 'this' outside of a method.", .token.line, .token.lexeme)]
    ThisOutsideClass { token: Token },

    #[error("[line {}] Error at '{}': Can't use 'super' outside of a method.", .token.line, .token.lexeme)]
    SuperOutsideClass { token: Token },

    #[error("[line {}] Error at '{}': Can't use 'super' in a class with no superclass.", .token.line, .token.lexeme)]
    SuperWithoutSuperclass { token: Token },

    #[error("[line {}] Error at '{}': A class can't inherit from itself.", .token.line, .token.lexeme)]
    SelfInheritance { token: Token },

    #[error("[line {}] Error at '{}': Can't use 'break' outside of a loop or switch.", .token.line, .token.lexeme)]
    BreakOutsideLoop { token: Token },

    #[error("[line {}] Error at '{}': Can't use 'continue' outside of a loop.", .token.line, .token.lexeme)]
    ContinueOutsideLoop { token: Token },

    #[error("[line {}] Error at '{}': Expect a parameter list; only methods can be getters.", .token.line, .token.lexeme)]
    MissingParameterList { token: Token },

    #[error("[line {}] Error at '{}': A spread is only allowed in call arguments and list elements.", .token.line, .token.lexeme)]
    MisplacedSplat { token: Token },

    #[error("[line {}] Error at '{}': Duplicate enum case.", .token.line, .token.lexeme)]
    DuplicateEnumCase { token: Token },

    #[error("[line {}] Error at '{}': A switch needs at least one case or a default.", .token.line, .token.lexeme)]
    EmptySwitch { token: Token },

    #[error("[line {}] Error at '{}': A case must contain at least one statement.", .token.line, .token.lexeme)]
    EmptyCase { token: Token },
}

impl ResolveError {
    /// The token the rule was violated at.
    pub fn token(&self) -> &Token {
        match self {
            ResolveError::AlreadyDeclared { token }
            | ResolveError::ReadInOwnInitializer { token }
            | ResolveError::ReturnOutsideFunction { token }
            | ResolveError::ReturnValueFromInitializer { token }
            | ResolveError::StaticInitializer { token }
            | ResolveError::ThisOutsideClass { token }
            | ResolveError::SuperOutsideClass { token }
            | ResolveError::SuperWithoutSuperclass { token }
            | ResolveError::SelfInheritance { token }
            | ResolveError::BreakOutsideLoop { token }
            | ResolveError::ContinueOutsideLoop { token }
            | ResolveError::MissingParameterList { token }
            | ResolveError::MisplacedSplat { token }
            | ResolveError::DuplicateEnumCase { token }
            | ResolveError::EmptySwitch { token }
            | ResolveError::EmptyCase { token } => token,
        }
    }
}

/// A failure while evaluating a resolved program.
///
/// Recoverable at statement granularity: the REPL reports it and keeps every
/// global defined so far.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{message}\n[line {}]", .token.line)]
    TypeMismatch { token: Token, message: String },

    #[error("Undefined variable '{}'.\n[line {}]", .token.lexeme, .token.line)]
    UndefinedVariable { token: Token },

    #[error("Undefined property '{}'.\n[line {}]", .token.lexeme, .token.line)]
    UndefinedProperty { token: Token },

    #[error("Expected {expected} arguments but got {got}.\n[line {}]", .token.line)]
    Arity {
        token: Token,
        expected: Arity,
        got: usize,
    },

    #[error("Can only call functions and classes.\n[line {}]", .token.line)]
    NotCallable { token: Token },

    #[error("{message}\n[line {}]", .token.line)]
    BadIndex { token: Token, message: String },

    #[error("{message}\n[line {}]", .token.line)]
    Arithmetic { token: Token, message: String },

    #[error("{message}\n[line {}]", .token.line)]
    Native { token: Token, message: String },

    #[error("Loop exceeded the limit of {limit} iterations.\n[line {}]", .token.line)]
    IterationLimit { token: Token, limit: u64 },

    #[error("Stack overflow.\n[line {}]", .token.line)]
    StackOverflow { token: Token },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RuntimeError {
    pub fn type_mismatch<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::TypeMismatch {
            token: token.clone(),
            message: msg.into(),
        }
    }

    pub fn bad_index<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::BadIndex {
            token: token.clone(),
            message: msg.into(),
        }
    }

    pub fn arithmetic<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::Arithmetic {
            token: token.clone(),
            message: msg.into(),
        }
    }

    /// Token the error is reported at, when one exists.
    pub fn token(&self) -> Option<&Token> {
        match self {
            RuntimeError::TypeMismatch { token, .. }
            | RuntimeError::UndefinedVariable { token }
            | RuntimeError::UndefinedProperty { token }
            | RuntimeError::Arity { token, .. }
            | RuntimeError::NotCallable { token }
            | RuntimeError::BadIndex { token, .. }
            | RuntimeError::Arithmetic { token, .. }
            | RuntimeError::Native { token, .. }
            | RuntimeError::IterationLimit { token, .. }
            | RuntimeError::StackOverflow { token } => Some(token),
            RuntimeError::Io(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
