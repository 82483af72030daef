pub mod ast;
pub mod ast_printer;
pub mod config;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod native;
pub mod object;
pub mod parser;
pub mod repl;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod token;
pub mod value;
