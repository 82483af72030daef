//! Drives source text through every phase against one long-lived interpreter.
//!
//! Globals persist between calls, so a session is both the batch runner
//! (`run`) and the backing store of the REPL (`run_repl_input`).

use log::{debug, info};

use crate::ast::{ResolvedTree, Stmt};
use crate::config::Config;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::value::Value;

/// Convenience classes for the built-in kinds, written in the language itself.
pub const PRELUDE: &str = include_str!("prelude.lox");

pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self::with_interpreter(Interpreter::new(config))
    }

    /// Wrap an interpreter that has already been set up (redirected output,
    /// scripted input).
    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Session { interpreter }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Run the prelude unless the configuration turns it off.
    pub fn load_prelude(&mut self) -> Result<()> {
        if !self.interpreter.config().prelude {
            info!("Prelude disabled by configuration");
            return Ok(());
        }

        info!("Loading prelude");
        self.interpreter.set_loading_prelude(true);
        let result = self.run(PRELUDE);
        self.interpreter.set_loading_prelude(false);
        result
    }

    /// Scan, parse and resolve `source` into a program ready to run.
    fn compile(source: &str, repl: bool) -> Result<ResolvedTree> {
        let tokens = Scanner::new(source.as_bytes()).scan_all()?;
        let parser = Parser::new(tokens);
        let tree = if repl {
            parser.parse_repl()?
        } else {
            parser.parse()?
        };
        Resolver::new().resolve(&tree)
    }

    /// Run a whole program.
    pub fn run(&mut self, source: &str) -> Result<()> {
        let program = Self::compile(source, false)?;
        self.interpreter.interpret(&program)?;

        info!("Program executed successfully");
        Ok(())
    }

    /// Run raw bytes, rejecting anything that is not UTF-8.
    pub fn run_bytes(&mut self, source: &[u8]) -> Result<()> {
        let source = std::str::from_utf8(source)?;
        self.run(source)
    }

    /// Run one REPL entry. A trailing expression statement is evaluated and
    /// its value returned instead of being discarded.
    pub fn run_repl_input(&mut self, source: &str) -> Result<Option<Value>> {
        let program = Self::compile(source, true)?;

        match program.split_last() {
            Some((Stmt::Expression(expr), leading)) => {
                self.interpreter.interpret(leading)?;
                let value = self.interpreter.evaluate(expr)?;
                debug!("REPL expression evaluated to {}", value);
                Ok(Some(value))
            }
            _ => {
                self.interpreter.interpret(&program)?;
                Ok(None)
            }
        }
    }
}
