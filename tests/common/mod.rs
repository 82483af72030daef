//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use rox::ast::ResolvedTree;
use rox::config::Config;
use rox::error::{LoxError, Result};
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::Scanner;
use rox::session::Session;

/// A writer whose contents stay readable after it is boxed and handed away.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session printing into a buffer and reading `input`, prelude loaded
/// unless the configuration says otherwise.
pub fn session_with(config: Config, input: &str) -> (Session, SharedBuffer) {
    let output = SharedBuffer::default();
    let interpreter = Interpreter::new(config)
        .with_output(Box::new(output.clone()))
        .with_input(Box::new(Cursor::new(input.as_bytes().to_vec())));

    let mut session = Session::with_interpreter(interpreter);
    session.load_prelude().expect("prelude loads");
    (session, output)
}

pub fn test_config() -> Config {
    Config {
        random_seed: Some(7),
        ..Config::default()
    }
}

/// Run `source` and return everything it printed, or the first error.
pub fn run(source: &str) -> Result<String> {
    run_with(test_config(), source)
}

pub fn run_with(config: Config, source: &str) -> Result<String> {
    let (mut session, output) = session_with(config, "");
    session.run(source)?;
    Ok(output.contents())
}

/// Run `source`, which must fail, and return the output printed before the
/// failure together with the error.
pub fn run_err(source: &str) -> (String, LoxError) {
    let (mut session, output) = session_with(test_config(), "");
    match session.run(source) {
        Ok(()) => panic!("expected an error, got output:\n{}", output.contents()),
        Err(err) => (output.contents(), err),
    }
}

/// Output lines, for terser assertions.
pub fn lines(source: &str) -> Vec<String> {
    match run(source) {
        Ok(output) => output.lines().map(str::to_string).collect(),
        Err(err) => panic!("program failed: {}", err),
    }
}

pub fn resolve(source: &str) -> Result<ResolvedTree> {
    let tokens = Scanner::new(source.as_bytes()).scan_all()?;
    let tree = Parser::new(tokens).parse()?;
    Resolver::new().resolve(&tree)
}
