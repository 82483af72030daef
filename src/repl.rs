//! Interactive prompt on top of a [`Session`].

use std::path::PathBuf;

use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};

use crate::session::Session;
use crate::value::Value;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".rox_history";

pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// A prompt over `session`, which should already have its prelude loaded.
    pub fn new(session: Session) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session,
            history_path,
        };

        if let Some(path) = &repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    pub fn run(&mut self) -> RlResult<()> {
        info!("REPL started");
        println!("rox {}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_input(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(path) = &self.history_path {
            let _ = self.editor.save_history(path);
        }

        info!("REPL finished");
        Ok(())
    }

    /// Returns `true` when the REPL should exit.
    fn handle_command(&mut self, command: &str) -> bool {
        match command {
            ":quit" | ":q" | ":exit" => true,
            ":help" | ":h" | ":?" => {
                println!("Commands:");
                println!("  :help, :h, :?   Show this help");
                println!("  :globals        List global names");
                println!("  :quit, :q       Exit the REPL");
                println!();
                println!("Statements run as in a script; globals persist between lines.");
                println!("A trailing expression may omit its ';' and its value is printed.");
                false
            }
            ":globals" => {
                let names: Vec<String> = self
                    .session
                    .interpreter()
                    .global_names()
                    .into_iter()
                    .filter(|name| !name.starts_with('_'))
                    .collect();
                println!("{}", names.join(" "));
                false
            }
            _ => {
                println!("Unknown command: {command}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn eval_input(&mut self, input: &str) {
        match self.session.run_repl_input(input) {
            Ok(Some(Value::Nil)) | Ok(None) => {}
            Ok(Some(value)) => println!("{value}"),
            Err(err) => {
                debug!("REPL input failed: {}", err);
                eprintln!("{err}");
            }
        }
    }
}
