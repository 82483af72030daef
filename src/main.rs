use std::fs::File;
use std::io::Write;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::config::Config;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::repl::Repl;
use rox::scanner::Scanner;
use rox::session::Session;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Skip the bundled prelude
    #[arg(long, global = true)]
    no_prelude: bool,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Abort any loop running more than N iterations
    #[arg(long, global = true, value_name = "N")]
    max_loop_iterations: Option<u64>,

    /// Abort when calls nest deeper than N
    #[arg(long, global = true, value_name = "N")]
    max_call_depth: Option<usize>,

    /// Seed for random and randomInt
    #[arg(long, global = true, value_name = "N")]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a program from a file and prints its tree
    Parse { filename: PathBuf },

    /// Runs a program from a file
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

/// Source file contents, memory-mapped.
struct SourceFile {
    map: Mmap,
}

impl Deref for SourceFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.map
    }
}

fn read_file(filename: &Path) -> Result<SourceFile> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    // SAFETY: the mapping is read-only and lives no longer than this run;
    // the file is not expected to change underneath the interpreter.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", map.len(), filename);
    Ok(SourceFile { map })
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// File configuration first, then command-line overrides.
fn build_config(args: &Cli) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).context(format!("Failed to load config {:?}", path))?,
        None => Config::default(),
    };

    if args.no_prelude {
        config.prelude = false;
    }
    if let Some(limit) = args.max_loop_iterations {
        config.max_loop_iterations = Some(limit);
    }
    if let Some(depth) = args.max_call_depth {
        config.max_call_depth = depth;
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Report a language error the way the test harnesses expect and exit.
fn fail(err: LoxError) -> ! {
    debug!("Exiting after error: {}", err);
    eprintln!("{}", err);
    std::process::exit(err.exit_code());
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;

    let mut tokens = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?
        );
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;

    let tree = Scanner::new(&source)
        .scan_all()
        .and_then(|tokens| Parser::new(tokens).parse());

    match tree {
        Ok(tree) => println!("{}", AstPrinter::print_program(&tree)),
        Err(e) => fail(e),
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run(filename: &Path, config: Config) -> Result<()> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;

    let mut session = Session::new(config);
    if let Err(e) = session.load_prelude() {
        fail(e);
    }
    if let Err(e) = session.run_bytes(&source) {
        fail(e);
    }

    info!("Program executed successfully");
    Ok(())
}

fn repl(config: Config) -> Result<()> {
    info!("Running Repl subcommand");

    let mut session = Session::new(config);
    if let Err(e) = session.load_prelude() {
        fail(e);
    }

    Repl::new(session)
        .and_then(|mut repl| repl.run())
        .context("Line editor failed")?;
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let config = build_config(&args)?;

    match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json)?,
        Commands::Parse { filename } => parse(filename)?,
        Commands::Run { filename } => run(filename, config)?,
        Commands::Repl => repl(config)?,
    }

    Ok(())
}
