//! microc - run a microc script.
//!
//! Wires the lexer, parser, and interpreter together behind a stdout
//! sink and turns a source file (or stdin) into a process exit code.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use microc_interp::Interpreter;
use microc_lex::tokenize;
use microc_par::parse;
use microc_util::{Handler, LoggingRadio, StdoutSink};

/// Lexer, parser, and tree-walking interpreter for the microc scripting language.
#[derive(ClapParser, Debug)]
#[command(name = "microc")]
#[command(author = "microc contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a microc script", long_about = None)]
struct Cli {
    /// Script path, or `-` to read from stdin
    path: PathBuf,

    /// Enable trace-level logging (shorthand for RUST_LOG=trace)
    #[arg(long)]
    trace: bool,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,

    /// Run as if embedded on a tile, logging send_bool calls instead of erroring
    #[arg(long)]
    embedded: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let source = match read_source(&cli.path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    let handler = Handler::new(Box::new(StdoutSink));

    let tokens = tokenize(&source);
    tracing::debug!(count = tokens.len(), "lexed tokens");

    let block = match parse(&tokens, &handler) {
        Ok(block) => block,
        Err(()) => return report(&handler),
    };

    let mut radio = cli.embedded.then(LoggingRadio::default);
    let mut interpreter = match radio.as_mut() {
        Some(radio) => Interpreter::with_radio(&handler, radio),
        None => Interpreter::new(&handler),
    };

    match interpreter.run(&block) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => report(&handler),
    }
}

/// Prints every collected diagnostic to stderr and returns the halt exit code.
fn report(handler: &Handler) -> ExitCode {
    for diagnostic in handler.diagnostics() {
        eprintln!("{diagnostic}");
    }
    ExitCode::from(1)
}

fn read_source(path: &std::path::Path) -> std::io::Result<String> {
    if path == std::path::Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.trace {
        EnvFilter::new("trace")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
