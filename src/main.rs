//! CLI tool to check, format and tokenize jindo source files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser as _, Subcommand};
use jindo_syntax::{File, Parser, PosBase, SyntaxError};
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser)]
#[command(name = "jindo", version, about = "Check, format and tokenize jindo source files")]
struct Cli {
    /// Trace grammar rule entry and exit while parsing
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report syntax errors
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print files in canonical form
    Fmt {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the tokens of each file
    Tokens {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("jindo_syntax=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Parses `path`, printing every diagnostic. Returns the tree only if the
/// file is free of errors.
fn parse_file(path: &Path, trace: bool) -> Option<File> {
    let input = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return None;
        }
    };

    let mut errors = 0usize;
    let result = Parser::new(
        PosBase::file(path.display().to_string()),
        input,
        Some(Box::new(|err: &SyntaxError| {
            eprintln!("{err}");
            errors += 1;
        })),
        trace,
    )
    .parse_file();

    match result {
        Ok(file) if errors == 0 => Some(file),
        Ok(_) => {
            eprintln!("{}: {errors} error(s)", path.display());
            None
        }
        Err(e) => {
            eprintln!("{e}");
            None
        }
    }
}

fn tokens(path: &Path) -> bool {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return false;
        }
    };
    let (lexemes, errors) = jindo_syntax::tokenize(&content);
    for l in &lexemes {
        println!("{}:{}:{}\t{:?}\t{}", path.display(), l.line, l.col, l.token, l.text);
    }
    for e in &errors {
        eprintln!("{}: {e}", path.display());
    }
    errors.is_empty()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.trace);

    let mut had_error = false;
    match &cli.command {
        Command::Check { files } => {
            for path in files {
                match parse_file(path, cli.trace) {
                    Some(file) => eprintln!(
                        "{}: ok ({} declaration(s))",
                        path.display(),
                        file.decls.len()
                    ),
                    None => had_error = true,
                }
            }
        }
        Command::Fmt { files } => {
            for path in files {
                match parse_file(path, cli.trace) {
                    Some(file) => print!("{}", jindo_syntax::format(&file)),
                    None => had_error = true,
                }
            }
        }
        Command::Tokens { files } => {
            for path in files {
                had_error |= !tokens(path);
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
