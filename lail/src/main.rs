//! Lail CLI

use clap::{Parser, Subcommand};
use lail::error::report_error;
use lail::{CompileError, Config, Session};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "lail", version, about = "Lail - a small dynamically typed scripting language")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Allow `if`/`else`/`fn` bodies of a single statement without braces
    #[arg(long, global = true)]
    bare_blocks: bool,

    /// Treat unbound identifiers as errors
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run source files in order, each in a fresh environment
    Run {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Start an interactive session
    Repl,
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Parse and print canonical source (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
        /// Dump the AST as JSON instead
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run { files } => run_files(&files, &config),
        Command::Repl => start_repl(config),
        Command::Tokens { file } => tokenize_file(&file),
        Command::Parse { file, json } => parse_file(&file, &config, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> lail::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let bare_blocks = config.bare_blocks || cli.bare_blocks;
    let strict = config.strict_identifiers || cli.strict;
    Ok(config.bare_blocks(bare_blocks).strict_identifiers(strict))
}

/// Imports inside `path` resolve against its directory
fn config_for(path: &Path, config: &Config) -> Config {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    config.clone().base_dir(dir)
}

fn read_source(path: &Path) -> Result<String, CompileError> {
    std::fs::read_to_string(path)
        .map_err(|e| CompileError::io_error(format!("{}: {e}", path.display())))
}

fn run_files(files: &[PathBuf], config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    let mut failed = 0;
    for path in files {
        if !run_file(path, config, &mut stdout)? {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} file(s) failed", files.len()).into());
    }
    Ok(())
}

/// Run one file in a fresh session and print its result; `false` if it failed
fn run_file(
    path: &Path,
    config: &Config,
    result_out: &mut dyn Write,
) -> Result<bool, Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let filename = path.display().to_string();
    let origin = std::fs::canonicalize(path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| filename.clone());

    let mut session = Session::new(config_for(path, config)).with_origin(origin);
    match session.run(&source) {
        Ok(value) => {
            writeln!(result_out, "{value}")?;
            Ok(true)
        }
        Err(e) => {
            report_error(&filename, &source, &e)?;
            Ok(false)
        }
    }
}

fn start_repl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut repl = lail::repl::Repl::new(config)?;
    repl.run()?;
    Ok(())
}

fn parse_file(path: &Path, config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let filename = path.display().to_string();

    let session = Session::new(config_for(path, config));
    let program = match session.parse(&source) {
        Ok(program) => program,
        Err(e) => {
            report_error(&filename, &source, &e)?;
            return Err(format!("{filename} has parse errors").into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&program)?);
    } else {
        println!("{program}");
    }
    Ok(())
}

fn tokenize_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(path)?;

    for tok in lail::lexer::tokenize(&source) {
        println!(
            "{:?} {:?} @ {}:{} ({}..{})",
            tok.kind, tok.literal, tok.line, tok.column, tok.span.start, tok.span.end
        );
    }

    Ok(())
}
