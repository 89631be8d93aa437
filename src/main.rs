use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::{scan_tokens, RunError};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
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

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive session, one program per line
    Repl,
}

/// Maps the file and copies it out as UTF-8 text.
fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length files cannot be mapped.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the mapping is read once and dropped before returning; the file
    // is not expected to be truncated underneath us.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let source = std::str::from_utf8(&mmap)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", len, filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
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

fn report(error: &RunError) {
    for e in error.errors() {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = read_source(filename)?;
    let (tokens, errors) = scan_tokens(&source);

    // Errors go to stderr first; tokens that did scan are still printed.
    for e in &errors {
        eprintln!("{}", e);
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?;
        println!("{}", rendered);
    } else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for token in &tokens {
            writeln!(out, "{}", token)?;
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code 65");
        process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source = read_source(filename)?;
    let (tokens, errors) = scan_tokens(&source);

    if !errors.is_empty() {
        report(&RunError::Static(errors));
        process::exit(65);
    }

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) => {
            let printed = AstPrinter::print(&expr);
            debug!("AST: {}", printed);
            println!("{}", printed);
            Ok(())
        }
        Err(errors) => {
            report(&RunError::Static(errors));
            process::exit(65);
        }
    }
}

fn evaluate(filename: &Path) -> Result<()> {
    let source = read_source(filename)?;

    match rox::evaluate(&source) {
        Ok(value) => {
            println!("{}", value);
            Ok(())
        }
        Err(e) => {
            report(&e);
            process::exit(e.exit_code());
        }
    }
}

fn run(filename: &Path) -> Result<()> {
    let source = read_source(filename)?;
    info!("Provided input:\n {}", source);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = rox::run(&source, &mut out) {
        out.flush()?;
        report(&e);
        process::exit(e.exit_code());
    }

    info!("Program executed successfully");
    Ok(())
}

fn repl() -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if line.trim().is_empty() {
            break;
        }

        // Each line is its own program; nothing carries over.
        let mut out = io::stdout();
        if let Err(e) = rox::run(&line, &mut out) {
            report(&e);
        }
    }

    info!("REPL session ended");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),
        Commands::Parse { filename } => parse(&filename),
        Commands::Evaluate { filename } => evaluate(&filename),
        Commands::Run { filename } => run(&filename),
        Commands::Repl => repl(),
    }
}
