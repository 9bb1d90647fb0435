use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Write debug logs to FILE (app.log when no file is given)
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "app.log"
    )]
    log: Option<PathBuf>,
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
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: &Path) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        // A logger is still installed so `log` macros have a sink.
        Builder::new().filter_level(log::LevelFilter::Off).init();
        return Ok(());
    };

    let log_file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(buf, "[{}:{}] - {}", module, record.line().unwrap_or(0), record.args())
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug) // overridden by RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

/// Prints every token and every lexical error. Returns whether the whole
/// source scanned cleanly.
fn tokenize(source: &str, json: bool) -> Result<bool> {
    let mut tokens = Vec::new();
    let mut clean = true;

    for result in Scanner::new(source) {
        match result {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }
            Err(e) => {
                clean = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    }

    Ok(clean)
}

fn parse(source: &str) -> std::result::Result<(), LoxError> {
    let tokens = scan_tokens(source)?;
    let expr = Parser::new(&tokens).parse_expression()?;

    let ast = AstPrinter::print(&expr);
    debug!("AST: {}", ast);
    println!("{}", ast);

    Ok(())
}

fn evaluate(source: &str) -> std::result::Result<(), LoxError> {
    let tokens = scan_tokens(source)?;
    let expr = Parser::new(&tokens).parse_expression()?;

    let value = Interpreter::new().evaluate_expression(&expr)?;
    debug!("Evaluated to: {}", value);
    println!("{}", value);

    Ok(())
}

fn run(source: &str) -> std::result::Result<(), LoxError> {
    let tokens = scan_tokens(source)?;
    let statements = Parser::new(&tokens).parse()?;
    info!("Parsed {} statements", statements.len());

    let mut interpreter = Interpreter::new();
    interpreter.run(&statements)
}

fn exit_with(err: LoxError) -> ! {
    debug!("Exiting after error: {:?}", err);
    eprintln!("{}", err);
    process::exit(err.exit_code());
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    init_logger(args.log.as_deref())?;

    info!("CLI arguments: {:?}", args);

    let filename = match &args.commands {
        Commands::Tokenize { filename, .. }
        | Commands::Parse { filename }
        | Commands::Evaluate { filename }
        | Commands::Run { filename } => filename,
    };

    let buf = read_file(filename)?;
    let source = std::str::from_utf8(&buf).unwrap_or_else(|err| exit_with(err.into()));

    let outcome = match args.commands {
        Commands::Tokenize { json, .. } => {
            info!("Running Tokenize subcommand");
            if !tokenize(source, json)? {
                debug!("Tokenization failed, exiting with code 65");
                process::exit(65);
            }
            Ok(())
        }

        Commands::Parse { .. } => {
            info!("Running Parse subcommand");
            parse(source)
        }

        Commands::Evaluate { .. } => {
            info!("Running Evaluate subcommand");
            evaluate(source)
        }

        Commands::Run { .. } => {
            info!("Running Run subcommand");
            run(source)
        }
    };

    if let Err(err) = outcome {
        exit_with(err);
    }

    info!("Completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn read_file_returns_contents_and_handles_empty_files() {
        let dir = std::env::temp_dir();
        let program = dir.join(format!("rox-read-file-{}.lox", process::id()));
        let empty = dir.join(format!("rox-read-file-empty-{}.lox", process::id()));

        fs::write(&program, "print \"hi\";\n").unwrap();
        fs::write(&empty, "").unwrap();

        assert_eq!(read_file(&program).unwrap(), b"print \"hi\";\n");
        assert!(read_file(&empty).unwrap().is_empty());
        assert!(read_file(&dir.join("rox-no-such-file.lox")).is_err());

        fs::remove_file(&program).unwrap();
        fs::remove_file(&empty).unwrap();
    }
}
