//! A tree-walking interpreter for the Lox language.
//!
//! Source text flows through [`scanner`] → [`parser`] → [`resolver`] →
//! [`interpreter`]. [`run_source`] wires the whole pipeline together.

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;

/// Scans, parses, resolves and runs `source`, printing to `out`.
pub fn run_source(source: &str, out: &mut dyn Write) -> Result<()> {
    let tokens = scanner::scan_tokens(source)?;
    let statements = Parser::new(&tokens).parse()?;

    let mut interpreter = Interpreter::with_output(Box::new(out));
    interpreter.run(&statements)
}
