//! Centralised error hierarchy for the interpreter.
//!
//! Every stage (scanner, parser, resolver, evaluator, CLI) converts its
//! failures into [`LoxError`]. Static failures carry a message and a line;
//! runtime failures are split into one [`RuntimeError`] variant per
//! condition so a host can tell them apart without parsing messages.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static resolution failure, reported before any statement runs.
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Source text that is not valid UTF‑8.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Process exit code for this failure (sysexits conventions).
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => 65,
            LoxError::Runtime(_) => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
        }
    }
}

/// A failure raised while evaluating a resolved program.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Operand must be a number.\n[line {line}]")]
    OperandNotNumber { line: usize },

    #[error("Operands must be numbers.\n[line {line}]")]
    OperandsNotNumbers { line: usize },

    #[error("Operands must be two numbers or two strings.\n[line {line}]")]
    OperandsNotAddable { line: usize },

    #[error("Can only call functions and classes.\n[line {line}]")]
    NotCallable { line: usize },

    #[error("Expected {expected} arguments but got {got}.\n[line {line}]")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("Undefined variable '{name}'.\n[line {line}]")]
    UndefinedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.\n[line {line}]")]
    UndefinedProperty { name: String, line: usize },

    #[error("Only instances have properties.\n[line {line}]")]
    PropertyOnNonInstance { line: usize },

    #[error("Only instances have fields.\n[line {line}]")]
    FieldOnNonInstance { line: usize },

    #[error("Superclass must be a class.\n[line {line}]")]
    SuperclassNotClass { line: usize },

    /// The output sink of a `print` statement failed.
    #[error("Failed to write output: {message}\n[line {line}]")]
    Output { message: String, line: usize },
}

impl RuntimeError {
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::OperandNotNumber { line }
            | RuntimeError::OperandsNotNumbers { line }
            | RuntimeError::OperandsNotAddable { line }
            | RuntimeError::NotCallable { line }
            | RuntimeError::ArityMismatch { line, .. }
            | RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::PropertyOnNonInstance { line }
            | RuntimeError::FieldOnNonInstance { line }
            | RuntimeError::SuperclassNotClass { line }
            | RuntimeError::Output { line, .. } => *line,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
