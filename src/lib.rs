//! Rox: a tree‑walking interpreter for Lox.
//!
//! The pipeline is scan → parse → resolve → interpret.  Any lexical, syntax
//! or resolve error stops the run before a single statement executes; a
//! runtime error stops it at the failing statement.

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

use std::io::{self, Write};

use log::info;
use thiserror::Error;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// How a run failed.
#[derive(Debug, Error)]
pub enum RunError {
    /// Lexical, syntax or resolve errors; nothing was executed.
    #[error("{}", join_errors(.0))]
    Static(Vec<LoxError>),

    /// The first runtime error; output before it has been written.
    #[error(transparent)]
    Runtime(LoxError),
}

impl RunError {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }

    /// Every individual error, in report order.
    pub fn errors(&self) -> &[LoxError] {
        match self {
            RunError::Static(errors) => errors,
            RunError::Runtime(error) => std::slice::from_ref(error),
        }
    }
}

fn join_errors(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scans the whole source.  The token list always ends with EOF, even when
/// lexical errors were found.
pub fn scan_tokens(source: &str) -> (Vec<Token<'_>>, Vec<LoxError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    (tokens, errors)
}

/// Runs a program, writing `print` output to `out`.
pub fn run(source: &str, out: &mut dyn Write) -> Result<(), RunError> {
    let (tokens, mut errors) = scan_tokens(source);

    // Syntax errors are still worth reporting next to lexical ones.
    let statements = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(parse_errors) => {
            errors.extend(parse_errors);
            return Err(RunError::Static(errors));
        }
    };

    if !errors.is_empty() {
        return Err(RunError::Static(errors));
    }

    let locals = Resolver::new()
        .resolve(&statements)
        .map_err(RunError::Static)?;

    info!("Program is well formed, {} statement(s)", statements.len());

    let mut interpreter = Interpreter::with_output(Box::new(out));
    interpreter
        .interpret(&statements, locals)
        .map_err(RunError::Runtime)
}

/// Evaluates a single expression and returns its printed form.
pub fn evaluate(source: &str) -> Result<String, RunError> {
    let (tokens, errors) = scan_tokens(source);
    if !errors.is_empty() {
        return Err(RunError::Static(errors));
    }

    let expr = Parser::new(&tokens)
        .parse_expression()
        .map_err(RunError::Static)?;

    let mut interpreter = Interpreter::with_output(Box::new(io::sink()));
    let value = interpreter.evaluate(&expr).map_err(RunError::Runtime)?;

    Ok(value.to_string())
}
