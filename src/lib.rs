use std::fmt;

use crate::builtinops::Arity;

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum LispError {
    ParseError(String),
    FunctionNotFound(String),
    TypeError(String),
    EvalError(String),
    ArityError {
        name: String,
        expected: Arity,
        got: usize,
    },
    IoError(String),
}

impl std::error::Error for LispError {}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LispError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LispError::FunctionNotFound(name) => write!(f, "Function {:?} not found", name),
            LispError::TypeError(msg) => write!(f, "Type error: {}", msg),
            LispError::EvalError(msg) => write!(f, "Evaluation error: {}", msg),
            LispError::ArityError {
                name,
                expected,
                got,
            } => {
                let expected = match expected {
                    Arity::Exact(n) => n.to_string(),
                    Arity::AtLeast(n) => format!("at least {}", n),
                    Arity::Any => "any number of".to_string(),
                };
                write!(
                    f,
                    "Arity error: {} expects {} arguments, got {}",
                    name, expected, got
                )
            }
            LispError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;

pub use ast::{Node, Program, Value};
pub use evaluator::{run, Interpreter, ScopeId};
pub use parser::parse;
