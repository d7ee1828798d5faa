use thiserror::Error;

use crate::diagnostics::Diagnostic;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    Parse {
        msg: String,
        line: usize,
        column: usize,
    },

    #[error("schema has {} validation error(s)", .0.len())]
    Invalid(Vec<Diagnostic>),

    #[error("Schema encode error: {0}")]
    Encode(String),

    #[error("Schema decode error: {0}")]
    Decode(String),
}
