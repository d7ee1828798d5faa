//! tagwire-compiler
//!
//! This crate implements:
//!  1) A lexer + recursive-descent parser for `.tw` schema files,
//!  2) A validator (duplicate names, field-number rules, modifier rules,
//!     type resolution) that reports every problem it can find in one pass,
//!  3) A C++ emitter producing a header and a source file per schema, with
//!     `serialize`/`deserialize` implementing the tag-length-value wire
//!     format,
//!  4) `encode_binary_schema` / `decode_binary_schema` for a compact binary
//!     dump of a schema, and
//!  5) Error and diagnostic types (`CompileError`, `Diagnostic`).

pub mod ast;
pub mod compiler;
pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod utils;
pub mod validator;

pub use compiler::check_schema;
pub use compiler::compile_schema;
pub use compiler::decode_binary_schema;
pub use compiler::encode_binary_schema;
pub use compiler::Artifacts;
pub use error::CompileError;
