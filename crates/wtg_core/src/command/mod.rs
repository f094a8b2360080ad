//! Configuration compilation.

pub mod compiler;

pub use compiler::{compile, validate_settings, CompileError, CompileRequest};
