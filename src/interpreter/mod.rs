pub mod lexer;
pub mod value;
pub mod ast;
pub mod parser;
pub mod function;
pub mod memory;
pub mod environment;
pub mod operators;
pub mod evaluator;
pub mod error;
#[allow(clippy::module_inception)]
pub mod interpreter;
