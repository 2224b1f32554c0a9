use thiserror::Error;
use crate::interpreter::lexer::LexerError;
use crate::interpreter::memory::MemoryError;
use crate::interpreter::parser::ParseError;
use crate::interpreter::value::ValueType;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Type mismatch at line {line}: expected {expected}, found {found}")]
    TypeMismatch { expected: ValueType, found: ValueType, line: usize },
    #[error("Mismatched operand types for '{operator}' at line {line}: {left} and {right}")]
    OperandMismatch { operator: String, left: ValueType, right: ValueType, line: usize },
    #[error("Unsupported operator '{operator}' for {operand} at line {line}")]
    UnsupportedOperator { operator: String, operand: ValueType, line: usize },
    #[error("Division by zero at line {line}")]
    DivisionByZero { line: usize },
    #[error("Integer overflow in '{operator}' at line {line}")]
    Overflow { operator: String, line: usize },
    #[error("No function matches {signature} (line {line})")]
    UnresolvedFunction { signature: String, line: usize },
    #[error("Function {signature} is declared more than once (line {line})")]
    RedeclaredFunction { signature: String, line: usize },
    #[error("Missing entry point: expected 'func main\\int()'")]
    MissingEntryPoint,
    #[error("Invalid entry point: 'main()' must return int, but returns {found}")]
    InvalidEntryPoint { found: ValueType },
    #[error("Expected a return in function '{function}'")]
    MissingReturn { function: String },
    #[error("Function {signature} must return {expected}, but returned {found} (line {line})")]
    ReturnTypeMismatch { signature: String, expected: ValueType, found: ValueType, line: usize },
    #[error("Statement used as an expression at line {line}")]
    NotAnExpression { line: usize },
    #[error("'return' outside of a function at line {line}")]
    ReturnOutsideFunction { line: usize },
    #[error("Maximum call depth of {limit} exceeded at line {line}")]
    CallDepthExceeded { limit: usize, line: usize },
    #[error("Variable error at line {line}: {source}")]
    Variable { source: MemoryError, line: usize },
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Any failure of a run, sorted by the phase that raised it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Lexical error: {0}")]
    Lexical(#[from] LexerError),
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),
    #[error("Semantic error: {0}")]
    Semantic(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, Error>;
