use std::io::Write;
use log::debug;
use crate::interpreter::ast::Node;
use crate::interpreter::error::Result;
use crate::interpreter::evaluator::Evaluator;
use crate::interpreter::function::FunctionTable;
use crate::interpreter::lexer::{Lexer, Token};
use crate::interpreter::memory::GlobalValueStorage;
use crate::interpreter::parser::Parser;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Returned by [`Interpreter::interpret`] when no function was parsed at all.
pub const NO_FUNCTIONS: i64 = -1;

/// Owns everything one program needs: the token buffer, the parsed program and the heap.
///
/// Feed it lines with [`Interpreter::tokenize`], then call [`Interpreter::parse`] and [`Interpreter::interpret`].
pub struct Interpreter {
    tokens: Vec<Token>,
    parsed: bool,

    functions: FunctionTable,
    statements: Vec<Node>,

    heap: GlobalValueStorage,
    max_call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter::with_max_call_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    pub fn with_max_call_depth(max_call_depth: usize) -> Interpreter {
        Interpreter {
            tokens: Vec::new(),
            parsed: false,
            functions: FunctionTable::default(),
            statements: Vec::new(),
            heap: GlobalValueStorage::new(),
            max_call_depth,
        }
    }

    /// Appends the tokens of `line` to the buffer.
    pub fn tokenize(&mut self, line: &str, line_number: usize) -> Result<()> {
        let tokens = Lexer::tokenize(line, line_number)?;
        self.tokens.extend(tokens);
        Ok(())
    }

    /// Parses the token buffer and builds the function table. Does nothing if already parsed.
    ///
    /// The buffer is only consumed once parsing succeeds, so a failed parse fails again on every retry.
    pub fn parse(&mut self) -> Result<()> {
        if self.parsed {
            return Ok(());
        }

        debug!("Parsing {} tokens", self.tokens.len());

        let program = Parser::new(self.tokens.clone()).parse()?;
        self.functions = FunctionTable::from_declarations(program.functions)?;
        self.statements = program.statements;

        self.tokens.clear();
        self.parsed = true;
        Ok(())
    }

    /// Runs the program, printing to stdout.
    pub fn interpret(&mut self) -> Result<i64> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.interpret_with_output(&mut lock)
    }

    pub fn interpret_with_output(&mut self, output: &mut dyn Write) -> Result<i64> {
        self.parse()?;

        if self.functions.is_empty() {
            return Ok(NO_FUNCTIONS);
        }

        let entry_point = self.functions.entry_point()?;
        let mut evaluator = Evaluator::new(&self.functions, &mut self.heap, output, self.max_call_depth);
        let result = evaluator.run(&self.statements, entry_point)?;

        debug!("main() returned {}", result);
        Ok(result)
    }

    /// Tokens waiting to be parsed.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of live heap cells; zero between runs.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
