pub mod util;
pub mod interpreter;

use std::io::Write;
use std::path::PathBuf;
use clap::Parser as ClapParser;
use nu_ansi_term::Color;
use thiserror::Error;
use crate::interpreter::error::Error;
use crate::interpreter::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use crate::interpreter::lexer::Token;

#[derive(ClapParser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(help = "Purah source file to run")]
    pub input: PathBuf,

    #[clap(short, long, help = "Print the token stream and parser progress")]
    pub debug: bool,
    #[clap(long, help = "Don't print the greeting")]
    pub no_hello: bool,
    #[clap(long, help = "Print a farewell after a successful run")]
    pub yes_goodbye: bool,
    #[clap(long, help = "Use colored output")]
    pub colorful: bool,
    #[clap(long, default_value_t = DEFAULT_MAX_CALL_DEPTH, help = "Maximum nesting of function calls")]
    pub max_call_depth: usize,

    #[clap(short, long, help = "Print verbose log output")]
    pub verbose: bool,
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Can't open '{path}': {source}")]
    Read { path: String, source: std::io::Error },
    #[error(transparent)]
    Interpreter(#[from] Error),
}

/// Paints `text` if `colorful` is set.
pub fn paint(colorful: bool, color: Color, text: &str) -> String {
    if colorful {
        color.paint(text).to_string()
    } else {
        text.to_owned()
    }
}

/// Feeds `source` to `interpreter` one line at a time, numbering lines from 1.
pub fn tokenize_lines(interpreter: &mut Interpreter, source: &str) -> Result<(), Error> {
    for (index, line) in source.lines().enumerate() {
        interpreter.tokenize(&format!("{}\n", line), index + 1)?;
    }

    Ok(())
}

/// Runs a whole program, writing everything it prints to `output`, and returns `main`'s result.
pub fn run_source(source: &str, output: &mut dyn Write) -> Result<i64, Error> {
    let mut interpreter = Interpreter::new();
    tokenize_lines(&mut interpreter, source)?;
    interpreter.parse()?;
    interpreter.interpret_with_output(output)
}

fn format_tokens(tokens: &[Token]) -> String {
    tokens.iter()
        .map(|token| format!("<{} '{}' {}>", token.token_type(), token.source(), token.line()))
        .collect::<Vec<String>>().join(", ")
}

pub fn run(config: &Config) -> Result<i64, RunError> {
    let source = std::fs::read_to_string(&config.input).map_err(|source| RunError::Read {
        path: config.input.display().to_string(),
        source,
    })?;

    let mut interpreter = Interpreter::with_max_call_depth(config.max_call_depth);
    tokenize_lines(&mut interpreter, &source)?;

    if config.debug {
        println!("{}", paint(config.colorful, Color::Green, "|| Debug: Tokens: "));
        println!("{}", paint(config.colorful, Color::Green, &format_tokens(interpreter.tokens())));
    }

    interpreter.parse()?;

    if config.debug {
        println!("{}", paint(config.colorful, Color::Green, "Parsing is done!"));
    }

    Ok(interpreter.interpret()?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::interpreter::lexer::{Lexer, TokenType};
    use super::*;

    #[test]
    fn token_listing() {
        let tokens = Lexer::tokenize("var x\\int = 2\n", 4).unwrap();
        assert_eq!(tokens.last().map(Token::token_type), Some(TokenType::EndOfLine));
        assert_eq!(format_tokens(&tokens[..2]), "<VAR 'var' 4>, <IDENTIFIER 'x' 4>");
    }

    #[test]
    fn paint_is_plain_without_color() {
        assert_eq!(paint(false, Color::Red, "Purah"), "Purah");
        assert_ne!(paint(true, Color::Red, "Purah"), "Purah");
    }
}
