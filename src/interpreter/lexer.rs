use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::Chars;
use lazy_static::lazy_static;
use log::trace;
use thiserror::Error;
use crate::util;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenType {
    Identifier,
    Int, Float,
    String, Bool,

    Dot, Comma, Semicolon, Backslash,
    ParenthesisLeft, ParenthesisRight,
    BracketLeft, BracketRight,

    Plus, Minus,
    Star, Divide, FloorDivide, Percent,
    Increment, Decrement, Arrow,

    Assign, Equal,
    Not, NotEqual,
    Greater, GreaterEqual,
    Less, LessEqual,
    And, Or,

    // Keywords
    Var,
    Function,
    If, Else,
    Return,
    Print,
    While, For,
    Class,

    EndOfLine,
    Eof,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenType::Identifier => "IDENTIFIER",
            TokenType::Int => "INTEGER",
            TokenType::Float => "FLOAT",
            TokenType::String => "STRING",
            TokenType::Bool => "BOOL",
            TokenType::Dot => "DOT",
            TokenType::Comma => "COMMA",
            TokenType::Semicolon => "SEMICOLON",
            TokenType::Backslash => "BACKSLASH",
            TokenType::ParenthesisLeft => "LPAREN",
            TokenType::ParenthesisRight => "RPAREN",
            TokenType::BracketLeft => "LBRACE",
            TokenType::BracketRight => "RBRACE",
            TokenType::Plus => "PLUS",
            TokenType::Minus => "MINUS",
            TokenType::Star => "STAR",
            TokenType::Divide => "DIVIDE",
            TokenType::FloorDivide => "FLOOR_DIVIDE",
            TokenType::Percent => "PERCENT",
            TokenType::Increment => "INCREMENT",
            TokenType::Decrement => "DECREMENT",
            TokenType::Arrow => "ARROW",
            TokenType::Assign => "EQUALS",
            TokenType::Equal => "EQUALITY",
            TokenType::Not => "NOT",
            TokenType::NotEqual => "NOT_EQUALITY",
            TokenType::Greater => "MORE",
            TokenType::GreaterEqual => "MORE_OR_EQUALITY",
            TokenType::Less => "LESS",
            TokenType::LessEqual => "LESS_OR_EQUALITY",
            TokenType::And => "AND",
            TokenType::Or => "OR",
            TokenType::Var => "VAR",
            TokenType::Function => "FUNCTION",
            TokenType::If => "IF",
            TokenType::Else => "ELSE",
            TokenType::Return => "RETURN",
            TokenType::Print => "PRINT",
            TokenType::While => "WHILE",
            TokenType::For => "FOR",
            TokenType::Class => "CLASS",
            TokenType::EndOfLine => "EOL",
            TokenType::Eof => "EOF",
        };

        f.write_str(name)
    }
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenType> = HashMap::from([
        ("var", TokenType::Var),
        ("func", TokenType::Function),
        ("if", TokenType::If),
        ("else", TokenType::Else),
        ("return", TokenType::Return),
        ("print", TokenType::Print),
        ("not", TokenType::Not),
        ("and", TokenType::And),
        ("or", TokenType::Or),
        ("while", TokenType::While),
        ("for", TokenType::For),
        ("class", TokenType::Class),
    ]);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    token_type: TokenType,
    source: String,
    line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, source: impl Into<String>, line: usize) -> Token {
        Token { token_type, source: source.into(), line }
    }

    pub fn eof(line: usize) -> Token {
        Token::new(TokenType::Eof, "", line)
    }

    pub fn token_type(&self) -> TokenType { self.token_type }
    pub fn source(&self) -> &str { &self.source }
    pub fn line(&self) -> usize { self.line }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.token_type {
            TokenType::Eof => f.write_str("end of input"),
            TokenType::EndOfLine => f.write_str("end of line"),
            TokenType::String => write!(f, "`\"{}\"`", self.source),
            _ => write!(f, "`{}`", self.source),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    #[error("Unexpected dot at line {line}")]
    UnexpectedDot { line: usize },
    #[error("Unexpected input '{character}' at line {line}")]
    UnexpectedInput { character: char, line: usize },
    #[error("Unclosed string at line {line}")]
    UnterminatedString { line: usize },
    #[error("Unknown escape sequence '\\{character}' at line {line}")]
    UnknownEscape { character: char, line: usize },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            LexerError::UnexpectedDot { line }
            | LexerError::UnexpectedInput { line, .. }
            | LexerError::UnterminatedString { line }
            | LexerError::UnknownEscape { line, .. } => *line,
        }
    }
}

type LexerResult<T> = Result<T, LexerError>;

/// Scans one chunk of source text (normally a single line) into tokens.
///
/// Every consumed `\n` produces an [`TokenType::EndOfLine`] token and advances the line counter, so
/// feeding a file line by line and feeding it whole yield the same token lines.
pub struct Lexer<'source> {
    input: &'source str,

    chars: Chars<'source>,
    peeked: Option<char>,

    start_index: usize,
    current_index: usize,

    start_line: usize,
    current_line: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str, line: usize) -> Lexer<'source> {
        Lexer {
            input: source,

            chars: source.chars(),
            peeked: None,

            start_index: 0,
            current_index: 0,

            start_line: line,
            current_line: line,
        }
    }

    /// Tokenizes `source` completely. The trailing [`TokenType::Eof`] is not included.
    pub fn tokenize(source: &str, line: usize) -> LexerResult<Vec<Token>> {
        let mut lexer = Lexer::new(source, line);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.scan_token()?;

            if token.token_type() == TokenType::Eof {
                break;
            }

            tokens.push(token);
        }

        trace!("Scanned {} tokens from line {}", tokens.len(), line);
        Ok(tokens)
    }

    pub fn scan_token(&mut self) -> LexerResult<Token> {
        loop {
            self.skip_whitespace();
            self.start_index = self.current_index;
            self.start_line = self.current_line;

            let c = match self.consume() {
                Some(c) => c,
                None => return Ok(self.make_token(TokenType::Eof)),
            };

            return match c {
                '\n' => {
                    let token = Token::new(TokenType::EndOfLine, "", self.start_line);
                    self.current_line += 1;
                    Ok(token)
                },

                '(' => Ok(self.make_token(TokenType::ParenthesisLeft)),
                ')' => Ok(self.make_token(TokenType::ParenthesisRight)),
                '{' => Ok(self.make_token(TokenType::BracketLeft)),
                '}' => Ok(self.make_token(TokenType::BracketRight)),
                '.' => Ok(self.make_token(TokenType::Dot)),
                ',' => Ok(self.make_token(TokenType::Comma)),
                ';' => Ok(self.make_token(TokenType::Semicolon)),
                '\\' => Ok(self.make_token(TokenType::Backslash)),
                '*' => Ok(self.make_token(TokenType::Star)),
                '%' => Ok(self.make_token(TokenType::Percent)),

                '=' => Ok(if self.expect('=') { self.make_token(TokenType::Equal) } else {
                    self.make_token(TokenType::Assign)
                }),
                '!' => Ok(if self.expect('=') { self.make_token(TokenType::NotEqual) } else {
                    self.make_token(TokenType::Not)
                }),
                '>' => Ok(if self.expect('=') { self.make_token(TokenType::GreaterEqual) } else {
                    self.make_token(TokenType::Greater)
                }),
                '<' => Ok(if self.expect('=') { self.make_token(TokenType::LessEqual) } else {
                    self.make_token(TokenType::Less)
                }),
                '+' => Ok(if self.expect('+') { self.make_token(TokenType::Increment) } else {
                    self.make_token(TokenType::Plus)
                }),
                // `--` wins over `->`, which wins over a plain `-`
                '-' => Ok(if self.expect('-') {
                    self.make_token(TokenType::Decrement)
                } else if self.expect('>') {
                    self.make_token(TokenType::Arrow)
                } else {
                    self.make_token(TokenType::Minus)
                }),
                '/' => Ok(if self.expect('/') { self.make_token(TokenType::FloorDivide) } else {
                    self.make_token(TokenType::Divide)
                }),

                '#' => {
                    self.skip_comment();
                    continue;
                },

                '"' => self.scan_string(),
                c if util::is_numeric(c) => self.scan_number(),
                c if util::is_alphabetic(c) => Ok(self.scan_identifier()),

                _ => Err(LexerError::UnexpectedInput { character: c, line: self.current_line }),
            };
        }
    }

    fn scan_string(&mut self) -> LexerResult<Token> {
        let mut value = String::new();

        loop {
            match self.consume() {
                Some('"') => break,
                Some('\\') => match self.consume() {
                    Some(escaped) => match util::unescape(escaped) {
                        Some(c) => value.push(c),
                        None => return Err(LexerError::UnknownEscape { character: escaped, line: self.start_line }),
                    },
                    None => return Err(LexerError::UnterminatedString { line: self.start_line }),
                },
                Some('\n') | None => return Err(LexerError::UnterminatedString { line: self.start_line }),
                Some(c) => value.push(c),
            }
        }

        Ok(Token::new(TokenType::String, value, self.start_line))
    }

    fn scan_number(&mut self) -> LexerResult<Token> {
        self.skip_digits();

        let mut floating_point = false;

        if self.expect('.') {
            floating_point = true;
            self.skip_digits();

            if self.peek() == Some('.') {
                return Err(LexerError::UnexpectedDot { line: self.current_line });
            }
        }

        Ok(self.make_token(if floating_point { TokenType::Float } else { TokenType::Int }))
    }

    fn scan_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if !util::is_identifier_char(c) {
                break;
            }

            self.consume();
        }

        let name = &self.input[self.start_index..self.current_index];

        let token_type = match name {
            "true" | "false" => TokenType::Bool,
            _ => KEYWORDS.get(name).copied().unwrap_or(TokenType::Identifier),
        };

        self.make_token(token_type)
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        Token {
            token_type,
            source: self.input[self.start_index..self.current_index].to_owned(),
            line: self.start_line,
        }
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peeked.take().or_else(|| self.chars.next());

        if let Some(c) = c {
            self.current_index += c.len_utf8();
        }

        c
    }

    fn peek(&mut self) -> Option<char> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }

        self.peeked
    }

    fn expect(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek() {
            if !util::is_numeric(c) {
                return;
            }

            self.consume();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || !c.is_whitespace() {
                return;
            }

            self.consume();
        }
    }

    /// Skips to the closing `#`, or up to the end of the line if there is none.
    /// The newline itself is left for [`Lexer::scan_token`].
    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                return;
            }

            self.consume();

            if c == '#' {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenType, String)> {
        Lexer::tokenize(source, 1).unwrap().into_iter()
            .map(|token| (token.token_type(), token.source().to_owned()))
            .collect()
    }

    #[test]
    fn variable_declaration() {
        assert_eq!(kinds("var x\\int = 2 + 3"), vec![
            (TokenType::Var, String::from("var")),
            (TokenType::Identifier, String::from("x")),
            (TokenType::Backslash, String::from("\\")),
            (TokenType::Identifier, String::from("int")),
            (TokenType::Assign, String::from("=")),
            (TokenType::Int, String::from("2")),
            (TokenType::Plus, String::from("+")),
            (TokenType::Int, String::from("3")),
        ]);
    }

    #[test]
    fn decimal_point() {
        assert_eq!(kinds("1.2"), vec![(TokenType::Float, String::from("1.2"))]);
        assert_eq!(Lexer::tokenize("1.2.3", 4), Err(LexerError::UnexpectedDot { line: 4 }));
        assert_eq!(Lexer::tokenize("1..2", 1), Err(LexerError::UnexpectedDot { line: 1 }));
    }

    #[test]
    fn booleans_before_keywords() {
        assert_eq!(kinds("true false truth"), vec![
            (TokenType::Bool, String::from("true")),
            (TokenType::Bool, String::from("false")),
            (TokenType::Identifier, String::from("truth")),
        ]);
    }

    #[test]
    fn identifiers_with_digits_and_underscores() {
        assert_eq!(kinds("var_1 if2 while"), vec![
            (TokenType::Identifier, String::from("var_1")),
            (TokenType::Identifier, String::from("if2")),
            (TokenType::While, String::from("while")),
        ]);
    }

    #[test]
    fn two_character_operators() {
        let types: Vec<TokenType> = kinds("== != ++ -- -> // <= >= = ! + - / < >").into_iter()
            .map(|(token_type, _)| token_type).collect();

        assert_eq!(types, vec![
            TokenType::Equal, TokenType::NotEqual, TokenType::Increment, TokenType::Decrement,
            TokenType::Arrow, TokenType::FloorDivide, TokenType::LessEqual, TokenType::GreaterEqual,
            TokenType::Assign, TokenType::Not, TokenType::Plus, TokenType::Minus,
            TokenType::Divide, TokenType::Less, TokenType::Greater,
        ]);
    }

    #[test]
    fn decrement_wins_over_arrow() {
        // "-->" is one decrement followed by a greater-than, never decrement + arrow
        let types: Vec<TokenType> = kinds("-->").into_iter().map(|(token_type, _)| token_type).collect();
        assert_eq!(types, vec![TokenType::Decrement, TokenType::Greater]);
    }

    #[test]
    fn string_escapes() {
        let tokens = Lexer::tokenize(r#""a\tb\n\"c\"\\""#, 1).unwrap();
        assert_eq!(tokens, vec![Token::new(TokenType::String, "a\tb\n\"c\"\\", 1)]);
    }

    #[test]
    fn string_errors() {
        assert_eq!(Lexer::tokenize(r#""abc"#, 2), Err(LexerError::UnterminatedString { line: 2 }));
        assert_eq!(Lexer::tokenize(r#""a\qb""#, 3), Err(LexerError::UnknownEscape { character: 'q', line: 3 }));
    }

    #[test]
    fn unexpected_input() {
        assert_eq!(Lexer::tokenize("var x = 1 @", 9), Err(LexerError::UnexpectedInput { character: '@', line: 9 }));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("1 # ignored 2 # 3"), vec![
            (TokenType::Int, String::from("1")),
            (TokenType::Int, String::from("3")),
        ]);
        assert_eq!(kinds("1 # rest of the line"), vec![(TokenType::Int, String::from("1"))]);
        assert_eq!(kinds("1 # c\n"), vec![
            (TokenType::Int, String::from("1")),
            (TokenType::EndOfLine, String::new()),
        ]);
    }

    #[test]
    fn unclosed_comment_keeps_line_numbers() {
        let tokens = Lexer::tokenize("a # open\nb\n", 3).unwrap();
        let lines: Vec<(TokenType, usize)> = tokens.iter().map(|token| (token.token_type(), token.line())).collect();

        assert_eq!(lines, vec![
            (TokenType::Identifier, 3),
            (TokenType::EndOfLine, 3),
            (TokenType::Identifier, 4),
            (TokenType::EndOfLine, 4),
        ]);
    }

    #[test]
    fn newlines_emit_end_of_line() {
        let tokens = Lexer::tokenize("a\nb\n", 7).unwrap();

        assert_eq!(tokens, vec![
            Token::new(TokenType::Identifier, "a", 7),
            Token::new(TokenType::EndOfLine, "", 7),
            Token::new(TokenType::Identifier, "b", 8),
            Token::new(TokenType::EndOfLine, "", 8),
        ]);
    }
}
