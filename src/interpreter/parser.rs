use log::debug;
use thiserror::Error;
use crate::interpreter::ast::{Call, FunctionDecl, Node, Program, TypedParam};
use crate::interpreter::lexer::{Token, TokenType};
use crate::interpreter::value::ValueType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected {expected} at line {line}, found {found}")]
    Expected { expected: &'static str, found: String, line: usize },
    #[error("Unexpected {found} at line {line}")]
    UnexpectedToken { found: String, line: usize },
    #[error("Unmatched closing parenthesis at line {line}")]
    UnmatchedParenthesis { line: usize },
    #[error("Losing call argument at line {line}: expected ',' or ')', found {found}")]
    LosingCallArgument { found: String, line: usize },
    #[error("Unknown type '{name}' at line {line}")]
    UnknownType { name: String, line: usize },
    #[error("Duplicate parameter '{name}' at line {line}")]
    DuplicateParameter { name: String, line: usize },
    #[error("Functions can only be declared at top level (line {line})")]
    NestedFunction { line: usize },
    #[error("Invalid literal '{literal}' at line {line}")]
    InvalidLiteral { literal: String, line: usize },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Expected { line, .. }
            | ParseError::UnexpectedToken { line, .. }
            | ParseError::UnmatchedParenthesis { line }
            | ParseError::LosingCallArgument { line, .. }
            | ParseError::UnknownType { line, .. }
            | ParseError::DuplicateParameter { line, .. }
            | ParseError::NestedFunction { line }
            | ParseError::InvalidLiteral { line, .. } => *line,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Binding strength of a binary operator; `None` if the token is not one.
fn binary_priority(token_type: TokenType) -> Option<u8> {
    match token_type {
        TokenType::Or => Some(1),
        TokenType::And => Some(2),
        TokenType::Equal | TokenType::NotEqual => Some(3),
        TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual => Some(4),
        TokenType::Plus | TokenType::Minus => Some(5),
        TokenType::Star | TokenType::Divide | TokenType::FloorDivide | TokenType::Percent => Some(6),
        _ => None,
    }
}

/// Recursive-descent parser over an already scanned token stream.
///
/// End-of-line tokens only carry line information for the lexer and are dropped here;
/// statements may be separated by `;` or by nothing at all.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    previous: Token, current: Token,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser {
            tokens: tokens.into_iter().filter(|token| token.token_type() != TokenType::EndOfLine).collect(),
            position: 0,
            previous: Token::eof(0), current: Token::eof(0),
        }
    }

    // Declaration parsing

    pub fn parse(&mut self) -> ParseResult<Program> {
        self.consume();

        let mut program = Program::default();

        while !self.is_eof() {
            if self.matches(TokenType::Semicolon) {
                continue;
            }

            if self.matches(TokenType::Function) {
                program.functions.push(self.parse_function_declaration()?);
            } else {
                program.statements.push(self.parse_statement()?);
            }
        }

        debug!("Parsed {} functions and {} top-level statements", program.functions.len(), program.statements.len());
        Ok(program)
    }

    fn parse_function_declaration(&mut self) -> ParseResult<FunctionDecl> {
        self.expect(TokenType::Identifier, "function name after 'func'")?;
        let name = self.previous.clone();
        let return_type = self.expect_type("'\\' before function return type")?;

        self.expect(TokenType::ParenthesisLeft, "'(' after function return type")?;
        let mut params: Vec<TypedParam> = Vec::new();

        if !self.check(TokenType::ParenthesisRight) {
            loop {
                self.expect(TokenType::Identifier, "parameter name")?;
                let param_name = self.previous.clone();
                let param_type = self.expect_type("'\\' after parameter name")?;

                if params.iter().any(|param| param.name.source() == param_name.source()) {
                    return Err(ParseError::DuplicateParameter { name: param_name.source().to_owned(), line: param_name.line() });
                }

                params.push(TypedParam { name: param_name, param_type });

                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenType::ParenthesisRight, "')' after function parameters")?;
        self.expect(TokenType::BracketLeft, "'{' before function body")?;
        let body = self.parse_block()?;

        Ok(FunctionDecl { name, return_type, params, body })
    }

    /// Parses `\ type`.
    fn expect_type(&mut self, message: &'static str) -> ParseResult<ValueType> {
        self.expect(TokenType::Backslash, message)?;
        self.expect(TokenType::Identifier, "type name after '\\'")?;

        ValueType::from_name(self.previous.source()).ok_or_else(|| ParseError::UnknownType {
            name: self.previous.source().to_owned(),
            line: self.previous.line(),
        })
    }

    /// Parses statements up to and including the closing `}`.
    fn parse_block(&mut self) -> ParseResult<Vec<Node>> {
        let mut body = Vec::new();

        while !self.check(TokenType::BracketRight) {
            if self.is_eof() {
                return Err(self.expected("'}' after block"));
            }

            if self.matches(TokenType::Semicolon) {
                continue;
            }

            body.push(self.parse_statement()?);
        }

        self.consume();
        Ok(body)
    }

    // Statement parsing

    fn parse_statement(&mut self) -> ParseResult<Node> {
        let statement = match self.current.token_type() {
            TokenType::Function => return Err(ParseError::NestedFunction { line: self.current.line() }),
            TokenType::Return => {
                self.consume();
                let token = self.previous.clone();
                let expr = self.parse_expression()?;

                Node::Return { token, expr: Box::new(expr) }
            },
            TokenType::Var => {
                self.consume();
                self.parse_variable_declaration()?
            },
            TokenType::If => {
                self.consume();
                self.parse_if()?
            },
            TokenType::Print => {
                self.consume();
                let token = self.previous.clone();
                let expr = self.parse_expression()?;

                Node::Print { token, expr: Box::new(expr) }
            },
            TokenType::Identifier => match self.peek_type() {
                TokenType::Assign => {
                    self.consume();
                    let name = self.previous.clone();
                    self.consume();
                    let expr = self.parse_expression()?;

                    Node::Assignment { name, expr: Box::new(expr) }
                },
                TokenType::Increment | TokenType::Decrement => {
                    self.consume();
                    let name = self.previous.clone();
                    self.consume();

                    Node::Step { name, operator: self.previous.clone() }
                },
                _ => self.parse_expression()?,
            },
            _ => self.parse_expression()?,
        };

        self.matches(TokenType::Semicolon);
        Ok(statement)
    }

    fn parse_variable_declaration(&mut self) -> ParseResult<Node> {
        self.expect(TokenType::Identifier, "variable name after 'var'")?;
        let name = self.previous.clone();
        let var_type = self.expect_type("'\\' after variable name")?;

        self.expect(TokenType::Assign, "'=' after variable type")?;
        let expr = self.parse_expression()?;

        Ok(Node::Variable { name, var_type, expr: Box::new(expr) })
    }

    /// Parses an `if` whose keyword was just consumed, including its `else` chain.
    fn parse_if(&mut self) -> ParseResult<Node> {
        let token = self.previous.clone();

        self.expect(TokenType::ParenthesisLeft, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::ParenthesisRight, "')' after 'if' condition")?;

        self.expect(TokenType::BracketLeft, "'{' after 'if' condition")?;
        let body = self.parse_block()?;

        let otherwise = if self.matches(TokenType::Else) {
            let else_token = self.previous.clone();

            if self.matches(TokenType::If) {
                self.parse_if()?
            } else {
                self.expect(TokenType::BracketLeft, "'{' or 'if' after 'else'")?;
                Node::Else { token: else_token, body: self.parse_block()? }
            }
        } else {
            Node::Empty
        };

        Ok(Node::If { token, condition: Box::new(condition), body, otherwise: Box::new(otherwise) })
    }

    // Expression parsing

    fn parse_expression(&mut self) -> ParseResult<Node> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_priority: u8) -> ParseResult<Node> {
        let mut expr = self.parse_unary()?;

        while let Some(priority) = binary_priority(self.current.token_type()) {
            if priority < min_priority {
                break;
            }

            self.consume();
            let operator = self.previous.clone();
            // One level tighter on the right keeps equal priorities left-associative
            let right = self.parse_binary(priority + 1)?;

            expr = Node::BinaryOperator { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Node> {
        if self.matches_any(&[TokenType::Minus, TokenType::Not]) {
            let operator = self.previous.clone();
            let expr = self.parse_unary()?;

            return Ok(Node::UnaryOperator { operator, expr: Box::new(expr) });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Node> {
        if self.matches(TokenType::Int) {
            let literal = &self.previous;

            return literal.source().parse().map(Node::ConstantInt).map_err(|_| ParseError::InvalidLiteral {
                literal: literal.source().to_owned(), line: literal.line(),
            });
        } else if self.matches(TokenType::Float) {
            let literal = &self.previous;

            return literal.source().parse().map(Node::ConstantFloat).map_err(|_| ParseError::InvalidLiteral {
                literal: literal.source().to_owned(), line: literal.line(),
            });
        } else if self.matches(TokenType::Bool) {
            return Ok(Node::ConstantBool(self.previous.source() == "true"));
        } else if self.matches(TokenType::String) {
            return Ok(Node::ConstantString(self.previous.source().to_owned()));
        } else if self.matches(TokenType::Identifier) {
            let name = self.previous.clone();

            if self.matches(TokenType::ParenthesisLeft) {
                return self.finish_call(name);
            }

            return Ok(Node::Identifier(name));
        } else if self.matches(TokenType::ParenthesisLeft) {
            let expr = self.parse_expression()?;
            self.expect(TokenType::ParenthesisRight, "')' after expression")?;

            return Ok(expr);
        } else if self.check(TokenType::ParenthesisRight) {
            return Err(ParseError::UnmatchedParenthesis { line: self.current.line() });
        } else if self.is_eof() {
            return Err(self.expected("expression"));
        }

        Err(ParseError::UnexpectedToken { found: self.current.to_string(), line: self.current.line() })
    }

    fn finish_call(&mut self, name: Token) -> ParseResult<Node> {
        let mut args = Vec::new();

        if !self.matches(TokenType::ParenthesisRight) {
            loop {
                args.push(self.parse_expression()?);

                if self.matches(TokenType::Comma) {
                    continue;
                } else if self.matches(TokenType::ParenthesisRight) {
                    break;
                }

                return Err(ParseError::LosingCallArgument { found: self.current.to_string(), line: self.current.line() });
            }
        }

        Ok(Node::Call(Call::new(name, args)))
    }

    fn consume(&mut self) {
        let next = match self.tokens.get(self.position) {
            Some(token) => {
                self.position += 1;
                token.clone()
            },
            None => Token::eof(self.current.line().max(self.previous.line())),
        };

        self.previous = std::mem::replace(&mut self.current, next);
    }

    fn expect(&mut self, token_type: TokenType, message: &'static str) -> ParseResult<()> {
        if self.current.token_type() == token_type {
            self.consume();
            return Ok(());
        }

        Err(self.expected(message))
    }

    fn expected(&self, message: &'static str) -> ParseError {
        ParseError::Expected { expected: message, found: self.current.to_string(), line: self.current.line() }
    }

    fn matches(&mut self, token_type: TokenType) -> bool {
        if !self.check(token_type) {
            return false;
        }

        self.consume();
        true
    }

    fn matches_any(&mut self, token_types: &[TokenType]) -> bool {
        for token_type in token_types {
            if self.check(*token_type) {
                self.consume();
                return true;
            }
        }

        false
    }

    #[inline]
    fn check(&self, token_type: TokenType) -> bool {
        self.current.token_type() == token_type
    }

    /// Type of the token after `current`.
    fn peek_type(&self) -> TokenType {
        self.tokens.get(self.position).map(Token::token_type).unwrap_or(TokenType::Eof)
    }

    fn is_eof(&self) -> bool {
        self.current.token_type() == TokenType::Eof
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::interpreter::lexer::Lexer;
    use super::*;

    fn parse(source: &str) -> ParseResult<Program> {
        Parser::new(Lexer::tokenize(source, 1).unwrap()).parse()
    }

    fn parse_statements(source: &str) -> Vec<String> {
        parse(source).unwrap().statements.iter().map(|node| format!("{:?}", node)).collect()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(parse_statements("1 + 2 * 3"), vec!["(1 + (2 * 3))"]);
        assert_eq!(parse_statements("10 - 3 - 2"), vec!["((10 - 3) - 2)"]);
        assert_eq!(parse_statements("a == b < c + 1"), vec!["(a == (b < (c + 1)))"]);
        assert_eq!(parse_statements("(1 + 2) // 3 % 4"), vec!["(((1 + 2) // 3) % 4)"]);
        assert_eq!(parse_statements("a or b and c == d"), vec!["(a or (b and (c == d)))"]);
        assert_eq!(parse_statements("-x * not y"), vec!["((-x) * (not y))"]);
    }

    #[test]
    fn statements_by_leading_token() {
        assert_eq!(parse_statements("var x\\int = 2 + 3; x = x * 2; x++; print x; f(x, \"s\", 1.5)"), vec![
            "var x\\int = (2 + 3)",
            "x = (x * 2)",
            "x++",
            "print x",
            "f(x, \"s\", 1.5)",
        ]);
    }

    #[test]
    fn function_declaration() {
        let program = parse("func add\\int(a\\int, b\\int) {\n  return a + b\n}\n").unwrap();

        assert_eq!(program.functions.len(), 1);
        assert_eq!(format!("{:?}", program.functions[0]), "func add\\int(a\\int, b\\int) { return (a + b); }");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn if_else_chain() {
        let program = parse("func main\\int() { if (x) { return 1; } else if (y) { return 2; } else { return 3; } }").unwrap();

        assert_eq!(format!("{:?}", program.functions[0].body[0]),
                   "if (x) { return 1; } else if (y) { return 2; } else { return 3; }");

        match &program.functions[0].body[0] {
            Node::If { otherwise, .. } => match otherwise.as_ref() {
                Node::If { otherwise, .. } => assert!(matches!(otherwise.as_ref(), Node::Else { .. })),
                other => panic!("expected else-if, got {:?}", other),
            },
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn lone_if_ends_with_empty_sentinel() {
        let program = parse("if (true) { print 1 }").unwrap();

        match &program.statements[0] {
            Node::If { otherwise, .. } => assert_eq!(**otherwise, Node::Empty),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn unmatched_parenthesis() {
        assert_eq!(parse("print 1 + )"), Err(ParseError::UnmatchedParenthesis { line: 1 }));
    }

    #[test]
    fn losing_call_argument() {
        assert_eq!(parse("f(1 2)"), Err(ParseError::LosingCallArgument { found: String::from("`2`"), line: 1 }));
    }

    #[test]
    fn duplicate_parameter() {
        assert_eq!(parse("func f\\int(a\\int, a\\float) { return 1 }"),
                   Err(ParseError::DuplicateParameter { name: String::from("a"), line: 1 }));
    }

    #[test]
    fn unknown_type() {
        assert_eq!(parse("var x\\double = 1.0"), Err(ParseError::UnknownType { name: String::from("double"), line: 1 }));
    }

    #[test]
    fn nested_function() {
        assert_eq!(parse("func f\\int() { func g\\int() { return 1 } }"), Err(ParseError::NestedFunction { line: 1 }));
    }

    #[test]
    fn unclosed_block_reports_last_line() {
        let mut tokens = Lexer::tokenize("func main\\int() {\n", 1).unwrap();
        tokens.extend(Lexer::tokenize("return 0\n", 2).unwrap());

        assert_eq!(Parser::new(tokens).parse(), Err(ParseError::Expected {
            expected: "'}' after block", found: String::from("end of input"), line: 2,
        }));
    }

    #[test]
    fn loops_are_not_statements() {
        assert_eq!(parse("while (true) { }"), Err(ParseError::UnexpectedToken { found: String::from("`while`"), line: 1 }));
    }

    #[test]
    fn integer_literal_overflow() {
        assert_eq!(parse("print 99999999999999999999"), Err(ParseError::InvalidLiteral {
            literal: String::from("99999999999999999999"), line: 1,
        }));
    }
}
