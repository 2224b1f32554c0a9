use std::cell::OnceCell;
use std::fmt::{Debug, Formatter};
use crate::interpreter::lexer::{Token, TokenType};
use crate::interpreter::value::ValueType;

/// Everything the parser produced from one token stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
    /// Non-function top-level statements, run in the global space before `main`.
    pub statements: Vec<Node>,
}

#[derive(Clone, PartialEq)]
pub struct TypedParam {
    pub name: Token,
    pub param_type: ValueType,
}

impl Debug for TypedParam {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\\{:?}", self.name.source(), self.param_type)
    }
}

#[derive(Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub return_type: ValueType,
    pub params: Vec<TypedParam>,
    pub body: Vec<Node>,
}

impl Debug for FunctionDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "func {}\\{:?}({}) {{ {} }}", self.name.source(), self.return_type,
               self.params.iter().map(|param| format!("{:?}", param)).collect::<Vec<String>>().join(", "),
               self.body.iter().map(|node| format!("{:?};", node)).collect::<Vec<String>>().join(" "))
    }
}

/// A call site. `resolved` remembers the function table index found by the first successful lookup.
#[derive(Clone, PartialEq)]
pub struct Call {
    pub name: Token,
    pub args: Vec<Node>,
    pub resolved: OnceCell<usize>,
}

impl Call {
    pub fn new(name: Token, args: Vec<Node>) -> Call {
        Call { name, args, resolved: OnceCell::new() }
    }
}

#[derive(Clone, PartialEq)]
pub enum Node {
    ConstantInt(i64),
    ConstantFloat(f64),
    ConstantBool(bool),
    ConstantString(String),
    Identifier(Token),

    UnaryOperator {
        operator: Token,
        expr: Box<Node>,
    },
    BinaryOperator {
        left: Box<Node>,
        operator: Token,
        right: Box<Node>,
    },
    Call(Call),

    Variable {
        name: Token,
        var_type: ValueType,
        expr: Box<Node>,
    },
    Assignment {
        name: Token,
        expr: Box<Node>,
    },
    /// `name++` or `name--`
    Step {
        name: Token,
        operator: Token,
    },
    Return {
        token: Token,
        expr: Box<Node>,
    },
    If {
        token: Token,
        condition: Box<Node>,
        body: Vec<Node>,
        /// Another `If` for `else if`, an `Else`, or `Empty` at the end of the chain.
        otherwise: Box<Node>,
    },
    Else {
        token: Token,
        body: Vec<Node>,
    },
    Print {
        token: Token,
        expr: Box<Node>,
    },

    Empty,
}

impl Node {
    /// Best-effort source line, used to tag runtime errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            Node::Identifier(token) => Some(token.line()),
            Node::UnaryOperator { operator, .. } => Some(operator.line()),
            Node::BinaryOperator { operator, .. } => Some(operator.line()),
            Node::Call(call) => Some(call.name.line()),
            Node::Variable { name, .. } | Node::Assignment { name, .. } | Node::Step { name, .. } => Some(name.line()),
            Node::Return { token, .. } | Node::If { token, .. } | Node::Else { token, .. } | Node::Print { token, .. } => Some(token.line()),
            _ => None,
        }
    }
}

fn block(f: &mut Formatter<'_>, body: &[Node]) -> std::fmt::Result {
    write!(f, "{{ {}}}", body.iter().map(|node| format!("{:?}; ", node)).collect::<Vec<String>>().join(""))
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::ConstantInt(value) => write!(f, "{}", value),
            Node::ConstantFloat(value) => write!(f, "{:?}", value),
            Node::ConstantBool(value) => write!(f, "{}", value),
            Node::ConstantString(value) => write!(f, "\"{}\"", value),
            Node::Identifier(name) => write!(f, "{}", name.source()),
            Node::UnaryOperator { operator, expr } => match operator.token_type() {
                TokenType::Not if operator.source() == "not" => write!(f, "(not {:?})", expr),
                _ => write!(f, "({}{:?})", operator.source(), expr),
            },
            Node::BinaryOperator { left, operator, right } => write!(f, "({:?} {} {:?})", left, operator.source(), right),
            Node::Call(call) => write!(f, "{}({})", call.name.source(), call.args.iter()
                .map(|arg| format!("{:?}", arg))
                .collect::<Vec<String>>().join(", ")),
            Node::Variable { name, var_type, expr } => write!(f, "var {}\\{:?} = {:?}", name.source(), var_type, expr),
            Node::Assignment { name, expr } => write!(f, "{} = {:?}", name.source(), expr),
            Node::Step { name, operator } => write!(f, "{}{}", name.source(), operator.source()),
            Node::Return { expr, .. } => write!(f, "return {:?}", expr),
            Node::If { condition, body, otherwise, .. } => {
                write!(f, "if ({:?}) ", condition)?;
                block(f, body)?;

                match otherwise.as_ref() {
                    Node::Empty => Ok(()),
                    otherwise => write!(f, " else {:?}", otherwise),
                }
            },
            Node::Else { body, .. } => block(f, body),
            Node::Print { expr, .. } => write!(f, "print {:?}", expr),
            Node::Empty => write!(f, "<empty>"),
        }
    }
}
