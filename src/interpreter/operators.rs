use std::cmp::Ordering;
use crate::interpreter::error::{RuntimeError, RuntimeResult};
use crate::interpreter::lexer::{Token, TokenType};
use crate::interpreter::value::Value;

fn unsupported(operator: &Token, operand: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperator { operator: operator.source().to_owned(), operand: operand.value_type(), line: operator.line() }
}

fn overflow(operator: &Token) -> RuntimeError {
    RuntimeError::Overflow { operator: operator.source().to_owned(), line: operator.line() }
}

fn checked(operator: &Token, result: Option<i64>) -> RuntimeResult<Value> {
    result.map(Value::Int).ok_or_else(|| overflow(operator))
}

fn floor_div(operator: &Token, left: i64, right: i64) -> RuntimeResult<i64> {
    let quotient = left.checked_div(right).ok_or_else(|| overflow(operator))?;

    if left % right != 0 && ((left < 0) != (right < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// Bools take part in `+ - * /` as 0 and 1; the result is true iff it is non-zero.
fn bool_arithmetic(operator: &Token, left: bool, right: bool) -> RuntimeResult<Value> {
    let (left, right) = (left as i64, right as i64);

    let result = match operator.token_type() {
        TokenType::Plus => left + right,
        TokenType::Minus => left - right,
        TokenType::Star => left * right,
        TokenType::Divide => {
            if right == 0 {
                return Err(RuntimeError::DivisionByZero { line: operator.line() });
            }

            left / right
        },
        _ => return Err(unsupported(operator, &Value::Bool(left != 0))),
    };

    Ok(Value::Bool(result != 0))
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(left), Value::Int(right)) => Some(left.cmp(right)),
        (Value::Float(left), Value::Float(right)) => left.partial_cmp(right),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        // Strings are ordered by length only
        (Value::String(left), Value::String(right)) => Some(left.len().cmp(&right.len())),
        _ => None,
    }
}

/// Applies a binary operator to two already evaluated operands of the same type.
pub fn apply_binary(operator: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
    if left.value_type() != right.value_type() {
        return Err(RuntimeError::OperandMismatch {
            operator: operator.source().to_owned(),
            left: left.value_type(), right: right.value_type(),
            line: operator.line(),
        });
    }

    match operator.token_type() {
        TokenType::Equal => return Ok(Value::Bool(left == right)),
        TokenType::NotEqual => return Ok(Value::Bool(left != right)),
        TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual => {
            // NaN compares false with everything
            let result = compare(&left, &right).map_or(false, |ordering| match operator.token_type() {
                TokenType::Less => ordering == Ordering::Less,
                TokenType::LessEqual => ordering != Ordering::Greater,
                TokenType::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            });

            return Ok(Value::Bool(result));
        },
        _ => {},
    }

    match (left, right) {
        (Value::Int(left), Value::Int(right)) => match operator.token_type() {
            TokenType::Plus => checked(operator, left.checked_add(right)),
            TokenType::Minus => checked(operator, left.checked_sub(right)),
            TokenType::Star => checked(operator, left.checked_mul(right)),
            TokenType::Divide if right == 0 => Err(RuntimeError::DivisionByZero { line: operator.line() }),
            TokenType::Divide => Ok(Value::Float(left as f64 / right as f64)),
            TokenType::FloorDivide | TokenType::Percent if right == 0 => Err(RuntimeError::DivisionByZero { line: operator.line() }),
            TokenType::FloorDivide => floor_div(operator, left, right).map(Value::Int),
            TokenType::Percent => checked(operator, left.checked_rem(right)),
            _ => Err(unsupported(operator, &Value::Int(left))),
        },
        (Value::Float(left), Value::Float(right)) => match operator.token_type() {
            TokenType::Plus => Ok(Value::Float(left + right)),
            TokenType::Minus => Ok(Value::Float(left - right)),
            TokenType::Star => Ok(Value::Float(left * right)),
            TokenType::Divide => Ok(Value::Float(left / right)),
            TokenType::FloorDivide => Ok(Value::Float((left / right).floor())),
            TokenType::Percent => Ok(Value::Float(left % right)),
            _ => Err(unsupported(operator, &Value::Float(left))),
        },
        (Value::Bool(left), Value::Bool(right)) => match operator.token_type() {
            TokenType::And => Ok(Value::Bool(left && right)),
            TokenType::Or => Ok(Value::Bool(left || right)),
            _ => bool_arithmetic(operator, left, right),
        },
        (Value::String(mut left), Value::String(right)) => match operator.token_type() {
            TokenType::Plus => {
                left.push_str(&right);
                Ok(Value::String(left))
            },
            _ => Err(unsupported(operator, &Value::String(left))),
        },
        (left, _) => Err(unsupported(operator, &left)),
    }
}

pub fn apply_unary(operator: &Token, operand: Value) -> RuntimeResult<Value> {
    match (operator.token_type(), operand) {
        (TokenType::Minus, Value::Int(value)) => checked(operator, value.checked_neg()),
        (TokenType::Minus, Value::Float(value)) => Ok(Value::Float(-value)),
        (TokenType::Not, Value::Bool(value)) => Ok(Value::Bool(!value)),
        (_, operand) => Err(unsupported(operator, &operand)),
    }
}

/// `name++` and `name--`.
pub fn apply_step(operator: &Token, operand: Value) -> RuntimeResult<Value> {
    let delta = match operator.token_type() {
        TokenType::Increment => 1,
        TokenType::Decrement => -1,
        _ => return Err(unsupported(operator, &operand)),
    };

    match operand {
        Value::Int(value) => checked(operator, value.checked_add(delta)),
        Value::Float(value) => Ok(Value::Float(value + delta as f64)),
        operand => Err(unsupported(operator, &operand)),
    }
}
