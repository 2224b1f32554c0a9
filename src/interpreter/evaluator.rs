use std::io::Write;
use log::{debug, trace};
use crate::interpreter::ast::{Call, Node};
use crate::interpreter::environment::{CallStack, SpaceId};
use crate::interpreter::error::{RuntimeError, RuntimeResult};
use crate::interpreter::function::{FunctionTable, SignatureKey};
use crate::interpreter::lexer::Token;
use crate::interpreter::memory::{GlobalValueStorage, MemoryError};
use crate::interpreter::operators;
use crate::interpreter::value::{Value, ValueType};

// Growth kicks in once less than the red zone is left
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// How a statement finished.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue,
    Return(Value),
}

fn variable_error(token: &Token) -> impl FnOnce(MemoryError) -> RuntimeError + '_ {
    move |source| RuntimeError::Variable { source, line: token.line() }
}

/// Tree-walking evaluator for one run of a program.
///
/// The heap is borrowed from the interpreter that owns it; the call stack lives exactly as long
/// as the run. Every space the evaluator enters is left again on every exit path, so a run that
/// ends (successfully or not) leaves no cells behind.
pub struct Evaluator<'a> {
    functions: &'a FunctionTable,
    heap: &'a mut GlobalValueStorage,
    stack: CallStack,
    output: &'a mut dyn Write,

    max_call_depth: usize,
    call_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(functions: &'a FunctionTable, heap: &'a mut GlobalValueStorage, output: &'a mut dyn Write, max_call_depth: usize) -> Evaluator<'a> {
        Evaluator {
            functions, heap,
            stack: CallStack::new(),
            output,
            max_call_depth,
            call_depth: 0,
        }
    }

    /// Runs the top-level statements in the root space, then calls the entry point.
    pub fn run(&mut self, statements: &[Node], entry_point: usize) -> RuntimeResult<i64> {
        let result = self.run_inner(statements, entry_point);
        let cleared = self.stack.clear(self.heap);
        let flushed = self.output.flush();

        let result = result?;
        cleared?;
        flushed?;
        Ok(result)
    }

    fn run_inner(&mut self, statements: &[Node], entry_point: usize) -> RuntimeResult<i64> {
        for statement in statements {
            if let Flow::Return(_) = self.execute(statement)? {
                return Err(RuntimeError::ReturnOutsideFunction { line: statement.line().unwrap_or(0) });
            }
        }

        match self.invoke(entry_point, Vec::new(), 0)? {
            Value::Int(result) => Ok(result),
            other => Err(RuntimeError::InvalidEntryPoint { found: other.value_type() }),
        }
    }

    // Scopes

    fn in_new_space<T>(&mut self, parent: SpaceId, f: impl FnOnce(&mut Self) -> RuntimeResult<T>) -> RuntimeResult<T> {
        self.stack.push(parent);
        let result = f(self);
        let popped = self.stack.pop(self.heap);

        let result = result?;
        popped?;
        Ok(result)
    }

    fn execute_statements(&mut self, body: &[Node]) -> RuntimeResult<Flow> {
        for statement in body {
            if let Flow::Return(value) = self.execute(statement)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Continue)
    }

    /// Runs an `if` or `else` body in a child of the current space.
    fn execute_block(&mut self, body: &[Node]) -> RuntimeResult<Flow> {
        let parent = self.stack.current();
        self.in_new_space(parent, |this| this.execute_statements(body))
    }

    // Statements

    pub fn execute(&mut self, node: &Node) -> RuntimeResult<Flow> {
        match node {
            Node::Variable { name, var_type, expr } => {
                let value = self.evaluate(expr)?;

                if value.value_type() != *var_type {
                    return Err(RuntimeError::TypeMismatch { expected: *var_type, found: value.value_type(), line: name.line() });
                }

                self.stack.declare(self.heap, name.source(), value).map_err(variable_error(name))?;
                Ok(Flow::Continue)
            },
            Node::Assignment { name, expr } => {
                let value = self.evaluate(expr)?;
                let address = self.stack.lookup(name.source()).map_err(variable_error(name))?;
                let cell = self.heap.get_cell_mut(address)?;

                if value.value_type() != cell.cell_type {
                    return Err(RuntimeError::TypeMismatch { expected: cell.cell_type, found: value.value_type(), line: name.line() });
                }

                cell.value = value;
                Ok(Flow::Continue)
            },
            Node::Step { name, operator } => {
                let address = self.stack.lookup(name.source()).map_err(variable_error(name))?;
                let cell = self.heap.get_cell_mut(address)?;

                cell.value = operators::apply_step(operator, cell.value.clone())?;
                Ok(Flow::Continue)
            },
            Node::Return { expr, .. } => Ok(Flow::Return(self.evaluate(expr)?)),
            Node::If { token, condition, body, otherwise } => {
                match self.evaluate(condition)? {
                    Value::Bool(true) => self.execute_block(body),
                    Value::Bool(false) => self.execute(otherwise),
                    other => Err(RuntimeError::TypeMismatch { expected: ValueType::Bool, found: other.value_type(), line: token.line() }),
                }
            },
            Node::Else { body, .. } => self.execute_block(body),
            Node::Print { expr, .. } => {
                let value = self.evaluate(expr)?;
                write!(self.output, "{}", value)?;
                Ok(Flow::Continue)
            },
            Node::Empty => Ok(Flow::Continue),
            expr => {
                self.evaluate(expr)?;
                Ok(Flow::Continue)
            },
        }
    }

    // Expressions

    /// Evaluates an expression, growing the native stack when deep recursion runs low on it.
    pub fn evaluate(&mut self, node: &Node) -> RuntimeResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.evaluate_inner(node))
    }

    fn evaluate_inner(&mut self, node: &Node) -> RuntimeResult<Value> {
        match node {
            Node::ConstantInt(value) => Ok(Value::Int(*value)),
            Node::ConstantFloat(value) => Ok(Value::Float(*value)),
            Node::ConstantBool(value) => Ok(Value::Bool(*value)),
            Node::ConstantString(value) => Ok(Value::String(value.clone())),
            Node::Identifier(name) => {
                let address = self.stack.lookup(name.source()).map_err(variable_error(name))?;
                Ok(self.heap.get_cell(address)?.value.clone())
            },
            Node::UnaryOperator { operator, expr } => {
                let operand = self.evaluate(expr)?;
                operators::apply_unary(operator, operand)
            },
            Node::BinaryOperator { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                operators::apply_binary(operator, left, right)
            },
            Node::Call(call) => self.call(call),
            statement => Err(RuntimeError::NotAnExpression { line: statement.line().unwrap_or(0) }),
        }
    }

    fn call(&mut self, call: &Call) -> RuntimeResult<Value> {
        let mut args = Vec::with_capacity(call.args.len());

        for arg in &call.args {
            args.push(self.evaluate(arg)?);
        }

        let arg_types: Vec<ValueType> = args.iter().map(Value::value_type).collect();
        let functions = self.functions;

        let cached = call.resolved.get().copied()
            .filter(|&index| functions.get(index).map_or(false, |entry| entry.signature.param_types == arg_types));

        let index = match cached {
            Some(index) => index,
            None => {
                let key = SignatureKey::new(call.name.source(), arg_types);
                let index = functions.lookup(&key).ok_or_else(|| RuntimeError::UnresolvedFunction {
                    signature: key.to_string(),
                    line: call.name.line(),
                })?;

                if call.resolved.set(index).is_ok() {
                    trace!("Resolved {} to function #{}", key, index);
                }

                index
            },
        };

        self.invoke(index, args, call.name.line())
    }

    fn invoke(&mut self, index: usize, args: Vec<Value>, line: usize) -> RuntimeResult<Value> {
        let functions = self.functions;
        let entry = functions.get(index).ok_or_else(|| RuntimeError::UnresolvedFunction {
            signature: format!("#{}", index),
            line,
        })?;
        let signature = &entry.signature;

        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded { limit: self.max_call_depth, line });
        }

        debug!("Calling {} at depth {}", signature, self.call_depth + 1);
        self.call_depth += 1;

        // Functions only see their own parameters and the globals
        let result = self.in_new_space(CallStack::ROOT, |this| {
            for ((param, param_type), value) in entry.decl.params.iter().zip(&signature.param_types).zip(args) {
                if value.value_type() != *param_type {
                    return Err(RuntimeError::TypeMismatch { expected: *param_type, found: value.value_type(), line: param.name.line() });
                }

                this.stack.declare(this.heap, param.name.source(), value).map_err(variable_error(&param.name))?;
            }

            this.execute_statements(&entry.decl.body)
        });

        self.call_depth -= 1;

        match result? {
            Flow::Return(value) if value.value_type() == signature.return_type => Ok(value),
            Flow::Return(value) => Err(RuntimeError::ReturnTypeMismatch {
                signature: signature.key().to_string(),
                expected: signature.return_type,
                found: value.value_type(),
                line,
            }),
            Flow::Continue => Err(RuntimeError::MissingReturn { function: signature.name.clone() }),
        }
    }
}
