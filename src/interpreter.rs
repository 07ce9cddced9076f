use std::collections::HashMap;

use crate::ast::{BinaryOperator, Expression, Statement};

mod error;
mod value;

pub use error::RuntimeError;
pub use value::Value;

/// Control-flow marker for statement execution.
enum ExecResult {
    Continue,
    Return(Value),
}

/// Final disposition of a run. A top-level `return` and a runtime
/// failure both halt execution, but they are distinct outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed,
    Returned(Value),
    Failed(RuntimeError),
}

/// Ordered observation lines plus the disposition of one program run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramRun {
    pub output: Vec<String>,
    pub outcome: Outcome,
}

/// Tree-walking evaluator with a two-tier variable store.
///
/// `locals` receives every `var` binding; `globals` is a fallback lookup
/// tier that no current language construct writes. Entering a block
/// snapshots the whole `locals` map and exiting restores it, so every
/// binding or reassignment made inside a block is discarded at its end.
pub struct Interpreter {
    globals: HashMap<String, Value>,
    locals: HashMap<String, Value>,
    output: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            locals: HashMap::new(),
            output: Vec::new(),
        }
    }

    /// Executes top-level statements in order until the program completes,
    /// returns, or fails. Consumes the interpreter: one instance, one run.
    pub fn run(mut self, statements: &[Statement]) -> ProgramRun {
        for statement in statements {
            match self.exec_statement(statement) {
                Ok(ExecResult::Continue) => {}
                Ok(ExecResult::Return(value)) => {
                    return ProgramRun {
                        output: self.output,
                        outcome: Outcome::Returned(value),
                    };
                }
                Err(error) => {
                    self.output.push(format!("Runtime error: {error}"));
                    return ProgramRun {
                        output: self.output,
                        outcome: Outcome::Failed(error),
                    };
                }
            }
        }
        ProgramRun {
            output: self.output,
            outcome: Outcome::Completed,
        }
    }

    fn exec_statement(&mut self, statement: &Statement) -> Result<ExecResult, RuntimeError> {
        match statement {
            Statement::VarDecl { name, initializer } => {
                let value = self.eval_expression(initializer)?;
                self.locals.insert(name.clone(), value);
                Ok(ExecResult::Continue)
            }
            Statement::Block(statements) => self.exec_block(statements),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.eval_expression(condition)?;
                if condition.is_truthy() {
                    self.exec_statement(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_statement(else_branch)
                } else {
                    Ok(ExecResult::Continue)
                }
            }
            Statement::While { condition, body } => {
                while self.eval_expression(condition)?.is_truthy() {
                    if let ExecResult::Return(value) = self.exec_statement(body)? {
                        return Ok(ExecResult::Return(value));
                    }
                }
                Ok(ExecResult::Continue)
            }
            Statement::Return(value) => {
                let value = self.eval_expression(value)?;
                self.output.push(format!("Returned: {value}"));
                Ok(ExecResult::Return(value))
            }
        }
    }

    fn exec_block(&mut self, statements: &[Statement]) -> Result<ExecResult, RuntimeError> {
        // Whole-map snapshot on entry, unconditional restore on exit —
        // also on the return and error paths.
        let snapshot = self.locals.clone();
        let mut result = Ok(ExecResult::Continue);
        for statement in statements {
            match self.exec_statement(statement) {
                Ok(ExecResult::Continue) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }
        self.locals = snapshot;
        result
    }

    fn eval_expression(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::Literal { text, .. } => Ok(match text.parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => Value::Str(text.clone()),
            }),
            Expression::Identifier { name, .. } => {
                if let Some(value) = self.locals.get(name) {
                    return Ok(value.clone());
                }
                if let Some(value) = self.globals.get(name) {
                    return Ok(value.clone());
                }
                Err(RuntimeError::UndefinedVariable { name: name.clone() })
            }
            Expression::Binary {
                left, op, right, ..
            } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                eval_binary(&left, *op, &right)
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn eval_binary(left: &Value, op: BinaryOperator, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOperator::Add => Ok(Value::Number(left.as_number(op)? + right.as_number(op)?)),
        BinaryOperator::Sub => Ok(Value::Number(left.as_number(op)? - right.as_number(op)?)),
        BinaryOperator::Mul => Ok(Value::Number(left.as_number(op)? * right.as_number(op)?)),
        BinaryOperator::Div => {
            let left = left.as_number(op)?;
            let right = right.as_number(op)?;
            if right == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Number(left / right))
        }
        BinaryOperator::Greater => Ok(Value::Boolean(left.as_number(op)? > right.as_number(op)?)),
        BinaryOperator::GreaterEqual => {
            Ok(Value::Boolean(left.as_number(op)? >= right.as_number(op)?))
        }
        BinaryOperator::Less => Ok(Value::Boolean(left.as_number(op)? < right.as_number(op)?)),
        BinaryOperator::LessEqual => {
            Ok(Value::Boolean(left.as_number(op)? <= right.as_number(op)?))
        }
    }
}
