use thiserror::Error;

/// Typed failures raised during evaluation. Each halts the remaining
/// statements of the run; none propagates past [`Interpreter::run`].
///
/// [`Interpreter::run`]: super::Interpreter::run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Variable '{name}' is not defined")]
    UndefinedVariable { name: String },
    #[error("Operator '{operator}' expects number operands, got {type_name}")]
    ExpectedNumber {
        operator: &'static str,
        type_name: &'static str,
    },
    #[error("Division by zero")]
    DivisionByZero,
}
