//! Error types for building and evaluating quoted functions.

use crate::value::DataType;
use thiserror::Error;

/// Errors raised when an expression is built, combined or evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        context: String,
    },

    #[error("Invalid operand types for operator {operator}: left={left_type:?}, right={right_type:?}")]
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unexpected NULL value in {context}")]
    UnexpectedNull { context: String },

    #[error("Function {function} expects {expected} arguments, got {actual}")]
    FunctionArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// A quoted function was given the wrong number of parameters or arguments
    #[error("Expected a function of {expected} parameters, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("Parameter {name} is not declared by the enclosing function")]
    UnboundParameter { name: String },

    #[error("Parameter {name} is declared more than once")]
    DuplicateParameter { name: String },

    #[error("Type {type_name} has no field {field}")]
    UnknownField { type_name: String, field: String },

    #[error("Cannot access field {field} on a value of type {target_type:?}")]
    InvalidMemberAccess {
        field: String,
        target_type: Option<DataType>,
    },

    /// A caller-supplied expression does not have the required syntactic shape
    #[error("Invalid expression shape: expected {expected}, got {actual}")]
    InvalidExpressionShape { expected: String, actual: String },

    #[error("Invalid argument {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Type {type_name} has no zero-argument constructor")]
    MissingConstructor { type_name: String },

    #[error("Field {field} of type {type_name} is initialized more than once")]
    DuplicateFieldInitializer { type_name: String, field: String },

    #[error("Expression evaluation error: {message}")]
    EvaluationError { message: String },

    #[error("Type check failed for expression '{expression}': {reason}")]
    TypeCheckFailed { expression: String, reason: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
