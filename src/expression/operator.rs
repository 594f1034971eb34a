//! Operator and built-in function definitions for expressions.

use crate::value::DataType;
use serde::{Deserialize, Serialize};

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // String
    Concat,
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    pub fn output_type(&self, left: &DataType, right: &DataType) -> Option<DataType> {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Rem => match (left, right) {
                (DataType::Int32, DataType::Int32) => Some(DataType::Int32),
                _ => None,
            },

            // Only values of the same type compare
            BinaryOperator::Eq | BinaryOperator::Ne => {
                (left == right).then_some(DataType::Boolean)
            }

            // Objects have no ordering
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                (left == right && !left.is_object()).then_some(DataType::Boolean)
            }

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (DataType::Boolean, DataType::Boolean) => Some(DataType::Boolean),
                _ => None,
            },

            BinaryOperator::Concat => match (left, right) {
                (DataType::Varchar, DataType::Varchar) => Some(DataType::Varchar),
                _ => None,
            },
        }
    }

    /// Output type when at least one operand is statically NULL
    pub fn null_output_type(&self, known: Option<&DataType>) -> Option<DataType> {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Rem => Some(DataType::Int32),
            BinaryOperator::Concat => Some(DataType::Varchar),
            _ if self.is_predicate() => Some(DataType::Boolean),
            _ => known.cloned(),
        }
    }

    /// Whether the operator always produces a boolean
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
                | BinaryOperator::And
                | BinaryOperator::Or
        )
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Concat => "++",
        }
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
    IsNull,
    IsNotNull,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: &DataType) -> Option<DataType> {
        match self {
            UnaryOperator::Not => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            UnaryOperator::Minus => match operand {
                DataType::Int32 => Some(DataType::Int32),
                _ => None,
            },

            // NULL checks always return boolean regardless of input type
            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(DataType::Boolean),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Minus => "-",
            UnaryOperator::IsNull => "is null",
            UnaryOperator::IsNotNull => "is not null",
        }
    }
}

/// Built-in functions callable from expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Abs,
    Length,
    Upper,
    Lower,
}

impl Function {
    pub fn arity(&self) -> usize {
        1
    }

    /// Get the output type of this function given its argument types
    pub fn output_type(&self, args: &[DataType]) -> Option<DataType> {
        match (self, args) {
            (Function::Abs, [DataType::Int32]) => Some(DataType::Int32),
            (Function::Length, [DataType::Varchar]) => Some(DataType::Int32),
            (Function::Upper | Function::Lower, [DataType::Varchar]) => Some(DataType::Varchar),
            _ => None,
        }
    }

    /// Output type when an argument is statically NULL
    pub fn null_output_type(&self) -> DataType {
        match self {
            Function::Abs | Function::Length => DataType::Int32,
            Function::Upper | Function::Lower => DataType::Varchar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Length => "length",
            Function::Upper => "upper",
            Function::Lower => "lower",
        }
    }
}
