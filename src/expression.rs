//! Quoted functions as explicit expression trees.
//!
//! This module provides:
//! - Expression AST representation
//! - Quoted functions pairing a parameter list with a body
//! - Tree substitution
//! - Type checking and validation
//! - Expression evaluation

pub mod error;
pub mod eval;
pub mod expr;
pub mod lambda;
pub mod operator;
pub mod replace;
pub mod type_checker;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, ExpressionEvaluator};
pub use expr::{Binding, Expression, FieldRef, Literal, Parameter};
pub use lambda::{CompiledFn, Lambda};
pub use operator::{BinaryOperator, Function, UnaryOperator};
pub use replace::Substitution;
pub use type_checker::TypeChecker;
