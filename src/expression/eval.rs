//! Expression evaluation implementation.

use crate::expression::{
    BinaryOperator, Expression, ExpressionError, ExpressionResult, FieldRef, Function, Parameter,
    UnaryOperator,
};
use crate::value::Value;
use std::cmp::Ordering;

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    /// Declared parameters, positionally matched with `arguments`
    parameters: &'a [Parameter],
    arguments: &'a [Value],
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator binding each parameter to the argument at the same position
    pub fn new(parameters: &'a [Parameter], arguments: &'a [Value]) -> Self {
        Self {
            parameters,
            arguments,
        }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.clone()),

            Expression::Parameter(param) => self.evaluate_parameter(param),

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;

                // Logical operators skip the right side once the left decides
                match (op, &left_val) {
                    (BinaryOperator::And, Value::Boolean(false)) => {
                        return Ok(Value::Boolean(false))
                    }
                    (BinaryOperator::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
                    _ => {}
                }

                let right_val = self.evaluate(right)?;
                self.evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                self.evaluate_call(*function, values)
            }

            Expression::Member { target, field } => {
                let target_val = self.evaluate(target)?;
                self.evaluate_member(target_val, field)
            }

            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => match self.evaluate(condition)? {
                Value::Boolean(true) => self.evaluate(then),
                Value::Boolean(false) => self.evaluate(otherwise),
                Value::Null => Err(ExpressionError::UnexpectedNull {
                    context: "conditional test".to_string(),
                }),
                other => Err(ExpressionError::InvalidOperandTypes {
                    operator: "?:".to_string(),
                    left_type: other.data_type(),
                    right_type: None,
                }),
            },

            Expression::Coalesce { value, fallback } => match self.evaluate(value)? {
                Value::Null => self.evaluate(fallback),
                present => Ok(present),
            },

            Expression::New(object_type) => Ok(Value::Object(object_type.instantiate())),

            Expression::MemberInit {
                object_type,
                bindings,
            } => {
                let mut record = object_type.instantiate();
                for binding in bindings {
                    let value = self.evaluate(&binding.value)?;
                    record.set(&binding.field.name, value);
                }
                Ok(Value::Object(record))
            }
        }
    }

    /// Evaluate a parameter reference
    fn evaluate_parameter(&self, param: &Parameter) -> ExpressionResult<Value> {
        self.parameters
            .iter()
            .position(|declared| declared == param)
            .and_then(|index| self.arguments.get(index))
            .cloned()
            .ok_or_else(|| ExpressionError::UnboundParameter {
                name: param.name.clone(),
            })
    }

    /// Evaluate a binary operation
    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        // Handle NULL propagation for most operators
        if left.is_null() || right.is_null() {
            return Ok(match op {
                // NULL AND false = false, NULL AND true = NULL
                BinaryOperator::And => {
                    if matches!(right, Value::Boolean(false)) {
                        Value::Boolean(false)
                    } else {
                        Value::Null
                    }
                }
                // NULL OR true = true, NULL OR false = NULL
                BinaryOperator::Or => {
                    if matches!(right, Value::Boolean(true)) {
                        Value::Boolean(true)
                    } else {
                        Value::Null
                    }
                }
                // Comparisons and arithmetic propagate NULL
                _ => Value::Null,
            });
        }

        let invalid = |left: &Value, right: &Value| ExpressionError::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left_type: left.data_type(),
            right_type: right.data_type(),
        };

        match op {
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => {
                match (&left, &right) {
                    (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(match op {
                        BinaryOperator::Add => a.wrapping_add(*b),
                        BinaryOperator::Sub => a.wrapping_sub(*b),
                        _ => a.wrapping_mul(*b),
                    })),
                    _ => Err(invalid(&left, &right)),
                }
            }

            BinaryOperator::Div | BinaryOperator::Rem => match (&left, &right) {
                (Value::Int32(_), Value::Int32(0)) => Err(ExpressionError::DivisionByZero),
                (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(match op {
                    BinaryOperator::Div => a.wrapping_div(*b),
                    _ => a.wrapping_rem(*b),
                })),
                _ => Err(invalid(&left, &right)),
            },

            BinaryOperator::Eq => self.compare_values(op, left, right, |cmp| cmp == Ordering::Equal),
            BinaryOperator::Ne => self.compare_values(op, left, right, |cmp| cmp != Ordering::Equal),
            BinaryOperator::Lt => self.compare_values(op, left, right, |cmp| cmp == Ordering::Less),
            BinaryOperator::Le => self.compare_values(op, left, right, |cmp| cmp != Ordering::Greater),
            BinaryOperator::Gt => self.compare_values(op, left, right, |cmp| cmp == Ordering::Greater),
            BinaryOperator::Ge => self.compare_values(op, left, right, |cmp| cmp != Ordering::Less),

            BinaryOperator::And | BinaryOperator::Or => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(match op {
                    BinaryOperator::And => *a && *b,
                    _ => *a || *b,
                })),
                _ => Err(invalid(&left, &right)),
            },

            BinaryOperator::Concat => match (&left, &right) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                _ => Err(invalid(&left, &right)),
            },
        }
    }

    /// Evaluate a unary operation
    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        match op {
            UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),
            UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),

            UnaryOperator::Not => match operand {
                Value::Null => Ok(Value::Null),
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.data_type(),
                    right_type: None,
                }),
            },

            UnaryOperator::Minus => match operand {
                Value::Null => Ok(Value::Null),
                Value::Int32(n) => Ok(Value::Int32(n.wrapping_neg())),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.data_type(),
                    right_type: None,
                }),
            },
        }
    }

    /// Evaluate a built-in function call
    fn evaluate_call(&self, function: Function, args: Vec<Value>) -> ExpressionResult<Value> {
        let [arg]: [Value; 1] =
            args.try_into()
                .map_err(|args: Vec<Value>| ExpressionError::FunctionArgumentCount {
                    function: function.as_str().to_string(),
                    expected: function.arity(),
                    actual: args.len(),
                })?;

        match (function, arg) {
            (_, Value::Null) => Ok(Value::Null),
            (Function::Abs, Value::Int32(n)) => Ok(Value::Int32(n.wrapping_abs())),
            (Function::Length, Value::String(s)) => Ok(Value::Int32(
                i32::try_from(s.chars().count()).unwrap_or(i32::MAX),
            )),
            (Function::Upper, Value::String(s)) => Ok(Value::String(s.to_uppercase())),
            (Function::Lower, Value::String(s)) => Ok(Value::String(s.to_lowercase())),
            (_, other) => Err(ExpressionError::InvalidOperandTypes {
                operator: function.as_str().to_string(),
                left_type: other.data_type(),
                right_type: None,
            }),
        }
    }

    /// Evaluate a field access
    fn evaluate_member(&self, target: Value, field: &FieldRef) -> ExpressionResult<Value> {
        match target {
            Value::Object(record) => {
                record
                    .get(&field.name)
                    .cloned()
                    .ok_or_else(|| ExpressionError::UnknownField {
                        type_name: record.type_name.clone(),
                        field: field.name.clone(),
                    })
            }
            Value::Null => Err(ExpressionError::UnexpectedNull {
                context: format!("access to field {}", field.name),
            }),
            other => Err(ExpressionError::InvalidMemberAccess {
                field: field.name.clone(),
                target_type: other.data_type(),
            }),
        }
    }

    /// Compare two values and apply a comparison function
    fn compare_values<F>(
        &self,
        op: BinaryOperator,
        left: Value,
        right: Value,
        cmp_fn: F,
    ) -> ExpressionResult<Value>
    where
        F: FnOnce(Ordering) -> bool,
    {
        let cmp_result = match (&left, &right) {
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            // Objects only support equality
            (Value::Object(a), Value::Object(b))
                if matches!(op, BinaryOperator::Eq | BinaryOperator::Ne) =>
            {
                if a == b {
                    Ordering::Equal
                } else {
                    Ordering::Less
                }
            }
            _ => {
                return Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: left.data_type(),
                    right_type: right.data_type(),
                })
            }
        };

        Ok(Value::Boolean(cmp_fn(cmp_result)))
    }
}

/// Helper function to evaluate an expression with positional arguments
pub fn evaluate_expression(
    expr: &Expression,
    parameters: &[Parameter],
    arguments: &[Value],
) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(parameters, arguments).evaluate(expr)
}
