//! Boolean predicates over a single input and their combinators.
//!
//! [`PredicateBuilder`] joins predicates with AND/OR/NOT and folds sequences of
//! them. When one operand is literally `true` or `false` the combinators
//! short-circuit: they either hand back the other operand itself (the same
//! shared tree, see [`Predicate::ptr_eq`]) or a freshly built constant.
//! Detection looks only at the shape of the body, so `x => 1 == 1` is not a
//! constant.
//!
//! A predicate holds for an input only when its body yields `true`; NULL
//! counts as false. Combined bodies fold NULL to `false` wherever the SQL
//! three-valued result would disagree with that reading, so `not(p)` holds
//! exactly when `p` does not, and `and`/`or` match `&&`/`||` over the
//! operands' outcomes, errors included.

use crate::expression::{
    BinaryOperator, Expression, ExpressionError, ExpressionResult, Lambda, Parameter,
    UnaryOperator,
};
use crate::value::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compiled form of a predicate
pub type CompiledPredicate = Box<dyn Fn(&Value) -> bool + Send + Sync + 'static>;

/// A single-parameter quoted function returning a boolean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Lambda", into = "Lambda")]
pub struct Predicate {
    lambda: Lambda,
}

impl Predicate {
    /// Wrap a quoted function, which must take one parameter and return a boolean
    pub fn new(lambda: Lambda) -> ExpressionResult<Self> {
        lambda.single_parameter()?;
        if *lambda.return_type() != DataType::Boolean {
            return Err(ExpressionError::TypeMismatch {
                expected: DataType::Boolean,
                actual: lambda.return_type().clone(),
                context: "predicate".to_string(),
            });
        }
        Ok(Self { lambda })
    }

    /// Create a predicate from its parameter and body
    pub fn from_body(parameter: Parameter, body: Expression) -> ExpressionResult<Self> {
        Self::new(Lambda::returning(vec![parameter], body, DataType::Boolean)?)
    }

    /// A fresh predicate whose body is the literal `value`
    pub fn constant(input_type: DataType, value: bool) -> Self {
        let parameter = Parameter::new("_", input_type);
        Self::from_trusted(parameter, Expression::bool(value))
    }

    pub fn always(input_type: DataType) -> Self {
        Self::constant(input_type, true)
    }

    pub fn never(input_type: DataType) -> Self {
        Self::constant(input_type, false)
    }

    /// Build from a parameter and a body that is boolean over it
    fn from_trusted(parameter: Parameter, body: Expression) -> Self {
        Self {
            lambda: Lambda::from_parts(vec![parameter], body, DataType::Boolean),
        }
    }

    pub fn parameter(&self) -> &Parameter {
        &self.lambda.parameters()[0]
    }

    pub fn input_type(&self) -> &DataType {
        &self.parameter().data_type
    }

    pub fn body(&self) -> &Expression {
        self.lambda.body()
    }

    pub fn as_lambda(&self) -> &Lambda {
        &self.lambda
    }

    /// Check if the body is exactly the literal `value`
    pub fn is_constant(&self, value: bool) -> bool {
        self.body().is_bool_literal(value)
    }

    /// Check if both predicates share the same tree
    pub fn ptr_eq(&self, other: &Predicate) -> bool {
        self.lambda.ptr_eq(&other.lambda)
    }

    /// Evaluate the predicate; a NULL result counts as false
    pub fn evaluate(&self, input: &Value) -> ExpressionResult<bool> {
        match self.lambda.invoke(std::slice::from_ref(input))? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(ExpressionError::EvaluationError {
                message: format!("predicate produced non-boolean value {}", other),
            }),
        }
    }

    /// Turn the predicate into a filter closure.
    ///
    /// Evaluation errors are treated as false, like NULL.
    pub fn compile(&self) -> CompiledPredicate {
        let predicate = self.clone();
        Box::new(move |input| predicate.evaluate(input).unwrap_or(false))
    }
}

impl TryFrom<Lambda> for Predicate {
    type Error = ExpressionError;

    fn try_from(lambda: Lambda) -> ExpressionResult<Self> {
        Predicate::new(lambda)
    }
}

impl From<Predicate> for Lambda {
    fn from(predicate: Predicate) -> Self {
        predicate.lambda
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lambda)
    }
}

/// `body ?? false`, unless `body` can never be NULL
fn two_valued(body: &Expression) -> Expression {
    if never_null(body) {
        body.clone()
    } else {
        Expression::coalesce(body.clone(), Expression::bool(false))
    }
}

fn never_null(expr: &Expression) -> bool {
    match expr {
        Expression::Literal(lit) => !lit.value.is_null(),
        Expression::Coalesce { fallback, .. } => never_null(fallback),
        Expression::UnaryOp { op, operand } => match op {
            UnaryOperator::IsNull | UnaryOperator::IsNotNull => true,
            UnaryOperator::Not | UnaryOperator::Minus => never_null(operand),
        },
        Expression::BinaryOp {
            op: BinaryOperator::And | BinaryOperator::Or,
            left,
            right,
        } => never_null(left) && never_null(right),
        _ => false,
    }
}

/// Combinators over [`Predicate`]s
pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Logical AND of two predicates.
    ///
    /// A literal `true` operand yields the other operand itself; a literal
    /// `false` operand yields a new constant-false predicate.
    pub fn and(first: &Predicate, second: &Predicate) -> ExpressionResult<Predicate> {
        Self::check_input_types(first, second)?;

        if first.is_constant(true) {
            log::debug!("and: left operand is true, returning right operand");
            return Ok(second.clone());
        }
        if second.is_constant(true) {
            log::debug!("and: right operand is true, returning left operand");
            return Ok(first.clone());
        }
        if first.is_constant(false) || second.is_constant(false) {
            log::debug!("and: an operand is false, returning constant false");
            return Ok(Predicate::never(first.input_type().clone()));
        }

        let (parameter, right) = Self::unify(first, second);
        Ok(Predicate::from_trusted(
            parameter,
            Expression::and(two_valued(first.body()), right),
        ))
    }

    /// Logical OR of two predicates.
    ///
    /// A literal `false` operand yields the other operand itself; a literal
    /// `true` operand yields a new constant-true predicate.
    pub fn or(first: &Predicate, second: &Predicate) -> ExpressionResult<Predicate> {
        Self::check_input_types(first, second)?;

        if first.is_constant(true) || second.is_constant(true) {
            log::debug!("or: an operand is true, returning constant true");
            return Ok(Predicate::always(first.input_type().clone()));
        }
        if first.is_constant(false) {
            log::debug!("or: left operand is false, returning right operand");
            return Ok(second.clone());
        }
        if second.is_constant(false) {
            log::debug!("or: right operand is false, returning left operand");
            return Ok(first.clone());
        }

        let (parameter, right) = Self::unify(first, second);
        Ok(Predicate::from_trusted(
            parameter,
            Expression::or(two_valued(first.body()), right),
        ))
    }

    /// Logical negation of a predicate.
    ///
    /// An input on which `predicate` is NULL satisfies the negation. An input
    /// on which it fails to evaluate fails the negation the same way.
    pub fn not(predicate: &Predicate) -> Predicate {
        Predicate::from_trusted(
            predicate.parameter().clone(),
            Expression::not_expr(two_valued(predicate.body())),
        )
    }

    /// AND of every predicate; true when there are none
    pub fn all<I>(input_type: DataType, predicates: I) -> ExpressionResult<Predicate>
    where
        I: IntoIterator<Item = Predicate>,
    {
        predicates
            .into_iter()
            .try_fold(Predicate::always(input_type), |acc, next| {
                Self::and(&acc, &next)
            })
    }

    /// OR of every predicate; false when there are none
    pub fn any<I>(input_type: DataType, predicates: I) -> ExpressionResult<Predicate>
    where
        I: IntoIterator<Item = Predicate>,
    {
        predicates
            .into_iter()
            .try_fold(Predicate::never(input_type), |acc, next| {
                Self::or(&acc, &next)
            })
    }

    fn check_input_types(first: &Predicate, second: &Predicate) -> ExpressionResult<()> {
        if first.input_type() != second.input_type() {
            return Err(ExpressionError::TypeMismatch {
                expected: first.input_type().clone(),
                actual: second.input_type().clone(),
                context: "predicate input".to_string(),
            });
        }
        Ok(())
    }

    /// The first predicate's parameter, and the second body re-pointed at it
    fn unify(first: &Predicate, second: &Predicate) -> (Parameter, Expression) {
        let parameter = first.parameter().clone();
        let body = if second.parameter() == first.parameter() {
            second.body().clone()
        } else {
            second
                .body()
                .replace(&second.parameter().to_expr(), &parameter.to_expr())
        };
        (parameter, body)
    }
}
