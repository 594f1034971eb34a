//! Quoted functions.

use crate::expression::{
    ExpressionError, ExpressionEvaluator, ExpressionResult, Expression, Parameter, TypeChecker,
};
use crate::value::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Compiled form of a quoted function
pub type CompiledFn = Box<dyn Fn(&[Value]) -> ExpressionResult<Value> + Send + Sync + 'static>;

/// A parameter list paired with a body expression.
///
/// `Lambda` is a cheap handle: cloning it shares the underlying tree, and
/// [`Lambda::ptr_eq`] tells whether two handles are the same function rather
/// than merely equal ones.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "LambdaDef", into = "LambdaDef")]
pub struct Lambda {
    inner: Arc<LambdaInner>,
}

#[derive(Debug, PartialEq)]
struct LambdaInner {
    parameters: Vec<Parameter>,
    body: Expression,
    return_type: DataType,
}

/// Serialized form; decoding goes back through validation
#[derive(Serialize, Deserialize)]
pub(crate) struct LambdaDef {
    parameters: Vec<Parameter>,
    body: Expression,
    return_type: DataType,
}

impl Lambda {
    /// Create a quoted function, inferring its return type from the body
    pub fn new(parameters: Vec<Parameter>, body: Expression) -> ExpressionResult<Self> {
        let inferred = Self::validate(&parameters, &body)?;
        let return_type = inferred.ok_or_else(|| ExpressionError::TypeCheckFailed {
            expression: body.to_string(),
            reason: "cannot infer the return type of a NULL body".to_string(),
        })?;
        Ok(Self::from_parts(parameters, body, return_type))
    }

    /// Create a quoted function with a declared return type
    pub fn returning(
        parameters: Vec<Parameter>,
        body: Expression,
        return_type: DataType,
    ) -> ExpressionResult<Self> {
        if let Some(inferred) = Self::validate(&parameters, &body)? {
            if inferred != return_type {
                return Err(ExpressionError::TypeMismatch {
                    expected: return_type,
                    actual: inferred,
                    context: "function body".to_string(),
                });
            }
        }
        Ok(Self::from_parts(parameters, body, return_type))
    }

    /// Create a single-parameter quoted function
    pub fn unary(parameter: Parameter, body: Expression) -> ExpressionResult<Self> {
        Self::new(vec![parameter], body)
    }

    fn validate(parameters: &[Parameter], body: &Expression) -> ExpressionResult<Option<DataType>> {
        for (i, param) in parameters.iter().enumerate() {
            if parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(ExpressionError::DuplicateParameter {
                    name: param.name.clone(),
                });
            }
        }
        TypeChecker::new(parameters).check(body)
    }

    /// Assemble a function from parts already known to be valid
    pub(crate) fn from_parts(
        parameters: Vec<Parameter>,
        body: Expression,
        return_type: DataType,
    ) -> Self {
        Self {
            inner: Arc::new(LambdaInner {
                parameters,
                body,
                return_type,
            }),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.inner.parameters
    }

    pub fn arity(&self) -> usize {
        self.inner.parameters.len()
    }

    pub fn body(&self) -> &Expression {
        &self.inner.body
    }

    pub fn return_type(&self) -> &DataType {
        &self.inner.return_type
    }

    /// The only parameter of a single-parameter function
    pub fn single_parameter(&self) -> ExpressionResult<&Parameter> {
        match self.parameters() {
            [param] => Ok(param),
            params => Err(ExpressionError::ArgumentCount {
                expected: 1,
                actual: params.len(),
            }),
        }
    }

    /// Check if both handles share the same function
    pub fn ptr_eq(&self, other: &Lambda) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Check if the body is exactly the literal `value`.
    ///
    /// This is a syntactic test: `x => 1 == 1` is not a constant.
    pub fn is_constant(&self, value: &Value) -> bool {
        self.body().as_literal() == Some(value)
    }

    /// Apply the function to `arguments`
    pub fn invoke(&self, arguments: &[Value]) -> ExpressionResult<Value> {
        let parameters = self.parameters();
        if arguments.len() != parameters.len() {
            return Err(ExpressionError::ArgumentCount {
                expected: parameters.len(),
                actual: arguments.len(),
            });
        }

        for (param, arg) in parameters.iter().zip(arguments) {
            if !arg.is_compatible_with(&param.data_type) {
                return Err(ExpressionError::TypeMismatch {
                    expected: param.data_type.clone(),
                    actual: arg.data_type().unwrap_or_else(|| param.data_type.clone()),
                    context: format!("argument {}", param.name),
                });
            }
        }

        ExpressionEvaluator::new(parameters, arguments).evaluate(self.body())
    }

    /// Turn the function into a closure
    pub fn compile(&self) -> CompiledFn {
        let lambda = self.clone();
        Box::new(move |arguments| lambda.invoke(arguments))
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner == other.inner
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("parameters", &self.inner.parameters)
            .field("body", &self.inner.body)
            .field("return_type", &self.inner.return_type)
            .finish()
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameters() {
            [param] => write!(f, "{}", param.name)?,
            params => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param.name)?;
                }
                write!(f, ")")?;
            }
        }
        write!(f, " => {}", self.body())
    }
}

impl TryFrom<LambdaDef> for Lambda {
    type Error = ExpressionError;

    fn try_from(def: LambdaDef) -> ExpressionResult<Self> {
        Lambda::returning(def.parameters, def.body, def.return_type)
    }
}

impl From<Lambda> for LambdaDef {
    fn from(lambda: Lambda) -> Self {
        LambdaDef {
            parameters: lambda.inner.parameters.clone(),
            body: lambda.inner.body.clone(),
            return_type: lambda.inner.return_type.clone(),
        }
    }
}
